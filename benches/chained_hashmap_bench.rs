use chained_hashmap::ChainedHashMap;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn filled(seed: u64, n: usize) -> (ChainedHashMap<String, u64>, Vec<String>) {
    let keys: Vec<String> = lcg(seed).take(n).map(key).collect();
    let m = keys.iter().cloned().zip(0u64..).collect();
    (m, keys)
}

// Exact-fit growth rebuilds at 1, 3, 7, 15, ... entries.
fn bench_insert_fresh_10k(c: &mut Criterion) {
    c.bench_function("chained::insert_fresh_10k", |b| {
        b.iter_batched(
            || lcg(1).take(10_000).map(key).collect::<Vec<_>>(),
            |keys| {
                let mut m = ChainedHashMap::new();
                for (i, k) in keys.into_iter().enumerate() {
                    m.insert(k, i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit(c: &mut Criterion) {
    c.bench_function("chained::get_hit", |b| {
        let (m, keys) = filled(7, 20_000);
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(m.get(k.as_str()));
        })
    });
}

fn bench_get_miss(c: &mut Criterion) {
    c.bench_function("chained::get_miss", |b| {
        let (m, _) = filled(11, 10_000);
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            let k = key(miss.next().unwrap());
            black_box(m.get(k.as_str()));
        })
    });
}

// Removal shrinks the index whenever buckets * 2 > len * 3.
fn bench_remove_all_10k(c: &mut Criterion) {
    c.bench_function("chained::remove_all_10k", |b| {
        b.iter_batched(
            || filled(5, 10_000),
            |(mut m, keys)| {
                for k in &keys {
                    black_box(m.remove(k.as_str()));
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_iterate_100k(c: &mut Criterion) {
    c.bench_function("chained::iterate_100k", |b| {
        let (m, _) = filled(13, 100_000);
        b.iter(|| {
            let mut sum = 0u64;
            for (_, v) in m.iter() {
                sum = sum.wrapping_add(*v);
            }
            black_box(sum)
        })
    });
}

fn bench_clone_10k(c: &mut Criterion) {
    c.bench_function("chained::clone_10k", |b| {
        let (m, _) = filled(17, 10_000);
        b.iter(|| black_box(m.clone()))
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(8))
        .warm_up_time(Duration::from_secs(2))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_insert_fresh_10k, bench_get_hit, bench_get_miss,
        bench_remove_all_10k, bench_iterate_100k, bench_clone_10k
}
criterion_main!(benches);
