#![cfg(test)]

// Property tests for ChainedHashMap kept inside the crate so they can check
// bucket placement through `assert_invariants`.

use crate::chained_hash_map::ChainedHashMap;
use crate::ordered_store::Handle;
use proptest::prelude::*;
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations shrink toward earlier keys and shorter scripts.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    GetOrDefault(usize),
    Remove(usize),
    RemoveHandle(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            1 => idx.clone().prop_map(OpI::GetOrDefault),
            3 => idx.clone().prop_map(OpI::Remove),
            1 => idx.clone().prop_map(OpI::RemoveHandle),
            2 => idx.clone().prop_map(OpI::Find),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Model: Vec of (key, value, handle) in insertion order.
type Model = Vec<(Key, i32, Handle)>;

fn position(model: &Model, k: &Key) -> Option<usize> {
    model.iter().position(|(mk, _, _)| mk == k)
}

// Runs one script against the map and an ordered model. Checked after
// every op:
// - iteration order and contents equal the model's
// - every entry sits in exactly the chain its hash selects
// - load bound after inserts, shrink bound after removals
// - handles of removed entries never resolve
fn run_script<S>(
    mut sut: ChainedHashMap<Key, i32, S>,
    pool: Vec<String>,
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut model: Model = Vec::new();
    let mut stale: Vec<Handle> = Vec::new();

    for op in ops {
        let mut inserted = false;
        let mut removed = false;
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(&pool, i);
                let before = position(&model, &k);
                let (h, added) = sut.insert_full(k.clone(), v);
                prop_assert_eq!(added, before.is_none(), "insert adds only new keys");
                match before {
                    Some(p) => prop_assert_eq!(model[p].2, h, "existing handle returned"),
                    None => model.push((k, v, h)),
                }
                inserted = added;
            }
            OpI::GetOrDefault(i) => {
                let k = key_from(&pool, i);
                let v = *sut.get_or_insert_default(k.clone());
                match position(&model, &k) {
                    Some(p) => prop_assert_eq!(model[p].1, v),
                    None => {
                        prop_assert_eq!(v, 0);
                        let h = sut.find(&k).expect("just inserted");
                        model.push((k, 0, h));
                        inserted = true;
                    }
                }
            }
            OpI::Remove(i) => {
                let k = key_from(&pool, i);
                let got = sut.remove_entry(&k);
                match position(&model, &k) {
                    Some(p) => {
                        let (mk, mv, mh) = model.remove(p);
                        prop_assert_eq!(got, Some((mk, mv)));
                        stale.push(mh);
                        removed = true;
                    }
                    None => prop_assert!(got.is_none()),
                }
                prop_assert!(sut.find(&k).is_none());
            }
            OpI::RemoveHandle(i) => {
                let k = key_from(&pool, i);
                if let Some(p) = position(&model, &k) {
                    let (mk, mv, mh) = model.remove(p);
                    prop_assert_eq!(sut.remove_handle(mh), Some((mk, mv)));
                    stale.push(mh);
                    removed = true;
                } else if let Some(&h) = stale.last() {
                    prop_assert!(sut.remove_handle(h).is_none(), "stale handle removes nothing");
                }
            }
            OpI::Find(i) => {
                let k = key_from(&pool, i);
                let found = sut.find(&k);
                prop_assert_eq!(found, position(&model, &k).map(|p| model[p].2));
                if let Some(h) = found {
                    prop_assert_eq!(h.key(&sut), Some(&k));
                    prop_assert_eq!(sut.at(&k).ok(), h.value(&sut));
                } else {
                    prop_assert!(sut.at(&k).is_err());
                }
            }
            OpI::Contains(s) => {
                let has_model = model.iter().any(|(k, _, _)| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(&pool, i);
                if let Some(p) = position(&model, &k) {
                    let h = model[p].2;
                    let vr = h.value_mut(&mut sut);
                    prop_assert!(vr.is_some(), "live handle should resolve");
                    if let Some(vr) = vr {
                        *vr = vr.saturating_add(d);
                    }
                    model[p].1 = model[p].1.saturating_add(d);
                }
            }
            OpI::Clear => {
                sut.clear();
                stale.extend(model.drain(..).map(|(_, _, h)| h));
                prop_assert_eq!(sut.bucket_count(), 0);
            }
        }

        let got: Vec<(Key, i32)> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
        let want: Vec<(Key, i32)> = model.iter().map(|(k, v, _)| (k.clone(), *v)).collect();
        prop_assert_eq!(got, want);
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        sut.assert_invariants();

        let (len, buckets) = (sut.len(), sut.bucket_count());
        if inserted {
            prop_assert!(len <= buckets * 2, "grow bound: len {} buckets {}", len, buckets);
        }
        if removed && buckets > 0 {
            prop_assert!(buckets * 2 <= len * 3, "shrink bound: len {} buckets {}", len, buckets);
        }
        if len == 0 {
            prop_assert_eq!(buckets, 0);
        }
        for &h in &stale {
            prop_assert!(h.value(&sut).is_none());
        }
    }
    Ok(())
}

// Property: state-machine equivalence against an insertion-ordered model.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_script(ChainedHashMap::new(), pool, ops)?;
    }
}

// Collision variant: every key hashes to 0 and shares one chain.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: same invariants under worst-case collisions.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_script(ChainedHashMap::with_hasher(ConstBuildHasher), pool, ops)?;
    }
}

// Property: a clone taken at any point is unaffected by later edits to the
// source, and vice versa.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_clone_independence(
        before in proptest::collection::vec((0u8..16, any::<i16>()), 0..40),
        after in proptest::collection::vec((any::<bool>(), 0u8..16), 0..40),
    ) {
        let mut a: ChainedHashMap<u8, i16> = ChainedHashMap::new();
        a.extend(before);
        let snapshot: Vec<(u8, i16)> = a.iter().map(|(k, v)| (*k, *v)).collect();

        let mut b = a.clone();
        prop_assert_eq!(b.bucket_count(), b.len());
        b.assert_invariants();
        for &(ins, k) in &after {
            if ins { b.insert(k, -1); } else { b.remove(&k); }
        }
        let now: Vec<(u8, i16)> = a.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(&now, &snapshot);

        let b_snapshot: Vec<(u8, i16)> = b.iter().map(|(k, v)| (*k, *v)).collect();
        for &(ins, k) in &after {
            if ins { a.remove(&k); } else { a.insert(k, 7); }
        }
        let b_now: Vec<(u8, i16)> = b.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(b_now, b_snapshot);
        a.assert_invariants();
        b.assert_invariants();
    }
}
