// ChainedHashMap property tests (public API).
//
// Property 1: order and uniqueness match an insertion-ordered model.
//  - Model: Vec<(key, value)>; insert appends only unseen keys, remove
//    deletes in place, get-or-default appends on a miss.
//  - Invariant: iter() == model after every step; len() == model.len().
//  - Operations: insert, remove, get_or_insert_default, value overwrite via
//    get_mut.
//
// Property 2: load-factor bounds.
//  - After any insert: len <= 2 * bucket_count.
//  - After any remove with buckets left: 2 * bucket_count <= 3 * len.
//  - Empty map: bucket_count == 0.
//
// Property 3: round trip and erase correctness.
//  - insert(k, v) into a map without k then find(k) yields (k, v).
//  - remove(k) then find(k) is None and len drops by exactly one.
use chained_hashmap::ChainedHashMap;
use proptest::prelude::*;

// Property 1: insertion order with first-value-wins.
proptest! {
    #[test]
    fn prop_order_matches_model(ops in proptest::collection::vec((0u8..=3u8, 0u16..24u16, any::<i32>()), 1..200)) {
        let mut m: ChainedHashMap<u16, i32> = ChainedHashMap::new();
        let mut model: Vec<(u16, i32)> = Vec::new();

        for (op, k, v) in ops {
            let pos = model.iter().position(|&(mk, _)| mk == k);
            match op {
                // Insert: only unseen keys append.
                0 => {
                    let added = m.insert(k, v);
                    prop_assert_eq!(added, pos.is_none());
                    if pos.is_none() { model.push((k, v)); }
                }
                // Remove: deletes in place; the rest keep their order.
                1 => {
                    let got = m.remove(&k);
                    match pos {
                        Some(p) => prop_assert_eq!(got, Some(model.remove(p).1)),
                        None => prop_assert_eq!(got, None),
                    }
                }
                // Index-style access inserts a default on a miss.
                2 => {
                    let got = *m.get_or_insert_default(k);
                    match pos {
                        Some(p) => prop_assert_eq!(got, model[p].1),
                        None => { prop_assert_eq!(got, 0); model.push((k, 0)); }
                    }
                }
                // Overwrite through get_mut; position does not change.
                3 => {
                    if let Some(slot) = m.get_mut(&k) { *slot = v; }
                    if let Some(p) = pos { model[p].1 = v; }
                }
                _ => unreachable!(),
            }

            let seen: Vec<(u16, i32)> = m.iter().map(|(k, v)| (*k, *v)).collect();
            prop_assert_eq!(&seen, &model);
            prop_assert_eq!(m.len(), model.len());
        }
    }
}

// Property 2: load-factor bounds after every mutation.
proptest! {
    #[test]
    fn prop_load_factor_bounds(ops in proptest::collection::vec((any::<bool>(), 0u32..64u32), 1..300)) {
        let mut m: ChainedHashMap<u32, ()> = ChainedHashMap::new();
        for (insert, k) in ops {
            if insert {
                m.insert(k, ());
                prop_assert!(m.len() <= m.bucket_count() * 2,
                    "after insert: len {} buckets {}", m.len(), m.bucket_count());
            } else {
                m.remove(&k);
                if m.bucket_count() > 0 {
                    prop_assert!(m.bucket_count() * 2 <= m.len() * 3,
                        "after remove: len {} buckets {}", m.len(), m.bucket_count());
                }
            }
            if m.is_empty() {
                prop_assert_eq!(m.bucket_count(), 0);
            }
        }
    }
}

// Property 3: round trip and erase correctness on arbitrary string keys.
proptest! {
    #[test]
    fn prop_round_trip_and_erase(
        seed in proptest::collection::vec(("[a-c]{0,3}", any::<u8>()), 0..30),
        key in "[a-c]{0,3}",
        val in any::<u8>(),
    ) {
        let mut m: ChainedHashMap<String, u8> = seed.into_iter().collect();
        m.remove(key.as_str());
        let before = m.len();

        prop_assert!(m.insert(key.clone(), val));
        let h = m.find(key.as_str()).expect("just inserted");
        prop_assert_eq!(h.key(&m), Some(&key));
        prop_assert_eq!(h.value(&m), Some(&val));
        prop_assert_eq!(m.len(), before + 1);
        prop_assert_eq!(m.iter().last(), Some((&key, &val)));

        prop_assert_eq!(m.remove(key.as_str()), Some(val));
        prop_assert!(m.find(key.as_str()).is_none());
        prop_assert_eq!(m.len(), before);
        prop_assert!(h.value(&m).is_none());
    }
}
