//! chained-hashmap: a separately-chained hash map that remembers insertion
//! order and hands out stable handles to its entries.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep ownership, indexing, and resizing in separate pieces so
//!   each has a small contract that can be checked on its own.
//! - Layers:
//!   - OrderedStore<K, V>: owns every entry in a generational slot map,
//!     linked in insertion order. Appends and removals are O(1) and never
//!     move other entries, so `Handle`s stay valid.
//!   - BucketIndex: `bucket_count` chains of handles. It owns nothing; the
//!     chain for an entry is `hash % bucket_count` at full `u64` width.
//!   - Rehash policy: after an insert, grow when `buckets * 2 < len`; after
//!     a removal, shrink when `buckets * 2 > len * 3`. Both rebuild the
//!     index to exactly `len` buckets by walking the store once.
//!   - ChainedHashMap<K, V, S>: public API over the three.
//!
//! Constraints
//! - Single-threaded: no internal synchronisation. The map is `Send` when
//!   its parts are and never `Sync`.
//! - Unique keys: inserting a present key is a no-op and keeps the old value.
//! - Iteration order is first-insertion order minus removed keys; a key
//!   removed and inserted again moves to the end.
//! - An empty map has zero buckets and answers lookups without hashing.
//!
//! Hasher and rehashing invariants
//! - Each entry stores its `u64` hash. Rebuilding the index uses the stored
//!   hash; `K: Hash` runs once per insert and once per lookup, never during
//!   a rehash.
//! - Bucket counts track the exact element count rather than a power of
//!   two, so rehashes are more frequent near the thresholds.
//!
//! Reentrancy
//! - Public entry points that may call `K: Hash`/`K: Eq` open a debug-only
//!   lookup guard. Re-entering the same map from those impls panics in debug
//!   builds.
//!
//! Notes and non-goals
//! - Keys are immutable after insertion; there is no `key_mut`.
//! - `get_or_insert_default` is the insert-on-miss accessor; `at` and
//!   `Index` never insert.
//! - Clones own fresh entries and build their own exact-fit index.

mod bucket_index;
mod chained_hash_map;
mod chained_hash_map_proptest;
mod error;
mod ordered_store;
mod reentrancy;
mod rehash;

// Public surface
pub use chained_hash_map::{ChainedHashMap, Keys, Values, ValuesMut};
pub use error::KeyNotFound;
pub use ordered_store::{Handle, IntoIter, Iter, IterMut};
