//! ChainedHashMap: public map joining the ordered store, the bucket index,
//! and the rehash policy.

use crate::bucket_index::BucketIndex;
use crate::error::KeyNotFound;
use crate::ordered_store::{Handle, IntoIter, Iter, IterMut, OrderedStore};
use crate::reentrancy::LookupTracker;
use crate::rehash::{self, Trigger};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::ops::Index;
use std::collections::hash_map::RandomState;

/// Hash map with separate chaining that iterates in insertion order.
///
/// Entries are owned by an ordered store; buckets only hold [`Handle`]s into
/// it, so rehashing never moves an entry. Inserting a key that is already
/// present leaves the stored value untouched. Removing a key and inserting it
/// again places it at the end of the order.
pub struct ChainedHashMap<K, V, S = RandomState> {
    hasher: S,
    store: OrderedStore<K, V>,
    index: BucketIndex,
    lookup: LookupTracker,
}

impl Handle {
    pub fn key<'a, K, V, S>(&self, map: &'a ChainedHashMap<K, V, S>) -> Option<&'a K> {
        map.store.key(*self)
    }

    pub fn value<'a, K, V, S>(&self, map: &'a ChainedHashMap<K, V, S>) -> Option<&'a V> {
        map.store.get(*self).map(|(_, v)| v)
    }

    pub fn value_mut<'a, K, V, S>(
        &self,
        map: &'a mut ChainedHashMap<K, V, S>,
    ) -> Option<&'a mut V> {
        map.store.get_mut(*self).map(|(_, v)| v)
    }
}

impl<K, V> ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<K, V, S> Default for ChainedHashMap<K, V, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> ChainedHashMap<K, V, S> {
    /// Empty map hashing keys with `hasher`. No buckets are allocated until
    /// the first insert.
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            store: OrderedStore::new(),
            index: BucketIndex::new(),
            lookup: LookupTracker::new(),
        }
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }
    pub fn is_empty(&self) -> bool {
        self.store.len() == 0
    }

    /// Current number of chains. Zero while the map is empty.
    pub fn bucket_count(&self) -> usize {
        self.index.bucket_count()
    }

    /// `len / bucket_count`, or `0.0` with no buckets.
    pub fn load_factor(&self) -> f64 {
        match self.bucket_count() {
            0 => 0.0,
            n => self.len() as f64 / n as f64,
        }
    }

    /// Drop every entry and release all buckets.
    pub fn clear(&mut self) {
        tracing::trace!(len = self.len(), buckets = self.bucket_count(), "clearing map");
        self.index.clear();
        self.store.clear();
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        self.store.first().and_then(|h| self.store.get(h))
    }

    pub fn last(&self) -> Option<(&K, &V)> {
        self.store.last().and_then(|h| self.store.get(h))
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        self.store.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        self.store.iter_mut()
    }

    /// Iterate from the entry behind `handle` to the end of the order.
    /// Yields nothing for a stale handle.
    pub fn iter_from(&self, handle: Handle) -> Iter<'_, K, V> {
        self.store.iter_from(handle)
    }

    pub fn iter_mut_from(&mut self, handle: Handle) -> IterMut<'_, K, V> {
        self.store.iter_mut_from(handle)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { it: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { it: self.iter() }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut { it: self.iter_mut() }
    }
}

impl<K, V, S> ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    // Callers hold the lookup guard.
    fn locate<Q>(&self, q: &Q) -> Option<(u64, Handle)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.index.bucket_count() == 0 {
            return None;
        }
        let hash = self.make_hash(q);
        self.index
            .lookup(hash, |h| {
                self.store
                    .key(h)
                    .map(|k| k.borrow() == q)
                    .unwrap_or(false)
            })
            .map(|h| (hash, h))
    }

    /// Handle of the entry for `q`, if present. Never mutates.
    pub fn find<Q>(&self, q: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.lookup.begin();
        self.locate(q).map(|(_, h)| h)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(q).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let h = self.find(q)?;
        self.store.get(h)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let h = self.find(q)?;
        self.store.get_mut(h).map(|(_, v)| v)
    }

    /// Get-or-fail: the value for `q`, or [`KeyNotFound`]. Never mutates.
    pub fn at<Q>(&self, q: &Q) -> Result<&V, KeyNotFound>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(q).ok_or(KeyNotFound)
    }

    /// Insert `key -> value` unless `key` is already present, in which case
    /// the map is left unchanged. Returns whether an entry was added.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.insert_full(key, value).1
    }

    /// Like [`insert`](Self::insert) but also returns the handle of the
    /// entry now stored under `key` (new or pre-existing).
    pub fn insert_full(&mut self, key: K, value: V) -> (Handle, bool) {
        self.insert_inner(key, || value)
    }

    /// Get-or-default-insert: a mutable reference to the value for `key`.
    ///
    /// Side effect: on a miss this inserts `V::default()` at the end of the
    /// order, so `len()` grows even though the call reads like an accessor.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Like [`get_or_insert_default`](Self::get_or_insert_default); `default`
    /// runs only when `key` is absent.
    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let (h, _) = self.insert_inner(key, default);
        self.store.value_mut_live(h)
    }

    fn insert_inner<F>(&mut self, key: K, default: F) -> (Handle, bool)
    where
        F: FnOnce() -> V,
    {
        let _g = self.lookup.begin();
        let hash = self.make_hash(&key);
        if let Some(h) = self.index.lookup(hash, |h| {
            self.store.key(h).map(|k| *k == key).unwrap_or(false)
        }) {
            return (h, false);
        }
        let handle = self.store.append(key, default(), hash);
        if !rehash::evaluate(Trigger::Grow, &mut self.index, &self.store) {
            self.index.insert_reference(hash, handle);
        }
        (handle, true)
    }

    /// Remove the entry for `q`, returning its value. No-op when absent.
    pub fn remove<Q>(&mut self, q: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.lookup.begin();
        let (hash, handle) = self.locate(q)?;
        Self::unlink(&mut self.index, &mut self.store, hash, handle)
    }

    /// Remove the entry behind `handle`. A stale handle is a no-op.
    pub fn remove_handle(&mut self, handle: Handle) -> Option<(K, V)> {
        let _g = self.lookup.begin();
        let hash = self.store.hash_of(handle)?;
        Self::unlink(&mut self.index, &mut self.store, hash, handle)
    }

    // Takes fields rather than `&mut self` so the caller's lookup guard can
    // stay open.
    fn unlink(
        index: &mut BucketIndex,
        store: &mut OrderedStore<K, V>,
        hash: u64,
        handle: Handle,
    ) -> Option<(K, V)> {
        let removed = index.remove_reference(hash, handle);
        debug_assert!(removed, "live entry missing from its chain");
        let entry = store.remove(handle)?;
        rehash::evaluate(Trigger::Shrink, index, store);
        Some(entry)
    }

    /// Check that every entry sits in exactly the chain its hash selects.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let n = self.bucket_count();
        let total: usize = (0..n).map(|b| self.index.chain(b).len()).sum();
        assert_eq!(total, self.len(), "chain references != live entries");
        for (hash, h) in self.store.hashed() {
            assert_eq!(self.store.key(h).map(|k| self.make_hash(k)), Some(hash));
            let b = self.index.bucket_of(hash).expect("non-empty map has buckets");
            assert_eq!(self.index.chain(b).iter().filter(|&&x| x == h).count(), 1);
        }
    }
}

impl<K, V, S> Clone for ChainedHashMap<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    /// Fresh entries in the same order, with an index sized to this copy.
    fn clone(&self) -> Self {
        let store = self.store.duplicate();
        let mut index = BucketIndex::new();
        rehash::evaluate(Trigger::Copy, &mut index, &store);
        Self {
            hasher: self.hasher.clone(),
            store,
            index,
            lookup: LookupTracker::new(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.clear();
        self.hasher.clone_from(&source.hasher);
        self.store = source.store.duplicate();
        rehash::evaluate(Trigger::Copy, &mut self.index, &self.store);
    }
}

impl<K, V, S> fmt::Debug for ChainedHashMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Equal when both maps hold the same keys with equal values; order is
/// not compared.
impl<K, V, S> PartialEq for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).map(|ov| v == ov).unwrap_or(false))
    }
}

impl<K, V, S> Eq for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

/// Panics if `key` is absent. Use [`ChainedHashMap::at`] for a `Result`.
impl<K, Q, V, S> Index<&Q> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not found in ChainedHashMap")
    }
}

/// Keeps the first value seen for each key.
impl<K, V, S> Extend<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    fn from(arr: [(K, V); N]) -> Self {
        arr.into_iter().collect()
    }
}

impl<K, V, S> IntoIterator for ChainedHashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.store)
    }
}

impl<'a, K, V, S> IntoIterator for &'a ChainedHashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut ChainedHashMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// Keys in insertion order.
pub struct Keys<'a, K, V> {
    it: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(k, _)| k)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// Values in insertion order.
pub struct Values<'a, K, V> {
    it: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, v)| v)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

pub struct ValuesMut<'a, K, V> {
    it: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, v)| v)
    }
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}
