//! BucketIndex: separate chains of non-owning handles into the store.

use crate::ordered_store::Handle;

#[derive(Debug, Default)]
pub(crate) struct BucketIndex {
    chains: Vec<Vec<Handle>>,
}

impl BucketIndex {
    pub(crate) fn new() -> Self {
        Self { chains: Vec::new() }
    }

    pub(crate) fn bucket_count(&self) -> usize {
        self.chains.len()
    }

    /// Reduce the full 64-bit hash modulo the bucket count. `None` when
    /// there are no buckets, so a zero modulus is never computed.
    #[inline]
    pub(crate) fn bucket_of(&self, hash: u64) -> Option<usize> {
        match self.chains.len() {
            0 => None,
            n => Some((hash % n as u64) as usize),
        }
    }

    /// First handle in `hash`'s chain accepted by `eq`.
    pub(crate) fn lookup<F>(&self, hash: u64, mut eq: F) -> Option<Handle>
    where
        F: FnMut(Handle) -> bool,
    {
        let b = self.bucket_of(hash)?;
        self.chains[b].iter().copied().find(|&h| eq(h))
    }

    pub(crate) fn insert_reference(&mut self, hash: u64, handle: Handle) {
        let b = self.bucket_of(hash);
        debug_assert!(b.is_some(), "insert_reference into an empty index");
        if let Some(b) = b {
            self.chains[b].push(handle);
        }
    }

    /// Drop exactly one reference to `handle` from its chain. Returns false
    /// when the chain does not hold it.
    pub(crate) fn remove_reference(&mut self, hash: u64, handle: Handle) -> bool {
        let Some(b) = self.bucket_of(hash) else {
            return false;
        };
        let chain = &mut self.chains[b];
        match chain.iter().position(|&h| h == handle) {
            Some(pos) => {
                chain.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Discard every chain and re-place `entries` under `new_count` buckets.
    pub(crate) fn rebuild<I>(&mut self, new_count: usize, entries: I)
    where
        I: IntoIterator<Item = (u64, Handle)>,
    {
        self.chains = (0..new_count).map(|_| Vec::new()).collect();
        for (hash, handle) in entries {
            self.insert_reference(hash, handle);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.chains = Vec::new();
    }

    #[cfg(test)]
    pub(crate) fn chain(&self, bucket: usize) -> &[Handle] {
        &self.chains[bucket]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordered_store::OrderedStore;

    fn handles(n: usize) -> (OrderedStore<usize, ()>, Vec<Handle>) {
        let mut s = OrderedStore::new();
        let hs = (0..n).map(|i| s.append(i, (), i as u64)).collect();
        (s, hs)
    }

    #[test]
    fn empty_index_never_reduces() {
        let idx = BucketIndex::new();
        assert_eq!(idx.bucket_count(), 0);
        assert_eq!(idx.bucket_of(u64::MAX), None);
        assert!(idx.lookup(42, |_| true).is_none());
    }

    /// Hashes above `u32::MAX` are reduced at full width.
    #[test]
    fn bucket_of_uses_full_hash_width() {
        let (_s, hs) = handles(7);
        let mut idx = BucketIndex::new();
        idx.rebuild(7, hs.iter().map(|&h| (0, h)));
        let big = (1u64 << 40) + 3;
        assert_eq!(idx.bucket_of(big), Some((big % 7) as usize));
        assert_eq!(idx.bucket_of(u64::MAX), Some((u64::MAX % 7) as usize));
    }

    #[test]
    fn rebuild_places_each_handle_in_its_chain() {
        let (s, _) = handles(5);
        let mut idx = BucketIndex::new();
        idx.rebuild(3, s.hashed());
        assert_eq!(idx.bucket_count(), 3);
        let total: usize = (0..3).map(|b| idx.chain(b).len()).sum();
        assert_eq!(total, 5);
        for (hash, h) in s.hashed() {
            let b = idx.bucket_of(hash).unwrap();
            assert_eq!(idx.chain(b).iter().filter(|&&x| x == h).count(), 1);
        }
    }

    /// Removal takes out only the matching reference even when the whole
    /// chain shares one hash.
    #[test]
    fn remove_reference_is_exact() {
        let (_s, hs) = handles(3);
        let mut idx = BucketIndex::new();
        idx.rebuild(1, hs.iter().map(|&h| (0, h)));
        assert!(idx.remove_reference(0, hs[1]));
        assert_eq!(idx.chain(0), &[hs[0], hs[2]]);
        assert!(!idx.remove_reference(0, hs[1]), "second removal is a no-op");
        assert_eq!(idx.chain(0).len(), 2);
    }

    #[test]
    fn lookup_scans_chain_with_predicate() {
        let (_s, hs) = handles(4);
        let mut idx = BucketIndex::new();
        idx.rebuild(2, hs.iter().map(|&h| (0, h)));
        assert_eq!(idx.lookup(0, |h| h == hs[2]), Some(hs[2]));
        assert_eq!(idx.lookup(1, |h| h == hs[2]), None);
    }

    #[test]
    fn rebuild_to_zero_and_clear() {
        let (s, _) = handles(2);
        let mut idx = BucketIndex::new();
        idx.rebuild(2, s.hashed());
        idx.rebuild(0, core::iter::empty());
        assert_eq!(idx.bucket_count(), 0);
        idx.rebuild(2, s.hashed());
        idx.clear();
        assert_eq!(idx.bucket_count(), 0);
        assert!(!idx.remove_reference(0, s.first().unwrap()));
    }
}
