//! OrderedStore: owning backing store that fixes the iteration order.
//!
//! Entries live in a generational `SlotMap` and are threaded into a doubly
//! linked list through `prev`/`next` keys. Slots never move, so a `Handle`
//! stays valid until its own entry is removed, whatever the bucket index
//! does in the meantime.

use core::iter::FusedIterator;
use slotmap::{DefaultKey, SecondaryMap, SlotMap};

/// Stable, copyable reference to one entry of a `ChainedHashMap`.
///
/// A handle survives rehashing and the removal of other entries. Once its
/// entry is removed the handle resolves to `None`, even if the slot is later
/// reused (generational keys).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    pub(crate) fn new(k: DefaultKey) -> Self {
        Handle(k)
    }
    pub(crate) fn raw_handle(&self) -> DefaultKey {
        self.0
    }
}

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    // Cached so the bucket index can be rebuilt without calling `K: Hash`.
    hash: u64,
    prev: Option<DefaultKey>,
    next: Option<DefaultKey>,
}

pub(crate) struct OrderedStore<K, V> {
    slots: SlotMap<DefaultKey, Node<K, V>>,
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
}

impl<K, V> OrderedStore<K, V> {
    pub(crate) fn new() -> Self {
        Self::with_capacity(0)
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: SlotMap::with_capacity_and_key(capacity),
            head: None,
            tail: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Link a new entry after the current tail.
    pub(crate) fn append(&mut self, key: K, value: V, hash: u64) -> Handle {
        let prev = self.tail;
        let k = self.slots.insert(Node {
            key,
            value,
            hash,
            prev,
            next: None,
        });
        match prev {
            Some(p) => self.slots[p].next = Some(k),
            None => self.head = Some(k),
        }
        self.tail = Some(k);
        Handle::new(k)
    }

    /// Unlink and return the entry behind `handle`. Other handles are unaffected.
    pub(crate) fn remove(&mut self, handle: Handle) -> Option<(K, V)> {
        let node = self.slots.remove(handle.raw_handle())?;
        match node.prev {
            Some(p) => self.slots[p].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => self.slots[n].prev = node.prev,
            None => self.tail = node.prev,
        }
        Some((node.key, node.value))
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.head = None;
        self.tail = None;
    }

    pub(crate) fn get(&self, handle: Handle) -> Option<(&K, &V)> {
        self.slots
            .get(handle.raw_handle())
            .map(|n| (&n.key, &n.value))
    }

    pub(crate) fn get_mut(&mut self, handle: Handle) -> Option<(&K, &mut V)> {
        self.slots
            .get_mut(handle.raw_handle())
            .map(|n| (&n.key, &mut n.value))
    }

    pub(crate) fn key(&self, handle: Handle) -> Option<&K> {
        self.slots.get(handle.raw_handle()).map(|n| &n.key)
    }

    pub(crate) fn hash_of(&self, handle: Handle) -> Option<u64> {
        self.slots.get(handle.raw_handle()).map(|n| n.hash)
    }

    pub(crate) fn first(&self) -> Option<Handle> {
        self.head.map(Handle::new)
    }

    pub(crate) fn last(&self) -> Option<Handle> {
        self.tail.map(Handle::new)
    }

    fn nodes(&self) -> impl Iterator<Item = (DefaultKey, &Node<K, V>)> + '_ {
        let mut cursor = self.head;
        core::iter::from_fn(move || {
            let k = cursor?;
            let node = &self.slots[k];
            cursor = node.next;
            Some((k, node))
        })
    }

    /// `(cached hash, handle)` for every entry, in list order.
    pub(crate) fn hashed(&self) -> impl Iterator<Item = (u64, Handle)> + '_ {
        self.nodes().map(|(k, n)| (n.hash, Handle::new(k)))
    }

    /// Fresh store with cloned entries in the same relative order.
    pub(crate) fn duplicate(&self) -> Self
    where
        K: Clone,
        V: Clone,
    {
        let mut copy = Self::with_capacity(self.len());
        for (_, n) in self.nodes() {
            copy.append(n.key.clone(), n.value.clone(), n.hash);
        }
        copy
    }

    /// Mutable access to a value whose handle is known to be live.
    pub(crate) fn value_mut_live(&mut self, handle: Handle) -> &mut V {
        debug_assert!(self.slots.contains_key(handle.raw_handle()));
        &mut self.slots[handle.raw_handle()].value
    }

    fn live_key(&self, handle: Handle) -> Option<DefaultKey> {
        let k = handle.raw_handle();
        self.slots.contains_key(k).then_some(k)
    }

    // Entries from `start` to the tail.
    fn count_from(&self, start: Option<DefaultKey>) -> usize {
        let mut n = 0;
        let mut cursor = start;
        while let Some(k) = cursor {
            n += 1;
            cursor = self.slots[k].next;
        }
        n
    }

    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            next: self.head,
            remaining: self.len(),
        }
    }

    /// Iterate from `handle` to the end. A stale handle yields nothing.
    /// Counts the tail up front so the length is exact.
    pub(crate) fn iter_from(&self, handle: Handle) -> Iter<'_, K, V> {
        let start = self.live_key(handle);
        Iter {
            slots: &self.slots,
            next: start,
            remaining: self.count_from(start),
        }
    }

    pub(crate) fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let (start, remaining) = (self.head, self.len());
        self.iter_mut_at(start, remaining)
    }

    pub(crate) fn iter_mut_from(&mut self, handle: Handle) -> IterMut<'_, K, V> {
        let start = self.live_key(handle);
        let remaining = self.count_from(start);
        self.iter_mut_at(start, remaining)
    }

    // Split every node into disjoint borrows up front, then hand them out in
    // list order.
    fn iter_mut_at(
        &mut self,
        start: Option<DefaultKey>,
        remaining: usize,
    ) -> IterMut<'_, K, V> {
        let mut nodes = SecondaryMap::with_capacity(self.slots.capacity());
        for (k, n) in self.slots.iter_mut() {
            nodes.insert(k, (&n.key, &mut n.value, n.next));
        }
        IterMut {
            nodes,
            next: start,
            remaining,
        }
    }
}

/// Iterator over `(&K, &V)` in insertion order.
pub struct Iter<'a, K, V> {
    slots: &'a SlotMap<DefaultKey, Node<K, V>>,
    next: Option<DefaultKey>,
    remaining: usize,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter { ..*self }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.slots.get(self.next?)?;
        self.next = node.next;
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

type MutNode<'a, K, V> = (&'a K, &'a mut V, Option<DefaultKey>);

/// Iterator over `(&K, &mut V)` in insertion order.
pub struct IterMut<'a, K, V> {
    nodes: SecondaryMap<DefaultKey, MutNode<'a, K, V>>,
    next: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (key, value, next) = self.nodes.remove(self.next?)?;
        self.next = next;
        self.remaining -= 1;
        Some((key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Owning iterator over `(K, V)` in insertion order.
pub struct IntoIter<K, V> {
    store: OrderedStore<K, V>,
}

impl<K, V> IntoIter<K, V> {
    pub(crate) fn new(store: OrderedStore<K, V>) -> Self {
        Self { store }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let h = self.store.first()?;
        self.store.remove(h)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.store.len(), Some(self.store.len()))
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let h = self.store.last()?;
        self.store.remove(h)
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}
