//! Rehash policy: when to rebuild the bucket index, and to what size.
//!
//! The target is always the exact element count, never a power of two or a
//! prime. Triggers are checked once per mutation:
//! - grow (after insert): `buckets * 2 < len`
//! - shrink (after remove): `buckets * 2 > len * 3`

use crate::bucket_index::BucketIndex;
use crate::ordered_store::OrderedStore;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Trigger {
    Grow,
    Shrink,
    /// A freshly copied store always gets an index sized to itself.
    Copy,
}

impl Trigger {
    /// New bucket count if this trigger fires, otherwise `None`.
    pub(crate) fn target(self, bucket_count: usize, len: usize) -> Option<usize> {
        let fires = match self {
            Trigger::Grow => bucket_count.saturating_mul(2) < len,
            Trigger::Shrink => bucket_count.saturating_mul(2) > len.saturating_mul(3),
            Trigger::Copy => true,
        };
        fires.then_some(len)
    }
}

/// Evaluate `trigger` against the current sizes and rebuild `index` from
/// `store` if it fires. Returns whether a rebuild happened.
pub(crate) fn evaluate<K, V>(
    trigger: Trigger,
    index: &mut BucketIndex,
    store: &OrderedStore<K, V>,
) -> bool {
    let from = index.bucket_count();
    let Some(to) = trigger.target(from, store.len()) else {
        return false;
    };
    tracing::trace!(?trigger, from, to, len = store.len(), "rebuilding bucket index");
    index.rebuild(to, store.hashed());
    true
}
