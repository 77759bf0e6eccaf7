use thiserror::Error;

/// Returned by [`ChainedHashMap::at`](crate::ChainedHashMap::at) when the
/// key has no entry. Every other lookup reports absence with `Option`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Error)]
#[error("key not found")]
pub struct KeyNotFound;
