//! Debug-only lookup guard.
//!
//! `K: Hash` and `K: Eq` run while a chain is being walked. If either one
//! reaches back into the same map (through a raw pointer or a cell) it
//! could observe a chain mid-edit. Debug builds panic on that nesting;
//! release builds keep only a zero-sized marker.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-map lookup tracker. Public entry points open a section with
/// `let _g = self.lookup.begin();`.
#[derive(Debug)]
pub(crate) struct LookupTracker {
    #[cfg(debug_assertions)]
    active: Cell<bool>,
    // Same auto traits in every build: `Send`, never `Sync`.
    _unsync: PhantomData<Cell<()>>,
}

impl LookupTracker {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(false),
            _unsync: PhantomData,
        }
    }

    /// Open a lookup section. In debug builds, panics if one is already open.
    #[inline]
    pub(crate) fn begin(&self) -> LookupGuard<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.active.replace(true),
                "reentrancy detected: map accessed from inside K: Hash or K: Eq"
            );
            LookupGuard { tracker: self }
        }

        #[cfg(not(debug_assertions))]
        {
            LookupGuard { _z: PhantomData }
        }
    }
}

impl Default for LookupTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Closes the section on drop.
pub(crate) struct LookupGuard<'a> {
    #[cfg(debug_assertions)]
    tracker: &'a LookupTracker,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl Drop for LookupGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.tracker.active.get());
            self.tracker.active.set(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LookupTracker;

    #[test]
    fn sequential_sections_are_ok() {
        let t = LookupTracker::new();
        drop(t.begin());
        let _g = t.begin();
    }

    #[cfg(debug_assertions)]
    #[test]
    fn nested_section_panics_in_debug() {
        let t = LookupTracker::new();
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _g1 = t.begin();
            let _g2 = t.begin();
        }));
        assert!(res.is_err(), "expected nested lookup to panic in debug builds");
    }

    #[cfg(not(debug_assertions))]
    #[test]
    fn nested_section_is_noop_in_release() {
        let t = LookupTracker::new();
        let _g1 = t.begin();
        let _g2 = t.begin();
    }
}
