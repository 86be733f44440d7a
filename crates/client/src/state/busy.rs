//! Per-item in-flight markers.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};

/// Set of item keys with a mutation in flight.
///
/// At most one mutation per key runs at a time; different keys never wait
/// on each other.
#[derive(Debug)]
pub(crate) struct BusySet<K> {
    keys: Mutex<HashSet<K>>,
}

impl<K: Copy + Eq + Hash> BusySet<K> {
    pub(crate) fn new() -> Self {
        Self {
            keys: Mutex::new(HashSet::new()),
        }
    }

    /// Mark `key` busy until the returned guard drops.
    ///
    /// Returns `None` if `key` is already busy.
    pub(crate) fn try_acquire(&self, key: K) -> Option<BusyGuard<'_, K>> {
        let inserted = self
            .keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key);
        inserted.then(|| BusyGuard { set: self, key })
    }

    pub(crate) fn contains(&self, key: K) -> bool {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&key)
    }
}

/// Clears its key from the [`BusySet`] on drop, including when the owning
/// future is cancelled.
#[derive(Debug)]
pub(crate) struct BusyGuard<'a, K: Copy + Eq + Hash> {
    set: &'a BusySet<K>,
    key: K,
}

impl<K: Copy + Eq + Hash> Drop for BusyGuard<'_, K> {
    fn drop(&mut self) {
        self.set
            .keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_refused() {
        let busy = BusySet::new();
        let guard = busy.try_acquire(1);
        assert!(guard.is_some());
        assert!(busy.try_acquire(1).is_none());
        assert!(busy.contains(1));
    }

    #[test]
    fn test_refused_acquire_keeps_holder_marked() {
        let busy = BusySet::new();
        let _held = busy.try_acquire(3).unwrap();
        drop(busy.try_acquire(3));
        assert!(busy.contains(3));
        assert!(busy.try_acquire(3).is_none());
    }

    #[test]
    fn test_other_keys_are_independent() {
        let busy = BusySet::new();
        let _first = busy.try_acquire(1);
        assert!(busy.try_acquire(2).is_some());
    }

    #[test]
    fn test_drop_releases() {
        let busy = BusySet::new();
        drop(busy.try_acquire(7));
        assert!(!busy.contains(7));
        assert!(busy.try_acquire(7).is_some());
    }
}
