//! Bounded recency list for ghost entries.
//!
//! Used by ARC to remember keys it recently evicted without keeping their
//! values. Implemented as a [`KeyList`] with a size cap.
//!
//! ## Architecture
//!
//! ```text
//!   KeyList<K>
//!   head ─► [A] ◄──► [B] ◄──► [C] ◄── tail
//!         oldest              newest
//!           ▲
//!           └── dropped first once len == capacity
//! ```
//!
//! ## Behavior
//! - `record(k)`: appends `k` as newest (or refreshes it), dropping the oldest
//!   key if the list is full
//! - `remove(k)`: forgets `k`
//! - `clear()`: forgets everything
//!
//! ## Performance
//! - `record` / `remove` / `contains`: O(1) average
use std::hash::Hash;

use crate::ds::key_list::KeyList;
use crate::error::InvariantError;

/// Bounded recency list of keys (no values), used for ARC ghost tracking.
#[derive(Debug, Clone)]
pub struct GhostList<K> {
    keys: KeyList<K>,
    capacity: usize,
}

impl<K> GhostList<K>
where
    K: Clone + Eq + Hash,
{
    /// Creates a new ghost list holding at most `capacity` keys.
    pub fn new(capacity: usize) -> Self {
        Self {
            keys: KeyList::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns `true` if `key` is tracked.
    pub fn contains(&self, key: &K) -> bool {
        self.keys.contains(key)
    }

    /// Records `key` as the newest ghost.
    ///
    /// Returns the oldest ghost if it had to be dropped to stay within
    /// capacity.
    pub fn record(&mut self, key: K) -> Option<K> {
        if self.capacity == 0 {
            return None;
        }
        if self.keys.move_to_back(&key) {
            return None;
        }
        let dropped = if self.keys.len() >= self.capacity {
            self.keys.pop_front()
        } else {
            None
        };
        self.keys.push_back(key);
        dropped
    }

    /// Forgets `key`; returns `true` if it was tracked.
    pub fn remove(&mut self, key: &K) -> bool {
        self.keys.remove(key)
    }

    /// Forgets all keys.
    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Iterates ghosts from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.keys.iter()
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.keys.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "ghost list holds {} keys, capacity {}",
                self.keys.len(),
                self.capacity
            )));
        }
        self.keys.check_invariants()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ghost_list_drops_oldest_when_full() {
        let mut ghost = GhostList::new(2);
        assert_eq!(ghost.record("a"), None);
        assert_eq!(ghost.record("b"), None);
        assert_eq!(ghost.record("c"), Some("a"));

        assert!(!ghost.contains(&"a"));
        assert!(ghost.contains(&"b"));
        assert!(ghost.contains(&"c"));
        assert_eq!(ghost.len(), 2);
    }

    #[test]
    fn ghost_list_zero_capacity_is_noop() {
        let mut ghost = GhostList::new(0);
        ghost.record("a");
        ghost.record("b");
        assert!(ghost.is_empty());
        assert!(!ghost.contains(&"a"));
    }

    #[test]
    fn ghost_list_record_existing_refreshes() {
        let mut ghost = GhostList::new(3);
        ghost.record("a");
        ghost.record("b");
        ghost.record("c");

        ghost.record("a");
        assert_eq!(ghost.record("d"), Some("b"));

        let order: Vec<_> = ghost.iter().copied().collect();
        assert_eq!(order, vec!["c", "a", "d"]);
    }

    #[test]
    fn ghost_list_remove_existing_and_missing() {
        let mut ghost = GhostList::new(2);
        ghost.record("a");
        ghost.record("b");
        assert!(ghost.remove(&"a"));
        assert!(!ghost.contains(&"a"));
        assert_eq!(ghost.len(), 1);

        assert!(!ghost.remove(&"missing"));
        assert_eq!(ghost.len(), 1);
        ghost.check_invariants().unwrap();
    }

    #[test]
    fn ghost_list_clear_resets_state() {
        let mut ghost = GhostList::new(2);
        ghost.record("a");
        ghost.record("b");
        ghost.clear();

        assert!(ghost.is_empty());
        assert_eq!(ghost.capacity(), 2);
        ghost.check_invariants().unwrap();
    }
}
