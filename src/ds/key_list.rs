//! Ordered set of keys with O(1) reordering.
//!
//! `KeyList` is the ordering primitive behind every policy in this crate:
//! FIFO-like queues, LRU recency lists, LFU frequency buckets and the four ARC
//! partitions are all a `KeyList` plus a value map.
//!
//! ## Architecture
//!
//! ```text
//!   index: FxHashMap<K, usize>        slots: Vec<Slot<K>>
//!   ┌─────────┬───────┐               ┌─────┬──────────────────────┐
//!   │  key 7  │   0   │──────────────►│  0  │ key 7, prev -, next 2│ ◄── head (oldest)
//!   │  key 3  │   2   │──────────────►│  2  │ key 3, prev 0, next 1│
//!   │  key 9  │   1   │──────────────►│  1  │ key 9, prev 2, next -│ ◄── tail (newest)
//!   └─────────┴───────┘               └─────┴──────────────────────┘
//!                                      free: [slots vacated by remove/pop]
//! ```
//!
//! Slots are linked by index rather than pointer, so the list is entirely
//! safe code. Vacated slots go on a free list and are reused by the next push.
//!
//! ## Operations
//!
//! | Operation      | Time | Notes                                  |
//! |----------------|------|----------------------------------------|
//! | `push_back`    | O(1) | No-op (returns `false`) if present     |
//! | `pop_front`    | O(1) | Removes the oldest key                 |
//! | `move_to_back` | O(1) | Marks a key as newest                  |
//! | `remove`       | O(1) | Arbitrary removal by key               |
//! | `contains`     | O(1) | Index lookup                           |
//! | `iter`         | O(n) | Front (oldest) to back (newest)        |

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::error::InvariantError;

#[derive(Debug, Clone)]
struct Slot<K> {
    key: Option<K>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Insertion-ordered key set supporting O(1) removal and move-to-back.
#[derive(Debug, Clone)]
pub struct KeyList<K> {
    slots: Vec<Slot<K>>,
    free: Vec<usize>,
    index: FxHashMap<K, usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl<K> Default for KeyList<K>
where
    K: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> KeyList<K>
where
    K: Clone + Eq + Hash,
{
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty list with room for `capacity` keys before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            head: None,
            tail: None,
        }
    }

    /// Number of keys in the list.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if the list holds no keys.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns `true` if `key` is in the list.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Oldest key, the next one [`pop_front`](Self::pop_front) returns.
    pub fn front(&self) -> Option<&K> {
        self.head.and_then(|idx| self.slots[idx].key.as_ref())
    }

    /// Newest key.
    pub fn back(&self) -> Option<&K> {
        self.tail.and_then(|idx| self.slots[idx].key.as_ref())
    }

    /// Appends `key` as the newest entry.
    ///
    /// Returns `false` and leaves the order untouched if `key` is already
    /// present.
    pub fn push_back(&mut self, key: K) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        let idx = self.allocate(key.clone());
        self.link_back(idx);
        self.index.insert(key, idx);
        true
    }

    /// Removes and returns the oldest key.
    pub fn pop_front(&mut self) -> Option<K> {
        let idx = self.head?;
        self.unlink(idx);
        let key = self.release(idx);
        self.index.remove(&key);
        Some(key)
    }

    /// Moves `key` to the back (newest position). Returns `false` if absent.
    pub fn move_to_back(&mut self, key: &K) -> bool {
        let Some(&idx) = self.index.get(key) else {
            return false;
        };
        if self.tail != Some(idx) {
            self.unlink(idx);
            self.link_back(idx);
        }
        true
    }

    /// Removes `key`. Returns `false` if it was not present.
    pub fn remove(&mut self, key: &K) -> bool {
        let Some(idx) = self.index.remove(key) else {
            return false;
        };
        self.unlink(idx);
        self.release(idx);
        true
    }

    /// Removes every key, keeping allocated storage.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }

    /// Iterates keys from oldest to newest.
    pub fn iter(&self) -> Iter<'_, K> {
        Iter {
            list: self,
            cursor: self.head,
            remaining: self.len(),
        }
    }

    /// Zero-based position of `key` counted from the front, or `None`.
    ///
    /// O(n); intended for diagnostics and tests.
    pub fn position(&self, key: &K) -> Option<usize> {
        self.iter().position(|k| k == key)
    }

    fn allocate(&mut self, key: K) -> usize {
        let slot = Slot {
            key: Some(key),
            prev: None,
            next: None,
        };
        if let Some(idx) = self.free.pop() {
            self.slots[idx] = slot;
            idx
        } else {
            self.slots.push(slot);
            self.slots.len() - 1
        }
    }

    fn release(&mut self, idx: usize) -> K {
        let slot = &mut self.slots[idx];
        slot.prev = None;
        slot.next = None;
        self.free.push(idx);
        slot.key.take().expect("linked slot holds a key")
    }

    fn link_back(&mut self, idx: usize) {
        self.slots[idx].prev = self.tail;
        self.slots[idx].next = None;
        match self.tail {
            Some(tail) => self.slots[tail].next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let prev = self.slots[idx].prev;
        let next = self.slots[idx].next;
        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.tail = prev,
        }
        self.slots[idx].prev = None;
        self.slots[idx].next = None;
    }

    /// Walks the links and checks them against the index.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let mut walked = 0usize;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(idx) = cursor {
            let slot = &self.slots[idx];
            let key = slot
                .key
                .as_ref()
                .ok_or_else(|| InvariantError::new(format!("linked slot {idx} has no key")))?;
            if self.index.get(key) != Some(&idx) {
                return Err(InvariantError::new(format!(
                    "slot {idx} is linked but not indexed at that slot"
                )));
            }
            if slot.prev != prev {
                return Err(InvariantError::new(format!("slot {idx} has a stale prev link")));
            }
            walked += 1;
            if walked > self.index.len() {
                return Err(InvariantError::new("cycle in key list"));
            }
            prev = Some(idx);
            cursor = slot.next;
        }
        if prev != self.tail {
            return Err(InvariantError::new("tail does not match last linked slot"));
        }
        if walked != self.index.len() {
            return Err(InvariantError::new(format!(
                "walked {walked} slots but index holds {}",
                self.index.len()
            )));
        }
        Ok(())
    }
}

/// Front-to-back iterator over a [`KeyList`].
pub struct Iter<'a, K> {
    list: &'a KeyList<K>,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        let slot = &self.list.slots[idx];
        self.cursor = slot.next;
        self.remaining = self.remaining.saturating_sub(1);
        slot.key.as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K> IntoIterator for &'a KeyList<K>
where
    K: Clone + Eq + Hash,
{
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(list: &KeyList<u32>) -> Vec<u32> {
        list.iter().copied().collect()
    }

    #[test]
    fn push_pop_preserves_insertion_order() {
        let mut list = KeyList::new();
        assert!(list.push_back(1));
        assert!(list.push_back(2));
        assert!(list.push_back(3));
        assert_eq!(keys(&list), vec![1, 2, 3]);
        assert_eq!(list.front(), Some(&1));
        assert_eq!(list.back(), Some(&3));

        assert_eq!(list.pop_front(), Some(1));
        assert_eq!(list.pop_front(), Some(2));
        assert_eq!(list.pop_front(), Some(3));
        assert_eq!(list.pop_front(), None);
        assert!(list.is_empty());
    }

    #[test]
    fn push_existing_is_rejected() {
        let mut list = KeyList::new();
        list.push_back(1);
        list.push_back(2);
        assert!(!list.push_back(1));
        assert_eq!(keys(&list), vec![1, 2]);
    }

    #[test]
    fn move_to_back_reorders() {
        let mut list = KeyList::new();
        for k in 1..=4 {
            list.push_back(k);
        }
        assert!(list.move_to_back(&1));
        assert!(list.move_to_back(&3));
        assert!(list.move_to_back(&3));
        assert!(!list.move_to_back(&99));
        assert_eq!(keys(&list), vec![2, 4, 1, 3]);
        list.check_invariants().unwrap();
    }

    #[test]
    fn remove_from_middle_and_ends() {
        let mut list = KeyList::new();
        for k in 1..=5 {
            list.push_back(k);
        }
        assert!(list.remove(&3));
        assert!(list.remove(&1));
        assert!(list.remove(&5));
        assert!(!list.remove(&5));
        assert_eq!(keys(&list), vec![2, 4]);
        assert_eq!(list.position(&4), Some(1));
        list.check_invariants().unwrap();
    }

    #[test]
    fn vacated_slots_are_reused() {
        let mut list = KeyList::new();
        for k in 0..8 {
            list.push_back(k);
        }
        for _ in 0..8 {
            list.pop_front();
        }
        for k in 10..18 {
            list.push_back(k);
        }
        assert_eq!(list.slots.len(), 8);
        assert_eq!(keys(&list), (10..18).collect::<Vec<_>>());
        list.check_invariants().unwrap();
    }

    #[test]
    fn clear_resets_everything() {
        let mut list = KeyList::new();
        list.push_back("a");
        list.push_back("b");
        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.front(), None);
        assert_eq!(list.iter().count(), 0);
        list.check_invariants().unwrap();
    }
}
