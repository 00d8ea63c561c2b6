//! # Least Frequently Used (LFU) Cache
//!
//! Evicts the entry with the fewest accesses. Among entries sharing the lowest
//! frequency, the one that reached that frequency earliest goes first.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                           LfuCache<K, V>                                 │
//! │                                                                          │
//! │   entries: FxHashMap<K, Entry<V>>         buckets: FxHashMap<u64, KeyList>│
//! │   ┌───────┬──────────────┬──────┐         ┌──────┬──────────────────────┐ │
//! │   │  Key  │ value        │ freq │         │ freq │ keys (oldest first)  │ │
//! │   ├───────┼──────────────┼──────┤         ├──────┼──────────────────────┤ │
//! │   │   A   │ content A    │  1   │  ────►  │  1   │ [B] ◄─► [A]          │ │◄─ min_freq
//! │   │   B   │ content B    │  1   │         │  3   │ [C]                  │ │
//! │   │   C   │ content C    │  3   │         └──────┴──────────────────────┘ │
//! │   └───────┴──────────────┴──────┘                                        │
//! │                                                                          │
//! │   Victim: front of buckets[min_freq]  (B above)                          │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! ```text
//!   hit(A), freq f = 1
//!     1. remove A from bucket 1
//!     2. bucket 1 empty and min_freq == 1? → drop bucket, min_freq = 2
//!     3. freq = 2, push A to back of bucket 2
//!
//!   miss(D), cache full
//!     1. loader(D) succeeds
//!     2. pop front of bucket[min_freq], drop bucket if empty
//!     3. insert D with freq 1 into bucket 1, min_freq = 1
//! ```
//!
//! Buckets are created on first use and dropped as soon as they empty, so the
//! bucket map never holds an empty list and `min_freq` always names a live
//! bucket while the cache is non-empty.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tracing::{debug, error, trace};

use crate::ds::KeyList;
use crate::error::{CacheError, InvariantError};
use crate::metrics::{
    CacheMetricsSnapshot, CoreMetricsRecorder, MetricsSnapshotProvider, RequestMetrics,
};
use crate::traits::{CoreCache, Lookup};

#[derive(Debug)]
struct Entry<V> {
    value: V,
    freq: u64,
}

/// Read-through cache that evicts the least frequently used entry.
///
/// # Example
///
/// ```
/// use std::convert::Infallible;
/// use std::time::Duration;
/// use cachelab::policy::lfu::LfuCache;
/// use cachelab::traits::CoreCache;
///
/// let mut cache = LfuCache::try_new(3).unwrap();
/// let load = |k: &u32| Ok::<_, Infallible>((*k, Duration::ZERO));
/// for id in [1, 2, 3, 1, 1, 4] {
///     cache.get(id, load).unwrap();
/// }
/// assert_eq!(cache.frequency(&1), Some(3));
/// assert!(!cache.contains(&2));
/// ```
pub struct LfuCache<K, V>
where
    K: Clone + Eq + Hash,
{
    entries: FxHashMap<K, Entry<V>>,
    /// Frequency level to keys at that level, oldest first.
    buckets: FxHashMap<u64, KeyList<K>>,
    /// Lowest frequency present; 0 only when empty.
    min_freq: u64,
    capacity: usize,
    metrics: RequestMetrics,
}

impl<K, V> LfuCache<K, V>
where
    K: Clone + Eq + Hash,
{
    pub fn new(capacity: NonZeroUsize) -> Self {
        let capacity = capacity.get();
        Self {
            entries: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            buckets: FxHashMap::default(),
            min_freq: 0,
            capacity,
            metrics: RequestMetrics::new(),
        }
    }

    pub fn try_new(capacity: usize) -> Result<Self, CacheError> {
        NonZeroUsize::new(capacity)
            .map(Self::new)
            .ok_or(CacheError::InvalidCapacity(capacity))
    }

    /// Access count of a live key (1 after the load, +1 per hit).
    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.entries.get(key).map(|e| e.freq)
    }

    /// Lowest frequency among live keys, `None` when empty.
    pub fn min_frequency(&self) -> Option<u64> {
        (!self.entries.is_empty()).then_some(self.min_freq)
    }

    /// The entry the next eviction would remove.
    pub fn peek_lfu(&self) -> Option<(&K, &V)> {
        let key = self.buckets.get(&self.min_freq)?.front()?;
        self.entries.get(key).map(|e| (key, &e.value))
    }

    /// Keys at one frequency level, oldest first.
    pub fn bucket(&self, freq: u64) -> impl Iterator<Item = &K> {
        self.buckets.get(&freq).into_iter().flat_map(KeyList::iter)
    }

    fn touch(&mut self, key: &K) {
        let Some(entry) = self.entries.get_mut(key) else {
            return;
        };
        let freq = entry.freq;
        entry.freq += 1;

        if let Some(bucket) = self.buckets.get_mut(&freq) {
            bucket.remove(key);
            if bucket.is_empty() {
                self.buckets.remove(&freq);
                if self.min_freq == freq {
                    self.min_freq = freq + 1;
                }
            }
        }
        self.buckets
            .entry(freq + 1)
            .or_default()
            .push_back(key.clone());
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.entries.len() > self.capacity {
            return Err(InvariantError::new("lfu exceeds capacity"));
        }
        if self.entries.is_empty() {
            if !self.buckets.is_empty() {
                return Err(InvariantError::new("empty lfu still has buckets"));
            }
            return Ok(());
        }
        if !self.buckets.contains_key(&self.min_freq) {
            return Err(InvariantError::new(format!(
                "min_freq {} has no bucket",
                self.min_freq
            )));
        }

        let mut seen = 0usize;
        for (&freq, bucket) in &self.buckets {
            bucket.check_invariants()?;
            if bucket.is_empty() {
                return Err(InvariantError::new(format!("bucket {freq} is empty")));
            }
            if freq < self.min_freq {
                return Err(InvariantError::new(format!(
                    "bucket {freq} is below min_freq {}",
                    self.min_freq
                )));
            }
            for key in bucket {
                match self.entries.get(key) {
                    Some(entry) if entry.freq == freq => seen += 1,
                    Some(entry) => {
                        return Err(InvariantError::new(format!(
                            "key with freq {} filed under bucket {freq}",
                            entry.freq
                        )));
                    },
                    None => return Err(InvariantError::new("bucket references a dead key")),
                }
            }
        }
        if seen != self.entries.len() {
            return Err(InvariantError::new(format!(
                "buckets hold {seen} keys but {} are live",
                self.entries.len()
            )));
        }
        Ok(())
    }

    #[cfg(test)]
    fn debug_validate_invariants(&self) {
        if let Err(err) = self.check_invariants() {
            panic!("{err}");
        }
    }
}

impl<K, V> CoreCache<K, V> for LfuCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn get<F, E>(&mut self, key: K, loader: F) -> Result<Lookup<'_, V>, CacheError<E>>
    where
        F: FnOnce(&K) -> Result<(V, Duration), E>,
    {
        let start = Instant::now();

        if self.entries.contains_key(&key) {
            self.touch(&key);
            let elapsed = start.elapsed();
            self.metrics.record_hit(elapsed);
            trace!(policy = "lfu", min_freq = self.min_freq, "hit");
            let entry = self.entries.get(&key).expect("lfu entry present");
            return Ok(Lookup::hit(&entry.value, elapsed));
        }

        let (value, load_time) = match loader(&key) {
            Ok(loaded) => loaded,
            Err(err) => {
                self.metrics.record_failed_load();
                return Err(CacheError::Loader(err));
            },
        };

        if self.is_full() && self.evict().is_none() {
            error!(policy = "lfu", min_freq = self.min_freq, "full cache had nothing to evict");
            return Err(CacheError::EmptyEvictionTarget("lfu min-frequency bucket"));
        }

        self.buckets.entry(1).or_default().push_back(key.clone());
        self.min_freq = 1;
        let elapsed = start.elapsed();
        self.metrics.record_miss(elapsed);
        trace!(policy = "lfu", ?load_time, "miss");
        let entry = self.entries.entry(key).or_insert(Entry { value, freq: 1 });
        Ok(Lookup::miss(&entry.value, elapsed))
    }

    fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|e| &e.value)
    }

    fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.buckets.clear();
        self.min_freq = 0;
        self.metrics.record_clear();
    }

    fn metrics(&self) -> CacheMetricsSnapshot {
        self.snapshot()
    }

    fn evict(&mut self) -> Option<K> {
        let freq = self.min_freq;
        let bucket = self.buckets.get_mut(&freq)?;
        let victim = bucket.pop_front()?;
        if bucket.is_empty() {
            self.buckets.remove(&freq);
            // A miss resets the floor to 1 right after; a bare evict must rescan.
            self.min_freq = self.buckets.keys().copied().min().unwrap_or(0);
        }
        self.entries.remove(&victim);
        self.metrics.record_eviction();
        debug!(policy = "lfu", freq, len = self.entries.len(), "evicted least frequently used entry");
        Some(victim)
    }

    fn policy_name(&self) -> &'static str {
        "LFU"
    }
}

impl<K, V> MetricsSnapshotProvider<CacheMetricsSnapshot> for LfuCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn snapshot(&self) -> CacheMetricsSnapshot {
        self.metrics.snapshot(self.capacity, self.entries.len())
    }
}

impl<K, V> std::fmt::Debug for LfuCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LfuCache")
            .field("capacity", &self.capacity)
            .field("len", &self.entries.len())
            .field("min_freq", &self.min_freq)
            .field("buckets", &self.buckets.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn load(k: &u32) -> Result<(String, Duration), Infallible> {
        Ok((format!("text {k}"), Duration::ZERO))
    }

    fn run(cache: &mut LfuCache<u32, String>, ids: &[u32]) -> Vec<bool> {
        ids.iter()
            .map(|&id| cache.get(id, load).unwrap().hit)
            .collect()
    }

    fn live(cache: &LfuCache<u32, String>) -> Vec<u32> {
        let mut keys: Vec<u32> = cache.entries.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    // Basic LFU Behavior Tests
    mod basic_behavior {
        use super::*;

        #[test]
        fn test_frequency_starts_at_one_and_counts_hits() {
            let mut cache = LfuCache::try_new(3).unwrap();
            run(&mut cache, &[1, 2, 1, 1]);
            assert_eq!(cache.frequency(&1), Some(3));
            assert_eq!(cache.frequency(&2), Some(1));
            assert_eq!(cache.frequency(&9), None);
            assert_eq!(cache.min_frequency(), Some(1));
            cache.debug_validate_invariants();
        }

        #[test]
        fn test_scenario_evicts_least_frequent() {
            let mut cache = LfuCache::try_new(3).unwrap();
            let hits = run(&mut cache, &[1, 2, 3, 1, 1, 4]);

            assert_eq!(hits, vec![false, false, false, true, true, false]);
            assert_eq!(cache.frequency(&1), Some(3));
            assert_eq!(live(&cache), vec![1, 3, 4]);
            cache.debug_validate_invariants();
        }

        #[test]
        fn test_zero_capacity_rejected() {
            assert!(matches!(
                LfuCache::<u32, String>::try_new(0),
                Err(CacheError::InvalidCapacity(0))
            ));
        }
    }

    mod tie_breaking {
        use super::*;

        #[test]
        fn test_earliest_at_level_goes_first() {
            let mut cache = LfuCache::try_new(3).unwrap();
            // 2 reaches freq 2 before 1 does
            run(&mut cache, &[1, 2, 3, 2, 1, 3]);
            let level: Vec<u32> = cache.bucket(2).copied().collect();
            assert_eq!(level, vec![2, 1, 3]);

            run(&mut cache, &[4]);
            assert!(!cache.contains(&2));
            assert_eq!(live(&cache), vec![1, 3, 4]);
        }

        #[test]
        fn test_new_entry_is_next_victim_among_singles() {
            let mut cache = LfuCache::try_new(2).unwrap();
            run(&mut cache, &[1, 1, 2, 3]);
            // 2 and 3 both had freq 1; 2 was older
            assert_eq!(live(&cache), vec![1, 3]);
            assert_eq!(cache.peek_lfu().map(|(k, _)| *k), Some(3));
        }
    }

    mod buckets {
        use super::*;

        #[test]
        fn test_min_freq_advances_when_floor_empties() {
            let mut cache = LfuCache::try_new(2).unwrap();
            run(&mut cache, &[1, 2, 1, 2]);
            assert_eq!(cache.min_frequency(), Some(2));
            assert_eq!(cache.bucket(1).count(), 0);
            assert!(!cache.buckets.contains_key(&1));
            cache.debug_validate_invariants();
        }

        #[test]
        fn test_empty_buckets_are_pruned() {
            let mut cache = LfuCache::try_new(3).unwrap();
            run(&mut cache, &[1, 1, 1, 2, 2]);
            // 1 passed through levels 1 and 2, neither of which is left behind
            assert_eq!(cache.buckets.len(), 2);
            assert_eq!(cache.bucket(3).copied().collect::<Vec<_>>(), vec![1]);
            assert_eq!(cache.bucket(2).copied().collect::<Vec<_>>(), vec![2]);
            cache.debug_validate_invariants();
        }

        #[test]
        fn test_bare_evict_rescans_min_freq() {
            let mut cache = LfuCache::try_new(3).unwrap();
            run(&mut cache, &[1, 2, 2, 3, 3, 3]);
            assert_eq!(cache.evict(), Some(1));
            assert_eq!(cache.min_frequency(), Some(2));
            assert_eq!(cache.evict(), Some(2));
            assert_eq!(cache.min_frequency(), Some(3));
            assert_eq!(cache.evict(), Some(3));
            assert_eq!(cache.min_frequency(), None);
            assert_eq!(cache.evict(), None);
            cache.debug_validate_invariants();
        }
    }

    mod state {
        use super::*;

        #[test]
        fn test_failed_load_leaves_buckets_alone() {
            let mut cache = LfuCache::try_new(1).unwrap();
            run(&mut cache, &[1, 1]);
            let err = cache
                .get(2, |_: &u32| Err::<(String, Duration), _>("gone"))
                .unwrap_err();
            assert_eq!(err.to_string(), "loader failed: gone");
            assert_eq!(cache.frequency(&1), Some(2));
            assert_eq!(cache.metrics().evictions, 0);
            cache.debug_validate_invariants();
        }

        #[test]
        fn test_clear_twice_matches_clear_once() {
            let mut cache = LfuCache::try_new(2).unwrap();
            run(&mut cache, &[1, 1, 2, 3]);
            cache.clear();
            let once = cache.metrics();
            cache.clear();
            assert_eq!(cache.metrics(), once);
            assert_eq!(once.hits + once.misses + once.total_requests, 0);
            assert_eq!(cache.min_frequency(), None);
            cache.debug_validate_invariants();
        }
    }
}
