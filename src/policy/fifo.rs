//! FIFO (First In, First Out) read-through cache.
//!
//! Evicts the entry that was loaded earliest. Hits never change the eviction
//! order, so the victim depends only on the sequence of misses.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                        FifoCache<K, V> Layout                               │
//! │                                                                             │
//! │   map: FxHashMap<K, V>              order: VecDeque<K>                      │
//! │   ┌──────────┬──────┐               ┌─────────────────────────┐             │
//! │   │   Key    │Value │               │ front             back  │             │
//! │   ├──────────┼──────┤               ├─────────────────────────┤             │
//! │   │    1     │  t1  │               │  [1]  [2]  [3]          │             │
//! │   │    2     │  t2  │               │   ↑               ↑     │             │
//! │   │    3     │  t3  │               │ EVICT           newest  │             │
//! │   └──────────┴──────┘               └─────────────────────────┘             │
//! │                                                                             │
//! │   Invariant: order.len() == map.len(), every key appears once in each       │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```
//! use std::convert::Infallible;
//! use std::time::Duration;
//! use cachelab::policy::fifo::FifoCache;
//! use cachelab::traits::CoreCache;
//!
//! let mut cache = FifoCache::try_new(3).unwrap();
//! let load = |k: &u32| Ok::<_, Infallible>((k * 10, Duration::ZERO));
//!
//! for id in [1, 2, 3, 1, 4] {
//!     cache.get(id, load).unwrap();
//! }
//! // The hit on 1 did not save it: it was still the oldest insertion.
//! let order: Vec<_> = cache.insertion_order().copied().collect();
//! assert_eq!(order, vec![2, 3, 4]);
//! ```

use std::collections::VecDeque;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tracing::{debug, error, trace};

use crate::error::{CacheError, InvariantError};
use crate::metrics::{
    CacheMetricsSnapshot, CoreMetricsRecorder, MetricsSnapshotProvider, RequestMetrics,
};
use crate::traits::{CoreCache, Lookup};

/// Read-through cache that evicts in insertion order.
pub struct FifoCache<K, V>
where
    K: Clone + Eq + Hash,
{
    map: FxHashMap<K, V>,
    /// Keys in load order; front is the next victim.
    order: VecDeque<K>,
    capacity: usize,
    metrics: RequestMetrics,
}

impl<K, V> FifoCache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// Creates a FIFO cache holding at most `capacity` entries.
    pub fn new(capacity: NonZeroUsize) -> Self {
        let capacity = capacity.get();
        Self {
            map: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            order: VecDeque::with_capacity(capacity),
            capacity,
            metrics: RequestMetrics::new(),
        }
    }

    /// Like [`new`](Self::new), rejecting a zero capacity at runtime.
    pub fn try_new(capacity: usize) -> Result<Self, CacheError> {
        NonZeroUsize::new(capacity)
            .map(Self::new)
            .ok_or(CacheError::InvalidCapacity(capacity))
    }

    /// Keys from oldest (next victim) to newest.
    pub fn insertion_order(&self) -> impl Iterator<Item = &K> {
        self.order.iter()
    }

    /// The entry that the next eviction would remove.
    pub fn peek_oldest(&self) -> Option<(&K, &V)> {
        let key = self.order.front()?;
        self.map.get(key).map(|v| (key, v))
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.order.len() != self.map.len() {
            return Err(InvariantError::new(format!(
                "order holds {} keys but map holds {}",
                self.order.len(),
                self.map.len()
            )));
        }
        if self.map.len() > self.capacity {
            return Err(InvariantError::new("fifo exceeds capacity"));
        }
        if self.order.iter().any(|k| !self.map.contains_key(k)) {
            return Err(InvariantError::new("order references a key with no value"));
        }
        Ok(())
    }
}

impl<K, V> CoreCache<K, V> for FifoCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn get<F, E>(&mut self, key: K, loader: F) -> Result<Lookup<'_, V>, CacheError<E>>
    where
        F: FnOnce(&K) -> Result<(V, Duration), E>,
    {
        let start = Instant::now();

        if self.map.contains_key(&key) {
            let elapsed = start.elapsed();
            self.metrics.record_hit(elapsed);
            trace!(policy = "fifo", "hit");
            let value = self.map.get(&key).expect("fifo entry present");
            return Ok(Lookup::hit(value, elapsed));
        }

        let (value, load_time) = match loader(&key) {
            Ok(loaded) => loaded,
            Err(err) => {
                self.metrics.record_failed_load();
                return Err(CacheError::Loader(err));
            },
        };

        if self.is_full() && self.evict().is_none() {
            error!(policy = "fifo", len = self.map.len(), "full cache had nothing to evict");
            return Err(CacheError::EmptyEvictionTarget("fifo order"));
        }

        self.order.push_back(key.clone());
        let elapsed = start.elapsed();
        self.metrics.record_miss(elapsed);
        trace!(policy = "fifo", ?load_time, "miss");
        let value = self.map.entry(key).or_insert(value);
        Ok(Lookup::miss(value, elapsed))
    }

    fn peek(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
        self.metrics.record_clear();
    }

    fn metrics(&self) -> CacheMetricsSnapshot {
        self.snapshot()
    }

    fn evict(&mut self) -> Option<K> {
        let victim = self.order.pop_front()?;
        self.map.remove(&victim);
        self.metrics.record_eviction();
        debug!(policy = "fifo", len = self.map.len(), "evicted oldest entry");
        Some(victim)
    }

    fn policy_name(&self) -> &'static str {
        "FIFO"
    }
}

impl<K, V> MetricsSnapshotProvider<CacheMetricsSnapshot> for FifoCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn snapshot(&self) -> CacheMetricsSnapshot {
        self.metrics.snapshot(self.capacity, self.map.len())
    }
}

impl<K, V> std::fmt::Debug for FifoCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FifoCache")
            .field("capacity", &self.capacity)
            .field("len", &self.map.len())
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

    fn run(cache: &mut FifoCache<u32, String>, ids: &[u32]) -> Vec<bool> {
        ids.iter()
            .map(|&id| cache.get(id, load).unwrap().hit)
            .collect()
    }

    fn order(cache: &FifoCache<u32, String>) -> Vec<u32> {
        cache.insertion_order().copied().collect()
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = FifoCache::<u32, String>::try_new(0).unwrap_err();
        assert!(matches!(err, CacheError::InvalidCapacity(0)));
    }

    #[test]
    fn scenario_hit_does_not_change_order() {
        let mut cache = FifoCache::try_new(3).unwrap();
        let hits = run(&mut cache, &[1, 2, 3, 1, 4]);

        assert_eq!(hits, vec![false, false, false, true, false]);
        assert_eq!(order(&cache), vec![2, 3, 4]);
        assert!(!cache.contains(&1));
        cache.check_invariants().unwrap();
    }

    #[test]
    fn returns_loaded_content() {
        let mut cache = FifoCache::try_new(2).unwrap();
        let lookup = cache.get(9, load).unwrap();
        assert_eq!(lookup.value, "text 9");
        assert!(!lookup.hit);
        assert_eq!(cache.peek(&9).map(String::as_str), Some("text 9"));
    }

    #[test]
    fn evict_returns_oldest_key() {
        let mut cache = FifoCache::try_new(3).unwrap();
        run(&mut cache, &[5, 6, 7, 5, 5]);
        assert_eq!(cache.peek_oldest().map(|(k, _)| *k), Some(5));
        assert_eq!(cache.evict(), Some(5));
        assert_eq!(cache.evict(), Some(6));
        assert_eq!(cache.evict(), Some(7));
        assert_eq!(cache.evict(), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn loader_failure_leaves_cache_untouched() {
        let mut cache = FifoCache::try_new(2).unwrap();
        run(&mut cache, &[1, 2]);

        let err = cache
            .get(3, |_: &u32| Err::<(String, Duration), _>("disk on fire"))
            .unwrap_err();
        assert!(matches!(err, CacheError::Loader("disk on fire")));
        assert_eq!(order(&cache), vec![1, 2]);
        assert_eq!(cache.metrics().misses, 3);
        assert_eq!(cache.metrics().evictions, 0);
    }

    #[test]
    fn metrics_track_hits_and_misses() {
        let mut cache = FifoCache::try_new(3).unwrap();
        run(&mut cache, &[1, 2, 1, 1]);
        let m = cache.metrics();
        assert_eq!(m.total_requests, 4);
        assert_eq!(m.hits, 2);
        assert_eq!(m.misses, 2);
        assert_eq!(m.hit_rate, 0.5);
        assert_eq!(m.size, 2);
        assert_eq!(m.capacity, 3);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut cache = FifoCache::try_new(2).unwrap();
        run(&mut cache, &[1, 2, 3]);
        cache.clear();
        let once = cache.metrics();
        cache.clear();
        assert_eq!(cache.metrics(), once);
        assert_eq!(once.total_requests, 0);
        assert_eq!(once.hits, 0);
        assert!(cache.is_empty());
        assert_eq!(order(&cache), Vec::<u32>::new());
    }
}
