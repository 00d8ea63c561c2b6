//! # Least Recently Used (LRU) Cache
//!
//! Evicts the entry whose last access is oldest. Every hit moves the key to
//! the most-recent end of the recency list; misses enter there too.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────────┐
//!   │                           LruCache<K, V>                                 │
//!   │                                                                          │
//!   │   ┌──────────────────────────────┐   ┌────────────────────────────────┐  │
//!   │   │  map: FxHashMap<K, V>        │   │  recency: KeyList<K>           │  │
//!   │   │                              │   │                                │  │
//!   │   │  ┌───────┬────────────────┐  │   │  front ──► [C] ◄─► [A] ◄─► [B] │  │
//!   │   │  │  Key  │ Value          │  │   │   (LRU)                 (MRU)  │  │
//!   │   │  ├───────┼────────────────┤  │   │                                │  │
//!   │   │  │   A   │ content A      │  │   │  O(1) move_to_back / pop_front │  │
//!   │   │  │   B   │ content B      │  │   │                                │  │
//!   │   │  │   C   │ content C      │  │   └────────────────────────────────┘  │
//!   │   │  └───────┴────────────────┘  │                                       │
//!   │   └──────────────────────────────┘                                       │
//!   └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## LRU Operations Flow
//!
//! ```text
//!   GET existing item (hit)
//!   ═══════════════════════════════════════════════════════════════════════════
//!
//!   Before:   front ──► [C] ◄──► [A] ◄──► [B]
//!   get(A):   move [A] to back
//!   After:    front ──► [C] ◄──► [B] ◄──► [A]
//!
//!   GET missing item (cache full)
//!   ═══════════════════════════════════════════════════════════════════════════
//!
//!   Before:   front ──► [C] ◄──► [B] ◄──► [A]     (capacity = 3)
//!   get(D):   1. loader(D) succeeds
//!             2. evict [C] from front
//!             3. push [D] to back
//!   After:    front ──► [B] ◄──► [A] ◄──► [D]
//! ```
//!
//! ## Performance
//!
//! | Operation | Time | Notes                          |
//! |-----------|------|--------------------------------|
//! | hit       | O(1) | hash lookup + list relink      |
//! | miss      | O(1) | plus loader cost               |
//! | evict     | O(1) | pop list front + map remove    |
//! | peek      | O(1) | no recency update              |

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

/// Read-through cache that evicts the least recently used entry.
///
/// # Example
///
/// ```
/// use std::convert::Infallible;
/// use std::time::Duration;
/// use cachelab::policy::lru::LruCache;
/// use cachelab::traits::CoreCache;
///
/// let mut cache = LruCache::try_new(3).unwrap();
/// let load = |k: &u32| Ok::<_, Infallible>((*k, Duration::ZERO));
/// for id in [1, 2, 3, 1, 4] {
///     cache.get(id, load).unwrap();
/// }
/// let order: Vec<_> = cache.recency_order().copied().collect();
/// assert_eq!(order, vec![3, 1, 4]);
/// ```
pub struct LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    map: FxHashMap<K, V>,
    /// Front is least recently used, back is most recently used.
    recency: KeyList<K>,
    capacity: usize,
    metrics: RequestMetrics,
}

impl<K, V> LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    pub fn new(capacity: NonZeroUsize) -> Self {
        let capacity = capacity.get();
        Self {
            map: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            recency: KeyList::with_capacity(capacity),
            capacity,
            metrics: RequestMetrics::new(),
        }
    }

    pub fn try_new(capacity: usize) -> Result<Self, CacheError> {
        NonZeroUsize::new(capacity)
            .map(Self::new)
            .ok_or(CacheError::InvalidCapacity(capacity))
    }

    /// Keys from least to most recently used.
    pub fn recency_order(&self) -> impl Iterator<Item = &K> {
        self.recency.iter()
    }

    /// The entry the next eviction would remove.
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        let key = self.recency.front()?;
        self.map.get(key).map(|v| (key, v))
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.recency.check_invariants()?;
        if self.recency.len() != self.map.len() {
            return Err(InvariantError::new(format!(
                "recency list holds {} keys but map holds {}",
                self.recency.len(),
                self.map.len()
            )));
        }
        if self.map.len() > self.capacity {
            return Err(InvariantError::new("lru exceeds capacity"));
        }
        if self.recency.iter().any(|k| !self.map.contains_key(k)) {
            return Err(InvariantError::new("recency list references a key with no value"));
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

impl<K, V> CoreCache<K, V> for LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn get<F, E>(&mut self, key: K, loader: F) -> Result<Lookup<'_, V>, CacheError<E>>
    where
        F: FnOnce(&K) -> Result<(V, Duration), E>,
    {
        let start = Instant::now();

        if self.recency.move_to_back(&key) {
            let elapsed = start.elapsed();
            self.metrics.record_hit(elapsed);
            trace!(policy = "lru", "hit");
            let value = self.map.get(&key).expect("lru entry present");
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
            error!(policy = "lru", len = self.map.len(), "full cache had nothing to evict");
            return Err(CacheError::EmptyEvictionTarget("lru recency list"));
        }

        self.recency.push_back(key.clone());
        let elapsed = start.elapsed();
        self.metrics.record_miss(elapsed);
        trace!(policy = "lru", ?load_time, "miss");
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
        self.recency.clear();
        self.metrics.record_clear();
    }

    fn metrics(&self) -> CacheMetricsSnapshot {
        self.snapshot()
    }

    fn evict(&mut self) -> Option<K> {
        let victim = self.recency.pop_front()?;
        self.map.remove(&victim);
        self.metrics.record_eviction();
        debug!(policy = "lru", len = self.map.len(), "evicted least recently used entry");
        Some(victim)
    }

    fn policy_name(&self) -> &'static str {
        "LRU"
    }
}

impl<K, V> MetricsSnapshotProvider<CacheMetricsSnapshot> for LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn snapshot(&self) -> CacheMetricsSnapshot {
        self.metrics.snapshot(self.capacity, self.map.len())
    }
}

impl<K, V> std::fmt::Debug for LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruCache")
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

    fn run(cache: &mut LruCache<u32, String>, ids: &[u32]) -> Vec<bool> {
        ids.iter()
            .map(|&id| cache.get(id, load).unwrap().hit)
            .collect()
    }

    fn order(cache: &LruCache<u32, String>) -> Vec<u32> {
        cache.recency_order().copied().collect()
    }

    mod basic_behavior {
        use super::*;

        #[test]
        fn test_zero_capacity_rejected() {
            assert!(matches!(
                LruCache::<u32, String>::try_new(0),
                Err(CacheError::InvalidCapacity(0))
            ));
        }

        #[test]
        fn test_hit_refreshes_recency() {
            let mut cache = LruCache::try_new(3).unwrap();
            let hits = run(&mut cache, &[1, 2, 3, 1, 4]);

            assert_eq!(hits, vec![false, false, false, true, false]);
            // 2 was least recent once 1 was touched
            assert!(!cache.contains(&2));
            assert_eq!(order(&cache), vec![3, 1, 4]);
            cache.debug_validate_invariants();
        }

        #[test]
        fn test_single_slot_cache() {
            let mut cache = LruCache::try_new(1).unwrap();
            let hits = run(&mut cache, &[1, 1, 2, 1]);
            assert_eq!(hits, vec![false, true, false, false]);
            assert_eq!(order(&cache), vec![1]);
            assert_eq!(cache.metrics().evictions, 2);
        }

        #[test]
        fn test_peek_does_not_touch_recency() {
            let mut cache = LruCache::try_new(2).unwrap();
            run(&mut cache, &[1, 2]);
            assert_eq!(cache.peek(&1).map(String::as_str), Some("text 1"));
            assert_eq!(cache.peek_lru().map(|(k, _)| *k), Some(1));
            run(&mut cache, &[3]);
            assert!(!cache.contains(&1));
        }
    }

    mod eviction {
        use super::*;

        #[test]
        fn test_evict_follows_recency() {
            let mut cache = LruCache::try_new(3).unwrap();
            run(&mut cache, &[1, 2, 3, 2, 1]);
            assert_eq!(cache.evict(), Some(3));
            assert_eq!(cache.evict(), Some(2));
            assert_eq!(cache.evict(), Some(1));
            assert_eq!(cache.evict(), None);
            assert_eq!(cache.metrics().evictions, 3);
        }

        #[test]
        fn test_failed_load_does_not_evict() {
            let mut cache = LruCache::try_new(2).unwrap();
            run(&mut cache, &[1, 2]);

            let err = cache
                .get(3, |_: &u32| Err::<(String, Duration), _>(7u8))
                .unwrap_err();
            assert_eq!(err.into_loader_error(), Some(7));
            assert_eq!(order(&cache), vec![1, 2]);

            let m = cache.metrics();
            assert_eq!(m.total_requests, 3);
            assert_eq!(m.misses, 3);
            assert_eq!(m.evictions, 0);
            cache.debug_validate_invariants();
        }
    }

    mod state {
        use super::*;

        #[test]
        fn test_clear_resets_everything() {
            let mut cache = LruCache::try_new(2).unwrap();
            run(&mut cache, &[1, 2, 1, 3]);
            cache.clear();
            assert!(cache.is_empty());
            assert_eq!(cache.metrics(), CacheMetricsSnapshot {
                capacity: 2,
                ..Default::default()
            });
            // works normally afterwards
            assert_eq!(run(&mut cache, &[1, 1]), vec![false, true]);
        }

        #[test]
        fn test_never_exceeds_capacity() {
            let mut cache = LruCache::try_new(4).unwrap();
            for id in 0..200u32 {
                cache.get(id % 11, load).unwrap();
                assert!(cache.len() <= 4);
            }
            cache.debug_validate_invariants();
        }
    }
}
