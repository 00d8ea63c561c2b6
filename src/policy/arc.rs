//! Adaptive Replacement Cache (ARC) read-through policy.
//!
//! Splits the live entries into a recency side (T1, seen once) and a
//! frequency side (T2, seen again), and remembers the keys it recently evicted
//! from each side in ghost lists (B1, B2). A miss that lands on a ghost tells
//! the cache which side it shrank too eagerly, and the target size `p` of T1
//! moves toward that side.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                           ArcCache<K, V> Layout                             │
//! │                                                                             │
//! │   values: FxHashMap<K, V>   (content for T1 ∪ T2 only)                      │
//! │                                                                             │
//! │   ┌─────────────────────────────────────────────────────────────────────┐   │
//! │   │                        List Organization                            │   │
//! │   │                                                                     │   │
//! │   │   T1 (recency, seen once)              T2 (frequency, seen again)   │   │
//! │   │   ┌─────────────────────────┐          ┌─────────────────────────┐  │   │
//! │   │   │ LRU               MRU   │          │ LRU               MRU   │  │   │
//! │   │   │ [a] ◄──► [b] ◄──► [c]   │          │ [x] ◄──► [y]            │  │   │
//! │   │   │  │                      │          │  │                      │  │   │
//! │   │   └──┼──────────────────────┘          └──┼──────────────────────┘  │   │
//! │   │      ▼ replace                            ▼ replace                 │   │
//! │   │   B1 (ghost keys, cap C)               B2 (ghost keys, cap C)       │   │
//! │   │   ┌─────────────────────────┐          ┌─────────────────────────┐  │   │
//! │   │   │ keys only, no content   │          │ keys only, no content   │  │   │
//! │   │   └─────────────────────────┘          └─────────────────────────┘  │   │
//! │   │                                                                     │   │
//! │   │   p ∈ [0, C]: target size of T1                                     │   │
//! │   └─────────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Request Classification
//!
//! ```text
//!   get(key, loader)
//!     │
//!     ├─ in T1 ─────► move to T2 MRU                              (hit)
//!     ├─ in T2 ─────► move to T2 MRU                              (hit)
//!     │
//!     │  not live: loader(key) first, then
//!     │
//!     ├─ in B1 ─────► p += max(1, |B2| / |B1|), capped at C
//!     │               drop ghost, make room, insert into T2       (miss)
//!     ├─ in B2 ─────► p -= max(1, |B1| / |B2|), floored at 0
//!     │               drop ghost, make room, insert into T2       (miss)
//!     └─ nowhere ───► make room, insert into T1                   (miss)
//! ```
//!
//! ## Making Room
//!
//! ```text
//!   if |T1| + |B1| >= C  or  |T1| + |T2| >= C:
//!     replace():
//!       if T1 non-empty and (|T1| > p or T2 empty):
//!         T1 LRU → B1
//!       else:
//!         T2 LRU → B2
//! ```
//!
//! The first condition is the recency-pressure trigger; the second keeps the
//! live set within capacity when T2 alone has grown to fill it. Ghost lists
//! drop their own oldest key once they hold `C` keys.
//!
//! ## Example Usage
//!
//! ```
//! use std::convert::Infallible;
//! use std::time::Duration;
//! use cachelab::policy::arc::ArcCache;
//! use cachelab::traits::CoreCache;
//!
//! let mut cache = ArcCache::try_new(4).unwrap();
//! let load = |k: &u32| Ok::<_, Infallible>((*k, Duration::ZERO));
//!
//! for id in [1, 2, 3, 4, 5, 6, 1] {
//!     cache.get(id, load).unwrap();
//! }
//! // 1 was a ghost in B1: the recency side earns one more slot
//! assert_eq!(cache.p_value(), 1);
//! assert!(cache.t2_keys().any(|k| *k == 1));
//! ```

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tracing::{debug, error, trace};

use crate::ds::{GhostList, KeyList};
use crate::error::{CacheError, InvariantError};
use crate::metrics::{
    CacheMetricsSnapshot, CoreMetricsRecorder, MetricsSnapshotProvider, RequestMetrics,
};
use crate::traits::{CoreCache, Lookup};

/// Where a non-live key was found before loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ghost {
    B1,
    B2,
    None,
}

/// Read-through Adaptive Replacement Cache.
///
/// `p` starts at 0, so a cold cache initially favors T2 once anything has
/// been promoted. Ghost hits are misses: the content has to be loaded again.
pub struct ArcCache<K, V>
where
    K: Clone + Eq + Hash,
{
    values: FxHashMap<K, V>,
    /// Seen once; front is the T1 LRU.
    t1: KeyList<K>,
    /// Seen at least twice; front is the T2 LRU.
    t2: KeyList<K>,
    /// Keys evicted from T1.
    b1: GhostList<K>,
    /// Keys evicted from T2.
    b2: GhostList<K>,
    /// Target size for T1.
    p: usize,
    capacity: usize,
    metrics: RequestMetrics,
}

impl<K, V> ArcCache<K, V>
where
    K: Clone + Eq + Hash,
{
    pub fn new(capacity: NonZeroUsize) -> Self {
        let capacity = capacity.get();
        Self {
            values: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            t1: KeyList::with_capacity(capacity),
            t2: KeyList::with_capacity(capacity),
            b1: GhostList::new(capacity),
            b2: GhostList::new(capacity),
            p: 0,
            capacity,
            metrics: RequestMetrics::new(),
        }
    }

    pub fn try_new(capacity: usize) -> Result<Self, CacheError> {
        NonZeroUsize::new(capacity)
            .map(Self::new)
            .ok_or(CacheError::InvalidCapacity(capacity))
    }

    /// Current target size for T1. Higher favors recency, lower favors
    /// frequency.
    pub fn p_value(&self) -> usize {
        self.p
    }

    pub fn t1_len(&self) -> usize {
        self.t1.len()
    }

    pub fn t2_len(&self) -> usize {
        self.t2.len()
    }

    pub fn b1_len(&self) -> usize {
        self.b1.len()
    }

    pub fn b2_len(&self) -> usize {
        self.b2.len()
    }

    /// T1 keys from LRU to MRU.
    pub fn t1_keys(&self) -> impl Iterator<Item = &K> {
        self.t1.iter()
    }

    /// T2 keys from LRU to MRU.
    pub fn t2_keys(&self) -> impl Iterator<Item = &K> {
        self.t2.iter()
    }

    /// B1 ghost keys, oldest first.
    pub fn b1_keys(&self) -> impl Iterator<Item = &K> {
        self.b1.iter()
    }

    /// B2 ghost keys, oldest first.
    pub fn b2_keys(&self) -> impl Iterator<Item = &K> {
        self.b2.iter()
    }

    fn classify(&self, key: &K) -> Ghost {
        if self.b1.contains(key) {
            Ghost::B1
        } else if self.b2.contains(key) {
            Ghost::B2
        } else {
            Ghost::None
        }
    }

    /// Moves `p` toward the side whose ghost was hit and forgets the ghost.
    fn adapt(&mut self, ghost: Ghost, key: &K) {
        match ghost {
            Ghost::B1 => {
                let delta = (self.b2.len() / self.b1.len()).max(1);
                self.p = (self.p + delta).min(self.capacity);
                self.b1.remove(key);
                debug!(policy = "arc", delta, p = self.p, "ghost hit in B1, favoring recency");
            },
            Ghost::B2 => {
                let delta = (self.b1.len() / self.b2.len()).max(1);
                self.p = self.p.saturating_sub(delta);
                self.b2.remove(key);
                debug!(policy = "arc", delta, p = self.p, "ghost hit in B2, favoring frequency");
            },
            Ghost::None => {},
        }
    }

    /// Recency pressure only forces a replacement while something is live;
    /// after explicit evictions B1 can be full with T1 and T2 both empty.
    fn needs_room(&self) -> bool {
        let live = self.t1.len() + self.t2.len();
        live >= self.capacity || (live > 0 && self.t1.len() + self.b1.len() >= self.capacity)
    }

    /// Evicts one live entry into its ghost list.
    fn replace(&mut self) -> Option<K> {
        let from_t1 = !self.t1.is_empty() && (self.t1.len() > self.p || self.t2.is_empty());
        let victim = if from_t1 {
            let victim = self.t1.pop_front()?;
            self.b1.record(victim.clone());
            victim
        } else {
            let victim = self.t2.pop_front()?;
            self.b2.record(victim.clone());
            victim
        };
        self.values.remove(&victim);
        self.metrics.record_eviction();
        debug!(
            policy = "arc",
            from = if from_t1 { "T1" } else { "T2" },
            p = self.p,
            t1 = self.t1.len(),
            t2 = self.t2.len(),
            "replaced live entry"
        );
        Some(victim)
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.t1.check_invariants()?;
        self.t2.check_invariants()?;
        self.b1.check_invariants()?;
        self.b2.check_invariants()?;

        let live = self.t1.len() + self.t2.len();
        if live > self.capacity {
            return Err(InvariantError::new(format!(
                "|T1| + |T2| = {live} exceeds capacity {}",
                self.capacity
            )));
        }
        if live != self.values.len() {
            return Err(InvariantError::new(format!(
                "lists hold {live} live keys but {} values are stored",
                self.values.len()
            )));
        }
        if self.p > self.capacity {
            return Err(InvariantError::new(format!(
                "p = {} outside [0, {}]",
                self.p, self.capacity
            )));
        }
        if self.b1.len() > self.capacity || self.b2.len() > self.capacity {
            return Err(InvariantError::new("ghost list exceeds capacity"));
        }
        for key in self.t1.iter() {
            if self.t2.contains(key) || self.b1.contains(key) || self.b2.contains(key) {
                return Err(InvariantError::new("T1 key appears in another list"));
            }
        }
        for key in self.t2.iter() {
            if self.b1.contains(key) || self.b2.contains(key) {
                return Err(InvariantError::new("T2 key appears in a ghost list"));
            }
        }
        if self.b1.iter().any(|k| self.b2.contains(k)) {
            return Err(InvariantError::new("key is a ghost in both B1 and B2"));
        }
        if self
            .t1
            .iter()
            .chain(self.t2.iter())
            .any(|k| !self.values.contains_key(k))
        {
            return Err(InvariantError::new("live key has no stored value"));
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

impl<K, V> CoreCache<K, V> for ArcCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn get<F, E>(&mut self, key: K, loader: F) -> Result<Lookup<'_, V>, CacheError<E>>
    where
        F: FnOnce(&K) -> Result<(V, Duration), E>,
    {
        let start = Instant::now();

        let promoted = self.t1.remove(&key);
        if promoted || self.t2.contains(&key) {
            if promoted {
                self.t2.push_back(key.clone());
            } else {
                self.t2.move_to_back(&key);
            }
            let elapsed = start.elapsed();
            self.metrics.record_hit(elapsed);
            trace!(policy = "arc", promoted, "hit");
            let value = self.values.get(&key).expect("arc entry present");
            return Ok(Lookup::hit(value, elapsed));
        }

        let ghost = self.classify(&key);

        let (value, load_time) = match loader(&key) {
            Ok(loaded) => loaded,
            Err(err) => {
                self.metrics.record_failed_load();
                return Err(CacheError::Loader(err));
            },
        };

        self.adapt(ghost, &key);

        if self.needs_room() && self.replace().is_none() {
            error!(policy = "arc", p = self.p, "replacement found both live lists empty");
            return Err(CacheError::EmptyEvictionTarget("arc T1/T2"));
        }

        if ghost == Ghost::None {
            self.t1.push_back(key.clone());
        } else {
            self.t2.push_back(key.clone());
        }
        let elapsed = start.elapsed();
        self.metrics.record_miss(elapsed);
        trace!(policy = "arc", ?ghost, ?load_time, "miss");
        let value = self.values.entry(key).or_insert(value);
        Ok(Lookup::miss(value, elapsed))
    }

    fn peek(&self, key: &K) -> Option<&V> {
        self.values.get(key)
    }

    fn contains(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        self.values.clear();
        self.t1.clear();
        self.t2.clear();
        self.b1.clear();
        self.b2.clear();
        self.p = 0;
        self.metrics.record_clear();
    }

    fn metrics(&self) -> CacheMetricsSnapshot {
        self.snapshot()
    }

    fn evict(&mut self) -> Option<K> {
        self.replace()
    }

    fn policy_name(&self) -> &'static str {
        "ARC"
    }
}

impl<K, V> MetricsSnapshotProvider<CacheMetricsSnapshot> for ArcCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn snapshot(&self) -> CacheMetricsSnapshot {
        self.metrics.snapshot(self.capacity, self.values.len())
    }
}

impl<K, V> std::fmt::Debug for ArcCache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArcCache")
            .field("capacity", &self.capacity)
            .field("p", &self.p)
            .field("t1", &self.t1.len())
            .field("t2", &self.t2.len())
            .field("b1", &self.b1.len())
            .field("b2", &self.b2.len())
            .finish()
    }
}
