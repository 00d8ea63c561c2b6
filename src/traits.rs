//! # Cache Contract
//!
//! Every eviction policy in this crate implements [`CoreCache`], a read-through
//! contract: callers ask for a key and hand over a loader; the cache either
//! answers from memory or calls the loader, stores the result and answers
//! with that.
//!
//! ## Architecture
//!
//! ```text
//!                          ┌─────────────────────────────────────────┐
//!                          │            CoreCache<K, V>              │
//!                          │                                         │
//!                          │  get(&mut, K, loader) → Lookup<V>       │
//!                          │  peek(&, &K) → Option<&V>               │
//!                          │  contains(&, &K) → bool                 │
//!                          │  len / is_empty / is_full / capacity    │
//!                          │  clear(&mut)                            │
//!                          │  metrics(&) → CacheMetricsSnapshot      │
//!                          │  evict(&mut) → Option<K>                │
//!                          └──────────────────┬──────────────────────┘
//!                                             │
//!        ┌──────────────────┬─────────────────┼─────────────────┬──────────────────┐
//!        ▼                  ▼                                   ▼                  ▼
//!   ┌──────────┐      ┌──────────┐                        ┌──────────┐      ┌──────────┐
//!   │FifoCache │      │ LruCache │                        │ LfuCache │      │ ArcCache │
//!   │insertion │      │ recency  │                        │frequency │      │ adaptive │
//!   └──────────┘      └──────────┘                        └──────────┘      └──────────┘
//! ```
//!
//! ## Request Flow
//!
//! ```text
//!   get(key, loader)
//!     │
//!     ├── live entry? ──yes──► update policy state ──► Lookup { hit: true }
//!     │
//!     no
//!     │
//!     ├── loader(&key) ──Err──► CacheError::Loader (cache untouched)
//!     │
//!     ├── make room per policy (evict)
//!     │
//!     └── store value ──► Lookup { hit: false }
//! ```
//!
//! The loader runs before any eviction, so a failed load leaves the cache
//! exactly as it was. Policies are interchangeable; the
//! [`builder`](crate::builder) module picks one at runtime.
//!
//! ## Thread Safety
//!
//! Caches take `&mut self` for every request and are meant to be owned by one
//! caller. Wrap in a `Mutex` if sharing is ever needed.

use std::time::Duration;

use crate::error::CacheError;
use crate::metrics::CacheMetricsSnapshot;

/// Result of a successful [`CoreCache::get`].
#[derive(Debug)]
pub struct Lookup<'a, V> {
    /// The content, owned by the cache.
    pub value: &'a V,
    /// Wall time spent inside `get`, loader included.
    pub elapsed: Duration,
    /// `true` when the content was already live.
    pub hit: bool,
}

impl<'a, V> Lookup<'a, V> {
    pub(crate) fn hit(value: &'a V, elapsed: Duration) -> Self {
        Self {
            value,
            elapsed,
            hit: true,
        }
    }

    pub(crate) fn miss(value: &'a V, elapsed: Duration) -> Self {
        Self {
            value,
            elapsed,
            hit: false,
        }
    }

    /// Splits into `(content, elapsed, hit)`.
    pub fn into_parts(self) -> (&'a V, Duration, bool) {
        (self.value, self.elapsed, self.hit)
    }
}

/// Read-through cache operations shared by all eviction policies.
///
/// # Example
///
/// ```
/// use std::convert::Infallible;
/// use std::time::Duration;
/// use cachelab::policy::lru::LruCache;
/// use cachelab::traits::CoreCache;
///
/// fn warm<C: CoreCache<u64, String>>(cache: &mut C, ids: &[u64]) {
///     for &id in ids {
///         let _ = cache.get(id, |k: &u64| {
///             Ok::<_, Infallible>((format!("text {k}"), Duration::ZERO))
///         });
///     }
/// }
///
/// let mut cache = LruCache::try_new(2).unwrap();
/// warm(&mut cache, &[1, 2, 3]);
/// assert_eq!(cache.len(), 2);
/// assert!(!cache.contains(&1));
/// assert_eq!(cache.metrics().misses, 3);
/// ```
pub trait CoreCache<K, V> {
    /// Returns the content for `key`, calling `loader` on a miss.
    ///
    /// On a hit the policy updates its ordering state. On a miss the loader
    /// runs first; only if it succeeds does the policy evict (when needed)
    /// and store the value.
    fn get<F, E>(&mut self, key: K, loader: F) -> Result<Lookup<'_, V>, CacheError<E>>
    where
        F: FnOnce(&K) -> Result<(V, Duration), E>;

    /// Reads live content without touching policy state or metrics.
    fn peek(&self, key: &K) -> Option<&V>;

    /// Checks whether `key` has live content, without touching policy state.
    fn contains(&self, key: &K) -> bool;

    /// Number of live entries.
    fn len(&self) -> usize;

    /// Returns `true` if the cache holds no live entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of live entries.
    fn capacity(&self) -> usize;

    /// Returns `true` once the live entry count has reached capacity.
    fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    /// Empties every structure and zeroes all metrics.
    fn clear(&mut self);

    /// Current request accounting.
    fn metrics(&self) -> CacheMetricsSnapshot;

    /// Evicts one live entry according to the policy and returns its key.
    ///
    /// Returns `None` only when there is nothing to evict.
    fn evict(&mut self) -> Option<K>;

    /// Short policy name used in logs and reports.
    fn policy_name(&self) -> &'static str;
}
