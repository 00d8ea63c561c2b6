//! Unified cache builder for all eviction policies.
//!
//! Lets callers pick a policy at runtime (from a CLI flag, a config file or a
//! benchmark matrix) and still talk to one concrete type.
//!
//! ## Example
//!
//! ```rust
//! use std::convert::Infallible;
//! use std::time::Duration;
//! use cachelab::builder::{CacheBuilder, CachePolicy};
//! use cachelab::traits::CoreCache;
//!
//! let policy: CachePolicy = "arc".parse().unwrap();
//! let mut cache = CacheBuilder::new(100).build::<u64, String>(policy).unwrap();
//!
//! let lookup = cache
//!     .get(1, |k: &u64| Ok::<_, Infallible>((format!("text {k}"), Duration::ZERO)))
//!     .unwrap();
//! assert!(!lookup.hit);
//! assert_eq!(cache.policy_name(), "ARC");
//! ```

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::metrics::CacheMetricsSnapshot;
use crate::policy::arc::ArcCache;
use crate::policy::fifo::FifoCache;
use crate::policy::lfu::LfuCache;
use crate::policy::lru::LruCache;
use crate::traits::{CoreCache, Lookup};

/// Available cache eviction policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    /// First In, First Out eviction.
    Fifo,
    /// Least Recently Used eviction.
    Lru,
    /// Least Frequently Used eviction, LRU among ties.
    Lfu,
    /// Adaptive Replacement Cache.
    Arc,
}

impl CachePolicy {
    /// Every policy, in report order.
    pub const ALL: [CachePolicy; 4] = [
        CachePolicy::Fifo,
        CachePolicy::Lru,
        CachePolicy::Lfu,
        CachePolicy::Arc,
    ];

    /// Upper-case display name, matching [`CoreCache::policy_name`].
    pub fn name(self) -> &'static str {
        match self {
            CachePolicy::Fifo => "FIFO",
            CachePolicy::Lru => "LRU",
            CachePolicy::Lfu => "LFU",
            CachePolicy::Arc => "ARC",
        }
    }
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Error returned when a policy name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown cache policy `{0}` (expected fifo, lru, lfu or arc)")]
pub struct ParsePolicyError(String);

impl FromStr for CachePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fifo" => Ok(CachePolicy::Fifo),
            "lru" => Ok(CachePolicy::Lru),
            "lfu" => Ok(CachePolicy::Lfu),
            "arc" => Ok(CachePolicy::Arc),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

/// Unified cache wrapper that provides a consistent API regardless of policy.
pub struct Cache<K, V>
where
    K: Clone + Eq + Hash,
{
    inner: CacheInner<K, V>,
}

enum CacheInner<K, V>
where
    K: Clone + Eq + Hash,
{
    Fifo(FifoCache<K, V>),
    Lru(LruCache<K, V>),
    Lfu(LfuCache<K, V>),
    Arc(ArcCache<K, V>),
}

macro_rules! dispatch {
    ($inner:expr, $cache:ident => $body:expr) => {
        match $inner {
            CacheInner::Fifo($cache) => $body,
            CacheInner::Lru($cache) => $body,
            CacheInner::Lfu($cache) => $body,
            CacheInner::Arc($cache) => $body,
        }
    };
}

impl<K, V> Cache<K, V>
where
    K: Clone + Eq + Hash,
{
    /// The policy this cache was built with.
    pub fn policy(&self) -> CachePolicy {
        match &self.inner {
            CacheInner::Fifo(_) => CachePolicy::Fifo,
            CacheInner::Lru(_) => CachePolicy::Lru,
            CacheInner::Lfu(_) => CachePolicy::Lfu,
            CacheInner::Arc(_) => CachePolicy::Arc,
        }
    }

    /// Borrows the ARC cache, if that is the policy in use.
    pub fn as_arc(&self) -> Option<&ArcCache<K, V>> {
        match &self.inner {
            CacheInner::Arc(arc) => Some(arc),
            _ => None,
        }
    }

    /// Borrows the LFU cache, if that is the policy in use.
    pub fn as_lfu(&self) -> Option<&LfuCache<K, V>> {
        match &self.inner {
            CacheInner::Lfu(lfu) => Some(lfu),
            _ => None,
        }
    }
}

impl<K, V> CoreCache<K, V> for Cache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn get<F, E>(&mut self, key: K, loader: F) -> Result<Lookup<'_, V>, CacheError<E>>
    where
        F: FnOnce(&K) -> Result<(V, Duration), E>,
    {
        dispatch!(&mut self.inner, c => c.get(key, loader))
    }

    fn peek(&self, key: &K) -> Option<&V> {
        dispatch!(&self.inner, c => c.peek(key))
    }

    fn contains(&self, key: &K) -> bool {
        dispatch!(&self.inner, c => c.contains(key))
    }

    fn len(&self) -> usize {
        dispatch!(&self.inner, c => c.len())
    }

    fn capacity(&self) -> usize {
        dispatch!(&self.inner, c => c.capacity())
    }

    fn clear(&mut self) {
        dispatch!(&mut self.inner, c => c.clear())
    }

    fn metrics(&self) -> CacheMetricsSnapshot {
        dispatch!(&self.inner, c => c.metrics())
    }

    fn evict(&mut self) -> Option<K> {
        dispatch!(&mut self.inner, c => c.evict())
    }

    fn policy_name(&self) -> &'static str {
        self.policy().name()
    }
}

impl<K, V> fmt::Debug for Cache<K, V>
where
    K: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        dispatch!(&self.inner, c => fmt::Debug::fmt(c, f))
    }
}

/// Builder for creating cache instances.
#[derive(Debug, Clone, Copy)]
pub struct CacheBuilder {
    capacity: usize,
}

impl CacheBuilder {
    /// Create a new cache builder with the specified capacity.
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Build a cache with the specified policy.
    ///
    /// Fails with [`CacheError::InvalidCapacity`] when the capacity is zero.
    ///
    /// # Example
    ///
    /// ```rust
    /// use cachelab::builder::{CacheBuilder, CachePolicy};
    /// use cachelab::traits::CoreCache;
    ///
    /// for policy in CachePolicy::ALL {
    ///     let cache = CacheBuilder::new(10).build::<u64, String>(policy).unwrap();
    ///     assert_eq!(cache.capacity(), 10);
    /// }
    /// assert!(CacheBuilder::new(0).build::<u64, String>(CachePolicy::Lru).is_err());
    /// ```
    pub fn build<K, V>(self, policy: CachePolicy) -> Result<Cache<K, V>, CacheError>
    where
        K: Clone + Eq + Hash,
    {
        let inner = match policy {
            CachePolicy::Fifo => CacheInner::Fifo(FifoCache::try_new(self.capacity)?),
            CachePolicy::Lru => CacheInner::Lru(LruCache::try_new(self.capacity)?),
            CachePolicy::Lfu => CacheInner::Lfu(LfuCache::try_new(self.capacity)?),
            CachePolicy::Arc => CacheInner::Arc(ArcCache::try_new(self.capacity)?),
        };
        Ok(Cache { inner })
    }
}
