//! cachelab: read-through cache policies behind one get-or-load contract.
//!
//! Four interchangeable eviction policies (FIFO, LRU, LFU, ARC) implement
//! [`traits::CoreCache`]. Each request either answers from memory or calls a
//! caller-supplied loader, and every cache keeps its own hit/miss accounting
//! so policies can be compared side by side on the same workload.
//!
//! ```
//! use std::convert::Infallible;
//! use std::time::Duration;
//! use cachelab::prelude::*;
//!
//! let mut cache = CacheBuilder::new(3).build::<u32, String>(CachePolicy::Lfu)?;
//! for id in [1, 2, 3, 1, 1, 4] {
//!     cache.get(id, |k: &u32| Ok::<_, Infallible>((format!("text {k}"), Duration::ZERO)))?;
//! }
//! assert!(!cache.contains(&2));
//! assert_eq!(cache.metrics().hits, 2);
//! # Ok::<(), CacheError>(())
//! ```

pub mod builder;
pub mod ds;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod policy;
pub mod prelude;
pub mod traits;
