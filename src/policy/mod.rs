//! Eviction policies.
//!
//! | Policy | Victim                                   | Hit updates            |
//! |--------|------------------------------------------|------------------------|
//! | FIFO   | earliest loaded                          | nothing                |
//! | LRU    | least recently used                      | recency                |
//! | LFU    | lowest frequency, oldest at that level   | frequency              |
//! | ARC    | T1 or T2 LRU, steered by ghost hits      | T1 → T2 promotion      |
//!
//! All four implement [`CoreCache`](crate::traits::CoreCache) and can be
//! swapped at runtime through [`CacheBuilder`](crate::builder::CacheBuilder).

pub mod arc;
pub mod fifo;
pub mod lfu;
pub mod lru;

pub use arc::ArcCache;
pub use fifo::FifoCache;
pub use lfu::LfuCache;
pub use lru::LruCache;
