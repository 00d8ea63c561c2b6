//! # Metrics Traits
//!
//! Recording and snapshotting are split into two small traits so policy code
//! only ever writes counters and report code only ever reads them.
//!
//! ```text
//!   ┌─────────────────────────────┐        ┌─────────────────────────────┐
//!   │     CoreMetricsRecorder     │        │  MetricsSnapshotProvider<S> │
//!   │  hit / miss / failed load   │        │  snapshot() -> S            │
//!   │  eviction / clear           │        │                             │
//!   └──────────────┬──────────────┘        └──────────────┬──────────────┘
//!                  │ written by                           │ read by
//!                  ▼                                      ▼
//!        FifoCache, LruCache,                   simulation driver,
//!        LfuCache, ArcCache                     report renderer
//! ```

use std::time::Duration;

/// Counters every cache policy records.
pub trait CoreMetricsRecorder {
    /// A request found live content; `elapsed` is the whole request time.
    fn record_hit(&mut self, elapsed: Duration);
    /// A request invoked the loader and stored its result.
    fn record_miss(&mut self, elapsed: Duration);
    /// A request invoked the loader and the loader failed.
    fn record_failed_load(&mut self);
    /// A live entry was evicted.
    fn record_eviction(&mut self);
    /// All counters return to zero.
    fn record_clear(&mut self);
}

/// Produces a point-in-time copy of a metrics source.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}
