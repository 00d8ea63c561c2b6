//! Request accounting shared by every cache policy.
//!
//! Each policy owns a [`RequestMetrics`] and drives it through the
//! [`CoreMetricsRecorder`] trait; callers read a [`CacheMetricsSnapshot`].

pub mod metrics_impl;
pub mod snapshot;
pub mod traits;

pub use metrics_impl::RequestMetrics;
pub use snapshot::CacheMetricsSnapshot;
pub use traits::{CoreMetricsRecorder, MetricsSnapshotProvider};
