use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Point-in-time view of a cache's request accounting.
///
/// `hit_rate` and `miss_rate` are fractions in `[0, 1]`; both are `0.0`
/// before the first request.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheMetricsSnapshot {
    pub total_requests: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,

    pub hit_rate: f64,
    pub miss_rate: f64,
    pub avg_load_time: Duration,
    pub total_load_time: Duration,

    // gauges captured at snapshot time
    pub capacity: usize,
    pub size: usize,
}

impl CacheMetricsSnapshot {
    /// Hit rate as a percentage (0-100).
    pub fn hit_percent(&self) -> f64 {
        self.hit_rate * 100.0
    }

    /// Miss rate as a percentage (0-100).
    pub fn miss_percent(&self) -> f64 {
        self.miss_rate * 100.0
    }
}
