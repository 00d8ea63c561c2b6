use std::time::Duration;

use crate::metrics::snapshot::CacheMetricsSnapshot;
use crate::metrics::traits::CoreMetricsRecorder;

/// Hit/miss counters and observed request durations for one cache instance.
///
/// Counters only grow until [`record_clear`](CoreMetricsRecorder::record_clear).
#[derive(Debug, Default, Clone)]
pub struct RequestMetrics {
    pub total_requests: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub load_times: Vec<Duration>,
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of all recorded request durations.
    pub fn total_load_time(&self) -> Duration {
        self.load_times.iter().sum()
    }

    /// Mean recorded request duration, zero when nothing was recorded.
    pub fn avg_load_time(&self) -> Duration {
        match u32::try_from(self.load_times.len()) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.total_load_time() / n,
            Err(_) => {
                let secs = self.total_load_time().as_secs_f64() / self.load_times.len() as f64;
                Duration::from_secs_f64(secs)
            },
        }
    }

    /// Builds a snapshot, adding the gauges only the owning cache knows.
    pub fn snapshot(&self, capacity: usize, size: usize) -> CacheMetricsSnapshot {
        let (hit_rate, miss_rate) = if self.total_requests == 0 {
            (0.0, 0.0)
        } else {
            let total = self.total_requests as f64;
            (self.hits as f64 / total, self.misses as f64 / total)
        };

        CacheMetricsSnapshot {
            total_requests: self.total_requests,
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            hit_rate,
            miss_rate,
            avg_load_time: self.avg_load_time(),
            total_load_time: self.total_load_time(),
            capacity,
            size,
        }
    }
}

impl CoreMetricsRecorder for RequestMetrics {
    fn record_hit(&mut self, elapsed: Duration) {
        self.total_requests += 1;
        self.hits += 1;
        self.load_times.push(elapsed);
    }

    fn record_miss(&mut self, elapsed: Duration) {
        self.total_requests += 1;
        self.misses += 1;
        self.load_times.push(elapsed);
    }

    fn record_failed_load(&mut self) {
        self.total_requests += 1;
        self.misses += 1;
    }

    fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    fn record_clear(&mut self) {
        self.total_requests = 0;
        self.hits = 0;
        self.misses = 0;
        self.evictions = 0;
        self.load_times.clear();
    }
}
