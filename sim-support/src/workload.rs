//! Request stream generators for simulations.
//!
//! Every generator is seeded, so the same `(total, seed, pattern)` always
//! yields the same ids. Ids are in `1..=total`.
//!
//! ```text
//!   Random     every id equally likely
//!   Poisson    ids drawn from Poisson(λ), clamped into [1, total]
//!   Weighted   P(hot) of a draw landing in [hot_start, hot_end],
//!              otherwise uniform over the ids outside that range
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Poisson};
use serde::{Deserialize, Serialize};

/// Shape of a user's request stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AccessPattern {
    /// Uniform over all ids.
    Random,
    /// Poisson-distributed ids around `lambda`.
    Poisson { lambda: f64 },
    /// A hot id range receives `hot_probability` of the traffic.
    Weighted {
        hot_start: u64,
        hot_end: u64,
        hot_probability: f64,
    },
}

impl AccessPattern {
    pub const DEFAULT_LAMBDA: f64 = 30.0;

    /// Poisson with the default mean of 30.
    pub const fn poisson() -> Self {
        AccessPattern::Poisson {
            lambda: Self::DEFAULT_LAMBDA,
        }
    }

    /// Ids 30 to 40 receive 43% of the requests.
    pub const fn weighted() -> Self {
        AccessPattern::Weighted {
            hot_start: 30,
            hot_end: 40,
            hot_probability: 0.43,
        }
    }

    /// Random, Poisson and weighted, with default parameters.
    pub fn defaults() -> Vec<AccessPattern> {
        vec![AccessPattern::Random, Self::poisson(), Self::weighted()]
    }

    pub fn name(&self) -> &'static str {
        match self {
            AccessPattern::Random => "random",
            AccessPattern::Poisson { .. } => "poisson",
            AccessPattern::Weighted { .. } => "weighted",
        }
    }
}

impl fmt::Display for AccessPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for AccessPattern {
    type Err = WorkloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" | "uniform" => Ok(AccessPattern::Random),
            "poisson" => Ok(Self::poisson()),
            "weighted" | "hot" => Ok(Self::weighted()),
            _ => Err(WorkloadError::UnknownPattern(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkloadError {
    #[error("unknown access pattern `{0}` (expected random, poisson or weighted)")]
    UnknownPattern(String),

    #[error("poisson mean must be positive and finite (got {0})")]
    InvalidLambda(f64),

    #[error("hot range {start}..={end} has no ids inside 1..={total}")]
    EmptyHotRange { start: u64, end: u64, total: u64 },

    #[error("hot probability must be within [0, 1] (got {0})")]
    InvalidProbability(f64),
}

/// Seeded generator of item ids in `1..=total`.
#[derive(Debug, Clone)]
pub struct RequestGenerator {
    total: u64,
    rng: SmallRng,
}

impl RequestGenerator {
    pub fn new(total: u64, seed: u64) -> Self {
        Self {
            total: total.max(1),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Generates `count` ids following `pattern`.
    pub fn generate(
        &mut self,
        pattern: &AccessPattern,
        count: usize,
    ) -> Result<Vec<u64>, WorkloadError> {
        match *pattern {
            AccessPattern::Random => Ok((0..count)
                .map(|_| self.rng.random_range(1..=self.total))
                .collect()),
            AccessPattern::Poisson { lambda } => self.poisson(lambda, count),
            AccessPattern::Weighted {
                hot_start,
                hot_end,
                hot_probability,
            } => self.weighted(hot_start, hot_end, hot_probability, count),
        }
    }

    fn poisson(&mut self, lambda: f64, count: usize) -> Result<Vec<u64>, WorkloadError> {
        let dist = Poisson::new(lambda).map_err(|_| WorkloadError::InvalidLambda(lambda))?;
        Ok((0..count)
            .map(|_| {
                let draw: f64 = dist.sample(&mut self.rng);
                (draw as u64).clamp(1, self.total)
            })
            .collect())
    }

    fn weighted(
        &mut self,
        hot_start: u64,
        hot_end: u64,
        hot_probability: f64,
        count: usize,
    ) -> Result<Vec<u64>, WorkloadError> {
        if !(0.0..=1.0).contains(&hot_probability) {
            return Err(WorkloadError::InvalidProbability(hot_probability));
        }
        let start = hot_start.max(1);
        let end = hot_end.min(self.total);
        if start > end {
            return Err(WorkloadError::EmptyHotRange {
                start: hot_start,
                end: hot_end,
                total: self.total,
            });
        }
        let hot_len = end - start + 1;
        let cold_len = self.total - hot_len;

        Ok((0..count)
            .map(|_| {
                if cold_len == 0 || self.rng.random::<f64>() < hot_probability {
                    start + self.rng.random_range(0..hot_len)
                } else {
                    // index into the cold ids, skipping over the hot range
                    let i = self.rng.random_range(0..cold_len);
                    if i + 1 < start { i + 1 } else { i + 1 + hot_len }
                }
            })
            .collect())
    }
}

/// Access counts of a generated stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    pub total_requests: usize,
    pub unique_ids: usize,
    /// Up to ten `(id, count)` pairs, most requested first.
    pub most_common: Vec<(u64, usize)>,
    pub min_accesses: usize,
    pub max_accesses: usize,
    pub avg_accesses: f64,
}

/// Summarizes how often each id appears in `requests`.
pub fn analyze(requests: &[u64]) -> DistributionStats {
    let mut counts: BTreeMap<u64, usize> = BTreeMap::new();
    for &id in requests {
        *counts.entry(id).or_default() += 1;
    }

    let mut most_common: Vec<(u64, usize)> = counts.iter().map(|(&id, &n)| (id, n)).collect();
    most_common.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    most_common.truncate(10);

    let avg_accesses = if counts.is_empty() {
        0.0
    } else {
        requests.len() as f64 / counts.len() as f64
    };

    DistributionStats {
        total_requests: requests.len(),
        unique_ids: counts.len(),
        most_common,
        min_accesses: counts.values().copied().min().unwrap_or(0),
        max_accesses: counts.values().copied().max().unwrap_or(0),
        avg_accesses,
    }
}

/// Fraction of `requests` that fall inside `start..=end`.
pub fn share_in_range(requests: &[u64], start: u64, end: u64) -> f64 {
    if requests.is_empty() {
        return 0.0;
    }
    let inside = requests.iter().filter(|id| (start..=end).contains(*id)).count();
    inside as f64 / requests.len() as f64
}
