//! Multi-user simulation over every policy and access pattern.
//!
//! ```text
//!   for policy in config.policies
//!     for pattern in config.patterns
//!       for user in 1..=config.users
//!         cache    = fresh cache(policy, capacity)
//!         requests = RequestGenerator(total_items, seed = user * 100)
//!         replay requests through cache.get(id, loader)  →  UserRun
//! ```
//!
//! A user's stream depends only on its id and pattern, so every policy sees
//! the exact same requests and the comparison is apples to apples.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use cachelab::builder::{CacheBuilder, CachePolicy};
use cachelab::error::CacheError;
use cachelab::loader::Loader;
use cachelab::traits::CoreCache;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::loader::DEFAULT_TOTAL;
use crate::workload::{AccessPattern, RequestGenerator, WorkloadError};

/// Parameters of one simulation matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub capacity: usize,
    pub users: u64,
    pub requests_per_user: usize,
    pub total_items: u64,
    pub policies: Vec<CachePolicy>,
    pub patterns: Vec<AccessPattern>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            users: 3,
            requests_per_user: 200,
            total_items: DEFAULT_TOTAL,
            policies: CachePolicy::ALL.to_vec(),
            patterns: AccessPattern::defaults(),
        }
    }
}

impl SimulationConfig {
    /// Seed of a user's request stream. Wraps for ids past `u64::MAX / 100`.
    pub fn seed_for(user_id: u64) -> u64 {
        user_id.wrapping_mul(100)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SimulationError<E> {
    #[error(transparent)]
    Cache(#[from] CacheError<E>),

    #[error(transparent)]
    Workload(#[from] WorkloadError),
}

/// One request as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccessRecord {
    /// 1-based position in the user's stream.
    pub request: usize,
    pub id: u64,
    pub hit: bool,
    pub elapsed: Duration,
}

/// Outcome of replaying one user's stream against one cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRun {
    pub user_id: u64,
    pub policy: CachePolicy,
    pub pattern: AccessPattern,
    pub total_requests: u64,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub miss_rate: f64,
    pub avg_load_time: Duration,
    pub total_load_time: Duration,
    /// Wall time of the whole replay.
    pub wall_time: Duration,
    pub hit_counts: BTreeMap<u64, u64>,
    pub miss_counts: BTreeMap<u64, u64>,
    pub access_log: Vec<AccessRecord>,
}

/// Replays `requests` through `cache`, loading misses with `loader`.
///
/// The cache is cleared first so its metrics describe this user only.
pub fn simulate_user<C, L>(
    cache: &mut C,
    loader: &mut L,
    requests: &[u64],
    user_id: u64,
    policy: CachePolicy,
    pattern: AccessPattern,
) -> Result<UserRun, CacheError<L::Error>>
where
    C: CoreCache<u64, String>,
    L: Loader<u64, String>,
{
    cache.clear();

    let mut hit_counts = BTreeMap::new();
    let mut miss_counts = BTreeMap::new();
    let mut access_log = Vec::with_capacity(requests.len());

    let start = Instant::now();
    for (i, &id) in requests.iter().enumerate() {
        let lookup = cache.get(id, loader.as_fn())?;
        let counts = if lookup.hit {
            &mut hit_counts
        } else {
            &mut miss_counts
        };
        *counts.entry(id).or_insert(0) += 1;
        access_log.push(AccessRecord {
            request: i + 1,
            id,
            hit: lookup.hit,
            elapsed: lookup.elapsed,
        });
    }
    let wall_time = start.elapsed();

    let m = cache.metrics();
    debug!(
        user_id,
        %policy,
        %pattern,
        hits = m.hits,
        misses = m.misses,
        hit_rate = m.hit_rate,
        "user replay finished"
    );

    Ok(UserRun {
        user_id,
        policy,
        pattern,
        total_requests: m.total_requests,
        hits: m.hits,
        misses: m.misses,
        hit_rate: m.hit_rate,
        miss_rate: m.miss_rate,
        avg_load_time: m.avg_load_time,
        total_load_time: m.total_load_time,
        wall_time,
        hit_counts,
        miss_counts,
        access_log,
    })
}

/// Runs the full policy × pattern × user matrix.
#[derive(Debug)]
pub struct Simulation<L> {
    config: SimulationConfig,
    loader: L,
}

impl<L> Simulation<L>
where
    L: Loader<u64, String>,
{
    pub fn new(config: SimulationConfig, loader: L) -> Self {
        Self { config, loader }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn into_loader(self) -> L {
        self.loader
    }

    /// The request stream of one user, identical for every policy.
    pub fn requests_for(
        &self,
        user_id: u64,
        pattern: &AccessPattern,
    ) -> Result<Vec<u64>, WorkloadError> {
        RequestGenerator::new(self.config.total_items, SimulationConfig::seed_for(user_id))
            .generate(pattern, self.config.requests_per_user)
    }

    pub fn run(&mut self) -> Result<Vec<UserRun>, SimulationError<L::Error>> {
        let config = self.config.clone();
        info!(
            capacity = config.capacity,
            users = config.users,
            requests_per_user = config.requests_per_user,
            policies = config.policies.len(),
            patterns = config.patterns.len(),
            "starting simulation"
        );

        let mut runs = Vec::with_capacity(
            config.policies.len() * config.patterns.len() * config.users as usize,
        );
        for &policy in &config.policies {
            for pattern in &config.patterns {
                for user_id in 1..=config.users {
                    let mut cache = CacheBuilder::new(config.capacity)
                        .build::<u64, String>(policy)
                        .map_err(|err| err.widen::<L::Error>())?;
                    let requests = self.requests_for(user_id, pattern)?;
                    let run = simulate_user(
                        &mut cache,
                        &mut self.loader,
                        &requests,
                        user_id,
                        policy,
                        *pattern,
                    )?;
                    runs.push(run);
                }
            }
            info!(%policy, "policy finished");
        }
        Ok(runs)
    }
}

/// Aggregate of all users for one policy and pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternSummary {
    pub policy: CachePolicy,
    pub pattern: AccessPattern,
    pub avg_hit_rate: f64,
    pub avg_miss_rate: f64,
    pub avg_load_time: Duration,
    pub total_hits: u64,
    pub total_misses: u64,
    pub users: usize,
}

/// Groups runs by policy and pattern, in first-seen order.
pub fn summarize(runs: &[UserRun]) -> Vec<PatternSummary> {
    let mut groups: Vec<(CachePolicy, AccessPattern, Vec<&UserRun>)> = Vec::new();
    for run in runs {
        match groups
            .iter_mut()
            .find(|(policy, pattern, _)| *policy == run.policy && *pattern == run.pattern)
        {
            Some((_, _, members)) => members.push(run),
            None => groups.push((run.policy, run.pattern, vec![run])),
        }
    }

    groups
        .into_iter()
        .map(|(policy, pattern, members)| {
            let n = members.len();
            let avg = |f: fn(&UserRun) -> f64| members.iter().map(|r| f(r)).sum::<f64>() / n as f64;
            let load_secs = avg(|r| r.avg_load_time.as_secs_f64());
            PatternSummary {
                policy,
                pattern,
                avg_hit_rate: avg(|r| r.hit_rate),
                avg_miss_rate: avg(|r| r.miss_rate),
                avg_load_time: Duration::from_secs_f64(load_secs),
                total_hits: members.iter().map(|r| r.hits).sum(),
                total_misses: members.iter().map(|r| r.misses).sum(),
                users: n,
            }
        })
        .collect()
}
