//! Summary tables, rankings and JSON artifacts for simulation results.
//!
//! Artifacts are versioned with [`SCHEMA_VERSION`] so downstream tooling can
//! refuse files it does not understand.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use cachelab::builder::CachePolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::{PatternSummary, SimulationConfig, UserRun, summarize};
use crate::workload::AccessPattern;

pub const SCHEMA_VERSION: u32 = 1;

/// Best policy for one access pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternWinner {
    pub pattern: AccessPattern,
    pub policy: CachePolicy,
    pub avg_hit_rate: f64,
}

/// A policy's standing across every pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRanking {
    pub policy: CachePolicy,
    pub avg_hit_rate: f64,
    pub avg_load_time: Duration,
}

/// Highest average hit rate per pattern. Ties go to the policy listed first.
pub fn best_by_pattern(summaries: &[PatternSummary]) -> Vec<PatternWinner> {
    let mut winners: Vec<PatternWinner> = Vec::new();
    for s in summaries {
        match winners.iter_mut().find(|w| w.pattern == s.pattern) {
            Some(w) if s.avg_hit_rate > w.avg_hit_rate => {
                w.policy = s.policy;
                w.avg_hit_rate = s.avg_hit_rate;
            },
            Some(_) => {},
            None => winners.push(PatternWinner {
                pattern: s.pattern,
                policy: s.policy,
                avg_hit_rate: s.avg_hit_rate,
            }),
        }
    }
    winners
}

/// Policies ordered by hit rate averaged over patterns, best first.
pub fn rank_policies(summaries: &[PatternSummary]) -> Vec<PolicyRanking> {
    let mut totals: Vec<(CachePolicy, f64, f64, usize)> = Vec::new();
    for s in summaries {
        let load = s.avg_load_time.as_secs_f64();
        match totals.iter_mut().find(|(p, ..)| *p == s.policy) {
            Some((_, hit, time, n)) => {
                *hit += s.avg_hit_rate;
                *time += load;
                *n += 1;
            },
            None => totals.push((s.policy, s.avg_hit_rate, load, 1)),
        }
    }

    let mut ranking: Vec<PolicyRanking> = totals
        .into_iter()
        .map(|(policy, hit, time, n)| PolicyRanking {
            policy,
            avg_hit_rate: hit / n as f64,
            avg_load_time: Duration::from_secs_f64(time / n as f64),
        })
        .collect();
    ranking.sort_by(|a, b| b.avg_hit_rate.total_cmp(&a.avg_hit_rate));
    ranking
}

/// Plain-text report: one table per pattern, its winner, then the overall
/// ranking.
pub fn render_summary(summaries: &[PatternSummary]) -> String {
    let mut out = String::new();
    if summaries.is_empty() {
        out.push_str("No results to summarize.\n");
        return out;
    }

    let rule = "=".repeat(70);
    let winners = best_by_pattern(summaries);
    for winner in &winners {
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "Pattern: {}", winner.pattern.name().to_uppercase());
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(
            out,
            "{:<10} {:>9} {:>12} {:>8} {:>8}",
            "Policy", "Hit rate", "Avg time", "Hits", "Misses"
        );
        let _ = writeln!(out, "{}", "-".repeat(70));
        for s in summaries.iter().filter(|s| s.pattern == winner.pattern) {
            let _ = writeln!(
                out,
                "{:<10} {:>8.2}% {:>10.4}ms {:>8} {:>8}",
                s.policy.name(),
                s.avg_hit_rate * 100.0,
                s.avg_load_time.as_secs_f64() * 1_000.0,
                s.total_hits,
                s.total_misses
            );
        }
        let _ = writeln!(
            out,
            "\nBest: {} ({:.2}% hit rate)\n",
            winner.policy.name(),
            winner.avg_hit_rate * 100.0
        );
    }

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Overall ranking");
    let _ = writeln!(out, "{rule}");
    for (place, r) in rank_policies(summaries).iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {:<6} {:>6.2}% hit rate, {:.4}ms avg",
            place + 1,
            r.policy.name(),
            r.avg_hit_rate * 100.0,
            r.avg_load_time.as_secs_f64() * 1_000.0
        );
    }
    out
}

/// Everything a simulation produced, ready for JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationArtifact {
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    pub config: SimulationConfig,
    pub summaries: Vec<PatternSummary>,
    pub winners: Vec<PatternWinner>,
    pub ranking: Vec<PolicyRanking>,
    /// Per-user detail, omitted when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runs: Vec<UserRun>,
}

impl SimulationArtifact {
    /// Builds an artifact; `include_runs` keeps the per-user access logs.
    pub fn new(config: SimulationConfig, runs: Vec<UserRun>, include_runs: bool) -> Self {
        let summaries = summarize(&runs);
        Self {
            schema_version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            config,
            winners: best_by_pattern(&summaries),
            ranking: rank_policies(&summaries),
            summaries,
            runs: if include_runs { runs } else { Vec::new() },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode report")]
    Json(#[from] serde_json::Error),
}

/// Writes `artifact` as pretty JSON, creating parent directories.
pub fn write_artifact(path: &Path, artifact: &SimulationArtifact) -> Result<(), ReportError> {
    let io_err = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(artifact)?;
    fs::write(path, json).map_err(io_err)?;
    info!(path = %path.display(), summaries = artifact.summaries.len(), "wrote simulation artifact");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(policy: CachePolicy, pattern: AccessPattern, hit_rate: f64) -> PatternSummary {
        PatternSummary {
            policy,
            pattern,
            avg_hit_rate: hit_rate,
            avg_miss_rate: 1.0 - hit_rate,
            avg_load_time: Duration::from_millis(1),
            total_hits: (hit_rate * 100.0) as u64,
            total_misses: ((1.0 - hit_rate) * 100.0) as u64,
            users: 1,
        }
    }

    fn sample() -> Vec<PatternSummary> {
        vec![
            summary(CachePolicy::Fifo, AccessPattern::Random, 0.10),
            summary(CachePolicy::Fifo, AccessPattern::weighted(), 0.30),
            summary(CachePolicy::Lfu, AccessPattern::Random, 0.12),
            summary(CachePolicy::Lfu, AccessPattern::weighted(), 0.40),
            summary(CachePolicy::Arc, AccessPattern::Random, 0.12),
            summary(CachePolicy::Arc, AccessPattern::weighted(), 0.35),
        ]
    }

    #[test]
    fn winners_per_pattern_keep_first_on_tie() {
        let winners = best_by_pattern(&sample());
        assert_eq!(winners.len(), 2);
        assert_eq!(winners[0].pattern, AccessPattern::Random);
        assert_eq!(winners[0].policy, CachePolicy::Lfu);
        assert_eq!(winners[1].policy, CachePolicy::Lfu);
        assert_eq!(winners[1].avg_hit_rate, 0.40);
    }

    #[test]
    fn ranking_orders_by_mean_hit_rate() {
        let ranking = rank_policies(&sample());
        let order: Vec<_> = ranking.iter().map(|r| r.policy).collect();
        assert_eq!(order, vec![CachePolicy::Lfu, CachePolicy::Arc, CachePolicy::Fifo]);
        assert!((ranking[0].avg_hit_rate - 0.26).abs() < 1e-12);
        assert_eq!(ranking[0].avg_load_time, Duration::from_millis(1));
    }

    #[test]
    fn rendered_summary_names_winners() {
        let text = render_summary(&sample());
        assert!(text.contains("Pattern: RANDOM"));
        assert!(text.contains("Pattern: WEIGHTED"));
        assert!(text.contains("Best: LFU (40.00% hit rate)"));
        assert!(text.contains("1. LFU"));
        assert_eq!(render_summary(&[]), "No results to summarize.\n");
    }

    #[test]
    fn artifact_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("results.json");

        let artifact = SimulationArtifact::new(SimulationConfig::default(), Vec::new(), true);
        write_artifact(&path, &artifact).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let back: SimulationArtifact = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.schema_version, SCHEMA_VERSION);
        assert_eq!(back.config, artifact.config);
        assert_eq!(back.generated_at, artifact.generated_at);
        assert!(!raw.contains("\"runs\""));
    }
}
