//! Simulation support for cachelab.
//!
//! This crate drives the cache policies the way a real deployment would:
//! several users, each replaying a generated request stream against a fresh
//! cache backed by a slow loader, followed by per-pattern comparison.
//!
//! - [`corpus`]: splits one document into the numbered texts the loader reads.
//! - [`loader`]: text files on disk and a synthetic in-memory source.
//! - [`workload`]: uniform, Poisson and hot-range request generators.
//! - [`engine`]: the policy × pattern × user simulation matrix.
//! - [`report`]: summary tables, rankings and JSON artifacts.

pub mod corpus;
pub mod engine;
pub mod loader;
pub mod report;
pub mod workload;
