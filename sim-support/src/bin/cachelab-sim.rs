use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use cachelab::builder::{CacheBuilder, CachePolicy};
use cachelab::loader::Loader;
use cachelab::traits::CoreCache;
use clap::{Args, Parser, Subcommand};
use sim_support::corpus::{DEFAULT_WORDS_PER_TEXT, split_into_texts};
use sim_support::engine::{Simulation, SimulationConfig};
use sim_support::loader::{ContentSource, DEFAULT_TOTAL, SyntheticLoader, TextLoader};
use sim_support::report::{SimulationArtifact, render_summary, write_artifact};
use sim_support::workload::{AccessPattern, RequestGenerator, analyze};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "cachelab-sim")]
#[command(about = "Compare cache eviction policies against simulated users")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every policy against every access pattern and compare hit rates
    Simulate(SimulateArgs),
    /// Fetch one text through a cache, repeatedly
    Fetch(FetchArgs),
    /// Generate a request stream and print its distribution
    Workload(WorkloadArgs),
    /// Split one document into numbered texts
    Split(SplitArgs),
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Directory holding texto_{n}.txt files; synthetic content if omitted
    #[arg(long, value_name = "DIR")]
    texts: Option<PathBuf>,

    /// Number of distinct texts
    #[arg(long, default_value_t = DEFAULT_TOTAL)]
    items: u64,

    /// Simulated load latency for synthetic content, in milliseconds
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,
}

impl SourceArgs {
    fn open(&self) -> Result<ContentSource> {
        match &self.texts {
            Some(dir) => {
                let loader = TextLoader::open(dir)
                    .with_context(|| format!("opening texts in {}", dir.display()))?
                    .with_total(self.items);
                Ok(ContentSource::Disk(loader))
            },
            None => Ok(ContentSource::Synthetic(SyntheticLoader::new(
                self.items,
                Duration::from_millis(self.latency_ms),
            ))),
        }
    }
}

#[derive(Args, Debug)]
struct SimulateArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Cache capacity per user
    #[arg(long, default_value_t = 10)]
    capacity: usize,

    /// Number of simulated users
    #[arg(long, default_value_t = 3)]
    users: u64,

    /// Requests issued by each user
    #[arg(long, default_value_t = 200)]
    requests: usize,

    /// Policies to compare (repeatable); all when omitted
    #[arg(long = "policy", value_name = "POLICY")]
    policies: Vec<CachePolicy>,

    /// Access patterns to replay (repeatable); all when omitted
    #[arg(long = "pattern", value_name = "PATTERN")]
    patterns: Vec<AccessPattern>,

    /// Write a JSON artifact to this path
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Include per-user access logs in the artifact
    #[arg(long)]
    include_runs: bool,
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Text id to fetch
    id: u64,

    #[command(flatten)]
    source: SourceArgs,

    #[arg(long, default_value_t = CachePolicy::Lru)]
    policy: CachePolicy,

    #[arg(long, default_value_t = 10)]
    capacity: usize,

    /// How many times to fetch the id
    #[arg(long, default_value_t = 2)]
    repeat: usize,
}

#[derive(Args, Debug)]
struct WorkloadArgs {
    #[arg(long, default_value_t = AccessPattern::Random)]
    pattern: AccessPattern,

    #[arg(long, default_value_t = 200)]
    requests: usize,

    #[arg(long, default_value_t = 100)]
    seed: u64,

    #[arg(long, default_value_t = DEFAULT_TOTAL)]
    items: u64,
}

#[derive(Args, Debug)]
struct SplitArgs {
    /// Source document
    input: PathBuf,

    /// Output directory for texto_{n}.txt files
    #[arg(long, default_value = "texts")]
    out: PathBuf,

    #[arg(long, default_value_t = DEFAULT_WORDS_PER_TEXT)]
    words: usize,

    #[arg(long, default_value_t = DEFAULT_TOTAL)]
    count: u64,
}

fn main() -> Result<()> {
    init_tracing();
    match Cli::parse().command {
        Command::Simulate(args) => simulate(args),
        Command::Fetch(args) => fetch(args),
        Command::Workload(args) => workload(args),
        Command::Split(args) => split(args),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn simulate(args: SimulateArgs) -> Result<()> {
    let defaults = SimulationConfig::default();
    let config = SimulationConfig {
        capacity: args.capacity,
        users: args.users,
        requests_per_user: args.requests,
        total_items: args.source.items,
        policies: if args.policies.is_empty() {
            defaults.policies
        } else {
            args.policies
        },
        patterns: if args.patterns.is_empty() {
            defaults.patterns
        } else {
            args.patterns
        },
    };

    let mut sim = Simulation::new(config.clone(), args.source.open()?);
    let runs = sim.run().context("simulation failed")?;
    let artifact = SimulationArtifact::new(config, runs, args.include_runs);

    print!("{}", render_summary(&artifact.summaries));

    if let Some(path) = args.output {
        write_artifact(&path, &artifact)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("\nResults written to {}", path.display());
    }
    Ok(())
}

fn fetch(args: FetchArgs) -> Result<()> {
    let mut loader = args.source.open()?;
    let mut cache = CacheBuilder::new(args.capacity).build::<u64, String>(args.policy)?;

    for attempt in 1..=args.repeat {
        let lookup = cache
            .get(args.id, loader.as_fn())
            .with_context(|| format!("fetching text {}", args.id))?;
        let outcome = if lookup.hit { "HIT" } else { "MISS" };
        println!(
            "#{attempt} {outcome:<4} text {} ({} bytes) in {:.4}ms",
            args.id,
            lookup.value.len(),
            lookup.elapsed.as_secs_f64() * 1_000.0
        );
    }

    let m = cache.metrics();
    info!(policy = %args.policy, hits = m.hits, misses = m.misses, "fetch finished");
    println!(
        "{}: {:.2}% hit rate over {} requests",
        cache.policy_name(),
        m.hit_percent(),
        m.total_requests
    );
    Ok(())
}

fn workload(args: WorkloadArgs) -> Result<()> {
    let requests = RequestGenerator::new(args.items, args.seed)
        .generate(&args.pattern, args.requests)?;
    let stats = analyze(&requests);

    println!("Pattern:        {}", args.pattern);
    println!("Total requests: {}", stats.total_requests);
    println!("Unique ids:     {}", stats.unique_ids);
    println!(
        "Accesses/id:    min {} max {} avg {:.2}",
        stats.min_accesses, stats.max_accesses, stats.avg_accesses
    );
    println!("Most requested:");
    for (id, count) in &stats.most_common {
        println!("  {id:>5}  {count}");
    }
    Ok(())
}

fn split(args: SplitArgs) -> Result<()> {
    let summary = split_into_texts(&args.input, &args.out, args.words, args.count)?;
    println!(
        "Wrote {} texts ({} words) to {}",
        summary.files,
        summary.words_written,
        args.out.display()
    );
    Ok(())
}
