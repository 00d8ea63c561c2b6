use std::convert::Infallible;
use std::hint::black_box;
use std::time::Duration;

use cachelab::builder::{CacheBuilder, CachePolicy};
use cachelab::traits::CoreCache;
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sim_support::workload::{AccessPattern, RequestGenerator};

const CAPACITY: usize = 1024;
const UNIVERSE: u64 = 8192;
const OPS: usize = 16_384;

fn load(k: &u64) -> Result<(u64, Duration), Infallible> {
    Ok((*k, Duration::ZERO))
}

fn generated_keys(pattern: AccessPattern, seed: u64) -> Vec<u64> {
    RequestGenerator::new(UNIVERSE, seed)
        .generate(&pattern, OPS)
        .expect("bench workload parameters are valid")
}

fn uniform_keys() -> Vec<u64> {
    generated_keys(AccessPattern::Random, 42)
}

/// 80% of requests go to the first 10% of keys.
fn hotset_keys() -> Vec<u64> {
    let hotset = AccessPattern::Weighted {
        hot_start: 1,
        hot_end: UNIVERSE / 10,
        hot_probability: 0.8,
    };
    generated_keys(hotset, 7)
}

/// Poisson around a mean well inside the capacity.
fn poisson_keys() -> Vec<u64> {
    generated_keys(AccessPattern::Poisson { lambda: 512.0 }, 11)
}

/// Hot keys interleaved with a one-pass scan that never repeats.
fn scan_keys() -> Vec<u64> {
    (0..OPS as u64)
        .map(|i| if i % 2 == 0 { i % 256 } else { UNIVERSE + i })
        .collect()
}

fn bench_get_or_load(c: &mut Criterion) {
    let workloads = [
        ("uniform", uniform_keys()),
        ("hotset", hotset_keys()),
        ("poisson", poisson_keys()),
        ("scan", scan_keys()),
    ];

    for (name, keys) in &workloads {
        let mut group = c.benchmark_group(format!("get_or_load/{name}"));
        group.throughput(Throughput::Elements(keys.len() as u64));
        for policy in CachePolicy::ALL {
            group.bench_with_input(BenchmarkId::from_parameter(policy), keys, |b, keys| {
                b.iter_batched(
                    || CacheBuilder::new(CAPACITY).build::<u64, u64>(policy).unwrap(),
                    |mut cache| {
                        for &k in keys {
                            let hit = cache.get(black_box(k), load).unwrap().hit;
                            black_box(hit);
                        }
                        cache
                    },
                    BatchSize::SmallInput,
                )
            });
        }
        group.finish();
    }
}

fn bench_hit_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("hit_path");
    for policy in CachePolicy::ALL {
        group.bench_function(BenchmarkId::from_parameter(policy), |b| {
            let mut cache = CacheBuilder::new(CAPACITY).build::<u64, u64>(policy).unwrap();
            for k in 0..CAPACITY as u64 {
                cache.get(k, load).unwrap();
            }
            let mut k = 0u64;
            b.iter(|| {
                k = (k + 1) % CAPACITY as u64;
                black_box(cache.get(black_box(k), load).unwrap().hit)
            });
        });
    }
    group.finish();
}

fn report_hit_rates(_c: &mut Criterion) {
    // prints hit rates, times nothing
    let keys = hotset_keys();
    for policy in CachePolicy::ALL {
        let mut cache = CacheBuilder::new(CAPACITY).build::<u64, u64>(policy).unwrap();
        for &k in &keys {
            cache.get(k, load).unwrap();
        }
        println!(
            "hotset {policy:<4} hit rate {:.2}%",
            cache.metrics().hit_percent()
        );
    }
}

criterion_group!(benches, bench_get_or_load, bench_hit_path, report_hit_rates);
criterion_main!(benches);
