//! `fp bench`: wall-clock timings for one integer through the engine cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use fp_core::{Budget, Engine};
use num_bigint::BigUint;

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1e3
}

pub async fn run(
    engine: Arc<Engine>,
    n: BigUint,
    iterations: u64,
    rounds: u32,
    threads: usize,
) -> Result<()> {
    let budget = Budget::iterations(iterations);
    let rounds = rounds.max(1);

    let mut uncached = Vec::with_capacity(rounds as usize);
    let mut cached = Vec::with_capacity(rounds as usize);
    for _ in 0..rounds {
        engine.clear_cache();
        let start = Instant::now();
        let first = engine.factorize_with_budget(&n, budget);
        uncached.push(start.elapsed());

        let start = Instant::now();
        let again = engine.factorize_with_budget(&n, budget);
        cached.push(start.elapsed());
        debug_assert!(Arc::ptr_eq(&first, &again));
    }

    let result = engine.factorize_with_budget(&n, budget);
    println!("{result}");
    report("uncached", &uncached);
    report("cached", &cached);

    // Burst of identical requests against a cold cache.
    engine.clear_cache();
    let before = engine.cache_stats();
    let start = Instant::now();
    let handles: Vec<_> = (0..threads.max(1))
        .map(|_| {
            let engine = Arc::clone(&engine);
            let n = n.clone();
            tokio::task::spawn_blocking(move || engine.factorize_with_budget(&n, budget))
        })
        .collect();
    for handle in handles {
        handle.await.context("bench task failed")?;
    }
    let elapsed = start.elapsed();
    let after = engine.cache_stats();

    println!(
        "burst:      {} requests in {:.3}ms (computed {}, hits {}, joined {})",
        threads.max(1),
        millis(elapsed),
        after.misses - before.misses,
        after.hits - before.hits,
        after.joined - before.joined,
    );
    Ok(())
}

fn report(label: &str, samples: &[Duration]) {
    let total: Duration = samples.iter().sum();
    let min = samples.iter().min().copied().unwrap_or_default();
    let mean = total / u32::try_from(samples.len().max(1)).unwrap_or(u32::MAX);
    println!(
        "{:<11} min {:.3}ms, mean {:.3}ms over {} rounds",
        format!("{label}:"),
        millis(min),
        millis(mean),
        samples.len()
    );
}
