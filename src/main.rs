//! ttl_lru soak runner
//!
//! Drives a shared cache from many concurrent workers on overlapping keys and
//! prints the final statistics as JSON.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttl_lru::config::parse_env;
use ttl_lru::{CacheConfig, LruCache};

/// Soak parameters on top of the cache config.
#[derive(Debug, Clone)]
struct SoakConfig {
    /// Number of concurrent workers
    workers: usize,
    /// Operations performed by each worker
    ops_per_worker: usize,
}

impl SoakConfig {
    /// Reads `SOAK_WORKERS` (default 8) and `SOAK_OPS` (default 10000).
    fn from_env() -> Self {
        Self {
            workers: parse_env("SOAK_WORKERS").unwrap_or(8),
            ops_per_worker: parse_env("SOAK_OPS").unwrap_or(10_000),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttl_lru=info,ttl_lru_soak=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env();
    let soak = SoakConfig::from_env();
    info!(
        "Configuration loaded: capacity={}, ttl_enabled={}, reclaim_interval={}ms, expire_on_read={}, workers={}, ops={}",
        config.capacity,
        config.ttl_enabled,
        config.reclaim_interval.as_millis(),
        config.expire_on_read,
        soak.workers,
        soak.ops_per_worker
    );

    let cache: Arc<LruCache<u64, u64>> =
        Arc::new(LruCache::from_config(&config).context("failed to build cache")?);

    let started = Instant::now();
    let key_space = (config.capacity as u64).saturating_mul(2).max(1);

    let mut workers = Vec::with_capacity(soak.workers);
    for worker in 0..soak.workers as u64 {
        let cache = Arc::clone(&cache);
        let ops = soak.ops_per_worker as u64;
        // Cache operations block on the store lock
        workers.push(tokio::task::spawn_blocking(move || {
            run_worker(&cache, worker, ops, key_space)
        }));
    }

    for worker in workers {
        worker
            .await
            .context("soak worker panicked")?
            .context("soak worker failed")?;
    }

    let elapsed = started.elapsed();
    let stats = cache.stats();
    info!(
        "Soak finished in {:?}: {} hits, {} misses ({:.1}% hit rate), {} evictions, {} expirations",
        elapsed,
        stats.hits,
        stats.misses,
        stats.hit_rate() * 100.0,
        stats.evictions,
        stats.expirations
    );

    println!(
        "{}",
        serde_json::to_string_pretty(&stats).context("failed to encode stats")?
    );

    cache.shutdown().await;
    info!("Soak runner shutdown complete");
    Ok(())
}

/// Mixed workload: half writes, the rest reads, membership checks and deletes.
fn run_worker(
    cache: &LruCache<u64, u64>,
    worker: u64,
    ops: u64,
    key_space: u64,
) -> ttl_lru::Result<()> {
    let ttl = Duration::from_millis(50 + worker * 10);

    for i in 0..ops {
        let key = (worker.wrapping_mul(7919) + i.wrapping_mul(31)) % key_space;
        match i % 8 {
            0..=3 => {
                if cache.is_ttl_enabled() {
                    cache.set_with_expiry(key, i, ttl)?;
                } else {
                    cache.set(key, i)?;
                }
            }
            4 | 5 => {
                cache.get(&key);
            }
            6 => {
                cache.contains(&key);
            }
            _ => {
                cache.del(&key);
            }
        }
    }
    Ok(())
}
