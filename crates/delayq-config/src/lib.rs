// ============================================================================
// delayq Config - Centralized configuration management
// ============================================================================
//
// Configuration for the queue library and the queue-worker binary.
// Loaded from environment variables (and an optional .env file) with
// sensible defaults.
//
// ============================================================================

mod constants;
mod redis;
mod worker;

pub use constants::{LIST_SUFFIX, ZSET_SUFFIX};
pub use redis::RedisConfig;
pub use worker::WorkerConfig;

use anyhow::{Result, bail};
use constants::*;
use std::time::Duration;

/// Main configuration structure for delayq services
#[derive(Clone, Debug)]
pub struct QueueConfig {
    pub redis: RedisConfig,

    /// Period of both consumer poll loops, in milliseconds
    pub rate_limit_period_ms: u64,

    /// tracing filter directive (RUST_LOG)
    pub rust_log: String,

    pub worker: WorkerConfig,
}

impl QueueConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let redis = RedisConfig::from_env()?;
        let worker = WorkerConfig::from_env();

        let rate_limit_period_ms =
            parse_rate_limit_period(std::env::var("QUEUE_RATE_LIMIT_PERIOD_MS").ok())?;

        Ok(Self {
            redis,
            rate_limit_period_ms,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_RUST_LOG.to_string()),
            worker,
        })
    }

    /// Config with defaults for everything except the Redis URL
    pub fn with_redis_url(url: impl Into<String>) -> Self {
        Self {
            redis: RedisConfig::from_url(url),
            rate_limit_period_ms: DEFAULT_RATE_LIMIT_PERIOD_MS,
            rust_log: DEFAULT_RUST_LOG.to_string(),
            worker: WorkerConfig {
                topics: vec![DEFAULT_WORKER_TOPICS.to_string()],
            },
        }
    }

    pub fn rate_limit_period(&self) -> Duration {
        Duration::from_millis(self.rate_limit_period_ms)
    }
}

/// Unparseable values fall back to the default; an explicit zero is an error
fn parse_rate_limit_period(raw: Option<String>) -> Result<u64> {
    let period = raw
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RATE_LIMIT_PERIOD_MS);
    if period == 0 {
        bail!("QUEUE_RATE_LIMIT_PERIOD_MS must be greater than zero");
    }
    Ok(period)
}
