//! Configuration Module
//!
//! Handles loading cache engine configuration from environment variables or JSON.

use std::env;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Cache engine configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries a bounded store can hold (0 = unbounded)
    pub capacity: usize,
    /// Default TTL in milliseconds for entries without explicit TTL (0 = never expires)
    pub default_ttl_ms: u64,
    /// Number of worker threads in the shared prune pool
    pub prune_workers: usize,
    /// Interval in milliseconds between scheduled prunes of timed caches
    pub prune_interval_ms: u64,
    /// Soft capacity of the generational cache's eden tier
    pub eden_threshold: usize,
    /// Hard capacity of the generational cache's longterm tier
    pub longterm_capacity: usize,
    /// Whether reads refresh an entry's last access time
    pub refresh_on_read: bool,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum entries per bounded store (default: 1000)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 0)
    /// - `CACHE_PRUNE_WORKERS` - Prune pool size (default: 16)
    /// - `CACHE_PRUNE_INTERVAL_MS` - Scheduled prune period (default: 1000)
    /// - `CACHE_EDEN_THRESHOLD` - Eden soft capacity (default: 1000)
    /// - `CACHE_LONGTERM_CAPACITY` - Longterm hard capacity (default: 10000)
    /// - `CACHE_REFRESH_ON_READ` - Refresh last access on reads (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            capacity: env_or("CACHE_CAPACITY", defaults.capacity),
            default_ttl_ms: env_or("CACHE_DEFAULT_TTL_MS", defaults.default_ttl_ms),
            prune_workers: env_or("CACHE_PRUNE_WORKERS", defaults.prune_workers),
            prune_interval_ms: env_or("CACHE_PRUNE_INTERVAL_MS", defaults.prune_interval_ms),
            eden_threshold: env_or("CACHE_EDEN_THRESHOLD", defaults.eden_threshold),
            longterm_capacity: env_or("CACHE_LONGTERM_CAPACITY", defaults.longterm_capacity),
            refresh_on_read: env_or("CACHE_REFRESH_ON_READ", defaults.refresh_on_read),
        }
    }

    /// Parses a JSON document. Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            default_ttl_ms: 0,
            prune_workers: 16,
            prune_interval_ms: 1000,
            eden_threshold: 1000,
            longterm_capacity: 10_000,
            refresh_on_read: true,
        }
    }
}
