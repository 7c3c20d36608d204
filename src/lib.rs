//! Gencache - An in-process caching engine
//!
//! Provides FIFO, LRU and timed eviction over a shared store skeleton, a
//! background prune scheduler, and a two-tier generational cache.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheStore, GenerationalCache, TimedCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tasks::{PruneHandle, PruneScheduler};
