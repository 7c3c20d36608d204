//! Background Tasks Module
//!
//! Contains the shared worker pool that runs periodic prune tasks.
//!
//! # Tasks
//! - Scheduled prune: fixed-rate sweeps registered by timed caches

mod scheduler;

pub use scheduler::{PruneHandle, PruneScheduler, PruneTask, DEFAULT_PRUNE_WORKERS, MAX_PRUNE_DELAY_MS};
