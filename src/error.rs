//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror. Cache misses are not
//! errors; they surface as `None`.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// An iteration was advanced past its last live entry
    #[error("Iteration exhausted: no more live entries")]
    IteratorExhausted,

    /// The requested operation is not supported on this object
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// The prune scheduler no longer accepts tasks
    #[error("Prune scheduler is shut down")]
    SchedulerShutdown,

    /// The prune worker pool could not be started
    #[error("Failed to start prune scheduler: {0}")]
    SchedulerStart(String),

    /// Configuration could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::InvalidConfig(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
