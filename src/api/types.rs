//! Common API types for the scheduler

use crate::location::LocationError;
use crate::utils::ConfigError;
use thiserror::Error;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler error types
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The scheduler was killed and cannot be restarted
    #[error("scheduler has been killed")]
    Terminated,
    /// Subscribing to the location source failed
    #[error("location subscription failed: {0}")]
    Location(#[from] LocationError),
    /// Invalid scheduler configuration
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The executor could not be built
    #[error("failed to build executor: {0}")]
    Executor(#[from] std::io::Error),
}

/// Lifecycle state of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No periodic task running
    Idle,
    /// Location updates subscribed and both periodic tasks running
    Running,
    /// Killed; no further start is accepted
    Terminated,
}
