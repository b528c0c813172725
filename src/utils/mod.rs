//! Utility modules for configuration and logging

pub mod config;
pub mod logging;

pub use config::{ConfigError, SchedulerConfig, TaskTiming};
pub use logging::init_logging;
