use crate::core::{
    ELECTRONIC_HORIZON_INITIAL_DELAY_MS, ELECTRONIC_HORIZON_PERIOD_MS,
    ENHANCED_LOCATION_INITIAL_DELAY_MS, ENHANCED_LOCATION_PERIOD_MS, LOCATIONS_CACHE_MAX_SIZE,
    STATUS_LAG_MS,
};
use crate::engine::Expansion;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Invalid parameter value
    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidParameter { parameter: String, value: String, reason: String },
    /// Configuration file I/O error
    #[error("{message}")]
    IoError { message: String },
    /// JSON serialization/deserialization error
    #[error("{message}")]
    SerializationError { message: String },
}

/// Initial delay and period of a recurring task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTiming {
    /// Delay before the first run (milliseconds)
    pub initial_delay_ms: u64,
    /// Interval between runs (milliseconds)
    pub period_ms: u64,
}

impl TaskTiming {
    pub fn new(initial_delay_ms: u64, period_ms: u64) -> Self {
        Self { initial_delay_ms, period_ms }
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

/// Scheduler configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Cadence of map-matched location dispatch
    pub enhanced_location: TaskTiming,
    /// Cadence of electronic horizon requests
    pub electronic_horizon: TaskTiming,
    /// Lag passed to the engine when retrieving status (milliseconds)
    pub status_lag_ms: u64,
    /// Number of recent positions used as horizon shape
    pub position_cache_capacity: usize,
    /// Expansion requested for the horizon
    pub horizon_expansion: Expansion,
    /// Worker threads of the shared executor
    pub worker_threads: usize,
    /// Maximum wait for executor shutdown on kill (milliseconds)
    pub shutdown_timeout_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enhanced_location: TaskTiming::new(
                ENHANCED_LOCATION_INITIAL_DELAY_MS,
                ENHANCED_LOCATION_PERIOD_MS,
            ),
            electronic_horizon: TaskTiming::new(
                ELECTRONIC_HORIZON_INITIAL_DELAY_MS,
                ELECTRONIC_HORIZON_PERIOD_MS,
            ),
            status_lag_ms: STATUS_LAG_MS,
            position_cache_capacity: LOCATIONS_CACHE_MAX_SIZE,
            horizon_expansion: Expansion::OneD,
            worker_threads: 2,
            shutdown_timeout_ms: 2_000,
        }
    }
}

impl SchedulerConfig {
    /// Load configuration from a JSON file. Missing keys take default values.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
            message: format!("Failed to read config file '{}': {}", path_str, e),
        })?;

        let config: SchedulerConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::SerializationError {
                message: format!("Failed to parse config file '{}': {}", path_str, e),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializationError {
                message: format!("Failed to serialize config: {}", e),
            })?;

        fs::write(&path, content).map_err(|e| ConfigError::IoError {
            message: format!("Failed to write config file '{}': {}", path_str, e),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, timing) in [
            ("enhanced_location.period_ms", &self.enhanced_location),
            ("electronic_horizon.period_ms", &self.electronic_horizon),
        ] {
            if timing.period_ms == 0 {
                return Err(ConfigError::InvalidParameter {
                    parameter: name.to_string(),
                    value: timing.period_ms.to_string(),
                    reason: "Period must be positive".to_string(),
                });
            }
        }

        if self.position_cache_capacity == 0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "position_cache_capacity".to_string(),
                value: "0".to_string(),
                reason: "Cache must hold at least one position".to_string(),
            });
        }

        if self.worker_threads == 0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "worker_threads".to_string(),
                value: "0".to_string(),
                reason: "Executor needs at least one worker".to_string(),
            });
        }

        Ok(())
    }

    pub fn status_lag(&self) -> Duration {
        Duration::from_millis(self.status_lag_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::process;

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(format!("free_drive_{}_{}.json", name, process::id()))
    }

    #[test]
    fn test_defaults_match_free_drive_cadence() {
        let config = SchedulerConfig::default();

        assert_eq!(config.enhanced_location, TaskTiming::new(1_500, 1_000));
        assert_eq!(config.electronic_horizon, TaskTiming::new(20_000, 20_000));
        assert_eq!(config.status_lag(), Duration::from_millis(1_500));
        assert_eq!(config.position_cache_capacity, 5);
        assert_eq!(config.horizon_expansion, Expansion::OneD);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_period_rejected() {
        let config = SchedulerConfig {
            electronic_horizon: TaskTiming::new(0, 0),
            ..Default::default()
        };

        match config.validate() {
            Err(ConfigError::InvalidParameter { parameter, .. }) => {
                assert_eq!(parameter, "electronic_horizon.period_ms");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_zero_workers_and_capacity_rejected() {
        let no_workers = SchedulerConfig { worker_threads: 0, ..Default::default() };
        let no_cache = SchedulerConfig { position_cache_capacity: 0, ..Default::default() };

        assert!(no_workers.validate().is_err());
        assert!(no_cache.validate().is_err());
    }

    #[test]
    fn test_file_round_trip_with_partial_keys() {
        let path = temp_path("partial");
        fs::write(
            &path,
            r#"{"status_lag_ms": 750, "horizon_expansion": "1.5D", "enhanced_location": {"initial_delay_ms": 100, "period_ms": 200}}"#,
        )
        .unwrap();

        let config = SchedulerConfig::from_file(&path).unwrap();
        assert_eq!(config.status_lag_ms, 750);
        assert_eq!(config.horizon_expansion, Expansion::OneAndHalfD);
        assert_eq!(config.enhanced_location, TaskTiming::new(100, 200));
        assert_eq!(config.electronic_horizon, TaskTiming::new(20_000, 20_000));

        config.save_to_file(&path).unwrap();
        assert_eq!(SchedulerConfig::from_file(&path).unwrap(), config);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_and_malformed_files() {
        let missing = SchedulerConfig::from_file(temp_path("missing_never_written"));
        assert!(matches!(missing, Err(ConfigError::IoError { .. })));

        let path = temp_path("malformed");
        fs::write(&path, "{ not json").unwrap();
        let malformed = SchedulerConfig::from_file(&path);
        assert!(matches!(malformed, Err(ConfigError::SerializationError { .. })));
        let _ = fs::remove_file(&path);
    }
}
