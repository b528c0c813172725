//! Location source trait and request configuration

use crate::core::RawFix;
use crate::location::LocationResult;
use crate::location::LocationError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Receiver of location updates registered with a [`LocationSource`]
pub trait LocationCallback: Send + Sync {
    /// A location result arrived. The result may carry no fix.
    fn on_success(&self, fix: Option<RawFix>);

    /// The source failed to produce a location
    fn on_failure(&self, error: LocationError);
}

/// Push-based provider of positioning fixes
pub trait LocationSource: Send + Sync {
    /// Start delivering updates to `callback` according to `request`
    fn request_location_updates(
        &self,
        request: &LocationRequest,
        callback: Arc<dyn LocationCallback>,
    ) -> LocationResult<()>;

    /// Stop delivering updates to `callback`. Unknown callbacks are ignored.
    fn remove_location_updates(&self, callback: &Arc<dyn LocationCallback>);

    /// Short name used in logs
    fn name(&self) -> &str {
        "location-source"
    }
}

/// Identity comparison for registered callbacks
pub fn same_callback(a: &Arc<dyn LocationCallback>, b: &Arc<dyn LocationCallback>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// Accuracy/power trade-off requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    HighAccuracy,
    BalancedPowerAccuracy,
    LowPower,
    NoPower,
}

/// Update request handed to the location source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRequest {
    /// Desired interval between updates (milliseconds)
    pub interval_ms: u64,
    /// Fastest interval the consumer can handle (milliseconds)
    pub fastest_interval_ms: u64,
    /// Accuracy/power priority
    pub priority: Priority,
    /// Minimum displacement between updates (meters)
    pub displacement_m: f32,
    /// Maximum batching delay (milliseconds)
    pub max_wait_ms: u64,
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            fastest_interval_ms: 500,
            priority: Priority::HighAccuracy,
            displacement_m: 0.0,
            max_wait_ms: 0,
        }
    }
}

impl LocationRequest {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            fastest_interval_ms: interval_ms / 2,
            ..Default::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_fastest_interval(mut self, fastest_interval_ms: u64) -> Self {
        self.fastest_interval_ms = fastest_interval_ms;
        self
    }

    pub fn with_displacement(mut self, displacement_m: f32) -> Self {
        self.displacement_m = displacement_m;
        self
    }

    pub fn with_max_wait(mut self, max_wait_ms: u64) -> Self {
        self.max_wait_ms = max_wait_ms;
        self
    }
}
