//! Adapter from a raw navigator binding to the [`MapMatchEngine`] contract

use crate::core::{current_time_ms, FixLocation, NavigationStatus, RawFix};
use crate::engine::{EngineResult, HorizonResult, MapMatchEngine};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Raw binding to the native map-matching/routing engine
///
/// Implementations are not required to be re-entrant; the adapter serializes
/// every call.
pub trait Navigator: Send {
    /// Feed a fix into the engine
    fn update_location(&mut self, fix: FixLocation) -> EngineResult<()>;

    /// Engine status at `time_ms` (milliseconds since epoch)
    fn get_status(&mut self, time_ms: u64) -> EngineResult<NavigationStatus>;

    /// Electronic horizon for a JSON request
    fn get_electronic_horizon(&mut self, request: &str) -> HorizonResult;
}

/// Thread-safe engine built on a [`Navigator`]
pub struct MapMatchEngineAdapter<N: Navigator> {
    navigator: Mutex<N>,
}

impl<N: Navigator> MapMatchEngineAdapter<N> {
    pub fn new(navigator: N) -> Self {
        Self {
            navigator: Mutex::new(navigator),
        }
    }

    /// Run `f` with exclusive access to the navigator
    pub fn with_navigator<R>(&self, f: impl FnOnce(&mut N) -> R) -> R {
        let mut navigator = self.navigator.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut navigator)
    }

    /// Convert a raw fix into the engine's representation.
    ///
    /// The fix is stamped with the current time; zero readings mean "absent".
    fn build_fix_location(raw: &RawFix) -> FixLocation {
        FixLocation {
            coordinate: raw.position(),
            time_ms: current_time_ms(),
            speed: non_zero(raw.speed),
            bearing: non_zero(raw.bearing),
            altitude: non_zero(raw.altitude.map(|a| a as f32)),
            accuracy: non_zero(raw.accuracy),
            provider: raw.provider.clone(),
        }
    }
}

fn non_zero(value: Option<f32>) -> Option<f32> {
    value.filter(|v| *v != 0.0)
}

impl<N: Navigator> MapMatchEngine for MapMatchEngineAdapter<N> {
    fn update_location(&self, fix: &RawFix) {
        let fix_location = Self::build_fix_location(fix);
        if let Err(e) = self.with_navigator(|n| n.update_location(fix_location)) {
            debug!(error = %e, "Navigator rejected location update");
        }
    }

    fn retrieve_status(&self, at: SystemTime, lag: Duration) -> EngineResult<NavigationStatus> {
        // Ask for a point slightly in the future to account for location service lag
        let target = if lag > Duration::ZERO {
            at.checked_add(lag).unwrap_or(at)
        } else {
            at
        };
        let time_ms = target
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        self.with_navigator(|n| n.get_status(time_ms))
    }

    fn retrieve_electronic_horizon(&self, request: &str) -> HorizonResult {
        self.with_navigator(|n| n.get_electronic_horizon(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineError, MockNavigator};

    #[test]
    fn test_status_requested_ahead_by_lag() {
        let adapter = MapMatchEngineAdapter::new(MockNavigator::new());
        let at = UNIX_EPOCH + Duration::from_millis(10_000);

        let _ = adapter.retrieve_status(at, Duration::from_millis(1_500));
        let _ = adapter.retrieve_status(at, Duration::ZERO);

        let times = adapter.with_navigator(|n| n.status_times().to_vec());
        assert_eq!(times, vec![11_500, 10_000]);
    }

    #[test]
    fn test_update_location_drops_zero_readings() {
        let adapter = MapMatchEngineAdapter::new(MockNavigator::new());
        let raw = RawFix::new(1.0, 2.0, 5)
            .with_bearing(0.0)
            .with_speed(3.0)
            .with_altitude(0.0)
            .with_accuracy(4.0)
            .with_provider("fused");

        adapter.update_location(&raw);

        let fixes = adapter.with_navigator(|n| n.fixes().to_vec());
        assert_eq!(fixes.len(), 1);
        let fix = &fixes[0];
        assert_eq!(fix.coordinate.latitude, 1.0);
        assert_eq!(fix.coordinate.longitude, 2.0);
        assert_eq!(fix.bearing, None);
        assert_eq!(fix.speed, Some(3.0));
        assert_eq!(fix.altitude, None);
        assert_eq!(fix.accuracy, Some(4.0));
        assert_eq!(fix.provider, "fused");
        assert!(fix.time_ms > 5);
    }

    #[test]
    fn test_status_reflects_last_fix() {
        let adapter = MapMatchEngineAdapter::new(MockNavigator::new());
        assert!(matches!(
            adapter.retrieve_status(SystemTime::now(), Duration::ZERO),
            Err(EngineError::StatusUnavailable { .. })
        ));

        adapter.update_location(&RawFix::new(48.1, 11.5, 1).with_bearing(90.0));
        let status = adapter.retrieve_status(SystemTime::now(), Duration::ZERO).unwrap();
        assert_eq!(status.location.coordinate.latitude, 48.1);
        assert_eq!(status.location.bearing, Some(90.0));
    }

    #[test]
    fn test_update_failure_is_swallowed() {
        let mut navigator = MockNavigator::new();
        navigator.fail_updates(true);
        let adapter = MapMatchEngineAdapter::new(navigator);

        adapter.update_location(&RawFix::new(1.0, 1.0, 1));

        assert!(adapter.with_navigator(|n| n.fixes().is_empty()));
    }
}
