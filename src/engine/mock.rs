//! Mock engine and navigator for testing and simulation

use crate::core::{FixLocation, NavigationStatus, Position, RawFix};
use crate::engine::{EngineError, EngineResult, HorizonResult, MapMatchEngine, Navigator};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Scriptable [`MapMatchEngine`] that records every call
///
/// Without a scripted status the engine "snaps" the last ingested fix by
/// adding a fixed offset to its coordinate.
pub struct MockEngine {
    updates: Mutex<Vec<RawFix>>,
    scripted_status: Mutex<Option<NavigationStatus>>,
    snap_offset: Mutex<Position>,
    fail_status: AtomicBool,
    status_calls: Mutex<Vec<(SystemTime, Duration)>>,
    horizon_requests: Mutex<Vec<String>>,
    horizon_response: Mutex<HorizonResult>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self {
            updates: Mutex::new(Vec::new()),
            scripted_status: Mutex::new(None),
            snap_offset: Mutex::new(Position::new(0.0, 0.0)),
            fail_status: AtomicBool::new(false),
            status_calls: Mutex::new(Vec::new()),
            horizon_requests: Mutex::new(Vec::new()),
            horizon_response: Mutex::new(HorizonResult::success(r#"{"edges":[]}"#)),
        }
    }
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer `retrieve_status` with `status`
    pub fn set_status(&self, status: NavigationStatus) {
        *lock(&self.scripted_status) = Some(status);
    }

    /// Offset added to the last fix when no status is scripted
    pub fn set_snap_offset(&self, offset: Position) {
        *lock(&self.snap_offset) = offset;
    }

    /// Make `retrieve_status` fail
    pub fn fail_status(&self, fail: bool) {
        self.fail_status.store(fail, Ordering::SeqCst);
    }

    pub fn set_horizon_response(&self, response: HorizonResult) {
        *lock(&self.horizon_response) = response;
    }

    pub fn updates(&self) -> Vec<RawFix> {
        lock(&self.updates).clone()
    }

    pub fn status_calls(&self) -> Vec<(SystemTime, Duration)> {
        lock(&self.status_calls).clone()
    }

    pub fn horizon_requests(&self) -> Vec<String> {
        lock(&self.horizon_requests).clone()
    }

    /// Poll until at least `count` fixes were ingested or `timeout` elapses
    pub fn wait_for_updates(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if lock(&self.updates).len() >= count {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        lock(&self.updates).len() >= count
    }
}

impl MapMatchEngine for MockEngine {
    fn update_location(&self, fix: &RawFix) {
        lock(&self.updates).push(fix.clone());
    }

    fn retrieve_status(&self, at: SystemTime, lag: Duration) -> EngineResult<NavigationStatus> {
        lock(&self.status_calls).push((at, lag));

        if self.fail_status.load(Ordering::SeqCst) {
            return Err(EngineError::Native {
                code: -1,
                description: "Simulated status failure".to_string(),
            });
        }
        if let Some(status) = lock(&self.scripted_status).clone() {
            return Ok(status);
        }

        let last = lock(&self.updates).last().cloned().ok_or_else(|| {
            EngineError::StatusUnavailable {
                reason: "no fix ingested".to_string(),
            }
        })?;
        let offset = *lock(&self.snap_offset);
        let time_ms = (at + lag)
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        Ok(NavigationStatus {
            location: FixLocation {
                coordinate: Position::new(
                    last.latitude + offset.latitude,
                    last.longitude + offset.longitude,
                ),
                time_ms,
                speed: last.speed,
                bearing: last.bearing,
                altitude: last.altitude.map(|a| a as f32),
                accuracy: last.accuracy,
                provider: last.provider,
            },
        })
    }

    fn retrieve_electronic_horizon(&self, request: &str) -> HorizonResult {
        lock(&self.horizon_requests).push(request.to_string());
        lock(&self.horizon_response).clone()
    }
}

/// In-memory [`Navigator`] echoing the last ingested fix as its status
#[derive(Default)]
pub struct MockNavigator {
    fixes: Vec<FixLocation>,
    status_times: Vec<u64>,
    horizon_requests: Vec<String>,
    fail_updates: bool,
}

impl MockNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_updates(&mut self, fail: bool) {
        self.fail_updates = fail;
    }

    pub fn fixes(&self) -> &[FixLocation] {
        &self.fixes
    }

    pub fn status_times(&self) -> &[u64] {
        &self.status_times
    }

    pub fn horizon_requests(&self) -> &[String] {
        &self.horizon_requests
    }
}

impl Navigator for MockNavigator {
    fn update_location(&mut self, fix: FixLocation) -> EngineResult<()> {
        if self.fail_updates {
            return Err(EngineError::Native {
                code: 1,
                description: "Simulated update failure".to_string(),
            });
        }
        self.fixes.push(fix);
        Ok(())
    }

    fn get_status(&mut self, time_ms: u64) -> EngineResult<NavigationStatus> {
        self.status_times.push(time_ms);
        let mut location = self
            .fixes
            .last()
            .cloned()
            .ok_or_else(|| EngineError::StatusUnavailable {
                reason: "no fix ingested".to_string(),
            })?;
        location.time_ms = time_ms;
        location.provider = "map_matched".to_string();
        Ok(NavigationStatus { location })
    }

    fn get_electronic_horizon(&mut self, request: &str) -> HorizonResult {
        self.horizon_requests.push(request.to_string());
        HorizonResult::success(r#"{"edges":[]}"#)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
