//! Free-drive location scheduler
//!
//! Ingests raw fixes from a [`LocationSource`], forwards them to the
//! map-matching engine and runs two recurring tasks on a shared executor:
//!
//! - **enhanced-location**: map-matches the latest raw fix and dispatches it
//! - **electronic-horizon**: requests a forward horizon built from the most
//!   recent positions and logs the engine's answer
//!
//! # Lifecycle
//!
//! ```text
//!            start()                       kill()
//!   Idle ─────────────▶ Running ───────────────────▶ Terminated
//!    ▲                     │
//!    └──────── stop() ─────┘
//! ```
//!
//! Swapping the location source or request while running stops, applies the
//! change and starts again, so the new source is subscribed seamlessly.
//!
//! # Known race
//!
//! `stop()` does not wait for an in-flight tick. A tick that already started
//! may still dispatch one event after `stop()` returns.

use crate::api::callback::NavigationEventDispatcher;
use crate::api::tasks::{PeriodicTaskPair, TaskKind, TickFn};
use crate::api::types::{SchedulerError, SchedulerResult, SchedulerState};
use crate::core::{EnhancedLocation, Position, RawFix};
use crate::engine::{ElectronicHorizonRequest, Expansion, HorizonResult, MapMatchEngine};
use crate::location::{LocationCallback, LocationError, LocationRequest, LocationSource};
use crate::processing::{BoundedPositionCache, RawFixRegister};
use crate::utils::SchedulerConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::{debug, error, info, trace, warn};

/// State shared between the location callback and the recurring tasks
struct FreeDriveCore {
    engine: Arc<dyn MapMatchEngine>,
    dispatcher: Arc<dyn NavigationEventDispatcher>,
    raw_fix: RawFixRegister,
    positions: BoundedPositionCache,
    status_lag: Duration,
    expansion: Expansion,
    /// Set by `kill()`; fixes arriving afterwards are dropped
    terminated: AtomicBool,
}

impl FreeDriveCore {
    /// Record a fix and forward it to the engine on the executor
    fn on_location_changed(&self, fix: RawFix, executor: &Handle) {
        if self.terminated.load(Ordering::Acquire) {
            debug!("Free drive scheduler killed, dropping raw location");
            return;
        }
        trace!(
            latitude = fix.latitude,
            longitude = fix.longitude,
            "Raw location received"
        );
        self.raw_fix.set(fix.clone());
        self.positions.push(fix.position());

        let engine = Arc::clone(&self.engine);
        executor.spawn_blocking(move || engine.update_location(&fix));
    }

    /// Map-match the latest raw fix. `None` until a fix arrived or when the
    /// engine has no status.
    fn enhanced_location(&self, at: SystemTime) -> Option<EnhancedLocation> {
        let raw = self.raw_fix.get()?;
        match self.engine.retrieve_status(at, self.status_lag) {
            Ok(status) => Some(EnhancedLocation::from_status(&status, &raw)),
            Err(e) => {
                warn!(error = %e, "Navigation status unavailable, skipping enhanced location");
                None
            }
        }
    }

    fn enhanced_location_tick(&self) {
        if let Some(location) = self.enhanced_location(SystemTime::now()) {
            self.dispatcher.on_enhanced_location_update(location);
        }
    }

    fn electronic_horizon_request(&self) -> ElectronicHorizonRequest {
        ElectronicHorizonRequest::new(self.positions.snapshot(), self.expansion)
    }

    /// Request a horizon from the cached shape. The result is only logged.
    fn electronic_horizon_tick(&self) -> Option<HorizonResult> {
        let request = match self.electronic_horizon_request().to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize electronic horizon request");
                return None;
            }
        };
        debug!(request = %request, "Electronic horizon request");

        let result = self.engine.retrieve_electronic_horizon(&request);
        if result.success {
            debug!(json = %result.json, "Electronic horizon retrieved");
        } else {
            warn!(json = %result.json, "Electronic horizon request failed");
        }
        Some(result)
    }
}

/// Callback registered with the location source
///
/// Owned by the scheduler; holds only the shared core, never the scheduler.
struct FreeDriveLocationCallback {
    core: Arc<FreeDriveCore>,
    executor: Handle,
}

impl LocationCallback for FreeDriveLocationCallback {
    fn on_success(&self, fix: Option<RawFix>) {
        if let Some(fix) = fix {
            self.core.on_location_changed(fix, &self.executor);
        }
    }

    fn on_failure(&self, error: LocationError) {
        error!(error = %error, "Location source failure");
    }
}

/// Configuration change applied while the scheduler is stopped
enum Reconfiguration {
    Source(Arc<dyn LocationSource>),
    Request(LocationRequest),
}

/// Mutable lifecycle state, guarded by one lock
struct Lifecycle {
    source: Arc<dyn LocationSource>,
    request: LocationRequest,
    tasks: PeriodicTaskPair,
    executor: Option<Runtime>,
    terminated: bool,
}

/// Background scheduler for free-drive location tracking
pub struct FreeDriveScheduler {
    core: Arc<FreeDriveCore>,
    callback: Arc<dyn LocationCallback>,
    executor: Handle,
    config: SchedulerConfig,
    lifecycle: Mutex<Lifecycle>,
}

impl FreeDriveScheduler {
    /// Create an idle scheduler with its own executor
    pub fn new(
        source: Arc<dyn LocationSource>,
        request: LocationRequest,
        engine: Arc<dyn MapMatchEngine>,
        dispatcher: Arc<dyn NavigationEventDispatcher>,
        config: SchedulerConfig,
    ) -> SchedulerResult<Self> {
        config.validate()?;

        let runtime = Builder::new_multi_thread()
            .worker_threads(config.worker_threads)
            .thread_name("free-drive")
            .enable_all()
            .build()?;
        let executor = runtime.handle().clone();

        let core = Arc::new(FreeDriveCore {
            engine,
            dispatcher,
            raw_fix: RawFixRegister::new(),
            positions: BoundedPositionCache::with_capacity(config.position_cache_capacity),
            status_lag: config.status_lag(),
            expansion: config.horizon_expansion,
            terminated: AtomicBool::new(false),
        });
        let callback: Arc<dyn LocationCallback> = Arc::new(FreeDriveLocationCallback {
            core: Arc::clone(&core),
            executor: executor.clone(),
        });

        Ok(Self {
            core,
            callback,
            executor,
            lifecycle: Mutex::new(Lifecycle {
                source,
                request,
                tasks: PeriodicTaskPair::new(config.enhanced_location, config.electronic_horizon),
                executor: Some(runtime),
                terminated: false,
            }),
            config,
        })
    }

    /// Create a scheduler with the default free-drive cadences
    pub fn with_defaults(
        source: Arc<dyn LocationSource>,
        request: LocationRequest,
        engine: Arc<dyn MapMatchEngine>,
        dispatcher: Arc<dyn NavigationEventDispatcher>,
    ) -> SchedulerResult<Self> {
        Self::new(source, request, engine, dispatcher, SchedulerConfig::default())
    }

    /// Subscribe to location updates and start both recurring tasks.
    ///
    /// No-op when already running. Fails after `kill()` or when the location
    /// source refuses the subscription; no task is started in either case.
    pub fn start(&self) -> SchedulerResult<()> {
        let mut lifecycle = self.lock_lifecycle();
        self.start_locked(&mut lifecycle)
    }

    /// Unsubscribe, cancel both tasks and clear the position cache.
    /// No-op when idle.
    pub fn stop(&self) {
        let mut lifecycle = self.lock_lifecycle();
        self.stop_locked(&mut lifecycle);
    }

    /// Stop and shut the executor down. Terminal; repeated calls are no-ops.
    ///
    /// Waits up to the configured shutdown timeout for in-flight work.
    pub fn kill(&self) {
        let mut lifecycle = self.lock_lifecycle();
        self.core.terminated.store(true, Ordering::Release);
        self.stop_locked(&mut lifecycle);
        lifecycle.terminated = true;

        let Some(runtime) = lifecycle.executor.take() else {
            debug!("Free drive scheduler already killed");
            return;
        };
        // Blocking shutdown is not allowed from inside the runtime, e.g. when
        // killed from a dispatcher running on a tick thread
        if Handle::try_current().is_ok() {
            runtime.shutdown_background();
        } else {
            runtime.shutdown_timeout(self.config.shutdown_timeout());
        }
        info!("Free drive scheduler killed");
    }

    /// Replace the location source, re-subscribing if running
    pub fn update_location_source(&self, source: Arc<dyn LocationSource>) -> SchedulerResult<()> {
        self.reconfigure(Reconfiguration::Source(source))
    }

    /// Replace the location request, re-subscribing if running
    pub fn update_location_request(&self, request: LocationRequest) -> SchedulerResult<()> {
        self.reconfigure(Reconfiguration::Request(request))
    }

    /// Feed a location result directly, as the source callback would.
    /// A missing fix is ignored, as is every fix after `kill()`.
    pub fn on_location_changed(&self, fix: Option<RawFix>) {
        self.callback.on_success(fix);
    }

    pub fn state(&self) -> SchedulerState {
        let lifecycle = self.lock_lifecycle();
        if lifecycle.terminated {
            SchedulerState::Terminated
        } else if lifecycle.tasks.is_running(TaskKind::EnhancedLocation) {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    /// Request currently handed to the location source
    pub fn location_request(&self) -> LocationRequest {
        self.lock_lifecycle().request.clone()
    }

    /// Recent positions, oldest first
    pub fn cached_positions(&self) -> Vec<Position> {
        self.core.positions.snapshot()
    }

    pub fn last_raw_fix(&self) -> Option<RawFix> {
        self.core.raw_fix.get()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    fn start_locked(&self, lifecycle: &mut Lifecycle) -> SchedulerResult<()> {
        if lifecycle.terminated {
            warn!("Ignoring start on a killed free drive scheduler");
            return Err(SchedulerError::Terminated);
        }

        if !lifecycle.tasks.is_running(TaskKind::EnhancedLocation) {
            lifecycle
                .source
                .request_location_updates(&lifecycle.request, Arc::clone(&self.callback))?;

            let core = Arc::clone(&self.core);
            let tick: TickFn = Arc::new(move || core.enhanced_location_tick());
            lifecycle
                .tasks
                .start(TaskKind::EnhancedLocation, &self.executor, tick);
            info!(
                source = lifecycle.source.name(),
                interval_ms = lifecycle.request.interval_ms,
                "Free drive location updates started"
            );
        }

        if !lifecycle.tasks.is_running(TaskKind::ElectronicHorizon) {
            let core = Arc::clone(&self.core);
            let tick: TickFn = Arc::new(move || {
                core.electronic_horizon_tick();
            });
            lifecycle
                .tasks
                .start(TaskKind::ElectronicHorizon, &self.executor, tick);
            debug!("Electronic horizon polling started");
        }

        Ok(())
    }

    fn stop_locked(&self, lifecycle: &mut Lifecycle) {
        if lifecycle.tasks.is_running(TaskKind::EnhancedLocation) {
            lifecycle.source.remove_location_updates(&self.callback);
            lifecycle.tasks.stop(TaskKind::EnhancedLocation);
            info!(source = lifecycle.source.name(), "Free drive location updates stopped");
        }

        if lifecycle.tasks.stop(TaskKind::ElectronicHorizon) {
            debug!("Electronic horizon polling stopped");
        }
        // A restart must not reuse a stale history
        self.core.positions.clear();
    }

    /// Apply a configuration change inside a stop/start pair when running
    fn reconfigure(&self, change: Reconfiguration) -> SchedulerResult<()> {
        let mut lifecycle = self.lock_lifecycle();
        let was_running = lifecycle.tasks.is_running(TaskKind::EnhancedLocation);

        self.stop_locked(&mut lifecycle);
        match change {
            Reconfiguration::Source(source) => {
                debug!(
                    from = lifecycle.source.name(),
                    to = source.name(),
                    "Swapping location source"
                );
                lifecycle.source = source;
            }
            Reconfiguration::Request(request) => {
                debug!(interval_ms = request.interval_ms, "Updating location request");
                lifecycle.request = request;
            }
        }

        if was_running {
            self.start_locked(&mut lifecycle)
        } else {
            Ok(())
        }
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for FreeDriveScheduler {
    fn drop(&mut self) {
        self.kill();
    }
}
