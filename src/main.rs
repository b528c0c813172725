//! Simulated free drive
//!
//! Runs the scheduler against a mock location source and a mock navigator,
//! feeding a straight drive and printing map-matched locations received on the
//! main thread. An optional first argument names a JSON configuration file.

use free_drive::core::current_time_ms;
use free_drive::engine::MockNavigator;
use free_drive::utils::init_logging;
use free_drive::{
    ChannelDispatcher, FreeDriveScheduler, LocationRequest, MapMatchEngineAdapter,
    MockLocationSource, NavigationEvent, RawFix, SchedulerConfig, TaskTiming,
};
use std::env;
use std::error::Error;
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const DRIVE_STEPS: u32 = 40;
const FIX_INTERVAL: Duration = Duration::from_millis(250);
const START: (f64, f64) = (52.5200, 13.4050);
// Roughly 14 m/s heading north-east
const STEP_DEGREES: f64 = 0.00009;

fn demo_config() -> SchedulerConfig {
    SchedulerConfig {
        enhanced_location: TaskTiming::new(500, 1_000),
        electronic_horizon: TaskTiming::new(3_000, 3_000),
        ..Default::default()
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    if let Err(e) = init_logging("info,free_drive=debug") {
        eprintln!("Logging unavailable: {}", e);
    }

    let config = match env::args().nth(1) {
        Some(path) => SchedulerConfig::from_file(path)?,
        None => demo_config(),
    };
    info!(?config, "Starting simulated free drive");

    let source = Arc::new(MockLocationSource::new("simulated-gps"));
    let engine = Arc::new(MapMatchEngineAdapter::new(MockNavigator::new()));
    let (dispatcher, events) = ChannelDispatcher::new();

    let scheduler = FreeDriveScheduler::new(
        source.clone(),
        LocationRequest::new(FIX_INTERVAL.as_millis() as u64),
        engine,
        Arc::new(dispatcher),
        config,
    )?;
    scheduler.start()?;

    let feeder = {
        let source = Arc::clone(&source);
        thread::spawn(move || {
            for step in 0..DRIVE_STEPS {
                let offset = step as f64 * STEP_DEGREES;
                let fix = RawFix::new(START.0 + offset, START.1 + offset, current_time_ms())
                    .with_bearing(45.0)
                    .with_speed(14.0)
                    .with_accuracy(5.0);
                source.emit(fix);
                thread::sleep(FIX_INTERVAL);
            }
        })
    };

    let deadline = Instant::now() + FIX_INTERVAL * DRIVE_STEPS + Duration::from_secs(1);
    let mut received = 0;
    while Instant::now() < deadline {
        match events.recv_timeout(Duration::from_millis(100)) {
            Ok(NavigationEvent::EnhancedLocationUpdate(enhanced)) => {
                received += 1;
                let location = enhanced.location();
                info!(
                    latitude = location.latitude,
                    longitude = location.longitude,
                    bearing = ?location.bearing,
                    provider = %location.provider,
                    "Enhanced location"
                );
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    if feeder.join().is_err() {
        warn!("Location feeder thread panicked");
    }
    scheduler.kill();
    info!(received, "Simulated free drive finished");
    Ok(())
}
