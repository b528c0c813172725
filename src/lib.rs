//! Free Drive Location Scheduler
//!
//! Background location tracking for passive, non-guided navigation: raw fixes
//! are fed to a map-matching engine, map-matched locations are dispatched on a
//! fixed cadence and an electronic horizon is requested periodically from the
//! most recent positions.

pub mod core;
pub mod processing;
pub mod location;
pub mod engine;
pub mod utils;
pub mod api;

// Re-export commonly used types
pub use core::{
    EnhancedLocation, FixLocation, NavigationStatus, Position, RawFix, ENHANCED_PROVIDER,
};
pub use processing::{BoundedPositionCache, RawFixRegister};
pub use location::{
    LocationCallback, LocationError, LocationRequest, LocationSource, MockLocationSource, Priority,
};
pub use engine::{
    MapMatchEngine, MapMatchEngineAdapter, Navigator, EngineError, HorizonResult,
    ElectronicHorizonRequest, Expansion, MockEngine,
};
pub use utils::{SchedulerConfig, TaskTiming, ConfigError};
pub use api::{
    FreeDriveScheduler, SchedulerError, SchedulerResult, SchedulerState,
    NavigationEventDispatcher, CallbackDispatcher, ChannelDispatcher, NavigationEvent,
};
