//! Scheduling cadences and fixed parameters

/// Delay before the first enhanced-location tick (milliseconds)
pub const ENHANCED_LOCATION_INITIAL_DELAY_MS: u64 = 1_500;

/// Period between enhanced-location ticks (milliseconds)
pub const ENHANCED_LOCATION_PERIOD_MS: u64 = 1_000;

/// Delay before the first electronic-horizon tick (milliseconds)
pub const ELECTRONIC_HORIZON_INITIAL_DELAY_MS: u64 = 20_000;

/// Period between electronic-horizon ticks (milliseconds)
pub const ELECTRONIC_HORIZON_PERIOD_MS: u64 = 20_000;

/// Lag handed to the engine when retrieving status, same as active guidance
pub const STATUS_LAG_MS: u64 = 1_500;

/// Number of recent positions kept for horizon requests
pub const LOCATIONS_CACHE_MAX_SIZE: usize = 5;

/// Provider tag stamped on map-matched locations
pub const ENHANCED_PROVIDER: &str = "enhanced";
