//! Core data types for the free-drive scheduler

use crate::core::constants::ENHANCED_PROVIDER;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// 2D position in geodetic coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Raw positioning fix delivered by a location source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFix {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Bearing in degrees, if the source reported one
    pub bearing: Option<f32>,
    /// Speed in meters per second
    pub speed: Option<f32>,
    /// Altitude in meters
    pub altitude: Option<f64>,
    /// Horizontal accuracy in meters
    pub accuracy: Option<f32>,
    /// Fix time (milliseconds since epoch)
    pub time_ms: u64,
    /// Name of the provider that produced the fix
    pub provider: String,
}

impl RawFix {
    pub fn new(latitude: f64, longitude: f64, time_ms: u64) -> Self {
        Self {
            latitude,
            longitude,
            bearing: None,
            speed: None,
            altitude: None,
            accuracy: None,
            time_ms,
            provider: String::from("gps"),
        }
    }

    pub fn with_bearing(mut self, bearing: f32) -> Self {
        self.bearing = Some(bearing);
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn with_accuracy(mut self, accuracy: f32) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn position(&self) -> Position {
        Position::new(self.latitude, self.longitude)
    }
}

/// Fix as understood by the map-matching engine
#[derive(Debug, Clone, PartialEq)]
pub struct FixLocation {
    pub coordinate: Position,
    pub time_ms: u64,
    pub speed: Option<f32>,
    pub bearing: Option<f32>,
    pub altitude: Option<f32>,
    pub accuracy: Option<f32>,
    pub provider: String,
}

/// Map-matching status reported by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationStatus {
    /// Map-matched fix
    pub location: FixLocation,
}

/// Raw fix snapped onto the road network by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancedLocation {
    location: RawFix,
}

impl EnhancedLocation {
    /// Overlay the engine's map-matched fix onto the fallback raw fix.
    ///
    /// Coordinates and time always come from the status. The bearing is only
    /// replaced when the status carries one.
    pub fn from_status(status: &NavigationStatus, fallback: &RawFix) -> Self {
        let matched = &status.location;
        let mut location = fallback.clone();
        location.provider = ENHANCED_PROVIDER.to_string();
        location.latitude = matched.coordinate.latitude;
        location.longitude = matched.coordinate.longitude;
        if let Some(bearing) = matched.bearing {
            location.bearing = Some(bearing);
        }
        location.time_ms = matched.time_ms;
        Self { location }
    }

    pub fn location(&self) -> &RawFix {
        &self.location
    }

    pub fn into_inner(self) -> RawFix {
        self.location
    }
}

/// Current wall-clock time in milliseconds since epoch
pub fn current_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(lat: f64, lon: f64, bearing: Option<f32>, time_ms: u64) -> NavigationStatus {
        NavigationStatus {
            location: FixLocation {
                coordinate: Position::new(lat, lon),
                time_ms,
                speed: None,
                bearing,
                altitude: None,
                accuracy: None,
                provider: String::from("map_matched"),
            },
        }
    }

    #[test]
    fn test_enhanced_location_keeps_fallback_bearing() {
        let raw = RawFix::new(1.0, 2.0, 1_000).with_bearing(45.0).with_speed(12.5);
        let enhanced = EnhancedLocation::from_status(&status(1.001, 2.001, None, 2_000), &raw);
        let location = enhanced.location();

        assert_eq!(location.latitude, 1.001);
        assert_eq!(location.longitude, 2.001);
        assert_eq!(location.bearing, Some(45.0));
        assert_eq!(location.speed, Some(12.5));
        assert_eq!(location.time_ms, 2_000);
        assert_eq!(location.provider, ENHANCED_PROVIDER);
    }

    #[test]
    fn test_enhanced_location_takes_status_bearing() {
        let raw = RawFix::new(1.0, 2.0, 1_000).with_bearing(45.0);
        let enhanced = EnhancedLocation::from_status(&status(1.0, 2.0, Some(90.0), 1_500), &raw);

        assert_eq!(enhanced.location().bearing, Some(90.0));
    }

    #[test]
    fn test_position_serializes_short_keys() {
        let json = serde_json::to_string(&Position::new(1.5, -2.25)).unwrap();
        assert_eq!(json, r#"{"lat":1.5,"lon":-2.25}"#);
    }
}
