//! Map-matching engine contract
//!
//! The scheduler talks to the routing engine through [`MapMatchEngine`]. The
//! engine itself is opaque; [`MapMatchEngineAdapter`] wraps a raw
//! [`Navigator`] binding and provides the contract on top of it.

pub mod adapter;
pub mod horizon;
pub mod mock;

pub use adapter::{MapMatchEngineAdapter, Navigator};
pub use horizon::{ElectronicHorizonRequest, Expansion, HorizonOptions};
pub use mock::{MockEngine, MockNavigator};

use crate::core::{NavigationStatus, RawFix};
use std::time::{Duration, SystemTime};
use thiserror::Error;

/// Engine failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// No status could be produced, e.g. no fix ingested yet
    #[error("navigation status unavailable: {reason}")]
    StatusUnavailable { reason: String },
    /// Native call failed
    #[error("native engine error {code}: {description}")]
    Native { code: i32, description: String },
}

/// Result type for engine calls
pub type EngineResult<T> = Result<T, EngineError>;

/// Outcome of an electronic horizon request
#[derive(Debug, Clone, PartialEq)]
pub struct HorizonResult {
    pub success: bool,
    pub json: String,
}

impl HorizonResult {
    pub fn success(json: impl Into<String>) -> Self {
        Self { success: true, json: json.into() }
    }

    pub fn failure(json: impl Into<String>) -> Self {
        Self { success: false, json: json.into() }
    }
}

/// Call surface of the map-matching engine used by the scheduler
pub trait MapMatchEngine: Send + Sync {
    /// Ingest a raw fix. Best effort; failures are not reported.
    fn update_location(&self, fix: &RawFix);

    /// Map-matched status at `at`, accounting for `lag` of engine buffering.
    /// Blocks for the duration of the native call.
    fn retrieve_status(&self, at: SystemTime, lag: Duration) -> EngineResult<NavigationStatus>;

    /// Request an electronic horizon for a serialized request.
    /// Blocks for the duration of the native call.
    fn retrieve_electronic_horizon(&self, request: &str) -> HorizonResult;
}
