//! Location source error types

use thiserror::Error;

/// Failures reported by a location source
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    /// Provider is disabled or has no fix available
    #[error("location provider {provider} unavailable: {reason}")]
    Unavailable { provider: String, reason: String },
    /// Caller is not allowed to receive locations
    #[error("location permission denied")]
    PermissionDenied,
    /// Provider-specific failure
    #[error("location provider error {code}: {description}")]
    Provider { code: u32, description: String },
}

/// Result type for location source operations
pub type LocationResult<T> = Result<T, LocationError>;
