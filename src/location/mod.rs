//! Location source abstraction
//!
//! The scheduler consumes raw fixes from a push-based provider. This module
//! defines the subscription contract, the request configuration handed to the
//! provider and a mock provider for tests and simulations.

pub mod source;
pub mod mock;
pub mod error;

pub use source::{LocationSource, LocationCallback, LocationRequest, Priority, same_callback};
pub use mock::MockLocationSource;
pub use error::{LocationError, LocationResult};
