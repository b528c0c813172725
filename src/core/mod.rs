//! Core types and constants for the free-drive location scheduler

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
