//! Shared position state fed by the location callback

pub mod cache;
pub mod register;

pub use cache::BoundedPositionCache;
pub use register::RawFixRegister;
