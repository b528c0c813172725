//! Scheduler API and event dispatch
//!
//! This module exposes the free-drive scheduler, the recurring task
//! primitives it runs on and the dispatchers delivering its events.

pub mod scheduler;
pub mod tasks;
pub mod callback;
pub mod types;

// Re-export commonly used API types
pub use types::{SchedulerError, SchedulerResult, SchedulerState};
pub use scheduler::FreeDriveScheduler;
pub use tasks::{PeriodicTask, PeriodicTaskPair, TaskKind, TaskStatus, TickFn};
pub use callback::{
    CallbackDispatcher, CallbackHandle, ChannelDispatcher, EnhancedLocationCallback,
    NavigationEvent, NavigationEventDispatcher,
};
