//! Event dispatch to navigation subscribers
//!
//! The scheduler hands every map-matched location to a single
//! [`NavigationEventDispatcher`]. Ticks run on executor threads, so a
//! dispatcher that needs a specific thread (a UI loop for instance) should use
//! [`ChannelDispatcher`] and drain the receiver on that thread.

use crate::core::EnhancedLocation;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;

/// Receiver of navigation events produced by the scheduler
pub trait NavigationEventDispatcher: Send + Sync {
    /// A new map-matched location is available
    fn on_enhanced_location_update(&self, location: EnhancedLocation);
}

/// Navigation events forwarded through a [`ChannelDispatcher`]
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationEvent {
    EnhancedLocationUpdate(EnhancedLocation),
}

/// Callback function type for enhanced location updates
pub type EnhancedLocationCallback = Box<dyn Fn(EnhancedLocation) + Send + Sync>;

/// Callback registration handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackHandle(u32);

impl CallbackHandle {
    pub fn id(&self) -> u32 {
        self.0
    }
}

type SharedCallback = Arc<dyn Fn(EnhancedLocation) + Send + Sync>;

/// Dispatcher fanning events out to registered callbacks
///
/// Callbacks run on the thread delivering the event, outside the registry
/// lock, so a callback may register or unregister callbacks itself. Changes
/// made during a dispatch apply from the next event on.
#[derive(Default)]
pub struct CallbackDispatcher {
    counter: AtomicU32,
    callbacks: RwLock<HashMap<CallbackHandle, SharedCallback>>,
}

impl CallbackDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for enhanced location updates
    pub fn register(&self, callback: EnhancedLocationCallback) -> CallbackHandle {
        let handle = CallbackHandle(self.counter.fetch_add(1, Ordering::Relaxed) + 1);
        self.callbacks
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(handle, Arc::from(callback));
        handle
    }

    /// Unregister a callback. Returns false for unknown handles.
    pub fn unregister(&self, handle: CallbackHandle) -> bool {
        self.callbacks
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&handle)
            .is_some()
    }

    pub fn callback_count(&self) -> usize {
        self.callbacks.read().map(|c| c.len()).unwrap_or(0)
    }
}

impl NavigationEventDispatcher for CallbackDispatcher {
    fn on_enhanced_location_update(&self, location: EnhancedLocation) {
        let callbacks: Vec<SharedCallback> = self
            .callbacks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        for callback in callbacks {
            callback(location.clone());
        }
    }
}

/// Dispatcher handing events over to another thread through a channel
pub struct ChannelDispatcher {
    sender: Mutex<Sender<NavigationEvent>>,
}

impl ChannelDispatcher {
    /// Create a dispatcher and the receiver to drain on the consuming thread
    pub fn new() -> (Self, Receiver<NavigationEvent>) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender: Mutex::new(sender) }, receiver)
    }
}

impl NavigationEventDispatcher for ChannelDispatcher {
    fn on_enhanced_location_update(&self, location: EnhancedLocation) {
        let sender = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        if sender
            .send(NavigationEvent::EnhancedLocationUpdate(location))
            .is_err()
        {
            debug!("Navigation event receiver dropped, event discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FixLocation, NavigationStatus, Position, RawFix};
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use std::time::Duration;

    fn enhanced(lat: f64) -> EnhancedLocation {
        let status = NavigationStatus {
            location: FixLocation {
                coordinate: Position::new(lat, 0.0),
                time_ms: 1,
                speed: None,
                bearing: None,
                altitude: None,
                accuracy: None,
                provider: String::from("map_matched"),
            },
        };
        EnhancedLocation::from_status(&status, &RawFix::new(0.0, 0.0, 0))
    }

    #[test]
    fn test_callbacks_registered_and_unregistered() {
        let dispatcher = CallbackDispatcher::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&received);
        let first = dispatcher.register(Box::new(move |loc| {
            sink.lock().unwrap().push(loc.location().latitude);
        }));
        let sink = Arc::clone(&received);
        let second = dispatcher.register(Box::new(move |loc| {
            sink.lock().unwrap().push(loc.location().latitude * 10.0);
        }));
        assert_ne!(first, second);
        assert_eq!(dispatcher.callback_count(), 2);

        dispatcher.on_enhanced_location_update(enhanced(1.0));
        assert!(dispatcher.unregister(second));
        assert!(!dispatcher.unregister(second));
        dispatcher.on_enhanced_location_update(enhanced(2.0));

        let mut values = received.lock().unwrap().clone();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(values, vec![1.0, 2.0, 10.0]);
    }

    #[test]
    fn test_callback_can_unregister_itself() {
        let dispatcher = Arc::new(CallbackDispatcher::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let own_handle = Arc::new(Mutex::new(None));

        let registry = Arc::clone(&dispatcher);
        let counter = Arc::clone(&calls);
        let slot = Arc::clone(&own_handle);
        let handle = dispatcher.register(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Some(handle) = slot.lock().unwrap().take() {
                registry.unregister(handle);
            }
        }));
        *own_handle.lock().unwrap() = Some(handle);

        let (done_tx, done_rx) = mpsc::channel();
        let target = Arc::clone(&dispatcher);
        thread::spawn(move || {
            target.on_enhanced_location_update(enhanced(1.0));
            target.on_enhanced_location_update(enhanced(2.0));
            let _ = done_tx.send(());
        });

        assert!(done_rx.recv_timeout(Duration::from_secs(2)).is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.callback_count(), 0);
    }

    #[test]
    fn test_callback_registered_during_dispatch_runs_next_time() {
        let dispatcher = Arc::new(CallbackDispatcher::new());
        let late_calls = Arc::new(AtomicUsize::new(0));

        let registry = Arc::clone(&dispatcher);
        let counter = Arc::clone(&late_calls);
        dispatcher.register(Box::new(move |_| {
            if registry.callback_count() == 1 {
                let counter = Arc::clone(&counter);
                registry.register(Box::new(move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }));
            }
        }));

        dispatcher.on_enhanced_location_update(enhanced(1.0));
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);
        dispatcher.on_enhanced_location_update(enhanced(2.0));
        assert_eq!(late_calls.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.callback_count(), 2);
    }

    #[test]
    fn test_channel_dispatcher_delivers_in_order() {
        let (dispatcher, receiver) = ChannelDispatcher::new();

        dispatcher.on_enhanced_location_update(enhanced(1.0));
        dispatcher.on_enhanced_location_update(enhanced(2.0));

        let latitudes: Vec<f64> = receiver
            .try_iter()
            .map(|NavigationEvent::EnhancedLocationUpdate(loc)| loc.location().latitude)
            .collect();
        assert_eq!(latitudes, vec![1.0, 2.0]);
    }

    #[test]
    fn test_channel_dispatcher_survives_dropped_receiver() {
        let (dispatcher, receiver) = ChannelDispatcher::new();
        drop(receiver);

        dispatcher.on_enhanced_location_update(enhanced(1.0));
    }
}
