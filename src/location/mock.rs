//! Mock location source for testing and simulation

use crate::core::RawFix;
use crate::location::{
    same_callback, LocationCallback, LocationError, LocationRequest, LocationResult, LocationSource,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Location source driven by hand
///
/// Fixes are pushed with [`MockLocationSource::emit`] and delivered
/// synchronously to every subscribed callback on the calling thread.
pub struct MockLocationSource {
    name: String,
    subscriptions: Mutex<Vec<(LocationRequest, Arc<dyn LocationCallback>)>>,
    request_count: AtomicUsize,
    removal_count: AtomicUsize,
    fail_next_request: Mutex<Option<LocationError>>,
}

impl MockLocationSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subscriptions: Mutex::new(Vec::new()),
            request_count: AtomicUsize::new(0),
            removal_count: AtomicUsize::new(0),
            fail_next_request: Mutex::new(None),
        }
    }

    /// Deliver a fix to all subscribers
    pub fn emit(&self, fix: RawFix) {
        for callback in self.callbacks() {
            callback.on_success(Some(fix.clone()));
        }
    }

    /// Deliver a result without a fix
    pub fn emit_empty(&self) {
        for callback in self.callbacks() {
            callback.on_success(None);
        }
    }

    /// Deliver a failure to all subscribers
    pub fn emit_failure(&self, error: LocationError) {
        for callback in self.callbacks() {
            callback.on_failure(error.clone());
        }
    }

    /// Make the next subscription attempt fail with `error`
    pub fn fail_next_request(&self, error: LocationError) {
        *self.fail_next_request.lock().unwrap_or_else(|e| e.into_inner()) = Some(error);
    }

    /// Number of active subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Number of successful `request_location_updates` calls
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Number of `remove_location_updates` calls that removed a subscription
    pub fn removal_count(&self) -> usize {
        self.removal_count.load(Ordering::SeqCst)
    }

    /// Request used by the most recent active subscription
    pub fn last_request(&self) -> Option<LocationRequest> {
        self.subscriptions
            .lock()
            .ok()
            .and_then(|s| s.last().map(|(request, _)| request.clone()))
    }

    fn callbacks(&self) -> Vec<Arc<dyn LocationCallback>> {
        self.subscriptions
            .lock()
            .map(|s| s.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default()
    }
}

impl Default for MockLocationSource {
    fn default() -> Self {
        Self::new("mock")
    }
}

impl LocationSource for MockLocationSource {
    fn request_location_updates(
        &self,
        request: &LocationRequest,
        callback: Arc<dyn LocationCallback>,
    ) -> LocationResult<()> {
        if let Some(error) = self
            .fail_next_request
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            return Err(error);
        }

        let mut subscriptions = self.subscriptions.lock().unwrap_or_else(|e| e.into_inner());
        let existing = subscriptions
            .iter()
            .position(|(_, cb)| same_callback(cb, &callback));
        match existing {
            // Re-registering a callback replaces its request
            Some(index) => subscriptions[index].0 = request.clone(),
            None => subscriptions.push((request.clone(), callback)),
        }
        self.request_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove_location_updates(&self, callback: &Arc<dyn LocationCallback>) {
        let mut subscriptions = self.subscriptions.lock().unwrap_or_else(|e| e.into_inner());
        let before = subscriptions.len();
        subscriptions.retain(|(_, cb)| !same_callback(cb, callback));
        if subscriptions.len() < before {
            self.removal_count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
