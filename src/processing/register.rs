//! Single-slot holder for the latest raw fix

use crate::core::RawFix;
use std::sync::RwLock;

/// Last-writer-wins slot read by timer threads and written by the location callback
#[derive(Default)]
pub struct RawFixRegister {
    slot: RwLock<Option<RawFix>>,
}

impl RawFixRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored fix
    pub fn set(&self, fix: RawFix) {
        *self.slot.write().unwrap_or_else(|e| e.into_inner()) = Some(fix);
    }

    /// Latest fix, or `None` until the first one arrives
    pub fn get(&self) -> Option<RawFix> {
        self.slot
            .read()
            .map(|s| s.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_until_first_set() {
        let register = RawFixRegister::new();
        assert!(register.get().is_none());
    }

    #[test]
    fn test_set_overwrites() {
        let register = RawFixRegister::new();
        register.set(RawFix::new(1.0, 2.0, 10));
        register.set(RawFix::new(3.0, 4.0, 20).with_bearing(12.0));

        let fix = register.get().unwrap();
        assert_eq!(fix.latitude, 3.0);
        assert_eq!(fix.longitude, 4.0);
        assert_eq!(fix.bearing, Some(12.0));
        assert_eq!(fix.time_ms, 20);
    }
}
