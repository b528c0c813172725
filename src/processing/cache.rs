use crate::core::{Position, LOCATIONS_CACHE_MAX_SIZE};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Fixed-capacity FIFO of recent positions feeding the horizon request
pub struct BoundedPositionCache {
    /// Positions ordered oldest to newest
    positions: Mutex<VecDeque<Position>>,
    /// Maximum number of retained positions
    capacity: usize,
}

impl Default for BoundedPositionCache {
    fn default() -> Self {
        Self::with_capacity(LOCATIONS_CACHE_MAX_SIZE)
    }
}

impl BoundedPositionCache {
    /// Create a cache holding the default number of positions
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache with a custom capacity (at least one slot)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            positions: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append a position, evicting the oldest one when full
    pub fn push(&self, position: Position) {
        let mut positions = self.positions.lock().unwrap_or_else(|e| e.into_inner());
        if positions.len() == self.capacity {
            positions.pop_front();
        }
        positions.push_back(position);
    }

    /// Copy of the current contents, oldest first
    pub fn snapshot(&self) -> Vec<Position> {
        self.positions
            .lock()
            .map(|p| p.iter().copied().collect())
            .unwrap_or_else(|e| e.into_inner().iter().copied().collect())
    }

    /// Drop all cached positions
    pub fn clear(&self) {
        self.positions.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn len(&self) -> usize {
        self.positions.lock().map(|p| p.len()).unwrap_or_else(|e| e.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
