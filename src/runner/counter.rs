//! Shared iteration clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Iteration counter shared between the training worker and observers.
///
/// Starts at 1, so the value read during a step is that step's iteration
/// number. Only the worker advances it; readers may see a slightly stale
/// value.
#[derive(Debug, Clone)]
pub struct Counter {
    value: Arc<AtomicU64>,
}

impl Counter {
    /// Creates a counter at 1.
    pub fn new() -> Self {
        Self {
            value: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Current value.
    #[inline]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    /// Advances by one and returns the new value.
    #[inline]
    pub fn increment(&self) -> u64 {
        self.value.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Steps completed so far.
    #[inline]
    pub fn completed(&self) -> u64 {
        self.get() - 1
    }
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}
