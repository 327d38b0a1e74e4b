//! Monotonic time sources.
//!
//! All elapsed-time accounting runs against a [`Clock`], never the wall
//! clock. Wall-clock timestamps appear only on emitted events, for display.
//! [`MonotonicClock`] is the production source; [`ManualClock`] is a
//! deterministic double for tests and simulations.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A monotonic time source.
///
/// `now()` is non-decreasing and immune to wall-clock adjustments.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// The process monotonic clock (`std::time::Instant`).
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A hand-advanced clock for deterministic tests.
///
/// Clones share the same offset, so a clock handed to an engine can still
/// be advanced from the test body.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += delta;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.base + *offset
    }
}
