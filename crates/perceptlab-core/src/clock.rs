//! Monotonic time source for reaction-time measurement.
//!
//! Latency is a pure subtraction of two monotonic readings taken
//! synchronously at stimulus exposure and at response. Wall-clock time is
//! never used for latency (clock adjustments would skew it), only for
//! record-keeping timestamps.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A monotonic clock: readings since an arbitrary fixed origin.
pub trait Clock: Send + Sync {
    fn elapsed(&self) -> Duration;
}

/// Production clock backed by [`std::time::Instant`].
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for MonotonicClock {
    fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A manually advanced clock for deterministic tests and simulation.
///
/// Cloning shares the underlying reading, so a copy handed to a controller
/// can still be advanced from the outside.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `step`.
    pub fn advance(&self, step: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += step;
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        *self.now.lock().unwrap()
    }
}
