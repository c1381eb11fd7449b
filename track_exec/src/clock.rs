//! # Clocks
//!
//! The tracking loop reads time through the `Clock` trait so that the sampling gate can be driven
//! by a manual clock in tests.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::cell::Cell;
use std::thread;
use std::time::{Duration, Instant};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Longest single sleep, well inside the range of `Duration`.
///
/// Units: seconds
const MAX_SLEEP_S: f64 = 1.0e18;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A monotonic millisecond clock.
pub trait Clock {
    /// Milliseconds elapsed since the clock's epoch.
    fn now_ms(&self) -> f64;

    /// Block for the given number of milliseconds. Non-positive durations return immediately.
    fn sleep_ms(&self, ms: f64);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Clock backed by `std::time::Instant`, with the epoch at creation.
#[derive(Debug, Clone, Copy)]
pub struct MonoClock {
    epoch: Instant,
}

/// Clock which only moves when told to.
///
/// Sleeping advances the clock by the requested amount, so a loop waiting on this clock runs
/// without blocking.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: Cell<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MonoClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonoClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonoClock {
    fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    fn sleep_ms(&self, ms: f64) {
        if let Some(d) = sleep_duration(ms) {
            thread::sleep(d);
        }
    }
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now_ms: Cell::new(start_ms),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, ms: f64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now_ms.get()
    }

    fn sleep_ms(&self, ms: f64) {
        if ms > 0.0 {
            self.advance(ms);
        }
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> f64 {
        (**self).now_ms()
    }

    fn sleep_ms(&self, ms: f64) {
        (**self).sleep_ms(ms)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert a sleep request into a `Duration`, saturating at `MAX_SLEEP_S`.
///
/// Returns `None` for non-positive and NaN requests.
fn sleep_duration(ms: f64) -> Option<Duration> {
    if !(ms > 0.0) {
        return None;
    }

    Some(Duration::from_secs_f64((ms / 1000.0).min(MAX_SLEEP_S)))
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
