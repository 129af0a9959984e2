//! Virtual clock for discrete-event simulation.
//!
//! The [`SimClock`] tracks simulation time independently of wall-clock time,
//! advancing only when events are processed. This enables deterministic,
//! repeatable simulations regardless of host machine speed.

use serde::{Deserialize, Serialize};

/// Integer ticks per simulated time unit.
pub const TICKS_PER_UNIT: u64 = 1_000_000;

/// Convert a duration in time units into whole ticks.
///
/// # Panics
///
/// Panics if `units` is negative, NaN or infinite. Such a delay can only come
/// from a bug in the caller.
pub fn units_to_ticks(units: f64) -> u64 {
    assert!(
        units.is_finite() && units >= 0.0,
        "Invalid simulated duration: {}",
        units
    );
    (units * TICKS_PER_UNIT as f64).round() as u64
}

/// Convert ticks back into time units.
pub fn ticks_to_units(ticks: u64) -> f64 {
    ticks as f64 / TICKS_PER_UNIT as f64
}

/// Virtual simulation clock.
///
/// Time is tracked in integer ticks internally so that event keys are
/// totally ordered, but most APIs expose `f64` time units.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimClock {
    /// Current simulation time in ticks.
    current_ticks: u64,
}

impl SimClock {
    /// Create a new clock starting at time zero.
    pub fn new() -> Self {
        Self { current_ticks: 0 }
    }

    /// Current time in time units.
    pub fn now(&self) -> f64 {
        ticks_to_units(self.current_ticks)
    }

    /// Current time in ticks.
    pub fn now_ticks(&self) -> u64 {
        self.current_ticks
    }

    /// Advance the clock to a specific tick.
    ///
    /// # Panics
    ///
    /// Panics if `ticks` is in the past.
    pub fn advance_to_ticks(&mut self, ticks: u64) {
        assert!(
            ticks >= self.current_ticks,
            "Cannot move clock backwards: current={} ticks, target={} ticks",
            self.current_ticks,
            ticks,
        );
        self.current_ticks = ticks;
    }
}
