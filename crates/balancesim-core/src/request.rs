//! Request model for the load-balancing simulation.
//!
//! Each [`Request`] is created by the arrival generator with a class and a
//! nominal service duration, and is never mutated afterwards. A server
//! wraps it in an [`Occupant`] while it is being served.

use crate::clock::{ticks_to_units, units_to_ticks};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Workload class of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RequestClass {
    /// Short compute-bound request.
    Cpu,
    /// Long I/O-bound request.
    Io,
}

impl fmt::Display for RequestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestClass::Cpu => write!(f, "CPU"),
            RequestClass::Io => write!(f, "I/O"),
        }
    }
}

/// A single request flowing through the simulated facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Unique, monotonically increasing identifier.
    pub id: u64,
    /// Workload class.
    pub class: RequestClass,
    /// Arrival time in ticks.
    pub arrival_ticks: u64,
    /// Nominal service duration in time units, before speed scaling.
    pub service_duration: f64,
}

impl Request {
    /// Arrival time in time units.
    pub fn arrival_time(&self) -> f64 {
        ticks_to_units(self.arrival_ticks)
    }

    /// Ticks a server of the given speed is occupied by this request.
    ///
    /// Never zero, so a completion always lands strictly after its start.
    pub fn occupation_ticks(&self, speed: f64) -> u64 {
        units_to_ticks(self.service_duration / speed).max(1)
    }
}

/// The request currently holding a server.
#[derive(Debug, Clone)]
pub struct Occupant {
    pub request: Request,
    /// Tick at which the server slot was granted.
    pub started_ticks: u64,
    /// Ticks the request holds the server for.
    pub occupation_ticks: u64,
}

impl Occupant {
    /// Tick at which the occupant releases the server.
    pub fn finish_ticks(&self) -> u64 {
        self.started_ticks + self.occupation_ticks
    }

    /// Fraction of the nominal service still to be performed at `now_ticks`,
    /// expressed in nominal work units.
    pub fn remaining_work(&self, now_ticks: u64) -> f64 {
        let left = self.finish_ticks().saturating_sub(now_ticks);
        let fraction = left as f64 / self.occupation_ticks as f64;
        self.request.service_duration * fraction
    }

    /// Time spent waiting in the queue before being granted the server.
    pub fn waiting_ticks(&self) -> u64 {
        self.started_ticks.saturating_sub(self.request.arrival_ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TICKS_PER_UNIT;

    fn sample_request() -> Request {
        Request {
            id: 1,
            class: RequestClass::Io,
            arrival_ticks: 10 * TICKS_PER_UNIT,
            service_duration: 9.0,
        }
    }

    #[test]
    fn test_occupation_scales_with_speed() {
        let req = sample_request();
        assert_eq!(req.occupation_ticks(1.0), 9 * TICKS_PER_UNIT);
        assert_eq!(req.occupation_ticks(3.0), 3 * TICKS_PER_UNIT);
    }

    #[test]
    fn test_occupation_is_never_zero() {
        let mut req = sample_request();
        req.service_duration = 1e-9;
        assert_eq!(req.occupation_ticks(1.0), 1);
    }

    #[test]
    fn test_remaining_work() {
        let req = sample_request();
        let occupant = Occupant {
            occupation_ticks: req.occupation_ticks(1.0),
            started_ticks: 12 * TICKS_PER_UNIT,
            request: req,
        };
        assert_eq!(occupant.remaining_work(12 * TICKS_PER_UNIT), 9.0);
        assert!((occupant.remaining_work(15 * TICKS_PER_UNIT) - 6.0).abs() < 1e-9);
        assert_eq!(occupant.remaining_work(30 * TICKS_PER_UNIT), 0.0);
        assert_eq!(occupant.waiting_ticks(), 2 * TICKS_PER_UNIT);
    }

    #[test]
    fn test_class_display() {
        assert_eq!(RequestClass::Cpu.to_string(), "CPU");
        assert_eq!(RequestClass::Io.to_string(), "I/O");
    }
}
