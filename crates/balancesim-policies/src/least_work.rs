//! Least-expected-work balancing policy.
//!
//! Estimates how long each server needs to drain the work already committed
//! to it, `(occupant work + queued work) / speed`, and routes to the server
//! that frees up first. This is the only built-in policy that accounts for
//! heterogeneous server speeds.

use crate::traits::*;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// How much of the current occupant's work counts toward the estimate.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupantEstimate {
    /// Only the part of the occupant's service not yet performed.
    #[default]
    Remaining,
    /// The occupant's full nominal duration, regardless of progress.
    Full,
}

/// Least-expected-work selector. Ties go to the first server in order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeastWork {
    estimate: OccupantEstimate,
}

impl LeastWork {
    pub fn new() -> Self {
        Self {
            estimate: OccupantEstimate::Remaining,
        }
    }

    pub fn with_estimate(estimate: OccupantEstimate) -> Self {
        Self { estimate }
    }

    pub fn estimate(&self) -> OccupantEstimate {
        self.estimate
    }

    /// Expected time until `server` has finished everything assigned to it.
    pub fn expected_time(&self, server: &ServerSnapshot) -> f64 {
        let occupant = match self.estimate {
            OccupantEstimate::Remaining => server.occupant_remaining_work,
            OccupantEstimate::Full => server.occupant_work,
        };
        (occupant + server.queued_work) / server.speed
    }
}

impl SelectServer for LeastWork {
    fn select(&mut self, servers: &[ServerSnapshot], _rng: &mut dyn RngCore) -> Option<u32> {
        let mut best: Option<(u32, f64)> = None;
        for server in servers {
            let expected = self.expected_time(server);
            match best {
                Some((_, current)) if expected >= current => {}
                _ => best = Some((server.index, expected)),
            }
        }
        best.map(|(index, _)| index)
    }

    fn name(&self) -> &'static str {
        "least_work"
    }
}
