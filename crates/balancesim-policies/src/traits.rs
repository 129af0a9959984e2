//! Policy trait definitions.
//!
//! Every balancing policy implements [`SelectServer`], which receives
//! read-only snapshots of the ordinary server pool and returns the index of
//! the candidate server. Overflow and discard handling live in the
//! simulator's balancer, not here.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Unknown balancing policy: {0}")]
    UnknownPolicy(String),
}

/// Read-only snapshot of a server's state, provided to balancing policies.
///
/// Work figures are nominal service durations, i.e. before the server's
/// speed multiplier is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSnapshot {
    /// Position of the server in the ordinary pool.
    pub index: u32,
    /// Requests waiting in the FIFO queue (the occupant is not counted).
    pub queue_length: u32,
    /// Speed multiplier of the server.
    pub speed: f64,
    /// Whether a request currently occupies the server.
    pub busy: bool,
    /// Sum of the nominal durations of all waiting requests.
    pub queued_work: f64,
    /// Full nominal duration of the current occupant (0 when idle).
    pub occupant_work: f64,
    /// Nominal work the current occupant still has left (0 when idle).
    pub occupant_remaining_work: f64,
}

impl ServerSnapshot {
    /// Snapshot of an idle server with an empty queue.
    pub fn idle(index: u32, speed: f64) -> Self {
        Self {
            index,
            queue_length: 0,
            speed,
            busy: false,
            queued_work: 0.0,
            occupant_work: 0.0,
            occupant_remaining_work: 0.0,
        }
    }
}

/// The core selection trait.
///
/// `select` is called once per incoming request with the ordinary pool in
/// index order. Policies that need randomness draw from `rng`, which is the
/// run's seeded generator, so selections stay reproducible.
pub trait SelectServer {
    /// Returns the index of the chosen server, or `None` for an empty pool.
    fn select(&mut self, servers: &[ServerSnapshot], rng: &mut dyn RngCore) -> Option<u32>;

    /// Human-readable name for reports.
    fn name(&self) -> &'static str;
}
