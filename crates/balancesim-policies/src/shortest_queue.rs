//! Shortest-queue balancing policy.
//!
//! Routes each request to the server with the fewest waiting requests. The
//! occupant is not counted, only the FIFO queue behind it.

use crate::traits::*;
use rand::RngCore;

/// Shortest wait-queue selector. Ties go to the lowest index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShortestQueue;

impl ShortestQueue {
    pub fn new() -> Self {
        Self
    }
}

impl SelectServer for ShortestQueue {
    fn select(&mut self, servers: &[ServerSnapshot], _rng: &mut dyn RngCore) -> Option<u32> {
        // min_by_key keeps the first of equal minima
        servers
            .iter()
            .min_by_key(|s| s.queue_length)
            .map(|s| s.index)
    }

    fn name(&self) -> &'static str {
        "shortest_queue"
    }
}
