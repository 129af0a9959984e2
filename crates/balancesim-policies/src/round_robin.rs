//! Round-robin balancing policy.
//!
//! Hands requests to the ordinary servers in a circular fashion. Ignores
//! queue state entirely, so load is only symmetric when servers are.

use crate::traits::*;
use rand::RngCore;

/// Round-robin selector.
///
/// The cursor advances on every call, including calls whose choice the
/// balancer later overrides with overflow routing or a discard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundRobin {
    /// Position the next call will pick.
    cursor: usize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self { cursor: 0 }
    }

    /// Start the rotation at a specific position.
    pub fn starting_at(cursor: usize) -> Self {
        Self { cursor }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl SelectServer for RoundRobin {
    fn select(&mut self, servers: &[ServerSnapshot], _rng: &mut dyn RngCore) -> Option<u32> {
        if servers.is_empty() {
            return None;
        }
        let position = self.cursor % servers.len();
        self.cursor = (position + 1) % servers.len();
        Some(servers[position].index)
    }

    fn name(&self) -> &'static str {
        "round_robin"
    }
}
