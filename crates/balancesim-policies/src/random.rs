//! Uniform random balancing policy.

use crate::traits::*;
use rand::{Rng, RngCore};

/// Picks an ordinary server uniformly at random.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RandomChoice;

impl RandomChoice {
    pub fn new() -> Self {
        Self
    }
}

impl SelectServer for RandomChoice {
    fn select(&mut self, servers: &[ServerSnapshot], rng: &mut dyn RngCore) -> Option<u32> {
        if servers.is_empty() {
            return None;
        }
        let position = rng.gen_range(0..servers.len());
        Some(servers[position].index)
    }

    fn name(&self) -> &'static str {
        "random"
    }
}
