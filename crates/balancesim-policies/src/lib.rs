//! Built-in balancing policies for BalanceSim.
//!
//! This crate provides the [`SelectServer`] trait, the four built-in
//! selectors, and [`BalancingPolicy`], the tagged variant the simulator
//! carries for the active policy:
//!
//! | Policy | Strategy | Best For |
//! |--------|----------|----------|
//! | [`RandomChoice`] | Uniform pick | Baseline comparisons |
//! | [`RoundRobin`] | Cycle through servers | Homogeneous pools |
//! | [`ShortestQueue`] | Fewest waiting requests | Variable request sizes |
//! | [`LeastWork`] | Smallest speed-scaled backlog | Heterogeneous speeds |

pub mod least_work;
pub mod random;
pub mod round_robin;
pub mod shortest_queue;
pub mod traits;

pub use least_work::{LeastWork, OccupantEstimate};
pub use random::RandomChoice;
pub use round_robin::RoundRobin;
pub use shortest_queue::ShortestQueue;
pub use traits::*;

use rand::RngCore;

/// The active balancing policy of a run.
///
/// Each variant carries only the state it needs; the round-robin cursor is
/// the only mutable state across calls.
#[derive(Debug, Clone, PartialEq)]
pub enum BalancingPolicy {
    Random(RandomChoice),
    RoundRobin(RoundRobin),
    ShortestQueue(ShortestQueue),
    LeastWork(LeastWork),
}

impl BalancingPolicy {
    /// Replace the occupant estimate of a least-work policy. Other
    /// variants are returned unchanged.
    pub fn with_occupant_estimate(self, estimate: OccupantEstimate) -> Self {
        match self {
            BalancingPolicy::LeastWork(_) => {
                BalancingPolicy::LeastWork(LeastWork::with_estimate(estimate))
            }
            other => other,
        }
    }
}

impl SelectServer for BalancingPolicy {
    fn select(&mut self, servers: &[ServerSnapshot], rng: &mut dyn RngCore) -> Option<u32> {
        match self {
            BalancingPolicy::Random(p) => p.select(servers, rng),
            BalancingPolicy::RoundRobin(p) => p.select(servers, rng),
            BalancingPolicy::ShortestQueue(p) => p.select(servers, rng),
            BalancingPolicy::LeastWork(p) => p.select(servers, rng),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            BalancingPolicy::Random(p) => p.name(),
            BalancingPolicy::RoundRobin(p) => p.name(),
            BalancingPolicy::ShortestQueue(p) => p.name(),
            BalancingPolicy::LeastWork(p) => p.name(),
        }
    }
}

/// Create a balancing policy by name.
pub fn policy_by_name(name: &str) -> Result<BalancingPolicy, PolicyError> {
    match name {
        "random" => Ok(BalancingPolicy::Random(RandomChoice::new())),
        "round_robin" => Ok(BalancingPolicy::RoundRobin(RoundRobin::new())),
        "shortest_queue" => Ok(BalancingPolicy::ShortestQueue(ShortestQueue::new())),
        "least_work" => Ok(BalancingPolicy::LeastWork(LeastWork::new())),
        _ => Err(PolicyError::UnknownPolicy(name.to_string())),
    }
}

/// List all available built-in policy names.
pub fn available_policies() -> Vec<&'static str> {
    vec!["random", "round_robin", "shortest_queue", "least_work"]
}
