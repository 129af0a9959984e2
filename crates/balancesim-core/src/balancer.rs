//! Front-end balancer: policy selection plus overflow and discard rules.
//!
//! The active [`BalancingPolicy`] only ever sees the ordinary servers. When
//! its pick is saturated the request spills over to the emergency server,
//! and when that one is saturated too the request is dropped.

use crate::server::{ServerId, ServerPool};
use balancesim_policies::{BalancingPolicy, SelectServer};
use rand::RngCore;
use tracing::{debug, trace};

/// Where the balancer sends a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    /// The policy's pick had room.
    Route(ServerId),
    /// The pick was saturated; the request goes to the emergency server.
    Overflow,
    /// No capacity anywhere. No lifecycle is started.
    Discard,
}

impl Routing {
    /// Server the request will be served by, if any.
    pub fn target(&self) -> Option<ServerId> {
        match self {
            Routing::Route(id) => Some(*id),
            Routing::Overflow => Some(ServerId::Emergency),
            Routing::Discard => None,
        }
    }
}

/// Routes each arriving request under the configured policy.
#[derive(Debug, Clone)]
pub struct Balancer {
    policy: BalancingPolicy,
    queue_bound: u32,
}

impl Balancer {
    pub fn new(policy: BalancingPolicy, queue_bound: u32) -> Self {
        Self {
            policy,
            queue_bound,
        }
    }

    pub fn policy(&self) -> &BalancingPolicy {
        &self.policy
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Decide where the next request goes.
    ///
    /// A queue at or above the bound counts as saturated. The policy is
    /// consulted exactly once per call, so stateful policies advance even
    /// when their pick is overridden.
    pub fn distribute(
        &mut self,
        pool: &ServerPool,
        now_ticks: u64,
        rng: &mut dyn RngCore,
    ) -> Routing {
        let snapshots = pool.snapshots(now_ticks);
        let Some(index) = self.policy.select(&snapshots, rng) else {
            debug!(policy = self.policy.name(), "policy found no candidate server");
            return Routing::Discard;
        };

        let candidate = ServerId::Pool(index);
        if snapshots[index as usize].queue_length < self.queue_bound {
            trace!(server = %candidate, "routed");
            return Routing::Route(candidate);
        }

        match pool.emergency() {
            Some(emergency) if emergency.queue_length() < self.queue_bound as usize => {
                debug!(server = %candidate, "candidate saturated, overflowing to emergency");
                Routing::Overflow
            }
            Some(_) => {
                debug!(server = %candidate, "emergency saturated, discarding");
                Routing::Discard
            }
            None => {
                debug!(
                    server = %candidate,
                    "candidate saturated and no emergency server, discarding"
                );
                Routing::Discard
            }
        }
    }
}
