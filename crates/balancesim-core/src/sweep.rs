//! Experiment sweeps: every policy at every mean inter-arrival time.
//!
//! Each combination gets a fresh engine, so runs share nothing but the
//! config. The deterministic policies consume identical random draws and
//! therefore face identical workloads; `random` takes one extra draw per
//! request and sees a different one.

use crate::config::SimConfig;
use crate::engine::SimulationEngine;
use crate::error::SimError;
use crate::metrics::SimulationMetrics;
use balancesim_policies::{policy_by_name, BalancingPolicy, SelectServer};
use tracing::info;

/// Resolve every policy name up front so a typo fails before any run.
fn resolve_policies(
    config: &SimConfig,
    names: &[&str],
) -> Result<Vec<BalancingPolicy>, SimError> {
    names
        .iter()
        .map(|name| {
            policy_by_name(name)
                .map(|p| p.with_occupant_estimate(config.balancer.occupant_estimate))
                .map_err(SimError::from)
        })
        .collect()
}

/// Run every policy against every mean inter-arrival time.
///
/// Results are ordered by inter-arrival time, then by policy in the order
/// given.
pub fn sweep(
    config: &SimConfig,
    policies: &[&str],
    mean_interarrivals: &[f64],
) -> Result<Vec<SimulationMetrics>, SimError> {
    let resolved = resolve_policies(config, policies)?;
    let mut results = Vec::with_capacity(resolved.len() * mean_interarrivals.len());

    for &mean_interarrival in mean_interarrivals {
        let rate_config = config.with_mean_interarrival(mean_interarrival);
        for policy in &resolved {
            info!(policy = policy.name(), mean_interarrival, "sweep run");
            let mut engine = SimulationEngine::new(rate_config.clone(), policy.clone())?;
            results.push(engine.run()?);
        }
    }
    Ok(results)
}

/// Run a comparison of multiple policies on the same config.
pub fn compare_policies(
    config: &SimConfig,
    policies: &[&str],
) -> Result<Vec<SimulationMetrics>, SimError> {
    sweep(config, policies, &[config.workload.mean_interarrival])
}
