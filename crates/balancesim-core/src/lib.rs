//! BalanceSim — Discrete-event simulator for multi-server load balancing.
//!
//! This crate provides the simulation engine that models a pool of
//! single-capacity servers with FIFO wait queues, an optional emergency
//! server, and a Poisson stream of CPU- and I/O-bound requests. Balancing
//! policies from `balancesim-policies` pick a server for each arriving
//! request; the balancer applies overflow and discard rules on top.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐     ┌───────────┐     ┌──────────────┐
//! │ Arrival  │────▶│  Engine   │────▶│   Metrics    │
//! │Generator │     │ (Events)  │     │  Collection  │
//! └──────────┘     └─────┬─────┘     └──────────────┘
//!                        │
//!                ┌───────┴───────┐
//!                │   Balancer    │
//!                │   (Policy)    │
//!                └───────┬───────┘
//!                        │
//!          ┌─────────────┼─────────────┬─────────────┐
//!          ▼             ▼             ▼             ▼
//!    ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌───────────┐
//!    │ Server 0 │  │ Server 1 │  │ Server N │  │ Emergency │
//!    │  Queue   │  │  Queue   │  │  Queue   │  │   Queue   │
//!    └──────────┘  └──────────┘  └──────────┘  └───────────┘
//! ```

pub mod arrivals;
pub mod balancer;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod metrics;
pub mod request;
pub mod scheduler;
pub mod server;
pub mod sweep;

// Re-export key types for convenience.
pub use arrivals::{ArrivalGenerator, MIN_SERVICE_DURATION};
pub use balancer::{Balancer, Routing};
pub use clock::{SimClock, TICKS_PER_UNIT};
pub use config::{ConfigError, SimConfig};
pub use engine::{SimEvent, SimulationEngine};
pub use error::{Result, SimError};
pub use metrics::{format_comparison_table, format_table, MetricsCollector, SimulationMetrics};
pub use request::{Request, RequestClass};
pub use scheduler::Scheduler;
pub use server::{ServerId, ServerPool, ServerResource};
pub use sweep::{compare_policies, sweep};

/// Run a complete simulation with the policy named in the config.
pub fn run_simulation(config: SimConfig) -> Result<SimulationMetrics> {
    let mut engine = SimulationEngine::from_config(config)?;
    engine.run()
}

/// Run a complete simulation with an explicitly chosen policy.
pub fn run_with_policy(config: SimConfig, policy: &str) -> Result<SimulationMetrics> {
    let policy = balancesim_policies::policy_by_name(policy)?
        .with_occupant_estimate(config.balancer.occupant_estimate);
    let mut engine = SimulationEngine::new(config, policy)?;
    engine.run()
}
