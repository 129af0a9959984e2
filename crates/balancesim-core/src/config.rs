//! TOML configuration parsing for BalanceSim.
//!
//! Defines the complete configuration schema for a simulation run: the
//! server pool, the emergency server, the workload mix, the active balancing
//! policy, and the optional sweep grid. A [`SimConfig`] is immutable once
//! built and is handed to each engine by value.

use balancesim_policies::OccupantEstimate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub simulation: SimulationSection,
    pub cluster: ClusterSection,
    #[serde(default)]
    pub workload: WorkloadSection,
    #[serde(default)]
    pub balancer: BalancerSection,
    #[serde(default)]
    pub sweep: Option<SweepSection>,
}

/// General simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSection {
    /// Human-readable name for this simulation.
    #[serde(default = "default_sim_name")]
    pub name: String,
    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Simulated time after which the run stops.
    #[serde(default = "default_horizon")]
    pub horizon: f64,
}

fn default_sim_name() -> String {
    "simulation".to_string()
}

fn default_seed() -> u64 {
    7777
}

fn default_horizon() -> f64 {
    800.0
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            name: default_sim_name(),
            seed: default_seed(),
            horizon: default_horizon(),
        }
    }
}

/// Server pool configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSection {
    /// Number of ordinary servers.
    pub num_servers: u32,
    /// Per-server speed multipliers. All servers run at 1.0 when absent.
    #[serde(default)]
    pub speeds: Option<Vec<f64>>,
    /// Maximum wait-queue length before overflow routing kicks in.
    #[serde(default = "default_queue_bound")]
    pub queue_bound: u32,
    /// Overflow server.
    #[serde(default)]
    pub emergency: EmergencySection,
}

fn default_queue_bound() -> u32 {
    1000
}

/// Emergency (overflow) server section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencySection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_speed")]
    pub speed: f64,
}

fn default_speed() -> f64 {
    1.0
}

impl Default for EmergencySection {
    fn default() -> Self {
        Self {
            enabled: false,
            speed: default_speed(),
        }
    }
}

/// Service-time distribution of one request class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "distribution", rename_all = "snake_case")]
pub enum ServiceTimeSection {
    Normal { mean: f64, std_dev: f64 },
    Exponential { mean: f64 },
}

impl ServiceTimeSection {
    pub fn mean(&self) -> f64 {
        match self {
            ServiceTimeSection::Normal { mean, .. } => *mean,
            ServiceTimeSection::Exponential { mean } => *mean,
        }
    }
}

/// Arrival process and request mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadSection {
    /// Mean time between arrivals (exponentially distributed).
    #[serde(default = "default_mean_interarrival")]
    pub mean_interarrival: f64,
    /// Probability that a request is CPU-bound.
    #[serde(default = "default_cpu_fraction")]
    pub cpu_fraction: f64,
    #[serde(default = "default_cpu_service")]
    pub cpu: ServiceTimeSection,
    #[serde(default = "default_io_service")]
    pub io: ServiceTimeSection,
}

fn default_mean_interarrival() -> f64 {
    4.0
}
fn default_cpu_fraction() -> f64 {
    0.7
}
fn default_cpu_service() -> ServiceTimeSection {
    ServiceTimeSection::Normal {
        mean: 3.0,
        std_dev: 0.5,
    }
}
fn default_io_service() -> ServiceTimeSection {
    ServiceTimeSection::Normal {
        mean: 9.0,
        std_dev: 1.0,
    }
}

impl Default for WorkloadSection {
    fn default() -> Self {
        Self {
            mean_interarrival: default_mean_interarrival(),
            cpu_fraction: default_cpu_fraction(),
            cpu: default_cpu_service(),
            io: default_io_service(),
        }
    }
}

/// Balancing policy selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancerSection {
    /// Policy name: random, round_robin, shortest_queue or least_work.
    #[serde(default = "default_policy")]
    pub policy: String,
    /// How least_work counts the work of a request already in service.
    #[serde(default)]
    pub occupant_estimate: OccupantEstimate,
}

fn default_policy() -> String {
    "round_robin".to_string()
}

impl Default for BalancerSection {
    fn default() -> Self {
        Self {
            policy: default_policy(),
            occupant_estimate: OccupantEstimate::default(),
        }
    }
}

/// Sweep grid: every policy is run at every mean inter-arrival time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SweepSection {
    #[serde(default)]
    pub policies: Vec<String>,
    #[serde(default)]
    pub mean_interarrivals: Vec<f64>,
}

impl Default for SimConfig {
    /// Three unit-speed servers, no emergency server, the CPU/IO normal mix
    /// and round-robin balancing over a horizon of 800.
    fn default() -> Self {
        Self {
            simulation: SimulationSection::default(),
            cluster: ClusterSection {
                num_servers: 3,
                speeds: None,
                queue_bound: default_queue_bound(),
                emergency: EmergencySection::default(),
            },
            workload: WorkloadSection::default(),
            balancer: BalancerSection::default(),
            sweep: None,
        }
    }
}

impl SimConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cluster.num_servers == 0 {
            return Err(ConfigError::Validation(
                "num_servers must be > 0".to_string(),
            ));
        }
        if let Some(speeds) = &self.cluster.speeds {
            if speeds.len() != self.cluster.num_servers as usize {
                return Err(ConfigError::Validation(format!(
                    "speeds has {} entries but num_servers is {}",
                    speeds.len(),
                    self.cluster.num_servers,
                )));
            }
            if let Some(bad) = speeds.iter().find(|s| !is_positive(**s)) {
                return Err(ConfigError::Validation(format!(
                    "server speeds must be > 0, got {}",
                    bad
                )));
            }
        }
        if self.cluster.emergency.enabled && !is_positive(self.cluster.emergency.speed) {
            return Err(ConfigError::Validation(
                "emergency speed must be > 0".to_string(),
            ));
        }
        if !is_positive(self.simulation.horizon) {
            return Err(ConfigError::Validation("horizon must be > 0".to_string()));
        }
        if !is_positive(self.workload.mean_interarrival) {
            return Err(ConfigError::Validation(
                "mean_interarrival must be > 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.workload.cpu_fraction) {
            return Err(ConfigError::Validation(format!(
                "cpu_fraction must be within [0, 1], got {}",
                self.workload.cpu_fraction
            )));
        }
        for (class, section) in [("cpu", &self.workload.cpu), ("io", &self.workload.io)] {
            if !is_positive(section.mean()) {
                return Err(ConfigError::Validation(format!(
                    "{} service mean must be > 0",
                    class
                )));
            }
            if let ServiceTimeSection::Normal { std_dev, .. } = section {
                if !(std_dev.is_finite() && *std_dev >= 0.0) {
                    return Err(ConfigError::Validation(format!(
                        "{} service std_dev must be >= 0",
                        class
                    )));
                }
            }
        }
        if let Some(sweep) = &self.sweep {
            if sweep.mean_interarrivals.iter().any(|m| !is_positive(*m)) {
                return Err(ConfigError::Validation(
                    "sweep mean_interarrivals must all be > 0".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Speed multiplier of every ordinary server, in index order.
    pub fn server_speeds(&self) -> Vec<f64> {
        match &self.cluster.speeds {
            Some(speeds) => speeds.clone(),
            None => vec![1.0; self.cluster.num_servers as usize],
        }
    }

    /// Emergency server speed, if the emergency server is enabled.
    pub fn emergency_speed(&self) -> Option<f64> {
        self.cluster
            .emergency
            .enabled
            .then_some(self.cluster.emergency.speed)
    }

    /// Copy of this config with a different mean inter-arrival time.
    pub fn with_mean_interarrival(&self, mean_interarrival: f64) -> Self {
        let mut config = self.clone();
        config.workload.mean_interarrival = mean_interarrival;
        config
    }
}

/// Finite and strictly positive. TOML accepts `inf` and `nan`.
fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
