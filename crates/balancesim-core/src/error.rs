//! Error types for simulation runs.

use crate::config::ConfigError;
use balancesim_policies::PolicyError;
use thiserror::Error;

/// Top-level error type for building, running and summarizing a simulation.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("No request completed within the horizon of {horizon}; mean response time is undefined")]
    NoCompletedRequests { horizon: f64 },
}

impl From<PolicyError> for SimError {
    fn from(err: PolicyError) -> Self {
        SimError::Configuration(err.to_string())
    }
}

pub type Result<T, E = SimError> = std::result::Result<T, E>;
