//! Synthetic request arrivals.
//!
//! The [`ArrivalGenerator`] is the lazy, infinite source of requests: the
//! engine asks it for one request, hands that request to the balancer, then
//! asks for the exponentially distributed gap until the next one.

use crate::config::{ServiceTimeSection, WorkloadSection};
use crate::error::SimError;
use crate::request::{Request, RequestClass};
use rand::Rng;
use rand_distr::{Distribution, Exp, Normal};

/// Floor applied to every sampled service duration.
pub const MIN_SERVICE_DURATION: f64 = 0.1;

/// Class-conditioned service-time distribution.
#[derive(Debug, Clone, Copy)]
pub enum ServiceTime {
    Normal(Normal<f64>),
    Exponential(Exp<f64>),
}

impl ServiceTime {
    pub fn from_section(section: &ServiceTimeSection) -> Result<Self, SimError> {
        match *section {
            ServiceTimeSection::Normal { mean, std_dev } => Normal::new(mean, std_dev)
                .map(ServiceTime::Normal)
                .map_err(|e| SimError::Configuration(format!("normal service time: {}", e))),
            ServiceTimeSection::Exponential { mean } => Exp::new(1.0 / mean)
                .map(ServiceTime::Exponential)
                .map_err(|e| SimError::Configuration(format!("exponential service time: {}", e))),
        }
    }

    /// Draw a duration, floored at [`MIN_SERVICE_DURATION`].
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let raw = match self {
            ServiceTime::Normal(d) => d.sample(rng),
            ServiceTime::Exponential(d) => d.sample(rng),
        };
        raw.max(MIN_SERVICE_DURATION)
    }
}

/// Produces requests with a CPU/IO mix and Poisson arrivals.
#[derive(Debug, Clone)]
pub struct ArrivalGenerator {
    next_id: u64,
    cpu_fraction: f64,
    cpu: ServiceTime,
    io: ServiceTime,
    interarrival: Exp<f64>,
}

impl ArrivalGenerator {
    pub fn new(workload: &WorkloadSection) -> Result<Self, SimError> {
        let interarrival = Exp::new(1.0 / workload.mean_interarrival)
            .map_err(|e| SimError::Configuration(format!("inter-arrival time: {}", e)))?;
        Ok(Self {
            next_id: 0,
            cpu_fraction: workload.cpu_fraction,
            cpu: ServiceTime::from_section(&workload.cpu)?,
            io: ServiceTime::from_section(&workload.io)?,
            interarrival,
        })
    }

    /// Build the next request, arriving at `now_ticks`.
    ///
    /// Draws the class first and the service duration second.
    pub fn next_request<R: Rng + ?Sized>(&mut self, now_ticks: u64, rng: &mut R) -> Request {
        let class = if rng.gen::<f64>() < self.cpu_fraction {
            RequestClass::Cpu
        } else {
            RequestClass::Io
        };
        let service_duration = match class {
            RequestClass::Cpu => self.cpu.sample(rng),
            RequestClass::Io => self.io.sample(rng),
        };
        let request = Request {
            id: self.next_id,
            class,
            arrival_ticks: now_ticks,
            service_duration,
        };
        self.next_id += 1;
        request
    }

    /// Sample the gap until the following arrival.
    pub fn next_interval<R: Rng + ?Sized>(&mut self, rng: &mut R) -> f64 {
        self.interarrival.sample(rng)
    }

    /// Number of requests generated so far.
    pub fn generated(&self) -> u64 {
        self.next_id
    }
}
