//! Discrete-event simulation engine.
//!
//! The engine owns the [`Scheduler`] and everything the events act upon.
//! Each step pops the next event at or before the horizon, advances the
//! virtual clock and dispatches the event. Arrivals are self-perpetuating:
//! every arrival schedules the next one, so the run only ends when the
//! horizon is reached.

use crate::arrivals::ArrivalGenerator;
use crate::balancer::{Balancer, Routing};
use crate::clock::units_to_ticks;
use crate::config::SimConfig;
use crate::error::SimError;
use crate::lifecycle;
use crate::metrics::{MetricsCollector, SimulationMetrics};
use crate::scheduler::Scheduler;
use crate::server::{ServerId, ServerPool};
use balancesim_policies::{policy_by_name, BalancingPolicy};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace};

/// Events in the discrete-event simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    /// The next request reaches the balancer.
    Arrival,
    /// A waiting request was handed the slot of `server`.
    AccessGranted { server: ServerId, request_id: u64 },
    /// The occupant of `server` finished service.
    ServiceComplete { server: ServerId, request_id: u64 },
}

/// The main simulation engine.
pub struct SimulationEngine {
    config: SimConfig,
    scheduler: Scheduler<SimEvent>,
    /// Ordinary servers plus the optional emergency server.
    pub pool: ServerPool,
    balancer: Balancer,
    generator: ArrivalGenerator,
    /// Metrics collector.
    pub metrics: MetricsCollector,
    /// Single random stream for the whole run.
    rng: ChaCha8Rng,
    horizon_ticks: u64,
    /// Total events processed.
    pub events_processed: u64,
}

impl SimulationEngine {
    /// Create a new simulation engine from config and policy.
    ///
    /// The first arrival is scheduled at time zero.
    pub fn new(config: SimConfig, policy: BalancingPolicy) -> Result<Self, SimError> {
        config.validate()?;
        let generator = ArrivalGenerator::new(&config.workload)?;
        let pool = ServerPool::new(&config.server_speeds(), config.emergency_speed());
        let balancer = Balancer::new(policy, config.cluster.queue_bound);

        let mut scheduler = Scheduler::new();
        scheduler.schedule_at_ticks(0, SimEvent::Arrival);

        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(config.simulation.seed),
            horizon_ticks: units_to_ticks(config.simulation.horizon),
            scheduler,
            pool,
            balancer,
            generator,
            metrics: MetricsCollector::new(),
            events_processed: 0,
            config,
        })
    }

    /// Create an engine running the policy named in the config.
    pub fn from_config(config: SimConfig) -> Result<Self, SimError> {
        let policy = policy_by_name(&config.balancer.policy)?
            .with_occupant_estimate(config.balancer.occupant_estimate);
        Self::new(config, policy)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn balancer(&self) -> &Balancer {
        &self.balancer
    }

    /// Current simulated time.
    pub fn now(&self) -> f64 {
        self.scheduler.now()
    }

    /// Get the number of pending events.
    pub fn pending_events(&self) -> usize {
        self.scheduler.pending_events()
    }

    /// Process the next event at or before the horizon.
    ///
    /// Returns the processed event, or `None` once nothing is left to do
    /// within the horizon.
    pub fn step(&mut self) -> Option<SimEvent> {
        let event = self.scheduler.pop_until(self.horizon_ticks)?;
        self.process_event(event);
        self.events_processed += 1;
        Some(event)
    }

    /// Run the simulation up to the horizon and summarize it.
    pub fn run(&mut self) -> Result<SimulationMetrics, SimError> {
        info!(
            simulation = %self.config.simulation.name,
            policy = self.balancer.policy_name(),
            servers = self.pool.ordinary().len(),
            emergency = self.pool.emergency().is_some(),
            horizon = self.config.simulation.horizon,
            seed = self.config.simulation.seed,
            "starting simulation"
        );

        while self.step().is_some() {}

        info!(
            generated = self.metrics.generated_count(),
            completed = self.metrics.completed_count(),
            discarded = self.metrics.discarded_count(),
            in_flight = self.pool.in_flight(),
            events = self.events_processed,
            "simulation reached horizon"
        );

        self.metrics.aggregate(
            &self.config,
            self.balancer.policy_name(),
            &self.pool,
            self.events_processed,
        )
    }

    /// Process a single event.
    fn process_event(&mut self, event: SimEvent) {
        trace!(now = self.scheduler.now(), ?event, "event");
        match event {
            SimEvent::Arrival => self.handle_arrival(),
            SimEvent::AccessGranted { server, request_id } => {
                lifecycle::resume(server, request_id, &self.pool, &mut self.scheduler)
            }
            SimEvent::ServiceComplete { server, request_id } => lifecycle::complete(
                server,
                request_id,
                &mut self.pool,
                &mut self.scheduler,
                &mut self.metrics,
            ),
        }
    }

    /// Handle an arrival: build the request, route it, then schedule the
    /// next arrival.
    fn handle_arrival(&mut self) {
        let now = self.scheduler.now_ticks();
        let request = self.generator.next_request(now, &mut self.rng);
        self.metrics.record_arrival();

        match self.balancer.distribute(&self.pool, now, &mut self.rng) {
            Routing::Route(server) => {
                lifecycle::start(request, server, &mut self.pool, &mut self.scheduler)
            }
            Routing::Overflow => {
                self.metrics.record_overflow();
                lifecycle::start(
                    request,
                    ServerId::Emergency,
                    &mut self.pool,
                    &mut self.scheduler,
                );
            }
            Routing::Discard => {
                debug!(request_id = request.id, class = %request.class, "request discarded");
                self.metrics.record_discard();
            }
        }

        let interval = self.generator.next_interval(&mut self.rng);
        self.scheduler.schedule(interval, SimEvent::Arrival);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TICKS_PER_UNIT;
    use balancesim_policies::RoundRobin;

    fn test_config() -> SimConfig {
        SimConfig::from_str(
            r#"
[simulation]
name = "test"
seed = 42
horizon = 200.0

[cluster]
num_servers = 2
queue_bound = 50
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_engine_creation() {
        let engine =
            SimulationEngine::new(test_config(), BalancingPolicy::RoundRobin(RoundRobin::new()))
                .unwrap();
        assert_eq!(engine.pool.ordinary().len(), 2);
        assert!(engine.pool.emergency().is_none());
        assert_eq!(engine.events_processed, 0);
        assert_eq!(engine.pending_events(), 1);
    }

    #[test]
    fn test_first_arrival_at_time_zero() {
        let mut engine = SimulationEngine::from_config(test_config()).unwrap();
        assert_eq!(engine.step(), Some(SimEvent::Arrival));
        assert_eq!(engine.now(), 0.0);
        assert_eq!(engine.metrics.generated_count(), 1);
        // The request went straight into service on server 0.
        assert!(engine.pool[ServerId::Pool(0)].is_busy());
    }

    #[test]
    fn test_clock_never_goes_backwards() {
        let mut engine = SimulationEngine::from_config(test_config()).unwrap();
        let mut last = 0.0;
        while engine.step().is_some() {
            assert!(engine.now() >= last);
            last = engine.now();
        }
        assert!(last <= 200.0);
    }

    #[test]
    fn test_run_produces_metrics() {
        let mut engine = SimulationEngine::from_config(test_config()).unwrap();
        let metrics = engine.run().unwrap();

        assert_eq!(metrics.policy, "round_robin");
        assert!(metrics.completed_requests > 0);
        assert!(metrics.throughput > 0.0);
        assert_eq!(metrics.events_processed, engine.events_processed);
        assert_eq!(
            metrics.generated_requests,
            metrics.completed_requests + metrics.discarded_requests + metrics.in_flight_requests
        );
    }

    #[test]
    fn test_horizon_leaves_future_events_unprocessed() {
        let mut engine = SimulationEngine::from_config(test_config()).unwrap();
        engine.run().unwrap();
        // At least the next arrival is still pending past the horizon.
        assert!(engine.pending_events() >= 1);
        assert!(engine.scheduler.next_event_ticks().unwrap() > 200 * TICKS_PER_UNIT);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let mut config = test_config();
        config.balancer.policy = "fastest_first".to_string();
        assert!(matches!(
            SimulationEngine::from_config(config),
            Err(SimError::Configuration(msg)) if msg.contains("fastest_first")
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = test_config();
        config.simulation.horizon = -1.0;
        assert!(matches!(
            SimulationEngine::from_config(config),
            Err(SimError::Config(_))
        ));
    }
}
