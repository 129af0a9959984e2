/// Integration tests for the simulation engine.
use balancesim_core::config::SimConfig;
use balancesim_core::server::ServerId;
use balancesim_core::{SimError, SimulationEngine};

fn reference_config() -> SimConfig {
    SimConfig::from_str(
        r#"
[simulation]
name = "integration-test"
seed = 7777
horizon = 800.0

[cluster]
num_servers = 3
speeds = [1.0, 1.0, 1.0]
queue_bound = 1000

[workload]
mean_interarrival = 4.0
cpu_fraction = 0.7

[workload.cpu]
distribution = "normal"
mean = 3.0
std_dev = 0.5

[workload.io]
distribution = "normal"
mean = 9.0
std_dev = 1.0

[balancer]
policy = "round_robin"
"#,
    )
    .unwrap()
}

fn overloaded_config(queue_bound: u32, emergency: bool) -> SimConfig {
    SimConfig::from_str(&format!(
        r#"
[simulation]
name = "overload-test"
seed = 11
horizon = 300.0

[cluster]
num_servers = 3
queue_bound = {}

[cluster.emergency]
enabled = {}
speed = 1.0

[workload]
mean_interarrival = 0.5

[balancer]
policy = "shortest_queue"
"#,
        queue_bound, emergency
    ))
    .unwrap()
}

#[test]
fn test_reference_scenario_round_robin() {
    let metrics = balancesim_core::run_simulation(reference_config()).unwrap();

    assert!(metrics.completed_requests > 150);
    assert_eq!(metrics.discarded_requests, 0);
    assert_eq!(metrics.overflowed_requests, 0);
    assert_eq!(metrics.discard_rate, 0.0);

    let utilizations: Vec<f64> = metrics
        .per_server
        .iter()
        .map(|s| s.utilization)
        .collect();
    assert_eq!(utilizations.len(), 3);
    let max = utilizations.iter().cloned().fold(f64::MIN, f64::max);
    let min = utilizations.iter().cloned().fold(f64::MAX, f64::min);
    assert!(
        max - min < 0.15,
        "round robin should balance utilization, got {:?}",
        utilizations
    );
    assert!(min > 0.2 && max < 0.7, "utilizations {:?}", utilizations);

    // Weighted mean service time is 3 * 0.7 + 9 * 0.3 = 4.8; queueing adds on top.
    assert!(
        metrics.mean_response_time > 4.8,
        "mean response time {}",
        metrics.mean_response_time
    );
    assert!(metrics.mean_waiting_time > 0.0);
    assert!(metrics.jains_fairness_index > 0.95);
}

#[test]
fn test_every_completion_is_positive_and_within_horizon() {
    let mut engine = SimulationEngine::from_config(reference_config()).unwrap();
    engine.run().unwrap();

    for record in engine.metrics.records() {
        assert!(record.response_time > 0.0, "record {:?}", record);
        assert!(record.completion_time <= 800.0);
        assert!(record.service_start >= record.arrival_time);
        assert!((record.response_time - record.waiting_time() - record.occupation).abs() < 1e-6);
    }
}

#[test]
fn test_conservation_of_requests() {
    for (bound, emergency) in [(1000, false), (2, true), (2, false), (1, true)] {
        let mut engine =
            SimulationEngine::from_config(overloaded_config(bound, emergency)).unwrap();
        let metrics = engine.run().unwrap();
        assert_eq!(
            metrics.generated_requests,
            metrics.completed_requests + metrics.discarded_requests + metrics.in_flight_requests,
            "bound={} emergency={}",
            bound,
            emergency
        );
        assert_eq!(metrics.in_flight_requests, engine.pool.in_flight());
    }
}

#[test]
fn test_capacity_bound_holds_at_every_event() {
    let bound = 3;
    let mut engine = SimulationEngine::from_config(overloaded_config(bound, true)).unwrap();

    while engine.step().is_some() {
        for server in engine.pool.iter() {
            assert!(
                server.queue_length() <= bound as usize,
                "{} queue {} exceeds bound {} at t={}",
                server.id,
                server.queue_length(),
                bound,
                engine.now()
            );
        }
    }
    for server in engine.pool.iter() {
        assert!(server.peak_queue_length <= bound as usize);
    }
}

#[test]
fn test_overflow_scenario() {
    let metrics = balancesim_core::run_simulation(overloaded_config(1, true)).unwrap();

    assert!(metrics.overflowed_requests > 0);
    assert!(metrics.discarded_requests > 0);
    assert!(metrics.discard_rate > 0.0 && metrics.discard_rate < 1.0);
    let emergency = metrics.server(ServerId::Emergency).unwrap();
    assert!(emergency.utilization > 0.0);
    assert!(emergency.served > 0);
}

#[test]
fn test_no_emergency_server_discards_instead_of_overflowing() {
    let metrics = balancesim_core::run_simulation(overloaded_config(1, false)).unwrap();

    assert_eq!(metrics.overflowed_requests, 0);
    assert!(metrics.discarded_requests > 0);
    assert!(metrics.server(ServerId::Emergency).is_none());
}

#[test]
fn test_emergency_idle_when_bound_never_reached() {
    let mut config = reference_config();
    config.cluster.emergency.enabled = true;
    let metrics = balancesim_core::run_simulation(config).unwrap();

    let emergency = metrics.server(ServerId::Emergency).unwrap();
    assert_eq!(emergency.utilization, 0.0);
    assert_eq!(metrics.overflowed_requests, 0);
}

#[test]
fn test_same_seed_is_byte_identical() {
    let a = balancesim_core::run_simulation(reference_config()).unwrap();
    let b = balancesim_core::run_simulation(reference_config()).unwrap();
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn test_different_seed_changes_results() {
    let a = balancesim_core::run_simulation(reference_config()).unwrap();
    let mut config = reference_config();
    config.simulation.seed = 1;
    let b = balancesim_core::run_simulation(config).unwrap();
    assert_ne!(a.mean_response_time, b.mean_response_time);
}

#[test]
fn test_speed_scales_occupation() {
    let mut slow = reference_config();
    slow.cluster.speeds = Some(vec![0.5, 0.5, 0.5]);
    let mut fast = reference_config();
    fast.cluster.speeds = Some(vec![2.0, 2.0, 2.0]);

    let slow = balancesim_core::run_simulation(slow).unwrap();
    let fast = balancesim_core::run_simulation(fast).unwrap();
    assert!(slow.mean_pool_utilization > fast.mean_pool_utilization * 2.0);
    assert!(slow.mean_response_time > fast.mean_response_time);
}

#[test]
fn test_horizon_without_completions_is_an_error() {
    let mut config = reference_config();
    config.simulation.horizon = 0.5;
    let result = balancesim_core::run_simulation(config);
    assert!(matches!(
        result,
        Err(SimError::NoCompletedRequests { horizon }) if horizon == 0.5
    ));
}

#[test]
fn test_unknown_policy_is_a_configuration_error() {
    let mut config = reference_config();
    config.balancer.policy = "weighted_magic".to_string();
    let err = balancesim_core::run_simulation(config).unwrap_err();
    assert!(matches!(err, SimError::Configuration(_)));
    assert!(err.to_string().contains("weighted_magic"));
}
