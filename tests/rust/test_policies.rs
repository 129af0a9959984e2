/// Integration tests for balancing policies in a simulation context.
use balancesim_core::config::SimConfig;
use balancesim_core::server::ServerId;
use balancesim_core::SimulationEngine;
use balancesim_policies::*;

fn busy_config() -> SimConfig {
    SimConfig::from_str(
        r#"
[simulation]
name = "policy-test"
seed = 42
horizon = 2000.0

[cluster]
num_servers = 3
queue_bound = 1000

[workload]
mean_interarrival = 2.0
"#,
    )
    .unwrap()
}

fn heterogeneous_config() -> SimConfig {
    SimConfig::from_str(
        r#"
[simulation]
name = "heterogeneous"
seed = 42
horizon = 1000.0

[cluster]
num_servers = 2
speeds = [1.0, 4.0]
queue_bound = 1000

[workload]
mean_interarrival = 2.0
"#,
    )
    .unwrap()
}

#[test]
fn test_all_policies_complete_requests() {
    let config = busy_config();
    for name in available_policies() {
        let metrics = balancesim_core::run_with_policy(config.clone(), name).unwrap();
        assert_eq!(metrics.policy, name);
        assert!(
            metrics.completed_requests > 0,
            "Policy {} produced no completed requests",
            name
        );
        assert_eq!(
            metrics.generated_requests,
            metrics.completed_requests + metrics.discarded_requests + metrics.in_flight_requests
        );
    }
}

#[test]
fn test_shortest_queue_beats_random_under_load() {
    let random = balancesim_core::run_with_policy(busy_config(), "random").unwrap();
    let shortest = balancesim_core::run_with_policy(busy_config(), "shortest_queue").unwrap();
    assert!(
        shortest.mean_response_time < random.mean_response_time,
        "shortest_queue {} vs random {}",
        shortest.mean_response_time,
        random.mean_response_time
    );
}

#[test]
fn test_least_work_prefers_fast_server() {
    let metrics = balancesim_core::run_with_policy(heterogeneous_config(), "least_work").unwrap();
    let slow = metrics.server(ServerId::Pool(0)).unwrap();
    let fast = metrics.server(ServerId::Pool(1)).unwrap();
    assert!(
        fast.served > slow.served,
        "fast server served {}, slow server {}",
        fast.served,
        slow.served
    );
}

#[test]
fn test_round_robin_ignores_speed() {
    let metrics = balancesim_core::run_with_policy(heterogeneous_config(), "round_robin").unwrap();
    let slow = metrics.server(ServerId::Pool(0)).unwrap();
    let fast = metrics.server(ServerId::Pool(1)).unwrap();
    // Same share of arrivals, so the slow server is busier.
    assert!(slow.utilization > fast.utilization * 2.0);
}

#[test]
fn test_least_work_beats_round_robin_on_heterogeneous_pool() {
    let rr = balancesim_core::run_with_policy(heterogeneous_config(), "round_robin").unwrap();
    let lw = balancesim_core::run_with_policy(heterogeneous_config(), "least_work").unwrap();
    assert!(lw.mean_response_time < rr.mean_response_time);
}

#[test]
fn test_occupant_estimate_is_configurable() {
    let mut config = heterogeneous_config();
    config.balancer.policy = "least_work".to_string();
    config.balancer.occupant_estimate = OccupantEstimate::Full;

    let engine = SimulationEngine::from_config(config.clone()).unwrap();
    assert_eq!(
        engine.balancer().policy(),
        &BalancingPolicy::LeastWork(LeastWork::with_estimate(OccupantEstimate::Full))
    );

    let metrics = balancesim_core::run_simulation(config).unwrap();
    assert_eq!(metrics.policy, "least_work");
    assert!(metrics.completed_requests > 0);
}

#[test]
fn test_random_policy_is_reproducible() {
    let a = balancesim_core::run_with_policy(busy_config(), "random").unwrap();
    let b = balancesim_core::run_with_policy(busy_config(), "random").unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_deterministic_policies_share_the_workload() {
    // Only `random` draws from the run's generator besides the arrivals.
    let rr = balancesim_core::run_with_policy(busy_config(), "round_robin").unwrap();
    let sq = balancesim_core::run_with_policy(busy_config(), "shortest_queue").unwrap();
    assert_eq!(rr.generated_requests, sq.generated_requests);
}

#[test]
fn test_unknown_policy_name() {
    let err = policy_by_name("least_kv").unwrap_err();
    assert_eq!(err, PolicyError::UnknownPolicy("least_kv".to_string()));
    assert!(balancesim_core::run_with_policy(busy_config(), "least_kv").is_err());
}
