/// Integration tests for policy comparisons and arrival-rate sweeps.
use balancesim_core::config::SimConfig;
use balancesim_core::metrics::{format_comparison_table, format_table};
use balancesim_core::SimError;

const SWEEP_CONFIG: &str = r#"
[simulation]
name = "sweep-test"
seed = 99
horizon = 600.0

[cluster]
num_servers = 3
queue_bound = 5

[cluster.emergency]
enabled = true
speed = 2.0

[sweep]
policies = ["round_robin", "shortest_queue"]
mean_interarrivals = [1.5, 3.0, 8.0]
"#;

fn sweep_config() -> SimConfig {
    SimConfig::from_str(SWEEP_CONFIG).unwrap()
}

#[test]
fn test_sweep_over_configured_grid() {
    let config = sweep_config();
    let grid = config.sweep.clone().unwrap();
    let policies: Vec<&str> = grid.policies.iter().map(|s| s.as_str()).collect();

    let results = balancesim_core::sweep(&config, &policies, &grid.mean_interarrivals).unwrap();
    assert_eq!(results.len(), 6);
    for m in &results {
        assert_eq!(m.name, "sweep-test");
        assert_eq!(m.seed, 99);
        assert_eq!(
            m.generated_requests,
            m.completed_requests + m.discarded_requests + m.in_flight_requests
        );
    }
}

#[test]
fn test_utilization_grows_with_arrival_rate() {
    let config = sweep_config();
    let results = balancesim_core::sweep(&config, &["round_robin"], &[8.0, 1.5]).unwrap();
    let light = &results[0];
    let heavy = &results[1];

    assert!(heavy.mean_pool_utilization > light.mean_pool_utilization);
    assert!(heavy.throughput > light.throughput);
    assert!(heavy.discard_rate >= light.discard_rate);
}

#[test]
fn test_compare_all_policies() {
    let config = sweep_config();
    let names = balancesim_policies::available_policies();
    let results = balancesim_core::compare_policies(&config, &names).unwrap();

    assert_eq!(results.len(), 4);
    let reported: Vec<&str> = results.iter().map(|m| m.policy.as_str()).collect();
    assert_eq!(reported, names);
}

#[test]
fn test_unknown_policy_aborts_whole_sweep() {
    let config = sweep_config();
    let result = balancesim_core::sweep(&config, &["round_robin", "fastest"], &[2.0, 4.0]);
    assert!(matches!(result, Err(SimError::Configuration(_))));
}

#[test]
fn test_reports_render_and_serialize() {
    let config = sweep_config();
    let results =
        balancesim_core::compare_policies(&config, &["round_robin", "least_work"]).unwrap();

    let table = format_comparison_table(&results);
    assert!(table.contains("round_robin"));
    assert!(table.contains("least_work"));

    let single = format_table(&results[0]);
    assert!(single.contains("emergency"));

    let json = serde_json::to_string_pretty(&results).unwrap();
    assert!(json.contains("\"discard_rate\""));
    assert!(json.contains("\"mean_response_time\""));
}
