//! Metrics collection and aggregation for simulation runs.
//!
//! The [`MetricsCollector`] is a plain accumulator mutated by the engine while
//! the run is in progress. Once the horizon is reached, [`MetricsCollector::aggregate`]
//! derives throughput, response-time statistics, per-server utilization and
//! the discard rate.

use crate::clock::ticks_to_units;
use crate::config::SimConfig;
use crate::error::SimError;
use crate::request::{Occupant, RequestClass};
use crate::server::{ServerId, ServerPool};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-request completion record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub request_id: u64,
    pub class: RequestClass,
    pub server: ServerId,
    pub arrival_time: f64,
    pub service_start: f64,
    pub completion_time: f64,
    /// Completion minus arrival.
    pub response_time: f64,
    /// Time the server was held, after speed scaling.
    pub occupation: f64,
}

impl CompletionRecord {
    /// Time spent in the wait queue.
    pub fn waiting_time(&self) -> f64 {
        self.service_start - self.arrival_time
    }
}

/// Percentile values for a distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl Percentiles {
    /// Compute percentiles from a slice of values.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                p50: 0.0,
                p90: 0.0,
                p99: 0.0,
                min: 0.0,
                max: 0.0,
                mean: 0.0,
            };
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;

        Self {
            p50: percentile_sorted(&sorted, 50.0),
            p90: percentile_sorted(&sorted, 90.0),
            p99: percentile_sorted(&sorted, 99.0),
            min: sorted[0],
            max: sorted[n - 1],
            mean,
        }
    }
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = (p / 100.0 * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Utilization summary of one server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerUtilization {
    pub server: ServerId,
    pub speed: f64,
    /// Occupied time of completed services.
    pub busy_time: f64,
    /// `busy_time / horizon`.
    pub utilization: f64,
    pub served: u64,
    pub peak_queue_length: usize,
}

/// Response-time summary of one request class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub class: RequestClass,
    pub completed: u64,
    pub mean_response_time: f64,
}

/// Aggregated metrics for an entire simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationMetrics {
    /// Simulation name from the config.
    pub name: String,
    /// Balancing policy name.
    pub policy: String,
    pub seed: u64,
    pub horizon: f64,
    pub mean_interarrival: f64,

    // Request accounting
    pub generated_requests: u64,
    pub completed_requests: u64,
    pub discarded_requests: u64,
    /// Requests redirected to the emergency server.
    pub overflowed_requests: u64,
    /// Requests still waiting or in service at the horizon.
    pub in_flight_requests: u64,

    // Derived rates
    /// Completions per unit of simulated time.
    pub throughput: f64,
    pub mean_response_time: f64,
    pub mean_waiting_time: f64,
    pub response_time: Percentiles,
    /// `discarded / (discarded + completed)`.
    pub discard_rate: f64,

    // Utilization
    pub per_server: Vec<ServerUtilization>,
    /// Mean utilization of the ordinary servers.
    pub mean_pool_utilization: f64,
    /// Jain's index over ordinary-server busy time.
    pub jains_fairness_index: f64,

    pub per_class: Vec<ClassSummary>,
    pub events_processed: u64,
}

impl SimulationMetrics {
    /// Utilization entry of a given server.
    pub fn server(&self, id: ServerId) -> Option<&ServerUtilization> {
        self.per_server.iter().find(|s| s.server == id)
    }
}

/// Collector that accumulates per-request metrics during simulation.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    /// Per-request records in completion order.
    records: Vec<CompletionRecord>,
    /// Cumulative occupied ticks per server.
    busy_ticks: BTreeMap<ServerId, u64>,
    generated: u64,
    discarded: u64,
    overflowed: u64,
}

impl MetricsCollector {
    /// Create a new collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a request produced by the arrival generator.
    pub fn record_arrival(&mut self) {
        self.generated += 1;
    }

    /// Count a request dropped by the balancer.
    pub fn record_discard(&mut self) {
        self.discarded += 1;
    }

    /// Count a request redirected to the emergency server.
    pub fn record_overflow(&mut self) {
        self.overflowed += 1;
    }

    /// Record a finished service on `server` at `now_ticks`.
    pub fn record_completion(&mut self, server: ServerId, occupant: &Occupant, now_ticks: u64) {
        let request = &occupant.request;
        *self.busy_ticks.entry(server).or_insert(0) += occupant.occupation_ticks;
        self.records.push(CompletionRecord {
            request_id: request.id,
            class: request.class,
            server,
            arrival_time: request.arrival_time(),
            service_start: ticks_to_units(occupant.started_ticks),
            completion_time: ticks_to_units(now_ticks),
            response_time: ticks_to_units(now_ticks - request.arrival_ticks),
            occupation: ticks_to_units(occupant.occupation_ticks),
        });
    }

    /// All completion records, in completion order.
    pub fn records(&self) -> &[CompletionRecord] {
        &self.records
    }

    /// Response times, in completion order.
    pub fn response_times(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.response_time).collect()
    }

    /// Cumulative occupied time of a server.
    pub fn busy_time(&self, server: ServerId) -> f64 {
        ticks_to_units(self.busy_ticks.get(&server).copied().unwrap_or(0))
    }

    pub fn completed_count(&self) -> u64 {
        self.records.len() as u64
    }

    pub fn generated_count(&self) -> u64 {
        self.generated
    }

    pub fn discarded_count(&self) -> u64 {
        self.discarded
    }

    pub fn overflowed_count(&self) -> u64 {
        self.overflowed
    }

    /// Aggregate all metrics into a summary.
    ///
    /// Fails with [`SimError::NoCompletedRequests`] when nothing completed,
    /// since the mean response time is undefined.
    pub fn aggregate(
        &self,
        config: &SimConfig,
        policy: &str,
        pool: &ServerPool,
        events_processed: u64,
    ) -> Result<SimulationMetrics, SimError> {
        let horizon = config.simulation.horizon;
        if self.records.is_empty() {
            return Err(SimError::NoCompletedRequests { horizon });
        }

        let response_times = self.response_times();
        let completed = self.records.len() as u64;
        let mean_response_time = response_times.iter().sum::<f64>() / completed as f64;
        let mean_waiting_time =
            self.records.iter().map(|r| r.waiting_time()).sum::<f64>() / completed as f64;

        let per_server: Vec<ServerUtilization> = pool
            .iter()
            .map(|server| {
                let busy_time = self.busy_time(server.id);
                ServerUtilization {
                    server: server.id,
                    speed: server.speed,
                    busy_time,
                    utilization: busy_time / horizon,
                    served: server.served,
                    peak_queue_length: server.peak_queue_length,
                }
            })
            .collect();

        let pool_busy: Vec<f64> = per_server
            .iter()
            .filter(|s| matches!(s.server, ServerId::Pool(_)))
            .map(|s| s.busy_time)
            .collect();
        let mean_pool_utilization =
            pool_busy.iter().sum::<f64>() / (pool_busy.len().max(1) as f64 * horizon);

        let per_class = [RequestClass::Cpu, RequestClass::Io]
            .into_iter()
            .map(|class| {
                let times: Vec<f64> = self
                    .records
                    .iter()
                    .filter(|r| r.class == class)
                    .map(|r| r.response_time)
                    .collect();
                ClassSummary {
                    class,
                    completed: times.len() as u64,
                    mean_response_time: if times.is_empty() {
                        0.0
                    } else {
                        times.iter().sum::<f64>() / times.len() as f64
                    },
                }
            })
            .collect();

        let resolved = self.discarded + completed;

        Ok(SimulationMetrics {
            name: config.simulation.name.clone(),
            policy: policy.to_string(),
            seed: config.simulation.seed,
            horizon,
            mean_interarrival: config.workload.mean_interarrival,
            generated_requests: self.generated,
            completed_requests: completed,
            discarded_requests: self.discarded,
            overflowed_requests: self.overflowed,
            in_flight_requests: pool.in_flight(),
            throughput: completed as f64 / horizon,
            mean_response_time,
            mean_waiting_time,
            response_time: Percentiles::from_values(&response_times),
            discard_rate: self.discarded as f64 / resolved as f64,
            per_server,
            mean_pool_utilization,
            jains_fairness_index: jains_fairness_index(&pool_busy),
            per_class,
            events_processed,
        })
    }
}

/// Jain's fairness index: (sum(x_i))^2 / (n * sum(x_i^2)).
fn jains_fairness_index(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 1.0;
    }
    let n = values.len() as f64;
    let sum: f64 = values.iter().sum();
    let sum_sq: f64 = values.iter().map(|v| v.powi(2)).sum();
    if sum_sq == 0.0 {
        return 1.0;
    }
    (sum * sum) / (n * sum_sq)
}

/// Format metrics as a pretty-printed table string.
pub fn format_table(metrics: &SimulationMetrics) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\n{:=<70}\n",
        format!("  {} / {} Results  ", metrics.name, metrics.policy)
    ));
    out.push_str(&format!(
        "  Horizon: {:.1} | Mean inter-arrival: {:.2} | Seed: {}\n",
        metrics.horizon, metrics.mean_interarrival, metrics.seed
    ));
    out.push_str(&format!(
        "  Requests: {} generated, {} completed, {} discarded, {} overflowed, {} in flight\n",
        metrics.generated_requests,
        metrics.completed_requests,
        metrics.discarded_requests,
        metrics.overflowed_requests,
        metrics.in_flight_requests,
    ));
    out.push_str(&format!("{:-<70}\n", "  Throughput & Latency  "));
    out.push_str(&format!("  Throughput:          {:.2}\n", metrics.throughput));
    out.push_str(&format!(
        "  Mean response time:  {:.2}  (waiting {:.2})\n",
        metrics.mean_response_time, metrics.mean_waiting_time
    ));
    out.push_str(&format!(
        "  Response time       P50={:>8.2}  P90={:>8.2}  P99={:>8.2}\n",
        metrics.response_time.p50, metrics.response_time.p90, metrics.response_time.p99
    ));
    for class in &metrics.per_class {
        out.push_str(&format!(
            "  {:<4} requests: {:>6}  mean response {:.2}\n",
            class.class.to_string(),
            class.completed,
            class.mean_response_time
        ));
    }
    out.push_str(&format!("  Discard rate:        {:.2}%\n", metrics.discard_rate * 100.0));
    out.push_str(&format!("{:-<70}\n", "  Utilization  "));
    for server in &metrics.per_server {
        out.push_str(&format!(
            "  {:<10} speed {:>4.2}  utilization {:>6.2}%  served {:>6}  peak queue {}\n",
            server.server.to_string(),
            server.speed,
            server.utilization * 100.0,
            server.served,
            server.peak_queue_length,
        ));
    }
    out.push_str(&format!(
        "  Mean pool utilization: {:.2}%  Jain's index: {:.4}\n",
        metrics.mean_pool_utilization * 100.0,
        metrics.jains_fairness_index
    ));
    out.push_str(&format!("{:=<70}\n", ""));
    out
}

/// Format a comparison table of multiple runs.
pub fn format_comparison_table(results: &[SimulationMetrics]) -> String {
    if results.is_empty() {
        return String::from("No results to compare.\n");
    }

    let mut out = String::new();
    out.push_str(&format!("\n{:=<90}\n", "  Policy Comparison  "));
    out.push_str(&format!(
        "{:<16} {:>8} {:>10} {:>10} {:>10} {:>10} {:>10} {:>8}\n",
        "Policy", "Interval", "Thruput", "Mean RT", "P99 RT", "Util%", "Discard%", "Jain's"
    ));
    out.push_str(&format!("{:-<90}\n", ""));

    for m in results {
        out.push_str(&format!(
            "{:<16} {:>8.2} {:>10.3} {:>10.2} {:>10.2} {:>9.1}% {:>9.2}% {:>8.4}\n",
            m.policy,
            m.mean_interarrival,
            m.throughput,
            m.mean_response_time,
            m.response_time.p99,
            m.mean_pool_utilization * 100.0,
            m.discard_rate * 100.0,
            m.jains_fairness_index,
        ));
    }
    out.push_str(&format!("{:=<90}\n", ""));
    out
}
