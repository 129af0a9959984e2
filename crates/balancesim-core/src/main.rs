//! BalanceSim CLI — Compare load balancing policies on a simulated server pool.

use balancesim_core::config::SimConfig;
use balancesim_core::{logging, metrics};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "balancesim",
    about = "Compare load balancing policies on a simulated server pool",
    version
)]
struct Cli {
    /// Default log level (trace, debug, info, warn, error). RUST_LOG wins.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation with a single policy.
    Run {
        /// Path to TOML configuration file. Built-in defaults when absent.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Balancing policy name, overriding the config.
        #[arg(short, long)]
        policy: Option<String>,
        /// Random seed, overriding the config.
        #[arg(short, long)]
        seed: Option<u64>,
        /// Output results to JSON file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compare multiple policies on the same configuration.
    Compare {
        /// Path to TOML configuration file. Built-in defaults when absent.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Comma-separated list of policy names.
        #[arg(short = 'P', long, value_delimiter = ',')]
        policies: Vec<String>,
        /// Output results to JSON file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Sweep mean inter-arrival times for several policies.
    Sweep {
        /// Path to TOML configuration file. Built-in defaults when absent.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Comma-separated list of policy names.
        #[arg(short = 'P', long, value_delimiter = ',')]
        policies: Vec<String>,
        /// Comma-separated list of mean inter-arrival times.
        #[arg(long, value_delimiter = ',')]
        intervals: Vec<f64>,
        /// Output results to JSON file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List available policies.
    ListPolicies,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level);

    match cli.command {
        Commands::Run {
            config,
            policy,
            seed,
            output,
        } => {
            let mut sim_config = load_config(config.as_deref());
            if let Some(seed) = seed {
                sim_config.simulation.seed = seed;
            }

            let result = match policy {
                Some(name) => balancesim_core::run_with_policy(sim_config, &name),
                None => balancesim_core::run_simulation(sim_config),
            }
            .unwrap_or_else(|e| {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            });

            println!("{}", metrics::format_table(&result));
            if let Some(output_path) = output {
                write_json(&output_path, &result);
            }
        }
        Commands::Compare {
            config,
            policies,
            output,
        } => {
            let sim_config = load_config(config.as_deref());
            let names: Vec<&str> = if policies.is_empty() {
                balancesim_policies::available_policies()
            } else {
                policies.iter().map(|s| s.as_str()).collect()
            };

            let results =
                balancesim_core::compare_policies(&sim_config, &names).unwrap_or_else(|e| {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                });

            println!("{}", metrics::format_comparison_table(&results));
            for result in &results {
                println!("{}", metrics::format_table(result));
            }

            if let Some(output_path) = output {
                write_json(&output_path, &results);
            }
        }
        Commands::Sweep {
            config,
            policies,
            intervals,
            output,
        } => {
            let sim_config = load_config(config.as_deref());
            let grid = sim_config.sweep.clone().unwrap_or_default();

            let names: Vec<&str> = if !policies.is_empty() {
                policies.iter().map(|s| s.as_str()).collect()
            } else if !grid.policies.is_empty() {
                grid.policies.iter().map(|s| s.as_str()).collect()
            } else {
                balancesim_policies::available_policies()
            };
            let intervals = if !intervals.is_empty() {
                intervals
            } else if !grid.mean_interarrivals.is_empty() {
                grid.mean_interarrivals
            } else {
                vec![sim_config.workload.mean_interarrival]
            };
            if let Some(bad) = intervals.iter().find(|m| !(m.is_finite() && **m > 0.0)) {
                eprintln!("Error: mean inter-arrival times must be > 0, got {}", bad);
                std::process::exit(1);
            }

            let results = balancesim_core::sweep(&sim_config, &names, &intervals)
                .unwrap_or_else(|e| {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                });

            for result in &results {
                println!(
                    "{:<16} interval {:>6.2}: throughput={:.3} mean RT={:.2} util={:.1}% discard={:.2}%",
                    result.policy,
                    result.mean_interarrival,
                    result.throughput,
                    result.mean_response_time,
                    result.mean_pool_utilization * 100.0,
                    result.discard_rate * 100.0,
                );
            }
            println!("{}", metrics::format_comparison_table(&results));

            if let Some(output_path) = output {
                write_json(&output_path, &results);
            }
        }
        Commands::ListPolicies => {
            println!("Available balancing policies:");
            for name in balancesim_policies::available_policies() {
                println!("  - {}", name);
            }
        }
    }
}

fn load_config(path: Option<&Path>) -> SimConfig {
    match path {
        Some(p) => SimConfig::from_file(p).unwrap_or_else(|e| {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }),
        None => SimConfig::default(),
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("Error serializing results: {}", e);
        std::process::exit(1);
    });
    std::fs::write(path, json).unwrap_or_else(|e| {
        eprintln!("Error writing output: {}", e);
        std::process::exit(1);
    });
    println!("Results written to {}", path.display());
}
