//! Structured logging setup.
//!
//! The simulator logs through `tracing`:
//! - TRACE: every processed event and lifecycle transition
//! - DEBUG: overflow and discard decisions
//! - INFO: run start and end, one line each
//!
//! `RUST_LOG` takes precedence over the level passed to [`init_logging`],
//! e.g. `RUST_LOG=balancesim_core::balancer=debug`.
//!
//! Output goes to stderr so reports on stdout stay machine-readable.

use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber with `level` as the default filter.
///
/// Calling it again is a no-op; the first subscriber stays installed.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("balancesim_core={level},balancesim_policies={level},balancesim={level}").into()
    });

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .with(filter)
        .try_init();
}
