//! Telemetry initialisation for the migration tool.
//!
//! Logs go to stderr as JSON lines. Stdout is reserved for the
//! [`MigrationReport`](common::protocol::MigrationReport) printed at the end,
//! so a caller can pipe it straight into `jq` or a file without log lines
//! mixed in.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Install the JSON stderr subscriber. `RUST_LOG` overrides `log_level`.
///
/// # Errors
///
/// Returns an error if the subscriber has already been set.
pub fn init(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise envelope-migrate tracing subscriber: {e}"))
}
