use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;

use crate::CliError;

/// Targets recorded in a run's `logs.ndjson`, independent of `RUST_LOG`.
const RUN_LOG_TARGETS: &[&str] = &["mockgraph", "mockgraph_generate"];

/// Console output filtered by `RUST_LOG` (default `info`), plus mockgraph
/// events as JSON lines appended to `path`.
pub fn init_run_logging(path: &Path) -> Result<(), CliError> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let run_log = tracing_subscriber::fmt::layer()
        .json()
        .with_timer(UtcTime::rfc_3339())
        .with_writer(Mutex::new(file))
        .with_filter(run_log_targets());

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(io::stderr)
        .with_filter(console_filter);

    tracing_subscriber::registry()
        .with(run_log)
        .with(console)
        .try_init()
        .map_err(|err| CliError::Logging(err.to_string()))
}

fn run_log_targets() -> Targets {
    RUN_LOG_TARGETS
        .iter()
        .fold(Targets::new(), |targets, target| {
            targets.with_target(*target, tracing::Level::INFO)
        })
}
