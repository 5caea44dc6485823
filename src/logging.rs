//! Tracing setup. The TUI owns stdout, so log lines go to a file in the data
//! directory instead of the console.
//!
//! `RUST_LOG` controls the filter (default `info`), e.g.
//! `RUST_LOG=cookbook_shelf=debug`.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "cookbook-shelf.log";

/// Install the global subscriber writing to `log_dir/cookbook-shelf.log`.
/// Keep the returned guard alive until shutdown or buffered lines are lost.
pub fn init_logging(log_dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))?;

    Ok(guard)
}
