//! Tracing setup for the binary
//!
//! The dashboard owns the terminal, so it logs to a file through a
//! background writer. Every other command logs to stderr.

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Non-blocking appender for `path`, creating its directory first
///
/// Lines are flushed when the returned guard is dropped.
pub fn file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("Log path {} has no file name", path.display()))?;
    let appender = tracing_appender::rolling::never(dir, file_name);

    Ok(tracing_appender::non_blocking(appender))
}

/// Install the global subscriber
///
/// Keep the returned guard alive until exit, or buffered lines are lost.
pub fn init_logging(debug: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let default_filter = if debug { "modalflow=debug" } else { "modalflow=info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());
    let registry = tracing_subscriber::registry().with(env_filter);

    let (result, guard) = match log_file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            let result = registry
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .try_init();
            (result, Some(guard))
        }
        None => {
            let result = registry
                .with(fmt::layer().with_writer(std::io::stderr))
                .try_init();
            (result, None)
        }
    };

    result.map_err(|e| anyhow!("Failed to initialize tracing: {}", e))?;
    Ok(guard)
}
