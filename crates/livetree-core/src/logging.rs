//! Tracing subscriber setup.
//!
//! The viewer owns stdout, so it logs to a daily-rolling file under
//! `${LIVETREE_HOME}/logs`. One-shot commands log to stderr instead.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{Config, paths};

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV: &str = "LIVETREE_LOG";

const LOG_FILE_PREFIX: &str = "livetree.log";

fn env_filter(config: &Config) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

/// Installs a file logger in the default logs directory.
///
/// Keep the returned guard alive until exit; dropping it flushes the writer.
pub fn init_file(config: &Config) -> Result<WorkerGuard> {
    init_file_in(&paths::logs_dir(), config)
}

pub fn init_file_in(dir: &Path, config: &Config) -> Result<WorkerGuard> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

/// Installs a stderr logger for non-interactive commands.
pub fn init_stderr(config: &Config) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("Failed to install tracing subscriber")
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_file_logger_creates_directory() {
        let dir = tempdir().unwrap();
        let logs = dir.path().join("nested").join("logs");

        let _guard = init_file_in(&logs, &Config::default()).unwrap();
        tracing::info!(target: "livetree_core", "hello");

        assert!(logs.is_dir());
    }
}
