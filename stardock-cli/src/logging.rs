//! Logging configuration using tracing

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::{Result, SetupError};

pub const LOG_ENV: &str = "STARDOCK_LOG";
const LOG_FILE: &str = "stardock.log";
const DEFAULT_FILTER: &str = "stardock=info,stardock_core=info,warn";

/// Initialize the logging subsystem
///
/// Logs go to a daily rolling file under `<data_local_dir>/stardock/logs/`,
/// never to the terminal, which belongs to the dashboard. `level` overrides
/// the `STARDOCK_LOG` environment variable.
///
/// ```bash
/// STARDOCK_LOG=debug stardock
/// stardock --log-level trace
/// ```
pub fn init(level: Option<&str>) -> Result<()> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE);

    let env_filter = match level {
        Some(level) => EnvFilter::try_new(level).map_err(|e| SetupError::Logging {
            message: format!("invalid log level '{}': {}", level, e),
        })?,
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .try_init()
        .map_err(|e| SetupError::Logging {
            message: e.to_string(),
        })?;

    tracing::info!("stardock {} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!("log directory: {}", log_dir.display());

    Ok(())
}

pub fn log_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("stardock").join("logs")
}
