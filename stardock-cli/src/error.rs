//! Startup failures. Any of these ends the process with exit code 1.

use std::time::Duration;

use thiserror::Error;

use stardock_core::config::ConfigError;
use stardock_core::error::RuntimeError;

pub type Result<T> = std::result::Result<T, SetupError>;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to connect to the container runtime: {message}")]
    Connect { message: String },

    #[error("container runtime still unavailable after {}s", waited.as_secs())]
    DaemonTimeout { waited: Duration },

    #[error("interrupted while waiting for the container runtime")]
    Aborted,

    #[error("this build has no Docker support; rerun with --demo")]
    DockerDisabled,

    #[error("{0}")]
    Runtime(#[from] RuntimeError),

    #[error("failed to initialize logging: {message}")]
    Logging { message: String },
}
