use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::navigation::TableLayout;
use crate::runtime::LogWindow;

pub const CONFIG_NAMES: [&str; 4] = [
    "stardock.yml",
    "stardock.yaml",
    ".stardock.yml",
    ".stardock.yaml",
];

pub const DEFAULT_GROUP_LABEL: &str = "com.docker.compose.project";

const DEFAULT_LOG_SINCE_SECS: u64 = 24 * 60 * 60;

/// Log fetch settings
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogsConfig {
    /// Fetch the last N lines instead of a time window
    #[serde(default)]
    pub tail: Option<usize>,

    /// Time window in seconds, used when `tail` is not set
    #[serde(default)]
    pub since_secs: Option<u64>,

    #[serde(default = "default_true")]
    pub timestamps: bool,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            tail: None,
            since_secs: None,
            timestamps: true,
        }
    }
}

/// Daemon bootstrap settings
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    /// Shell command run once when the first liveness check fails
    #[serde(default = "default_launch_command")]
    pub launch_command: Option<String>,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Give up after this long; wait forever when unset
    #[serde(default)]
    pub max_wait_secs: Option<u64>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            launch_command: default_launch_command(),
            poll_interval_ms: default_poll_interval(),
            max_wait_secs: None,
        }
    }
}

/// Root configuration file structure
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_ms: u64,

    /// List exited and created resources too
    #[serde(default = "default_true")]
    pub include_stopped: bool,

    /// Label whose value places a resource into a stack
    #[serde(default = "default_group_label")]
    pub group_label: String,

    #[serde(default)]
    pub layout: TableLayout,

    #[serde(default)]
    pub logs: LogsConfig,

    #[serde(default)]
    pub daemon: DaemonConfig,
}

fn default_true() -> bool {
    true
}
fn default_refresh_interval() -> u64 {
    1000
}
fn default_poll_interval() -> u64 {
    2000
}
fn default_group_label() -> String {
    DEFAULT_GROUP_LABEL.into()
}
fn default_launch_command() -> Option<String> {
    if cfg!(target_os = "macos") {
        Some("open -a Docker --args --unattended".into())
    } else {
        None
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval(),
            include_stopped: true,
            group_label: default_group_label(),
            layout: TableLayout::default(),
            logs: LogsConfig::default(),
            daemon: DaemonConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("logs.tail and logs.since_secs cannot both be set")]
    ConflictingLogWindow,

    #[error("group_label must not be empty")]
    EmptyGroupLabel,
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        // An empty file deserializes as `null`
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: DashboardConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `explicit` if given, else the first known file name in `dir`,
    /// else defaults. Returns the path that was read.
    pub fn resolve(
        explicit: Option<&Path>,
        dir: &Path,
    ) -> Result<(Option<PathBuf>, Self), ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => find_config(dir),
        };
        match path {
            Some(path) => {
                let config = Self::load(&path)?;
                Ok((Some(path), config))
            }
            None => Ok((None, Self::default())),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::Zero {
                field: "refresh_interval_ms",
            });
        }
        if self.daemon.poll_interval_ms == 0 {
            return Err(ConfigError::Zero {
                field: "daemon.poll_interval_ms",
            });
        }
        if self.logs.tail == Some(0) {
            return Err(ConfigError::Zero { field: "logs.tail" });
        }
        if self.logs.since_secs == Some(0) {
            return Err(ConfigError::Zero {
                field: "logs.since_secs",
            });
        }
        if self.logs.tail.is_some() && self.logs.since_secs.is_some() {
            return Err(ConfigError::ConflictingLogWindow);
        }
        if self.group_label.trim().is_empty() {
            return Err(ConfigError::EmptyGroupLabel);
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.daemon.poll_interval_ms)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.daemon.max_wait_secs.map(Duration::from_secs)
    }

    pub fn log_window(&self) -> LogWindow {
        match (self.logs.tail, self.logs.since_secs) {
            (Some(lines), _) => LogWindow::Tail(lines),
            (None, Some(secs)) => LogWindow::Since(Duration::from_secs(secs)),
            (None, None) => LogWindow::Since(Duration::from_secs(DEFAULT_LOG_SINCE_SECS)),
        }
    }
}

/// First known config file name present in `dir`
pub fn find_config(dir: &Path) -> Option<PathBuf> {
    CONFIG_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}
