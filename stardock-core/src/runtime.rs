//! The seam between the dashboard and a container runtime.
//!
//! Implementations live in the CLI crate: a bollard-backed Docker client and
//! an in-memory demo runtime. Everything here is request/response; the
//! caller decides when to ask.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::RuntimeResult;
use crate::model::{RawResource, ResourceId};

/// How much history a log fetch returns
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogWindow {
    /// Last N lines
    Tail(usize),
    /// Everything newer than now minus the duration
    Since(Duration),
}

impl Default for LogWindow {
    fn default() -> Self {
        LogWindow::Since(Duration::from_secs(24 * 60 * 60))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRequest {
    pub id: ResourceId,
    pub window: LogWindow,
    pub timestamps: bool,
}

impl LogRequest {
    pub fn new(id: impl Into<ResourceId>, window: LogWindow, timestamps: bool) -> Self {
        Self {
            id: id.into(),
            window,
            timestamps,
        }
    }
}

#[async_trait]
pub trait RuntimeClient: Send + Sync {
    /// Short label shown in the status bar
    fn name(&self) -> &str;

    /// Liveness check; `Err(Unavailable)` when the daemon does not answer
    async fn ping(&self) -> RuntimeResult<()>;

    async fn list_resources(&self, include_stopped: bool) -> RuntimeResult<Vec<RawResource>>;

    async fn start_resource(&self, id: &str) -> RuntimeResult<()>;

    async fn stop_resource(&self, id: &str) -> RuntimeResult<()>;

    /// Full log text for the requested window, stdout and stderr interleaved
    async fn fetch_logs(&self, request: &LogRequest) -> RuntimeResult<String>;
}
