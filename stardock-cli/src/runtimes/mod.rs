mod demo;

#[cfg(feature = "docker")]
mod docker;

use std::sync::Arc;
use std::time::Duration;

use stardock_core::config::DashboardConfig;
use stardock_core::runtime::RuntimeClient;

use crate::error::{Result, SetupError};

pub use demo::DemoRuntime;

#[cfg(feature = "docker")]
pub use docker::DockerRuntime;

const DEMO_LATENCY: Duration = Duration::from_millis(120);

/// Build the runtime client the dashboard and subcommands talk to
pub fn connect(demo: bool, config: &DashboardConfig) -> Result<Arc<dyn RuntimeClient>> {
    if demo {
        return Ok(Arc::new(DemoRuntime::new().with_latency(DEMO_LATENCY)));
    }
    docker_runtime(config)
}

#[cfg(feature = "docker")]
fn docker_runtime(config: &DashboardConfig) -> Result<Arc<dyn RuntimeClient>> {
    let runtime = DockerRuntime::connect(config.group_label.clone()).map_err(|e| {
        SetupError::Connect {
            message: e.to_string(),
        }
    })?;
    Ok(Arc::new(runtime))
}

#[cfg(not(feature = "docker"))]
fn docker_runtime(_config: &DashboardConfig) -> Result<Arc<dyn RuntimeClient>> {
    Err(SetupError::DockerDisabled)
}
