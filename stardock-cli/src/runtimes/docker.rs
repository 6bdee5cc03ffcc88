#![cfg(feature = "docker")]

use async_trait::async_trait;
use bollard::Docker;
use bollard::container::{
    ListContainersOptions, LogsOptions, StartContainerOptions, StopContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::models::ContainerSummary;
use futures_util::StreamExt;
use tracing::debug;

use stardock_core::error::{CommandKind, RuntimeError, RuntimeResult};
use stardock_core::model::{PortBinding, RawResource};
use stardock_core::runtime::{LogRequest, LogWindow, RuntimeClient};

/// Runtime client talking to the local Docker daemon
pub struct DockerRuntime {
    client: Docker,
    group_label: String,
}

impl DockerRuntime {
    pub fn connect(group_label: impl Into<String>) -> RuntimeResult<Self> {
        let client = Docker::connect_with_local_defaults()
            .map_err(|e| RuntimeError::unavailable(format!("failed to connect to Docker: {}", e)))?;
        Ok(Self {
            client,
            group_label: group_label.into(),
        })
    }
}

fn summary_to_raw(summary: ContainerSummary, group_label: &str) -> RawResource {
    let group = summary
        .labels
        .as_ref()
        .and_then(|labels| labels.get(group_label))
        .cloned();

    let ports = summary
        .ports
        .unwrap_or_default()
        .into_iter()
        .map(|port| PortBinding {
            ip: port.ip,
            private_port: port.private_port,
            public_port: port.public_port,
            protocol: port.typ.map(|t| t.to_string()),
        })
        .collect();

    RawResource {
        id: summary.id.unwrap_or_default(),
        names: summary.names.unwrap_or_default(),
        image: summary.image,
        ports,
        status: summary.status,
        state: summary.state.map(|s| s.to_string()),
        group,
    }
}

/// The daemon answered with an error: the request was wrong, not the
/// connection. Anything else means the daemon could not be reached.
fn command_error(action: CommandKind, id: &str, err: BollardError) -> RuntimeError {
    match err {
        BollardError::DockerResponseServerError { message, .. } => {
            RuntimeError::command(action, id, message)
        }
        other => RuntimeError::unavailable(other.to_string()),
    }
}

fn logs_error(id: &str, err: BollardError) -> RuntimeError {
    match err {
        BollardError::DockerResponseServerError { message, .. } => RuntimeError::logs(id, message),
        other => RuntimeError::unavailable(other.to_string()),
    }
}

fn listing_error(err: BollardError) -> RuntimeError {
    match err {
        BollardError::DockerResponseServerError { message, .. } => RuntimeError::listing(message),
        other => RuntimeError::unavailable(other.to_string()),
    }
}

fn logs_options(window: LogWindow, timestamps: bool) -> LogsOptions<String> {
    let (since, tail) = match window {
        LogWindow::Tail(lines) => (0, lines.to_string()),
        LogWindow::Since(window) => {
            let since = chrono::Utc::now().timestamp() - window.as_secs() as i64;
            (since.max(0), "all".to_string())
        }
    };
    LogsOptions::<String> {
        follow: false,
        stdout: true,
        stderr: true,
        since,
        timestamps,
        tail,
        ..Default::default()
    }
}

#[async_trait]
impl RuntimeClient for DockerRuntime {
    fn name(&self) -> &str {
        "docker"
    }

    async fn ping(&self) -> RuntimeResult<()> {
        self.client
            .ping()
            .await
            .map(|_| ())
            .map_err(|e| RuntimeError::unavailable(format!("Docker ping failed: {}", e)))
    }

    async fn list_resources(&self, include_stopped: bool) -> RuntimeResult<Vec<RawResource>> {
        let options = ListContainersOptions::<String> {
            all: include_stopped,
            ..Default::default()
        };
        let containers = self
            .client
            .list_containers(Some(options))
            .await
            .map_err(listing_error)?;
        debug!(count = containers.len(), "listed containers");
        Ok(containers
            .into_iter()
            .map(|c| summary_to_raw(c, &self.group_label))
            .collect())
    }

    async fn start_resource(&self, id: &str) -> RuntimeResult<()> {
        self.client
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| command_error(CommandKind::Start, id, e))
    }

    async fn stop_resource(&self, id: &str) -> RuntimeResult<()> {
        self.client
            .stop_container(id, None::<StopContainerOptions>)
            .await
            .map_err(|e| command_error(CommandKind::Stop, id, e))
    }

    async fn fetch_logs(&self, request: &LogRequest) -> RuntimeResult<String> {
        let options = logs_options(request.window, request.timestamps);
        let mut stream = self.client.logs(&request.id, Some(options));
        let mut content = String::new();
        while let Some(chunk) = stream.next().await {
            let output = chunk.map_err(|e| logs_error(&request.id, e))?;
            content.push_str(&output.to_string());
        }
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bollard::models::Port;

    use super::*;

    #[test]
    fn test_tail_window_options() {
        let options = logs_options(LogWindow::Tail(200), true);
        assert_eq!(options.tail, "200");
        assert_eq!(options.since, 0);
        assert!(options.timestamps);
        assert!(options.stdout && options.stderr);
        assert!(!options.follow);
    }

    #[test]
    fn test_since_window_options() {
        let options = logs_options(LogWindow::Since(Duration::from_secs(86400)), false);
        assert_eq!(options.tail, "all");
        let expected = chrono::Utc::now().timestamp() - 86400;
        assert!((options.since - expected).abs() <= 2);
    }

    #[test]
    fn test_summary_to_raw() {
        let summary = ContainerSummary {
            id: Some("abc123".into()),
            names: Some(vec!["/shop-api-1".into()]),
            image: Some("shop/api:latest".into()),
            status: Some("Up 3 hours".into()),
            labels: Some(
                [("com.docker.compose.project".to_string(), "shop".to_string())]
                    .into_iter()
                    .collect(),
            ),
            ports: Some(vec![Port {
                ip: Some("0.0.0.0".into()),
                private_port: 80,
                public_port: Some(8080),
                ..Default::default()
            }]),
            ..Default::default()
        };
        let raw = summary_to_raw(summary, "com.docker.compose.project");
        assert_eq!(raw.id, "abc123");
        assert_eq!(raw.names, vec!["/shop-api-1"]);
        assert_eq!(raw.group.as_deref(), Some("shop"));
        assert_eq!(raw.ports[0].public_port, Some(8080));

        let raw = summary_to_raw(ContainerSummary::default(), "io.stack");
        assert_eq!(raw.group, None);
        assert!(raw.ports.is_empty());
    }

    #[test]
    fn test_server_error_is_command_error() {
        let err = command_error(
            CommandKind::Stop,
            "abc",
            BollardError::DockerResponseServerError {
                status_code: 404,
                message: "No such container: abc".into(),
            },
        );
        assert!(matches!(err, RuntimeError::Command { .. }));
        assert!(err.to_string().contains("No such container"));
    }

    #[test]
    fn test_listing_server_error_is_not_unavailable() {
        let err = listing_error(BollardError::DockerResponseServerError {
            status_code: 500,
            message: "layer store corrupted".into(),
        });
        assert!(matches!(err, RuntimeError::Listing { .. }));
        assert!(!err.is_unavailable());

        let err = listing_error(BollardError::RequestTimeoutError);
        assert!(err.is_unavailable());
    }
}
