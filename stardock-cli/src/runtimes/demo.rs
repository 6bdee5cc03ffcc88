use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::Mutex;

use stardock_core::error::{CommandKind, RuntimeError, RuntimeResult};
use stardock_core::model::{LifecycleState, PortBinding, RawResource};
use stardock_core::runtime::{LogRequest, LogWindow, RuntimeClient};

#[derive(Clone, Debug)]
struct DemoContainer {
    name: String,
    image: String,
    ports: Vec<PortBinding>,
    state: LifecycleState,
    stack: Option<String>,
    /// Commands against this container always fail
    stuck: bool,
    log_lines: u64,
}

impl DemoContainer {
    fn new(name: &str, image: &str, state: LifecycleState, stack: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            image: image.to_string(),
            ports: Vec::new(),
            state,
            stack: stack.map(String::from),
            stuck: false,
            log_lines: 0,
        }
    }

    fn publish(mut self, public: u16, private: u16) -> Self {
        self.ports.push(PortBinding {
            ip: Some("0.0.0.0".into()),
            private_port: private,
            public_port: Some(public),
            protocol: Some("tcp".into()),
        });
        self
    }

    fn stuck(mut self) -> Self {
        self.stuck = true;
        self
    }

    fn status(&self) -> String {
        match self.state {
            LifecycleState::Running => "Up 2 hours".into(),
            LifecycleState::Exited => "Exited (0) 5 minutes ago".into(),
            LifecycleState::Restarting => "Restarting (1) 3 seconds ago".into(),
            other => other.as_str().to_string(),
        }
    }
}

/// In-memory runtime with a fixed set of stacks, used by `--demo` and tests.
///
/// Every log fetch on a running container appends a few generated lines, so
/// the log screen has something to follow.
pub struct DemoRuntime {
    containers: Mutex<BTreeMap<String, DemoContainer>>,
    epoch: DateTime<Utc>,
    latency: Duration,
}

impl DemoRuntime {
    pub fn new() -> Self {
        use LifecycleState::{Exited, Restarting, Running};

        let seed = [
            (
                "3f9a1c2b7d4e",
                DemoContainer::new("shop-web-1", "nginx:1.27", Running, Some("shop"))
                    .publish(8080, 80),
            ),
            (
                "8b2e4f6a1c3d",
                DemoContainer::new("shop-api-1", "shop/api:latest", Running, Some("shop"))
                    .publish(3000, 3000),
            ),
            (
                "c41d9e7f2a6b",
                DemoContainer::new("shop-db-1", "postgres:16", Exited, Some("shop")),
            ),
            (
                "5e7a3b9c1d2f",
                DemoContainer::new("grafana", "grafana/grafana:11.0.0", Exited, Some("monitoring"))
                    .publish(3001, 3000),
            ),
            (
                "a2c4e6f8b1d3",
                DemoContainer::new("prometheus", "prom/prometheus:v2.53.0", Exited, Some("monitoring")),
            ),
            (
                "d7f1b3a5c9e2",
                DemoContainer::new("redis", "redis:7-alpine", Running, None).publish(6379, 6379),
            ),
            (
                "e9b8c7d6a5f4",
                DemoContainer::new("buildkit", "moby/buildkit:buildx-stable-1", Exited, None),
            ),
            (
                "1a2b3c4d5e6f",
                DemoContainer::new("legacy-cron", "busybox:1.36", Restarting, None).stuck(),
            ),
        ];
        Self {
            containers: Mutex::new(
                seed.into_iter()
                    .map(|(id, container)| (id.to_string(), container))
                    .collect(),
            ),
            epoch: Utc
                .with_ymd_and_hms(2024, 1, 1, 9, 0, 0)
                .single()
                .unwrap_or_else(Utc::now),
            latency: Duration::ZERO,
        }
    }

    /// Delay every listing and log fetch, so fetches overlap ticks the way
    /// they do against a real daemon
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    async fn pause(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    async fn set_state(&self, action: CommandKind, id: &str) -> RuntimeResult<()> {
        let mut containers = self.containers.lock().await;
        let container = containers
            .get_mut(id)
            .ok_or_else(|| RuntimeError::command(action, id, "no such container"))?;
        if container.stuck {
            return Err(RuntimeError::command(
                action,
                id,
                "container is restarting, wait until it is running",
            ));
        }
        container.state = match action {
            CommandKind::Start => LifecycleState::Running,
            CommandKind::Stop => LifecycleState::Exited,
        };
        Ok(())
    }

    fn log_line(&self, container: &DemoContainer, n: u64, timestamps: bool) -> String {
        const MESSAGES: [&str; 5] = [
            "accepted connection",
            "GET /health 200 0.4ms",
            "cache hit ratio 0.93",
            "flushed 12 buffered writes",
            "worker heartbeat ok",
        ];
        let message = MESSAGES[(n as usize) % MESSAGES.len()];
        let text = format!("{} [{}] {}", container.name, n, message);
        if timestamps {
            let at = self.epoch + chrono::Duration::seconds(n as i64);
            format!("{} {}", at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true), text)
        } else {
            text
        }
    }
}

impl Default for DemoRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RuntimeClient for DemoRuntime {
    fn name(&self) -> &str {
        "demo"
    }

    async fn ping(&self) -> RuntimeResult<()> {
        Ok(())
    }

    async fn list_resources(&self, include_stopped: bool) -> RuntimeResult<Vec<RawResource>> {
        self.pause().await;
        let containers = self.containers.lock().await;
        Ok(containers
            .iter()
            .filter(|(_, c)| include_stopped || c.state.is_running())
            .map(|(id, c)| RawResource {
                id: id.clone(),
                names: vec![format!("/{}", c.name)],
                image: Some(c.image.clone()),
                ports: c.ports.clone(),
                status: Some(c.status()),
                state: Some(c.state.as_str().to_string()),
                group: c.stack.clone(),
            })
            .collect())
    }

    async fn start_resource(&self, id: &str) -> RuntimeResult<()> {
        self.set_state(CommandKind::Start, id).await
    }

    async fn stop_resource(&self, id: &str) -> RuntimeResult<()> {
        self.set_state(CommandKind::Stop, id).await
    }

    async fn fetch_logs(&self, request: &LogRequest) -> RuntimeResult<String> {
        self.pause().await;
        let mut containers = self.containers.lock().await;
        let container = containers
            .get_mut(&request.id)
            .ok_or_else(|| RuntimeError::logs(&request.id, "no such container"))?;

        if container.state.is_running() {
            container.log_lines += 3;
        } else if container.log_lines == 0 {
            container.log_lines = 20;
        }

        let total = container.log_lines;
        let first = match request.window {
            LogWindow::Tail(lines) => total.saturating_sub(lines as u64),
            LogWindow::Since(window) => total.saturating_sub(window.as_secs().min(total)),
        };
        let container = container.clone();
        drop(containers);

        let lines: Vec<String> = (first + 1..=total)
            .map(|n| self.log_line(&container, n, request.timestamps))
            .collect();
        Ok(lines.join("\n"))
    }
}
