//! Daemon bootstrap: block until the runtime answers a ping.
//!
//! Progress goes to stderr because the dashboard has not taken over the
//! terminal yet.

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use stardock_core::runtime::RuntimeClient;

use crate::error::{Result, SetupError};

#[derive(Clone, Debug)]
pub struct ProbeOptions {
    pub launch_command: Option<String>,
    pub poll_interval: Duration,
    pub max_wait: Option<Duration>,
}

pub async fn wait_for_daemon(client: &dyn RuntimeClient, options: &ProbeOptions) -> Result<()> {
    let interrupted = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };
    wait_until_ready(client, options, interrupted).await
}

/// Poll until the runtime answers, `abort` resolves, or `max_wait` passes.
/// Every ping races `abort`, so a hung socket can still be interrupted.
async fn wait_until_ready(
    client: &dyn RuntimeClient,
    options: &ProbeOptions,
    abort: impl Future<Output = ()>,
) -> Result<()> {
    tokio::pin!(abort);

    let first = tokio::select! {
        _ = &mut abort => return Err(aborted()),
        result = client.ping() => match result {
            Ok(()) => return Ok(()),
            Err(err) => err,
        },
    };
    warn!(error = %first, "container runtime not answering");
    eprintln!("{} is not responding: {}", client.name(), first);

    if let Some(command) = options.launch_command.as_deref() {
        launch(command);
    }

    eprintln!("Waiting for {} to become ready (ctrl-c to abort)...", client.name());
    let started = Instant::now();
    let mut poll = tokio::time::interval(options.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    poll.tick().await;

    loop {
        tokio::select! {
            _ = &mut abort => return Err(aborted()),
            _ = poll.tick() => {}
        }
        let result = tokio::select! {
            _ = &mut abort => return Err(aborted()),
            result = client.ping() => result,
        };
        match result {
            Ok(()) => {
                info!(waited_ms = started.elapsed().as_millis() as u64, "container runtime ready");
                eprintln!("{} is ready.", client.name());
                return Ok(());
            }
            Err(err) => {
                debug!(error = %err, "still waiting for runtime");
                if let Some(max) = options.max_wait {
                    if started.elapsed() >= max {
                        return Err(SetupError::DaemonTimeout { waited: started.elapsed() });
                    }
                }
            }
        }
    }
}

fn aborted() -> SetupError {
    warn!("daemon wait aborted by operator");
    SetupError::Aborted
}

/// Spawn the launch command once and leave it running. Failure to launch is
/// logged, not fatal; the operator may start the daemon by hand while we poll.
fn launch(command: &str) {
    let mut parts = command.split_whitespace();
    let Some(program) = parts.next() else {
        return;
    };
    eprintln!("Starting it with `{}`...", command);
    info!(command, "launching container runtime");
    let spawned = Command::new(program)
        .args(parts)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    match spawned {
        Ok(child) => debug!(command, pid = ?child.id(), "launch command started"),
        Err(err) => warn!(command, error = %err, "failed to run launch command"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use stardock_core::error::{RuntimeError, RuntimeResult};
    use stardock_core::model::RawResource;
    use stardock_core::runtime::LogRequest;

    use super::*;

    /// Answers ping only after `ready_after` failed attempts. Pings from
    /// attempt `hang_from` on never return.
    struct SlowDaemon {
        attempts: AtomicUsize,
        ready_after: usize,
        hang_from: usize,
    }

    impl SlowDaemon {
        fn new(ready_after: usize) -> Self {
            Self {
                attempts: AtomicUsize::new(0),
                ready_after,
                hang_from: usize::MAX,
            }
        }
    }

    #[async_trait]
    impl RuntimeClient for SlowDaemon {
        fn name(&self) -> &str {
            "slow"
        }

        async fn ping(&self) -> RuntimeResult<()> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst);
            if n >= self.hang_from {
                std::future::pending::<()>().await;
            }
            if n >= self.ready_after {
                Ok(())
            } else {
                Err(RuntimeError::unavailable("connection refused"))
            }
        }

        async fn list_resources(&self, _include_stopped: bool) -> RuntimeResult<Vec<RawResource>> {
            Ok(Vec::new())
        }

        async fn start_resource(&self, _id: &str) -> RuntimeResult<()> {
            Ok(())
        }

        async fn stop_resource(&self, _id: &str) -> RuntimeResult<()> {
            Ok(())
        }

        async fn fetch_logs(&self, _request: &LogRequest) -> RuntimeResult<String> {
            Ok(String::new())
        }
    }

    fn options(max_wait: Option<Duration>) -> ProbeOptions {
        ProbeOptions {
            launch_command: None,
            poll_interval: Duration::from_millis(10),
            max_wait,
        }
    }

    #[tokio::test]
    async fn test_ready_daemon_returns_immediately() {
        let daemon = SlowDaemon::new(0);
        wait_for_daemon(&daemon, &options(None)).await.unwrap();
        assert_eq!(daemon.attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_polls_until_ready() {
        let daemon = SlowDaemon::new(3);
        wait_for_daemon(&daemon, &options(Some(Duration::from_secs(5))))
            .await
            .unwrap();
        assert_eq!(daemon.attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_wait() {
        let daemon = SlowDaemon::new(usize::MAX);
        let err = wait_for_daemon(&daemon, &options(Some(Duration::from_millis(30))))
            .await
            .unwrap_err();
        assert!(matches!(err, SetupError::DaemonTimeout { .. }));
    }

    #[tokio::test]
    async fn test_blocking_launcher_does_not_delay_polling() {
        let daemon = SlowDaemon::new(1);
        let launching = ProbeOptions {
            launch_command: Some("sleep 20".into()),
            ..options(Some(Duration::from_secs(5)))
        };
        tokio::time::timeout(Duration::from_secs(3), wait_for_daemon(&daemon, &launching))
            .await
            .expect("polling waited on the launch command")
            .unwrap();
        assert_eq!(daemon.attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_abort_interrupts_hung_ping() {
        let daemon = SlowDaemon {
            hang_from: 1,
            ..SlowDaemon::new(usize::MAX)
        };
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let _ = tx.send(());
        });
        let abort = async {
            let _ = rx.await;
        };
        let err = tokio::time::timeout(
            Duration::from_secs(3),
            wait_until_ready(&daemon, &options(None), abort),
        )
        .await
        .expect("abort was not observed during a pending ping")
        .unwrap_err();
        assert!(matches!(err, SetupError::Aborted));
        assert_eq!(daemon.attempts.load(Ordering::SeqCst), 2);
    }
}
