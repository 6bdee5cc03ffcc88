use std::time::Duration;

use tracing::warn;

use stardock_core::error::{CommandKind, RuntimeError};
use stardock_core::runtime::{LogRequest, LogWindow, RuntimeClient};

use crate::error::{Result, SetupError};

/// Start or stop each id in turn. Every id is attempted; the last failure is
/// returned so the process exits non-zero.
pub async fn run_lifecycle(client: &dyn RuntimeClient, action: CommandKind, ids: &[String]) -> Result<()> {
    let mut failure: Option<RuntimeError> = None;
    for id in ids {
        let result = match action {
            CommandKind::Start => client.start_resource(id).await,
            CommandKind::Stop => client.stop_resource(id).await,
        };
        match result {
            Ok(()) => println!("{} {}", id, past_tense(action)),
            Err(err) => {
                warn!(%id, %action, error = %err, "command failed");
                eprintln!("Error: {}", err);
                failure = Some(err);
            }
        }
    }
    match failure {
        Some(err) => Err(SetupError::Runtime(err)),
        None => Ok(()),
    }
}

fn past_tense(action: CommandKind) -> &'static str {
    match action {
        CommandKind::Start => "started",
        CommandKind::Stop => "stopped",
    }
}

/// Print logs once for `id`. `tail` wins over `since`, else the configured
/// window applies.
pub async fn run_logs(
    client: &dyn RuntimeClient,
    id: &str,
    tail: Option<usize>,
    since: Option<u64>,
    default_window: LogWindow,
    timestamps: bool,
) -> Result<()> {
    let window = match (tail, since) {
        (Some(lines), _) => LogWindow::Tail(lines),
        (None, Some(secs)) => LogWindow::Since(Duration::from_secs(secs)),
        (None, None) => default_window,
    };
    let content = client.fetch_logs(&LogRequest::new(id, window, timestamps)).await?;
    print!("{}", content);
    if !content.is_empty() && !content.ends_with('\n') {
        println!();
    }
    Ok(())
}
