mod commands;
mod error;
mod logging;
mod probe;
mod runtimes;
mod tui;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use stardock_core::config::DashboardConfig;
use stardock_core::error::CommandKind;

use crate::error::Result;
use crate::probe::ProbeOptions;

#[derive(Parser)]
#[command(name = "stardock")]
#[command(about = "Live terminal dashboard for containers and compose stacks", long_about = None)]
struct Cli {
    /// Config file (default: stardock.yml in the current directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Use a built-in simulated runtime instead of Docker
    #[arg(long, global = true)]
    demo: bool,

    /// Override the refresh interval in milliseconds
    #[arg(long, global = true)]
    refresh_ms: Option<u64>,

    /// Log filter, e.g. "debug" or "stardock=trace"
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the dashboard (default)
    Tui,
    /// List containers grouped by compose stack
    Ps {
        #[arg(long)]
        json: bool,
    },
    Start {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    Stop {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Print a container's logs once
    Logs {
        id: String,
        #[arg(long, conflicts_with = "since")]
        tail: Option<usize>,
        /// Only lines from the last N seconds
        #[arg(long)]
        since: Option<u64>,
        /// Prefix lines with timestamps (default from `logs.timestamps`)
        #[arg(short, long, conflicts_with = "no_timestamps")]
        timestamps: bool,
        #[arg(long)]
        no_timestamps: bool,
    },
}

/// Command-line choice wins over the config file in either direction
fn timestamps_choice(on: bool, off: bool, configured: bool) -> bool {
    match (on, off) {
        (true, _) => true,
        (_, true) => false,
        _ => configured,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    logging::init(cli.log_level.as_deref())?;

    let cwd = std::env::current_dir()?;
    let (path, mut config) = DashboardConfig::resolve(cli.config.as_deref(), &cwd)?;
    if let Some(ms) = cli.refresh_ms {
        config.refresh_interval_ms = ms;
    }
    config.validate()?;
    match &path {
        Some(path) => info!(path = %path.display(), "loaded config"),
        None => info!("no config file, using defaults"),
    }

    let client = runtimes::connect(cli.demo, &config)?;
    let probe = ProbeOptions {
        launch_command: config.daemon.launch_command.clone(),
        poll_interval: config.poll_interval(),
        max_wait: config.max_wait(),
    };
    probe::wait_for_daemon(client.as_ref(), &probe).await?;

    match cli.command {
        Some(Commands::Ps { json }) => commands::run_ps(client.as_ref(), config.include_stopped, json).await,
        Some(Commands::Start { ids }) => commands::run_lifecycle(client.as_ref(), CommandKind::Start, &ids).await,
        Some(Commands::Stop { ids }) => commands::run_lifecycle(client.as_ref(), CommandKind::Stop, &ids).await,
        Some(Commands::Logs {
            id,
            tail,
            since,
            timestamps,
            no_timestamps,
        }) => {
            commands::run_logs(
                client.as_ref(),
                &id,
                tail,
                since,
                config.log_window(),
                timestamps_choice(timestamps, no_timestamps, config.logs.timestamps),
            )
            .await
        }
        Some(Commands::Tui) | None => tui::run(client, &config).await,
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_logs_tail_conflicts_with_since() {
        let err = Cli::try_parse_from(["stardock", "logs", "abc", "--tail", "5", "--since", "60"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["stardock", "ps", "--json", "--demo"]).unwrap();
        assert!(cli.demo);
        assert!(matches!(cli.command, Some(Commands::Ps { json: true })));
    }

    #[test]
    fn test_no_timestamps_overrides_config() {
        let cli = Cli::try_parse_from(["stardock", "logs", "abc", "--no-timestamps"]).unwrap();
        let Some(Commands::Logs {
            timestamps,
            no_timestamps,
            ..
        }) = cli.command
        else {
            panic!("expected logs");
        };
        assert!(!timestamps_choice(timestamps, no_timestamps, true));
        assert!(timestamps_choice(true, false, false));
        assert!(timestamps_choice(false, false, true));
        assert!(Cli::try_parse_from(["stardock", "logs", "abc", "-t", "--no-timestamps"]).is_err());
    }
}
