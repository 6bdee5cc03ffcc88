//! Terminal dashboard
//!
//! One queue feeds the loop: key and resize events from a blocking input
//! thread, ticks from an interval task, and results from spawned fetch and
//! command tasks. The loop reduces each event in turn, hands the resulting
//! actions to the [`Executor`] and redraws.

mod keys;
mod render;
mod theme;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event,
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use stardock_core::config::DashboardConfig;
use stardock_core::error::CommandKind;
use stardock_core::reducer::{Action, AppEvent, reduce};
use stardock_core::runtime::{LogRequest, LogWindow, RuntimeClient};
use stardock_core::state::AppState;

use crate::error::Result;

const INPUT_POLL: Duration = Duration::from_millis(50);

// --- Terminal setup/teardown ---

/// Chain a panic hook that runs `restore` before the previous hook prints
fn install_panic_hook(restore: fn()) {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        restore();
        original_hook(panic_info);
    }));
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    install_panic_hook(ratatui::restore);
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Carries out reducer actions against the runtime. Every call returns at
/// once; results come back through the event queue.
#[derive(Clone)]
pub struct Executor {
    client: Arc<dyn RuntimeClient>,
    tx: mpsc::UnboundedSender<AppEvent>,
    include_stopped: bool,
    log_window: LogWindow,
    timestamps: bool,
}

impl Executor {
    pub fn new(
        client: Arc<dyn RuntimeClient>,
        tx: mpsc::UnboundedSender<AppEvent>,
        config: &DashboardConfig,
    ) -> Self {
        Self {
            client,
            tx,
            include_stopped: config.include_stopped,
            log_window: config.log_window(),
            timestamps: config.logs.timestamps,
        }
    }

    pub fn execute(&self, action: Action) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        match action {
            Action::FetchResources(ticket) => {
                let include_stopped = self.include_stopped;
                tokio::spawn(async move {
                    let result = client.list_resources(include_stopped).await;
                    let _ = tx.send(AppEvent::ResourcesFetched { ticket, result });
                });
            }
            Action::FetchLogs(ticket, id) => {
                let request = LogRequest::new(id, self.log_window, self.timestamps);
                tokio::spawn(async move {
                    let result = client.fetch_logs(&request).await;
                    let _ = tx.send(AppEvent::LogsFetched { ticket, result });
                });
            }
            Action::Start(id) => self.command(CommandKind::Start, id),
            Action::Stop(id) => self.command(CommandKind::Stop, id),
            Action::Quit => {}
        }
    }

    fn command(&self, action: CommandKind, id: String) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        info!(%id, %action, "sending command");
        tokio::spawn(async move {
            let result = match action {
                CommandKind::Start => client.start_resource(&id).await,
                CommandKind::Stop => client.stop_resource(&id).await,
            };
            let _ = tx.send(AppEvent::CommandFinished { action, id, result });
        });
    }
}

/// Blocking reader for terminal events. Exits once the queue is dropped.
fn spawn_input_thread(tx: mpsc::UnboundedSender<AppEvent>) {
    std::thread::spawn(move || {
        while !tx.is_closed() {
            match event::poll(INPUT_POLL) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(err) => {
                    warn!(error = %err, "terminal input failed");
                    break;
                }
            }
            match event::read() {
                Ok(ev) => {
                    if let Some(app_event) = keys::translate(ev) {
                        if tx.send(app_event).is_err() {
                            break;
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "terminal input failed");
                    break;
                }
            }
        }
        debug!("input thread stopped");
    });
}

fn spawn_ticker(tx: mpsc::UnboundedSender<AppEvent>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tick.tick().await;
            if tx.send(AppEvent::Tick).is_err() {
                break;
            }
        }
    })
}

pub async fn run(client: Arc<dyn RuntimeClient>, config: &DashboardConfig) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, client, config).await;
    restore_terminal(terminal)?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    client: Arc<dyn RuntimeClient>,
    config: &DashboardConfig,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();
    let mut state = AppState::new(config.layout, config.refresh_interval(), client.name());
    let executor = Executor::new(client, tx.clone(), config);

    let size = terminal.size()?;
    reduce(
        &mut state,
        AppEvent::Resize {
            width: size.width,
            height: size.height,
        },
    );

    spawn_input_thread(tx.clone());
    let ticker = spawn_ticker(tx, state.scheduler.interval());
    info!(runtime = %state.runtime_name, "dashboard started");

    let mut title = String::new();
    loop {
        let screen_title = state.nav.screen().title();
        if screen_title != title {
            execute!(terminal.backend_mut(), SetTitle(&screen_title))?;
            title = screen_title;
        }
        terminal.draw(|f| render::draw(f, &state))?;

        let Some(event) = rx.recv().await else {
            break;
        };
        for action in reduce(&mut state, event) {
            executor.execute(action);
        }
        if state.quit {
            break;
        }
    }

    ticker.abort();
    info!("dashboard stopped");
    Ok(())
}
