//! Event reducer
//!
//! Every input, tick, resize and completed fetch is fed through [`reduce`]
//! one at a time. It mutates the [`AppState`] and returns the I/O the event
//! loop has to perform; it never performs any itself.

use tracing::{debug, warn};

use crate::aggregate::aggregate;
use crate::error::{CommandKind, RuntimeError, RuntimeResult};
use crate::model::{RawResource, ResourceId};
use crate::navigation::{Effect, Input, Scroll};
use crate::refresh::{FetchKind, Ticket};
use crate::state::{AppState, Notice};
use crate::viewport::{self, LogBuffer};

#[derive(Clone, Debug)]
pub enum AppEvent {
    Input(Input),
    Tick,
    Resize {
        width: u16,
        height: u16,
    },
    ResourcesFetched {
        ticket: Ticket,
        result: RuntimeResult<Vec<RawResource>>,
    },
    LogsFetched {
        ticket: Ticket,
        result: RuntimeResult<String>,
    },
    CommandFinished {
        action: CommandKind,
        id: ResourceId,
        result: RuntimeResult<()>,
    },
}

/// Work the event loop carries out on the reducer's behalf
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    FetchResources(Ticket),
    FetchLogs(Ticket, ResourceId),
    Start(ResourceId),
    Stop(ResourceId),
    Quit,
}

pub fn reduce(state: &mut AppState, event: AppEvent) -> Vec<Action> {
    let mut actions = Vec::new();
    if state.quit {
        return actions;
    }

    match event {
        AppEvent::Input(input) => {
            let effects = state.nav.handle(input, state.snapshot.as_ref());
            for effect in effects {
                apply_effect(state, effect, &mut actions);
            }
        }
        AppEvent::Tick => {
            let kind = FetchKind::for_screen(state.nav.screen());
            issue(state, kind, &mut actions);
        }
        AppEvent::Resize { width, height } => {
            state.terminal = (width, height);
            let (w, h) = state.log_area();
            if let Some(buffer) = state.logs.as_mut() {
                buffer.resize(w, h);
            }
        }
        AppEvent::ResourcesFetched { ticket, result } => {
            if !state.scheduler.complete(&ticket) {
                return actions;
            }
            match result {
                Ok(raw) => {
                    let snapshot = aggregate(raw);
                    state.nav.reconcile(&snapshot);
                    state.snapshot = Some(snapshot);
                    state.banner = None;
                    state.clear_notices_before(ticket.seq);
                }
                Err(err) => {
                    warn!(seq = ticket.seq, error = %err, "resource refresh failed");
                    record_failure(state, &err);
                }
            }
            follow_up(state, &mut actions);
        }
        AppEvent::LogsFetched { ticket, result } => {
            if !state.scheduler.complete(&ticket) {
                return actions;
            }
            let FetchKind::Logs(id) = &ticket.kind else {
                return actions;
            };
            let current = state.logs.as_ref().is_some_and(|b| &b.resource_id == id);
            if !current {
                debug!(%id, "discarding logs for a resource no longer shown");
            } else {
                match result {
                    Ok(content) => {
                        if let Some(buffer) = state.logs.take() {
                            state.logs = Some(viewport::apply(buffer, content));
                        }
                        state.banner = None;
                    }
                    Err(err) => {
                        warn!(%id, error = %err, "log refresh failed");
                        if err.is_unavailable() {
                            state.banner = Some(err.to_string());
                        }
                        if let Some(buffer) = state.logs.as_mut() {
                            buffer.set_error(err.to_string());
                        }
                    }
                }
            }
            follow_up(state, &mut actions);
        }
        AppEvent::CommandFinished { action, id, result } => {
            state.pending.remove(&id);
            match result {
                Ok(()) => {
                    debug!(%id, %action, "command accepted");
                    state.notices.remove(&id);
                }
                Err(err) => {
                    warn!(%id, %action, error = %err, "command failed");
                    if err.is_unavailable() {
                        state.banner = Some(err.to_string());
                    }
                    let notice = Notice {
                        message: err.to_string(),
                        after_seq: state.scheduler.last_issued(),
                    };
                    state.notices.insert(id, notice);
                }
            }
        }
    }

    actions
}

fn apply_effect(state: &mut AppState, effect: Effect, actions: &mut Vec<Action>) {
    match effect {
        Effect::FetchResources => issue(state, FetchKind::Resources, actions),
        Effect::FetchLogs { id } => issue(state, FetchKind::Logs(id), actions),
        Effect::OpenLogs(target) => {
            let mut buffer = LogBuffer::new(target.id, target.name);
            let (w, h) = state.log_area();
            buffer.resize(w, h);
            state.logs = Some(buffer);
        }
        Effect::CloseLogs => {
            state.logs = None;
            if let Some(snapshot) = state.snapshot.as_ref() {
                state.nav.reconcile(snapshot);
            }
        }
        Effect::ScrollLogs(scroll) => {
            if let Some(buffer) = state.logs.as_mut() {
                match scroll {
                    Scroll::Lines(delta) => buffer.scroll_lines(delta),
                    Scroll::PageUp => buffer.page_up(),
                    Scroll::PageDown => buffer.page_down(),
                    Scroll::Top => buffer.scroll_to_top(),
                    Scroll::Bottom => buffer.scroll_to_bottom(),
                    Scroll::ToggleFollow => buffer.toggle_follow(),
                }
            }
        }
        Effect::Start { id } => {
            state.pending.insert(id.clone(), CommandKind::Start);
            actions.push(Action::Start(id));
        }
        Effect::Stop { id } => {
            state.pending.insert(id.clone(), CommandKind::Stop);
            actions.push(Action::Stop(id));
        }
        Effect::Quit => {
            state.quit = true;
            actions.push(Action::Quit);
        }
    }
}

fn issue(state: &mut AppState, kind: FetchKind, actions: &mut Vec<Action>) {
    if let Some(ticket) = state.scheduler.begin(kind) {
        let action = match &ticket.kind {
            FetchKind::Resources => Action::FetchResources(ticket.clone()),
            FetchKind::Logs(id) => Action::FetchLogs(ticket.clone(), id.clone()),
        };
        actions.push(action);
    }
}

/// A request that was turned away while busy runs now, for whatever the
/// current screen needs.
fn follow_up(state: &mut AppState, actions: &mut Vec<Action>) {
    if state.scheduler.take_queued() {
        let kind = FetchKind::for_screen(state.nav.screen());
        issue(state, kind, actions);
    }
}

fn record_failure(state: &mut AppState, err: &RuntimeError) {
    if err.is_unavailable() {
        state.banner = Some(err.to_string());
    } else {
        state.status = Some(Notice {
            message: err.to_string(),
            after_seq: state.scheduler.last_issued(),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::model::LifecycleState;
    use crate::navigation::{Screen, TableLayout};

    fn raw(id: &str, name: &str, state: &str, group: Option<&str>) -> RawResource {
        RawResource {
            id: id.into(),
            names: vec![format!("/{}", name)],
            state: Some(state.into()),
            group: group.map(String::from),
            ..Default::default()
        }
    }

    fn listing() -> Vec<RawResource> {
        vec![
            raw("c1", "cache", "running", None),
            raw("w1", "worker", "exited", Some("proj1")),
            raw("a1", "api", "running", Some("proj1")),
        ]
    }

    fn new_state() -> AppState {
        let mut state = AppState::new(TableLayout::Table, Duration::from_secs(1), "test");
        reduce(
            &mut state,
            AppEvent::Resize {
                width: 82,
                height: 14,
            },
        );
        state
    }

    /// Drive one resource refresh through to completion
    fn refresh(state: &mut AppState, result: RuntimeResult<Vec<RawResource>>) -> Vec<Action> {
        let actions = reduce(state, AppEvent::Tick);
        let Some(Action::FetchResources(ticket)) = actions.into_iter().next() else {
            panic!("expected a resource fetch");
        };
        reduce(state, AppEvent::ResourcesFetched { ticket, result })
    }

    /// Index -> resource table with one listing applied
    fn on_table() -> AppState {
        let mut state = new_state();
        let actions = reduce(&mut state, AppEvent::Input(Input::Enter));
        let Some(Action::FetchResources(ticket)) = actions.into_iter().next() else {
            panic!("expected a resource fetch");
        };
        reduce(
            &mut state,
            AppEvent::ResourcesFetched {
                ticket,
                result: Ok(listing()),
            },
        );
        assert_eq!(state.nav.screen(), &Screen::ResourceTable);
        state
    }

    #[test]
    fn test_tick_fetches_resources_on_index() {
        let mut state = new_state();
        let actions = reduce(&mut state, AppEvent::Tick);
        assert!(matches!(actions.as_slice(), [Action::FetchResources(_)]));
    }

    #[test]
    fn test_tick_skipped_while_fetch_outstanding() {
        let mut state = new_state();
        let first = reduce(&mut state, AppEvent::Tick);
        assert_eq!(first.len(), 1);
        assert!(reduce(&mut state, AppEvent::Tick).is_empty());

        let Action::FetchResources(ticket) = first[0].clone() else {
            panic!("expected a resource fetch");
        };
        let actions = reduce(
            &mut state,
            AppEvent::ResourcesFetched {
                ticket: ticket.clone(),
                result: Ok(listing()),
            },
        );
        // the skipped tick runs as a follow-up
        match actions.as_slice() {
            [Action::FetchResources(next)] => assert!(next.seq > ticket.seq),
            other => panic!("unexpected actions: {:?}", other),
        }
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut state = new_state();
        let actions = reduce(&mut state, AppEvent::Tick);
        let Action::FetchResources(ticket) = actions[0].clone() else {
            panic!("expected a resource fetch");
        };
        let forged = Ticket {
            seq: ticket.seq + 10,
            kind: FetchKind::Resources,
        };
        reduce(
            &mut state,
            AppEvent::ResourcesFetched {
                ticket: forged,
                result: Ok(listing()),
            },
        );
        assert!(state.snapshot.is_none());
        assert!(state.scheduler.is_busy());
    }

    #[test]
    fn test_refresh_builds_grouped_snapshot() {
        let state = on_table();
        let snapshot = state.snapshot.as_ref().unwrap();
        let names: Vec<&str> = snapshot.entries().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["cache", "proj1"]);
        assert!(snapshot.group("proj1").unwrap().is_active());
    }

    #[test]
    fn test_unavailable_keeps_snapshot_and_shows_banner() {
        let mut state = on_table();
        let before = state.snapshot.clone();

        refresh(&mut state, Err(RuntimeError::unavailable("connection refused")));
        assert_eq!(state.snapshot, before);
        assert!(state.banner.as_deref().unwrap().contains("connection refused"));
        assert_eq!(state.nav.screen(), &Screen::ResourceTable);

        refresh(&mut state, Ok(listing()));
        assert_eq!(state.banner, None);
    }

    #[test]
    fn test_listing_error_sets_status_not_banner() {
        let mut state = on_table();
        refresh(&mut state, Err(RuntimeError::listing("internal server error")));
        assert_eq!(state.banner, None);
        let status = state.status.as_ref().unwrap();
        assert!(status.message.contains("internal server error"));

        refresh(&mut state, Ok(listing()));
        assert!(state.status.is_none());
    }

    #[test]
    fn test_refresh_does_not_touch_navigation() {
        let mut state = on_table();
        reduce(&mut state, AppEvent::Input(Input::Down));
        reduce(&mut state, AppEvent::Input(Input::Enter));
        assert!(state.nav.is_expanded("proj1"));
        reduce(&mut state, AppEvent::Input(Input::Down));

        refresh(&mut state, Ok(listing()));
        assert_eq!(state.nav.selected_index(), 2);
        assert!(state.nav.is_expanded("proj1"));
        assert_eq!(state.nav.screen(), &Screen::ResourceTable);
    }

    #[test]
    fn test_refresh_clamps_selection_when_rows_vanish() {
        let mut state = on_table();
        reduce(&mut state, AppEvent::Input(Input::End));
        assert_eq!(state.nav.selected_index(), 1);

        refresh(&mut state, Ok(vec![raw("c1", "cache", "running", None)]));
        assert_eq!(state.nav.selected_index(), 0);

        refresh(&mut state, Ok(Vec::new()));
        assert_eq!(state.nav.selected_index(), 0);
        assert!(state.nav.selected_row(state.snapshot.as_ref().unwrap()).is_none());
    }

    #[test]
    fn test_failing_stop_leaves_state_until_next_refresh() {
        let mut state = on_table();
        // cache is running
        let actions = reduce(&mut state, AppEvent::Input(Input::Stop));
        assert_eq!(actions, vec![Action::Stop("c1".into())]);
        assert_eq!(state.pending.get("c1"), Some(&CommandKind::Stop));

        reduce(
            &mut state,
            AppEvent::CommandFinished {
                action: CommandKind::Stop,
                id: "c1".into(),
                result: Err(RuntimeError::command(CommandKind::Stop, "c1", "permission denied")),
            },
        );
        assert!(state.pending.is_empty());
        assert!(state.notice_for("c1").unwrap().contains("permission denied"));
        let record = state.snapshot.as_ref().unwrap().find_record("c1").unwrap();
        assert_eq!(record.lifecycle_state, LifecycleState::Running);

        refresh(&mut state, Ok(listing()));
        assert_eq!(state.notice_for("c1"), None);
    }

    #[test]
    fn test_notice_survives_fetch_issued_before_it() {
        let mut state = on_table();
        let actions = reduce(&mut state, AppEvent::Tick);
        let Action::FetchResources(ticket) = actions[0].clone() else {
            panic!("expected a resource fetch");
        };
        reduce(
            &mut state,
            AppEvent::CommandFinished {
                action: CommandKind::Start,
                id: "w1".into(),
                result: Err(RuntimeError::command(CommandKind::Start, "w1", "port in use")),
            },
        );
        reduce(
            &mut state,
            AppEvent::ResourcesFetched {
                ticket,
                result: Ok(listing()),
            },
        );
        assert!(state.notice_for("w1").is_some());
    }

    #[test]
    fn test_open_logs_then_apply_follows() {
        let mut state = on_table();
        let actions = reduce(&mut state, AppEvent::Input(Input::Enter));
        let [Action::FetchLogs(ticket, id)] = actions.as_slice() else {
            panic!("unexpected actions: {:?}", actions);
        };
        assert_eq!(id, "c1");
        assert_eq!(state.logs.as_ref().unwrap().name, "cache");

        let content = (1..=50)
            .map(|i| format!("line {}", i))
            .collect::<Vec<_>>()
            .join("\n");
        reduce(
            &mut state,
            AppEvent::LogsFetched {
                ticket: ticket.clone(),
                result: Ok(content),
            },
        );
        let buffer = state.logs.as_ref().unwrap();
        assert!(buffer.is_loaded());
        assert_eq!(buffer.scroll_fraction(), 1.0);
        // 14 rows minus chrome leaves 10 visible
        assert_eq!(buffer.offset(), 40);
    }

    #[test]
    fn test_late_logs_after_leaving_are_discarded() {
        let mut state = on_table();
        let actions = reduce(&mut state, AppEvent::Input(Input::Enter));
        let Action::FetchLogs(ticket, _) = actions[0].clone() else {
            panic!("expected a log fetch");
        };

        let actions = reduce(&mut state, AppEvent::Input(Input::Back));
        assert!(actions.is_empty());
        assert!(state.logs.is_none());

        reduce(
            &mut state,
            AppEvent::LogsFetched {
                ticket,
                result: Ok("late".into()),
            },
        );
        assert!(state.logs.is_none());
        assert_eq!(state.nav.screen(), &Screen::ResourceTable);
        assert!(!state.scheduler.is_busy());
    }

    #[test]
    fn test_log_error_lands_on_viewport() {
        let mut state = on_table();
        let actions = reduce(&mut state, AppEvent::Input(Input::Enter));
        let Action::FetchLogs(ticket, _) = actions[0].clone() else {
            panic!("expected a log fetch");
        };
        reduce(
            &mut state,
            AppEvent::LogsFetched {
                ticket,
                result: Err(RuntimeError::logs("c1", "stream closed")),
            },
        );
        let buffer = state.logs.as_ref().unwrap();
        assert!(buffer.error().unwrap().contains("stream closed"));
        assert_eq!(state.banner, None);
    }

    #[test]
    fn test_tick_on_log_view_fetches_logs() {
        let mut state = on_table();
        let actions = reduce(&mut state, AppEvent::Input(Input::Enter));
        let Action::FetchLogs(ticket, _) = actions[0].clone() else {
            panic!("expected a log fetch");
        };
        reduce(
            &mut state,
            AppEvent::LogsFetched {
                ticket,
                result: Ok("hello".into()),
            },
        );
        let actions = reduce(&mut state, AppEvent::Tick);
        assert!(matches!(actions.as_slice(), [Action::FetchLogs(_, id)] if id == "c1"));
    }

    #[test]
    fn test_quit_stops_everything() {
        let mut state = on_table();
        assert_eq!(
            reduce(&mut state, AppEvent::Input(Input::Quit)),
            vec![Action::Quit]
        );
        assert!(state.quit);
        assert!(reduce(&mut state, AppEvent::Tick).is_empty());
    }

    #[test]
    fn test_resize_reaches_log_buffer() {
        let mut state = on_table();
        reduce(&mut state, AppEvent::Input(Input::Enter));
        reduce(
            &mut state,
            AppEvent::Resize {
                width: 42,
                height: 24,
            },
        );
        assert_eq!(state.log_area(), (40, 20));
    }
}
