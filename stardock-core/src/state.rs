use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::CommandKind;
use crate::model::{ResourceId, Snapshot};
use crate::navigation::{NavigationState, TableLayout};
use crate::refresh::RefreshScheduler;
use crate::viewport::LogBuffer;

/// Columns and rows the log screen spends on borders, status and help lines
pub const LOG_CHROME: (u16, u16) = (2, 4);

/// A message tied to the fetch sequence it was raised after. Any later
/// successful listing clears it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub after_seq: u64,
}

/// The one application context, owned by the event loop
#[derive(Debug)]
pub struct AppState {
    pub nav: NavigationState,
    /// Last good listing; kept through failed refreshes
    pub snapshot: Option<Snapshot>,
    pub logs: Option<LogBuffer>,
    pub scheduler: RefreshScheduler,
    /// Set while the runtime is unreachable
    pub banner: Option<String>,
    /// Transient message for a failed listing
    pub status: Option<Notice>,
    /// Per-resource command failures
    pub notices: BTreeMap<ResourceId, Notice>,
    /// Commands sent but not yet answered
    pub pending: BTreeMap<ResourceId, CommandKind>,
    pub runtime_name: String,
    pub terminal: (u16, u16),
    pub quit: bool,
}

impl AppState {
    pub fn new(layout: TableLayout, interval: Duration, runtime_name: impl Into<String>) -> Self {
        Self {
            nav: NavigationState::new(layout),
            snapshot: None,
            logs: None,
            scheduler: RefreshScheduler::new(interval),
            banner: None,
            status: None,
            notices: BTreeMap::new(),
            pending: BTreeMap::new(),
            runtime_name: runtime_name.into(),
            terminal: (0, 0),
            quit: false,
        }
    }

    /// Size of the log text area for the current terminal
    pub fn log_area(&self) -> (u16, u16) {
        (
            self.terminal.0.saturating_sub(LOG_CHROME.0),
            self.terminal.1.saturating_sub(LOG_CHROME.1),
        )
    }

    pub fn notice_for(&self, id: &str) -> Option<&str> {
        self.notices.get(id).map(|n| n.message.as_str())
    }

    /// Drop messages raised before the fetch numbered `seq` was issued
    pub(crate) fn clear_notices_before(&mut self, seq: u64) {
        self.notices.retain(|_, notice| notice.after_seq >= seq);
        if self.status.as_ref().is_some_and(|n| n.after_seq < seq) {
            self.status = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_area_subtracts_chrome() {
        let mut state = AppState::new(TableLayout::Table, Duration::from_secs(1), "demo");
        assert_eq!(state.log_area(), (0, 0));
        state.terminal = (100, 30);
        assert_eq!(state.log_area(), (98, 26));
    }

    #[test]
    fn test_clear_notices_keeps_newer() {
        let mut state = AppState::new(TableLayout::Table, Duration::from_secs(1), "demo");
        state.notices.insert(
            "old".into(),
            Notice {
                message: "stale".into(),
                after_seq: 2,
            },
        );
        state.notices.insert(
            "new".into(),
            Notice {
                message: "fresh".into(),
                after_seq: 5,
            },
        );
        state.clear_notices_before(4);
        assert_eq!(state.notice_for("old"), None);
        assert_eq!(state.notice_for("new"), Some("fresh"));
    }
}
