//! Refresh scheduling
//!
//! At most one fetch is in flight at a time. A request that arrives while
//! one is outstanding is folded into a single queued follow-up, so results
//! are always applied in the order their fetches were issued.

use std::time::Duration;

use tracing::debug;

use crate::model::ResourceId;
use crate::navigation::Screen;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchKind {
    Resources,
    Logs(ResourceId),
}

impl FetchKind {
    /// What a tick should refresh while `screen` is showing
    pub fn for_screen(screen: &Screen) -> Self {
        match screen {
            Screen::Index | Screen::ResourceTable => FetchKind::Resources,
            Screen::LogView(target) => FetchKind::Logs(target.id.clone()),
        }
    }
}

/// Handle for one issued fetch; the result is only accepted with it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ticket {
    pub seq: u64,
    pub kind: FetchKind,
}

#[derive(Clone, Debug)]
pub struct RefreshScheduler {
    interval: Duration,
    next_seq: u64,
    in_flight: Option<Ticket>,
    queued: bool,
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl RefreshScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_seq: 0,
            in_flight: None,
            queued: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn in_flight(&self) -> Option<&Ticket> {
        self.in_flight.as_ref()
    }

    /// Sequence number of the most recently issued fetch, 0 before the first
    pub fn last_issued(&self) -> u64 {
        self.next_seq
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Issue a fetch, or queue a follow-up if one is already outstanding
    pub fn begin(&mut self, kind: FetchKind) -> Option<Ticket> {
        if let Some(current) = &self.in_flight {
            debug!(seq = current.seq, ?kind, "fetch outstanding, queueing follow-up");
            self.queued = true;
            return None;
        }
        self.next_seq += 1;
        let ticket = Ticket {
            seq: self.next_seq,
            kind,
        };
        debug!(seq = ticket.seq, kind = ?ticket.kind, "fetch issued");
        self.in_flight = Some(ticket.clone());
        Some(ticket)
    }

    /// Close out `ticket`. Returns false for anything but the in-flight fetch.
    pub fn complete(&mut self, ticket: &Ticket) -> bool {
        match &self.in_flight {
            Some(current) if current == ticket => {
                self.in_flight = None;
                true
            }
            _ => {
                debug!(seq = ticket.seq, "ignoring result for stale ticket");
                false
            }
        }
    }

    /// Consume the queued follow-up, if any
    pub fn take_queued(&mut self) -> bool {
        std::mem::take(&mut self.queued)
    }
}
