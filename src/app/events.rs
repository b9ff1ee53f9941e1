//! Outbound application events.
//!
//! The [`Companion`](super::service::Companion) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log them, draw them on the display,
//! forward them to a web dashboard.

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::scheduler::ReminderKind;
use crate::state::{OperatingMode, OperatingState};

/// Structured events emitted by the companion core.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// The companion has started (carries the initial register values).
    Started {
        state: OperatingState,
        mode: OperatingMode,
    },

    /// The operating state was written.
    StateChanged {
        from: OperatingState,
        to: OperatingState,
    },

    /// The operating mode was written.
    ModeChanged {
        from: OperatingMode,
        to: OperatingMode,
    },

    /// A reminder triggered.
    ReminderFired {
        kind: ReminderKind,
        message: String,
    },

    /// A network scan finished.
    ScanCompleted { hosts: usize },

    /// The feed list was replaced.
    FeedRefreshed { items: usize },

    /// Periodic status snapshot.
    Status(StatusSnapshot),
}

/// A point-in-time view of the whole companion, for logging or display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub state: OperatingState,
    pub mode: OperatingMode,
    pub active_reminder: Option<ReminderKind>,
    pub scan_hosts: usize,
    pub last_scan: Option<DateTime<Local>>,
    pub feed_items: usize,
    pub feed_cursor: usize,
    pub current_title: Option<String>,
    pub buttons_simulated: bool,
}
