//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the process logger.  A display or dashboard adapter would implement
//! the same trait.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&self, event: &AppEvent) {
        match event {
            AppEvent::Status(s) => {
                info!(
                    "STATUS | [{}] state={:?} | reminder={} | scan_hosts={} last_scan={} | \
                     feed={}/{} \"{}\"{}",
                    s.mode.short_label(),
                    s.state,
                    s.active_reminder.map_or("-", |k| k.name()),
                    s.scan_hosts,
                    s.last_scan
                        .map_or_else(|| "never".to_string(), |t| t.format("%H:%M:%S").to_string()),
                    s.feed_cursor,
                    s.feed_items,
                    s.current_title.as_deref().unwrap_or(""),
                    if s.buttons_simulated { " | buttons=simulated" } else { "" },
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::ModeChanged { from, to } => {
                info!("MODE | {:?} -> {:?}", from, to);
            }
            AppEvent::ReminderFired { kind, message } => {
                info!("REMIND | {} | {}", kind.name(), message);
            }
            AppEvent::ScanCompleted { hosts } => {
                info!("SCAN | complete, {} hosts with open ports", hosts);
            }
            AppEvent::FeedRefreshed { items } => {
                info!("FEED | {} items", items);
            }
            AppEvent::Started { state, mode } => {
                info!("START | state={:?} mode={:?}", state, mode);
            }
        }
    }
}
