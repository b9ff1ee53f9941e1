//! Port traits: the hexagonal boundary between the core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ workers / Companion (domain)
//! ```
//!
//! Driven adapters (GPIO, HTTP, TCP probe, clock, event sinks, config
//! files) implement these traits.  The workers hold them as trait objects,
//! so every worker can be exercised in tests with mocks and no hardware or
//! network.

use std::io;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use crate::config::CompanionConfig;
use crate::error::{ConfigError, HttpError, InputError};
use crate::scheduler::Reminder;

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source.  Reminder timing is a pure function of the
/// instants this returns, which lets tests drive time by hand.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

// ───────────────────────────────────────────────────────────────
// Digital input port (driven adapter: GPIO → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the button lines.
///
/// Lines are pulled up; *active* means the line reads low (button held).
pub trait DigitalInput: Send {
    /// Claim and configure `lines` as inputs.
    ///
    /// An error here is not fatal: the poller falls back to simulation.
    fn setup(&mut self, lines: &[u8]) -> Result<(), InputError>;

    /// `true` while the line is held low.  Read errors report inactive.
    fn is_active(&mut self, line: u8) -> bool;

    /// Release every claimed line.
    fn cleanup(&mut self);
}

// ───────────────────────────────────────────────────────────────
// HTTP port (driven adapter: domain → remote feeds)
// ───────────────────────────────────────────────────────────────

/// A completed HTTP exchange.  `body` is `Null` for non-success statuses.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking GET returning a parsed JSON body.
pub trait HttpClient: Send + Sync {
    fn get_json(&self, url: &str, timeout: Duration) -> Result<HttpResponse, HttpError>;
}

// ───────────────────────────────────────────────────────────────
// Port probe (driven adapter: domain → network)
// ───────────────────────────────────────────────────────────────

/// Result of one connect-style probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Open,
    Closed,
}

/// Connect-style TCP probe.
pub trait PortProbe: Send + Sync {
    /// `Ok(Closed)` covers refused and timed-out connects.  Any other
    /// failure is an `Err` and aborts the scan of that one host.
    fn probe(&self, host: Ipv4Addr, port: u16, timeout: Duration) -> io::Result<ProbeOutcome>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / presentation)
// ───────────────────────────────────────────────────────────────

/// The coordinator emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (log, display, ...).
///
/// Called from worker threads, hence `&self` and `Sync`.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads the companion configuration.
///
/// Missing keys never fail; implementations fill documented defaults.
pub trait ConfigPort {
    fn load(&self) -> Result<CompanionConfig, ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Reminder delegate (decouples reminder engine from side effects)
// ───────────────────────────────────────────────────────────────

/// Callback trait the reminder engine invokes when a reminder triggers.
///
/// This decouples [`ReminderTable`](crate::scheduler::ReminderTable) from
/// the state register and user callbacks, so its priority and timing
/// rules are testable on their own.
pub trait ReminderDelegate {
    /// Called after `reminder` moved to the triggered state.
    fn on_reminder_fired(&mut self, reminder: &Reminder);
}
