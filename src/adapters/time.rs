//! Monotonic clock adapter.
//!
//! Provides the [`Clock`] port from `std::time::Instant` and tracks the
//! process uptime for status reporting.

use std::time::{Duration, Instant};

use crate::app::ports::Clock;

/// Wall-independent clock backed by `Instant::now()`.
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Time since this clock was created.
    pub fn uptime(&self) -> Duration {
        self.start.elapsed()
    }

    /// Seconds since boot (monotonic).
    pub fn uptime_secs(&self) -> u64 {
        self.uptime().as_secs()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
