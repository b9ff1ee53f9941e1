//! Companion coordinator, the hexagonal core.
//!
//! [`Companion`] owns the state register and the four workers.  It wires
//! register changes and worker results to the [`EventSink`], binds the
//! buttons to [`AppCommand`]s, and starts and stops everything together.
//!
//! ```text
//!  DigitalInput ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!  HttpClient   ──▶ │          Companion           │
//!  PortProbe    ──▶ │ Register · Reminders · Scan  │
//!  Clock        ──▶ │ Feed · Buttons               │
//!                   └──────────────────────────────┘
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::info;

use crate::config::CompanionConfig;
use crate::drivers::button::DebouncedInputPoller;
use crate::feed::FeedFetcher;
use crate::scanner::NetworkScanner;
use crate::scheduler::ReminderScheduler;
use crate::state::{OperatingMode, OperatingState, StateRegister};

use super::commands::{AppCommand, BUTTON_COMMANDS};
use super::events::{AppEvent, StatusSnapshot};
use super::ports::{Clock, DigitalInput, EventSink, HttpClient, PortProbe};

// ───────────────────────────────────────────────────────────────
// Adapters bundle
// ───────────────────────────────────────────────────────────────

/// Concrete port implementations handed to [`Companion::new`].
pub struct Adapters {
    pub input: Box<dyn DigitalInput>,
    pub http: Arc<dyn HttpClient>,
    pub probe: Arc<dyn PortProbe>,
    pub clock: Arc<dyn Clock>,
    pub sink: Arc<dyn EventSink>,
}

// ───────────────────────────────────────────────────────────────
// Controls
// ───────────────────────────────────────────────────────────────

/// Cloneable handle that interprets [`AppCommand`]s.
///
/// Button actions capture one of these, so a command never needs the
/// whole [`Companion`].
#[derive(Clone)]
pub struct Controls {
    register: Arc<StateRegister>,
    reminders: Arc<ReminderScheduler>,
    scanner: Arc<NetworkScanner>,
    feed: Arc<FeedFetcher>,
}

impl Controls {
    /// Apply `cmd` to the current mode and state.
    ///
    /// Returns `false` when the command does not apply right now.
    pub fn handle_command(&self, cmd: AppCommand) -> bool {
        let snap = self.register.snapshot();
        match cmd {
            AppCommand::Acknowledge => {
                if snap.state != OperatingState::Alert && snap.mode != OperatingMode::Buddy {
                    return false;
                }
                self.reminders.acknowledge(None);
                true
            }
            AppCommand::NextPost => {
                if snap.mode != OperatingMode::Feed {
                    return false;
                }
                self.feed.next_post();
                self.register.set_state(OperatingState::Reading);
                true
            }
            AppCommand::Scan => {
                if snap.mode != OperatingMode::Scanner {
                    return false;
                }
                self.scanner.request_scan();
                true
            }
            AppCommand::CycleMode => {
                let mode = self.register.cycle_mode();
                let state = match mode {
                    OperatingMode::Feed => OperatingState::Reading,
                    OperatingMode::Buddy | OperatingMode::Scanner => OperatingState::Idle,
                };
                self.register.set_state(state);
                true
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Companion
// ───────────────────────────────────────────────────────────────

/// The coordinator owns every worker and the shared register.
pub struct Companion {
    controls: Controls,
    buttons: DebouncedInputPoller,
    sink: Arc<dyn EventSink>,
    running: AtomicBool,
}

impl Companion {
    /// Build every worker and wire callbacks and buttons.
    ///
    /// Nothing runs until [`start`](Self::start).
    pub fn new(config: &CompanionConfig, adapters: Adapters) -> crate::Result<Self> {
        let Adapters {
            input,
            http,
            probe,
            clock,
            sink,
        } = adapters;

        let register = Arc::new(StateRegister::new());
        let reminders = Arc::new(ReminderScheduler::new(
            &config.reminders,
            Arc::clone(&register),
            Arc::clone(&clock),
        ));
        let scanner = Arc::new(NetworkScanner::new(
            config.scanner.clone(),
            Arc::clone(&register),
            probe,
        ));
        let feed = Arc::new(FeedFetcher::new(config.feed.clone(), Arc::clone(&register), http));
        let buttons = DebouncedInputPoller::new(&config.buttons, input, clock);

        let controls = Controls {
            register,
            reminders,
            scanner,
            feed,
        };
        let companion = Self {
            controls,
            buttons,
            sink,
            running: AtomicBool::new(false),
        };
        companion.wire_callbacks();
        companion.wire_buttons()?;
        Ok(companion)
    }

    fn wire_callbacks(&self) {
        let c = &self.controls;

        let sink = Arc::clone(&self.sink);
        c.register
            .register_state_callback(move |from, to| sink.emit(&AppEvent::StateChanged { from, to }));

        let sink = Arc::clone(&self.sink);
        c.register
            .register_mode_callback(move |from, to| sink.emit(&AppEvent::ModeChanged { from, to }));

        let sink = Arc::clone(&self.sink);
        c.reminders.register_reminder_callback(move |reminder| {
            sink.emit(&AppEvent::ReminderFired {
                kind: reminder.kind,
                message: reminder.message.clone(),
            });
        });

        let sink = Arc::clone(&self.sink);
        let register = Arc::clone(&c.register);
        c.scanner.register_scan_callback(move |results| {
            sink.emit(&AppEvent::ScanCompleted {
                hosts: results.len(),
            });
            // In Scanner mode the scanner leaves the state alone.
            register.set_state_if(
                |snap| {
                    snap.mode == OperatingMode::Scanner && snap.state == OperatingState::Scanning
                },
                OperatingState::Idle,
            );
        });

        let sink = Arc::clone(&self.sink);
        c.feed.register_feed_callback(move |items| {
            sink.emit(&AppEvent::FeedRefreshed { items: items.len() });
        });
    }

    fn wire_buttons(&self) -> crate::Result<()> {
        for (button, cmd) in BUTTON_COMMANDS {
            let controls = self.controls.clone();
            self.buttons.register_button_callback(button, move || {
                controls.handle_command(cmd);
            })?;
        }
        Ok(())
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start every worker.  No-op if already running.
    pub fn start(&self) -> crate::Result<()> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let snap = self.controls.register.snapshot();
        self.sink.emit(&AppEvent::Started {
            state: snap.state,
            mode: snap.mode,
        });

        let c = &self.controls;
        let started = c
            .reminders
            .start()
            .and_then(|()| c.scanner.start())
            .and_then(|()| c.feed.start())
            .and_then(|()| self.buttons.start());
        if let Err(e) = started {
            self.stop();
            return Err(e);
        }
        info!("Companion started in {:?} / {:?}", snap.state, snap.mode);
        Ok(())
    }

    /// Stop every worker, buttons first.  No-op if not running.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        self.buttons.stop();
        self.controls.reminders.stop();
        self.controls.scanner.stop();
        self.controls.feed.stop();
        info!("Companion stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    // ── Commands ──────────────────────────────────────────────

    pub fn handle_command(&self, cmd: AppCommand) -> bool {
        self.controls.handle_command(cmd)
    }

    pub fn controls(&self) -> Controls {
        self.controls.clone()
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a status snapshot from every worker.
    pub fn build_status(&self) -> StatusSnapshot {
        let c = &self.controls;
        let snap = c.register.snapshot();
        let current = c.feed.current_post();
        StatusSnapshot {
            state: snap.state,
            mode: snap.mode,
            active_reminder: c.reminders.active_reminder().map(|r| r.kind),
            scan_hosts: c.scanner.results().len(),
            last_scan: c.scanner.last_scan(),
            feed_items: c.feed.posts().len(),
            feed_cursor: c.feed.cursor(),
            current_title: current.map(|p| p.title),
            buttons_simulated: self.buttons.is_simulated(),
        }
    }

    /// Build a status snapshot and push it to the sink.
    pub fn emit_status(&self) -> StatusSnapshot {
        let status = self.build_status();
        self.sink.emit(&AppEvent::Status(status.clone()));
        status
    }

    pub fn register(&self) -> &Arc<StateRegister> {
        &self.controls.register
    }

    pub fn reminders(&self) -> &Arc<ReminderScheduler> {
        &self.controls.reminders
    }

    pub fn scanner(&self) -> &Arc<NetworkScanner> {
        &self.controls.scanner
    }

    pub fn feed(&self) -> &Arc<FeedFetcher> {
        &self.controls.feed
    }

    pub fn buttons(&self) -> &DebouncedInputPoller {
        &self.buttons
    }
}

impl Drop for Companion {
    fn drop(&mut self) {
        self.stop();
    }
}
