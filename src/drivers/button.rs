//! Debounced button poller.
//!
//! ## Hardware
//!
//! Four active-low momentary switches with pull-ups.  There are no
//! interrupts: a worker thread samples every bound line each poll interval
//! (10 ms by default) and runs the debounce filter per button.
//!
//! ## Debounce
//!
//! | Sample sequence                 | Condition                          | Result       |
//! |---------------------------------|------------------------------------|--------------|
//! | inactive → active               | first press, or window elapsed     | action fires |
//! | inactive → active               | less than window since last fire   | ignored      |
//! | active → active                 | button held                        | nothing      |
//!
//! Actions run on the poller thread, outside every internal lock, each in
//! its own panic boundary.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::{error, info, warn};

use crate::app::ports::{Clock, DigitalInput};
use crate::config::ButtonConfig;
use crate::diagnostics::panic_message;
use crate::error::ButtonError;
use crate::worker::Worker;

/// Logical buttons are numbered `1..=BUTTON_COUNT`.
pub const BUTTON_COUNT: usize = 4;

/// Bounded wait for the poller on stop.
const STOP_TIMEOUT: Duration = Duration::from_secs(1);

// ───────────────────────────────────────────────────────────────
// Debounce filter
// ───────────────────────────────────────────────────────────────

/// Press-edge detector with a minimum spacing between fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Debouncer {
    window_ms: u64,
    was_active: bool,
    last_fire_ms: Option<u64>,
}

impl Debouncer {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            was_active: false,
            last_fire_ms: None,
        }
    }

    /// Feed one sample taken at `now_ms`.  Returns `true` when the press
    /// should fire.
    pub fn sample(&mut self, active: bool, now_ms: u64) -> bool {
        let rising = active && !self.was_active;
        self.was_active = active;
        if !rising {
            return false;
        }
        let clear = self
            .last_fire_ms
            .is_none_or(|at| now_ms.saturating_sub(at) >= self.window_ms);
        if clear {
            self.last_fire_ms = Some(now_ms);
        }
        clear
    }
}

// ───────────────────────────────────────────────────────────────
// Poller
// ───────────────────────────────────────────────────────────────

/// Action bound to a button.
pub type ButtonAction = Arc<dyn Fn() + Send + Sync>;

struct ButtonBinding {
    button: u8,
    line: u8,
    action: ButtonAction,
    debouncer: Debouncer,
}

struct Shared {
    input: Mutex<Box<dyn DigitalInput>>,
    bindings: Mutex<heapless::Vec<ButtonBinding, BUTTON_COUNT>>,
    clock: Arc<dyn Clock>,
    epoch: Instant,
    simulated: AtomicBool,
}

fn lock<T: ?Sized>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn poll(&self) -> usize {
        if self.simulated.load(Ordering::Acquire) {
            return 0;
        }
        let now_ms = self.clock.now().saturating_duration_since(self.epoch).as_millis() as u64;

        let mut fired: heapless::Vec<(u8, ButtonAction), BUTTON_COUNT> = heapless::Vec::new();
        {
            let mut input = lock(&self.input);
            let mut bindings = lock(&self.bindings);
            for binding in bindings.iter_mut() {
                let active = input.is_active(binding.line);
                if binding.debouncer.sample(active, now_ms) {
                    // At most one entry per binding.
                    let _ = fired.push((binding.button, Arc::clone(&binding.action)));
                }
            }
        }

        for (button, action) in &fired {
            info!("Button {} pressed", button);
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| action())) {
                error!(
                    "Error in button {} callback: {}",
                    button,
                    panic_message(payload.as_ref())
                );
            }
        }
        fired.len()
    }
}

/// Samples the button lines on a worker thread and fires bound actions.
pub struct DebouncedInputPoller {
    shared: Arc<Shared>,
    lines: [u8; BUTTON_COUNT],
    debounce_ms: u64,
    poll_interval: Duration,
    worker: Mutex<Option<Worker>>,
}

impl DebouncedInputPoller {
    pub fn new(config: &ButtonConfig, input: Box<dyn DigitalInput>, clock: Arc<dyn Clock>) -> Self {
        let epoch = clock.now();
        Self {
            shared: Arc::new(Shared {
                input: Mutex::new(input),
                bindings: Mutex::new(heapless::Vec::new()),
                clock,
                epoch,
                simulated: AtomicBool::new(false),
            }),
            lines: config.lines,
            debounce_ms: config.debounce_ms,
            poll_interval: config.poll_interval(),
            worker: Mutex::new(None),
        }
    }

    /// Input line wired to `button`, if the id is valid.
    pub fn line_for(&self, button: u8) -> Option<u8> {
        (1..=BUTTON_COUNT as u8)
            .contains(&button)
            .then(|| self.lines[usize::from(button) - 1])
    }

    /// Bind `action` to logical `button` (`1..=4`).
    ///
    /// Each button takes one action; a second registration is rejected.
    pub fn register_button_callback(
        &self,
        button: u8,
        action: impl Fn() + Send + Sync + 'static,
    ) -> Result<(), ButtonError> {
        let Some(line) = self.line_for(button) else {
            warn!("Invalid button number: {}", button);
            return Err(ButtonError::UnknownButton(button));
        };
        let mut bindings = lock(&self.shared.bindings);
        if bindings.iter().any(|b| b.button == button) {
            warn!("Button {} already has an action", button);
            return Err(ButtonError::AlreadyBound(button));
        }
        // Ids are unique and in range, so the table cannot be full here.
        let _ = bindings.push(ButtonBinding {
            button,
            line,
            action: Arc::new(action),
            debouncer: Debouncer::new(self.debounce_ms),
        });
        info!("Button {} bound to line {}", button, line);
        Ok(())
    }

    /// Take one sample of every bound line and fire pending actions on the
    /// calling thread.  Returns how many actions fired.
    pub fn poll_once(&self) -> usize {
        self.shared.poll()
    }

    /// `true` once setup failed and the poller ignores the hardware.
    pub fn is_simulated(&self) -> bool {
        self.shared.simulated.load(Ordering::Acquire)
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Configure the input lines and start polling.
    ///
    /// If the input backend cannot be set up the poller keeps running in
    /// simulation mode, where no button ever fires.  No-op if running.
    pub fn start(&self) -> crate::Result<()> {
        let mut slot = lock(&self.worker);
        if slot.is_some() {
            return Ok(());
        }
        let simulated = match lock(&self.shared.input).setup(&self.lines) {
            Ok(()) => false,
            Err(e) => {
                warn!("Button input unavailable ({}); running in simulation mode", e);
                true
            }
        };
        self.shared.simulated.store(simulated, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        let interval = self.poll_interval;
        *slot = Some(Worker::start("buttons", move |token| {
            while token.is_running() {
                shared.poll();
                if !token.sleep(interval) {
                    break;
                }
            }
        })?);
        info!("Button poller started");
        Ok(())
    }

    /// Stop polling and release the input lines.  No-op if not running.
    pub fn stop(&self) {
        let worker = lock(&self.worker).take();
        if let Some(worker) = worker {
            worker.stop(STOP_TIMEOUT);
            if !self.is_simulated() {
                lock(&self.shared.input).cleanup();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.worker).as_ref().is_some_and(|w| !w.is_finished())
    }
}

impl Drop for DebouncedInputPoller {
    fn drop(&mut self) {
        self.stop();
    }
}
