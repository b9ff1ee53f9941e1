//! Reminder scheduler.
//!
//! Four interval reminders (eat, drink, rest, focus) share one background
//! loop.  The loop wakes every check interval and hands the current time
//! to a [`ReminderTable`], which decides which reminder (if any) fires and
//! notifies a [`ReminderDelegate`].  The threaded [`ReminderScheduler`]
//! wraps the table with the state register and the user callback.
//!
//! ```text
//!            ┌──────────┐   acknowledge   ┌──────────────┐
//!     ┌─────▶│   Due    │────────────────▶│ Acknowledged │
//!     │      └────┬─────┘                 └──────┬───────┘
//!     │   tick    │ (first due in priority       │ interval re-elapses
//!     │           ▼  order, one per tick)        │
//!     │      ┌──────────┐   acknowledge          │
//!     └──────│Triggered │────────────────────────┘
//!  interval  └──────────┘
//! ```
//!
//! At most one reminder triggers per tick.  Lower-priority reminders can
//! starve while a higher one keeps coming due; that is accepted.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};

use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::app::ports::{Clock, ReminderDelegate};
use crate::config::ReminderConfig;
use crate::diagnostics::panic_message;
use crate::state::{OperatingState, StateRegister};
use crate::worker::Worker;

/// Bounded wait for the reminder loop on stop.
const STOP_TIMEOUT: Duration = Duration::from_secs(1);

// ═══════════════════════════════════════════════════════════════
//  Reminder types
// ═══════════════════════════════════════════════════════════════

/// The fixed reminder set, declared in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    Eat,
    Drink,
    Rest,
    Focus,
}

/// Static per-kind data: name, state shown while triggered, message.
struct KindInfo {
    name: &'static str,
    state: OperatingState,
    message: &'static str,
}

const KIND_TABLE: [KindInfo; 4] = [
    KindInfo {
        name: "eat",
        state: OperatingState::Eating,
        message: "\u{1F355} Time to eat! Take a break and fuel up!",
    },
    KindInfo {
        name: "drink",
        state: OperatingState::Drinking,
        message: "\u{1F4A7} Stay hydrated! Time for a drink!",
    },
    KindInfo {
        name: "rest",
        state: OperatingState::Resting,
        message: "\u{1F634} Take a rest! Your eyes need a break!",
    },
    KindInfo {
        name: "focus",
        state: OperatingState::Focusing,
        message: "\u{1F3AF} Focus time! Let's get things done!",
    },
];

impl ReminderKind {
    /// Scan order of every scheduler tick.
    pub const PRIORITY: [Self; 4] = [Self::Eat, Self::Drink, Self::Rest, Self::Focus];

    fn info(self) -> &'static KindInfo {
        &KIND_TABLE[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// State written to the register when this reminder triggers.
    pub fn state(self) -> OperatingState {
        self.info().state
    }

    pub fn default_message(self) -> &'static str {
        self.info().message
    }
}

/// One interval reminder.
#[derive(Debug, Clone)]
pub struct Reminder {
    pub kind: ReminderKind,
    pub interval: Duration,
    pub message: String,
    pub last_triggered: Option<Instant>,
    pub acknowledged: bool,
    /// When the current acknowledgement was given.
    pub acknowledged_at: Option<Instant>,
}

impl Reminder {
    pub fn new(kind: ReminderKind, interval: Duration) -> Self {
        Self {
            kind,
            interval,
            message: kind.default_message().to_string(),
            last_triggered: None,
            acknowledged: false,
            acknowledged_at: None,
        }
    }

    /// Pure timing check: never triggered, or a full interval since the last trigger.
    pub fn should_trigger(&self, now: Instant) -> bool {
        self.last_triggered
            .is_none_or(|at| now.saturating_duration_since(at) >= self.interval)
    }

    /// Ready to trigger: timing is met and no acknowledgement covers this period.
    ///
    /// An acknowledgement suppresses the reminder until a full interval has
    /// passed since it was given.
    pub fn is_due(&self, now: Instant) -> bool {
        if !self.should_trigger(now) {
            return false;
        }
        if !self.acknowledged {
            return true;
        }
        self.acknowledged_at
            .is_some_and(|at| now.saturating_duration_since(at) >= self.interval)
    }

    /// Triggered and still waiting for the user.
    pub fn is_triggered(&self) -> bool {
        self.last_triggered.is_some() && !self.acknowledged
    }

    /// Mark triggered at `now`; clears any previous acknowledgement.
    pub fn trigger(&mut self, now: Instant) {
        self.last_triggered = Some(now);
        self.acknowledged = false;
        self.acknowledged_at = None;
    }

    pub fn acknowledge(&mut self, now: Instant) {
        self.acknowledged = true;
        self.acknowledged_at = Some(now);
    }
}

// ═══════════════════════════════════════════════════════════════
//  Reminder table (pure engine)
// ═══════════════════════════════════════════════════════════════

/// The four reminders in priority order.
///
/// Decoupled from threads, the register, and wall time: the caller passes
/// `now` and a [`ReminderDelegate`].
#[derive(Debug, Clone)]
pub struct ReminderTable {
    reminders: [Reminder; 4],
}

impl ReminderTable {
    pub fn new(config: &ReminderConfig) -> Self {
        let minutes = |m: u64| Duration::from_secs(m.saturating_mul(60));
        Self::with_intervals([
            minutes(config.eat_interval_min),
            minutes(config.drink_interval_min),
            minutes(config.rest_interval_min),
            minutes(config.focus_interval_min),
        ])
    }

    /// Intervals indexed like [`ReminderKind::PRIORITY`].
    pub fn with_intervals(intervals: [Duration; 4]) -> Self {
        let [eat, drink, rest, focus] = intervals;
        Self {
            reminders: [
                Reminder::new(ReminderKind::Eat, eat),
                Reminder::new(ReminderKind::Drink, drink),
                Reminder::new(ReminderKind::Rest, rest),
                Reminder::new(ReminderKind::Focus, focus),
            ],
        }
    }

    pub fn get(&self, kind: ReminderKind) -> &Reminder {
        &self.reminders[kind as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reminder> {
        self.reminders.iter()
    }

    /// Trigger the first due reminder in priority order, if any.
    ///
    /// Returns the kind that fired.  At most one fires per call.
    pub fn tick(
        &mut self,
        now: Instant,
        delegate: &mut dyn ReminderDelegate,
    ) -> Option<ReminderKind> {
        let reminder = self.reminders.iter_mut().find(|r| r.is_due(now))?;
        reminder.trigger(now);
        info!("Reminder: '{}' triggered", reminder.kind.name());
        delegate.on_reminder_fired(reminder);
        Some(reminder.kind)
    }

    /// Acknowledge one reminder, or every due/triggered one when `target` is `None`.
    ///
    /// Returns the kinds that were newly acknowledged.
    pub fn acknowledge(
        &mut self,
        target: Option<ReminderKind>,
        now: Instant,
    ) -> heapless::Vec<ReminderKind, 4> {
        let mut acked = heapless::Vec::new();
        for reminder in &mut self.reminders {
            let selected = match target {
                Some(kind) => reminder.kind == kind,
                None => reminder.is_triggered() || reminder.is_due(now),
            };
            if selected && !reminder.acknowledged {
                reminder.acknowledge(now);
                // Capacity equals the reminder count.
                let _ = acked.push(reminder.kind);
            }
        }
        acked
    }

    /// First unacknowledged reminder (priority order) that is triggered or due.
    pub fn active(&self, now: Instant) -> Option<&Reminder> {
        self.reminders
            .iter()
            .find(|r| !r.acknowledged && (r.is_triggered() || r.is_due(now)))
    }
}

// ═══════════════════════════════════════════════════════════════
//  Threaded scheduler
// ═══════════════════════════════════════════════════════════════

/// Observer of triggered reminders.
pub type ReminderCallback = Box<dyn Fn(&Reminder) + Send + Sync>;

struct Shared {
    table: Mutex<ReminderTable>,
    register: Arc<StateRegister>,
    clock: Arc<dyn Clock>,
    callback: RwLock<Option<ReminderCallback>>,
}

impl Shared {
    fn table(&self) -> MutexGuard<'_, ReminderTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn tick(&self) -> Option<ReminderKind> {
        let mut fired = FiredReminder(None);
        let now = self.clock.now();
        let kind = self.table().tick(now, &mut fired)?;
        // Table lock released: the callback may query the scheduler.
        if let Some(reminder) = fired.0 {
            self.register.set_state(kind.state());
            self.notify(&reminder);
        }
        Some(kind)
    }

    fn notify(&self, reminder: &Reminder) {
        let callback = self.callback.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(callback) = callback.as_ref() {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback(reminder))) {
                error!(
                    "Error in reminder callback for '{}': {}",
                    reminder.kind.name(),
                    panic_message(payload.as_ref())
                );
            }
        }
    }
}

/// Delegate that captures the reminder that fired during one tick.
struct FiredReminder(Option<Reminder>);

impl ReminderDelegate for FiredReminder {
    fn on_reminder_fired(&mut self, reminder: &Reminder) {
        self.0 = Some(reminder.clone());
    }
}

/// Background reminder loop bound to the state register.
pub struct ReminderScheduler {
    shared: Arc<Shared>,
    check_interval: Duration,
    worker: Mutex<Option<Worker>>,
}

impl ReminderScheduler {
    pub fn new(config: &ReminderConfig, register: Arc<StateRegister>, clock: Arc<dyn Clock>) -> Self {
        Self::with_table(ReminderTable::new(config), config.check_interval(), register, clock)
    }

    pub fn with_table(
        table: ReminderTable,
        check_interval: Duration,
        register: Arc<StateRegister>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                table: Mutex::new(table),
                register,
                clock,
                callback: RwLock::new(None),
            }),
            check_interval,
            worker: Mutex::new(None),
        }
    }

    /// Set the callback invoked on every trigger (replaces any previous one).
    pub fn register_reminder_callback(&self, callback: impl Fn(&Reminder) + Send + Sync + 'static) {
        *self
            .shared
            .callback
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Box::new(callback));
    }

    /// Run one scheduling pass now.  The background loop calls this every
    /// check interval.
    pub fn tick(&self) -> Option<ReminderKind> {
        self.shared.tick()
    }

    /// Acknowledge `target`, or every due/triggered reminder for `None`.
    ///
    /// Afterwards the state returns to `Idle` if it is `Alert`, or if it is
    /// the state shown for a reminder acknowledged by this call.
    pub fn acknowledge(&self, target: Option<ReminderKind>) -> heapless::Vec<ReminderKind, 4> {
        let now = self.shared.clock.now();
        let acked = self.shared.table().acknowledge(target, now);
        for kind in &acked {
            info!("Reminder: '{}' acknowledged", kind.name());
        }
        self.shared.register.set_state_if(
            |snap| {
                snap.state == OperatingState::Alert
                    || acked.iter().any(|k| k.state() == snap.state)
            },
            OperatingState::Idle,
        );
        acked
    }

    /// The reminder currently calling for attention, if any.
    pub fn active_reminder(&self) -> Option<Reminder> {
        let now = self.shared.clock.now();
        self.shared.table().active(now).cloned()
    }

    /// Snapshot of one reminder.
    pub fn reminder(&self, kind: ReminderKind) -> Reminder {
        self.shared.table().get(kind).clone()
    }

    /// Snapshot of all reminders in priority order.
    pub fn reminders(&self) -> Vec<Reminder> {
        self.shared.table().iter().cloned().collect()
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the background loop.  No-op if already running.
    pub fn start(&self) -> crate::Result<()> {
        let mut slot = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Ok(());
        }
        let shared = Arc::clone(&self.shared);
        let interval = self.check_interval;
        *slot = Some(Worker::start("reminders", move |token| {
            while token.is_running() {
                shared.tick();
                if !token.sleep(interval) {
                    break;
                }
            }
        })?);
        Ok(())
    }

    /// Stop the loop, waiting up to one second.  No-op if not running.
    pub fn stop(&self) {
        let worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(worker) = worker {
            worker.stop(STOP_TIMEOUT);
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|w| !w.is_finished())
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
