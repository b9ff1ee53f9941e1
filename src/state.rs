//! Shared state/mode register.
//!
//! ```text
//!  ReminderLoop ──┐                        ┌──▶ state callbacks (in order)
//!  ScannerLoop  ──┼──▶ StateRegister ──────┤
//!  Coordinator  ──┘   (mutex-guarded)      └──▶ mode callbacks  (in order)
//! ```
//!
//! The register is the single source of truth for what the companion is
//! doing right now.  Values live behind one mutex so a reader never sees a
//! torn state/mode pair.  Writes to a field are serialised by a per-field
//! dispatch lock that stays held while that field's callbacks run, so
//! observers see `(old, new)` pairs in exact commit order and every
//! callback has returned before `set_*` returns.
//!
//! A callback may read the register, and a mode callback may write the
//! state (and vice versa).  A callback must not write the field it is
//! observing: the dispatch lock is not re-entrant.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::diagnostics::panic_message;

// ---------------------------------------------------------------------------
// State and mode
// ---------------------------------------------------------------------------

/// What the companion is currently doing.  Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingState {
    Idle,
    Eating,
    Drinking,
    Resting,
    Focusing,
    Scanning,
    Reading,
    Alert,
}

/// Which worker's output is currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// Reminder companion.
    Buddy,
    /// Network scan results.
    Scanner,
    /// Remote feed reader.
    Feed,
}

impl OperatingMode {
    /// Cyclic order used by [`StateRegister::cycle_mode`].
    pub const CYCLE: [Self; 3] = [Self::Buddy, Self::Scanner, Self::Feed];

    /// The mode after `self`, wrapping back to the first.
    pub fn next(self) -> Self {
        let idx = Self::CYCLE.iter().position(|m| *m == self).unwrap_or(0);
        Self::CYCLE[(idx + 1) % Self::CYCLE.len()]
    }

    /// Three-letter indicator for the corner of the display.
    pub fn short_label(self) -> &'static str {
        match self {
            Self::Buddy => "BUD",
            Self::Scanner => "SCA",
            Self::Feed => "FEE",
        }
    }
}

/// Consistent view of both fields taken under one lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterSnapshot {
    pub state: OperatingState,
    pub mode: OperatingMode,
}

// ---------------------------------------------------------------------------
// Callbacks
// ---------------------------------------------------------------------------

/// Observer of a state transition, called with `(old, new)`.
pub type StateCallback = Box<dyn Fn(OperatingState, OperatingState) + Send + Sync>;

/// Observer of a mode transition, called with `(old, new)`.
pub type ModeCallback = Box<dyn Fn(OperatingMode, OperatingMode) + Send + Sync>;

/// Run every callback in order, each inside its own panic boundary.
fn dispatch<T: Copy>(
    field: &str,
    callbacks: &RwLock<Vec<Box<dyn Fn(T, T) + Send + Sync>>>,
    old: T,
    new: T,
) {
    let callbacks = callbacks.read().unwrap_or_else(PoisonError::into_inner);
    for (idx, callback) in callbacks.iter().enumerate() {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback(old, new))) {
            error!(
                "Error in {} callback #{}: {}",
                field,
                idx,
                panic_message(payload.as_ref())
            );
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Register
// ---------------------------------------------------------------------------

/// Thread-safe holder of the operating state and mode.
///
/// Share it as `Arc<StateRegister>`; the raw values are never exposed.
pub struct StateRegister {
    values: Mutex<RegisterSnapshot>,
    state_dispatch: Mutex<()>,
    mode_dispatch: Mutex<()>,
    state_callbacks: RwLock<Vec<StateCallback>>,
    mode_callbacks: RwLock<Vec<ModeCallback>>,
}

impl Default for StateRegister {
    fn default() -> Self {
        Self::new()
    }
}

impl StateRegister {
    /// Start in `Idle` / `Buddy`.
    pub fn new() -> Self {
        Self::with_initial(OperatingState::Idle, OperatingMode::Buddy)
    }

    pub fn with_initial(state: OperatingState, mode: OperatingMode) -> Self {
        Self {
            values: Mutex::new(RegisterSnapshot { state, mode }),
            state_dispatch: Mutex::new(()),
            mode_dispatch: Mutex::new(()),
            state_callbacks: RwLock::new(Vec::new()),
            mode_callbacks: RwLock::new(Vec::new()),
        }
    }

    // ── Reads ─────────────────────────────────────────────────

    pub fn state(&self) -> OperatingState {
        lock(&self.values).state
    }

    pub fn mode(&self) -> OperatingMode {
        lock(&self.values).mode
    }

    /// Both fields read atomically.
    pub fn snapshot(&self) -> RegisterSnapshot {
        *lock(&self.values)
    }

    // ── Writes ────────────────────────────────────────────────

    /// Commit a new state and notify every state callback before returning.
    pub fn set_state(&self, new: OperatingState) {
        let _commit = lock(&self.state_dispatch);
        self.commit_state(new);
    }

    /// Commit `new` only if `cond` holds for the current snapshot.
    ///
    /// The check and the write are atomic with respect to other state
    /// writers.  Returns whether the write happened.
    pub fn set_state_if(
        &self,
        cond: impl FnOnce(RegisterSnapshot) -> bool,
        new: OperatingState,
    ) -> bool {
        let _commit = lock(&self.state_dispatch);
        if !cond(self.snapshot()) {
            return false;
        }
        self.commit_state(new);
        true
    }

    fn commit_state(&self, new: OperatingState) {
        let old = {
            let mut values = lock(&self.values);
            core::mem::replace(&mut values.state, new)
        };
        if old != new {
            info!("State: {:?} -> {:?}", old, new);
        }
        dispatch("state", &self.state_callbacks, old, new);
    }

    /// Commit a new mode and notify every mode callback before returning.
    pub fn set_mode(&self, new: OperatingMode) {
        let _commit = lock(&self.mode_dispatch);
        self.commit_mode(new);
    }

    /// Advance to the next mode in cyclic order and return it.
    ///
    /// The read-advance-write is atomic with respect to other mode writers.
    pub fn cycle_mode(&self) -> OperatingMode {
        let _commit = lock(&self.mode_dispatch);
        let next = self.mode().next();
        self.commit_mode(next);
        next
    }

    fn commit_mode(&self, new: OperatingMode) {
        let old = {
            let mut values = lock(&self.values);
            core::mem::replace(&mut values.mode, new)
        };
        if old != new {
            info!("Mode: {:?} -> {:?}", old, new);
        }
        dispatch("mode", &self.mode_callbacks, old, new);
    }

    // ── Registration ──────────────────────────────────────────

    /// Append a state observer.  There is no unregister.
    pub fn register_state_callback(
        &self,
        callback: impl Fn(OperatingState, OperatingState) + Send + Sync + 'static,
    ) {
        self.state_callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(callback));
    }

    /// Append a mode observer.  There is no unregister.
    pub fn register_mode_callback(
        &self,
        callback: impl Fn(OperatingMode, OperatingMode) + Send + Sync + 'static,
    ) {
        self.mode_callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(callback));
    }
}
