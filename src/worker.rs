//! Background worker threads with cooperative cancellation.
//!
//! Every long-running loop (button poller, reminders, scanner, feed) runs
//! on its own named OS thread.  Loops share nothing but a
//! [`CancelToken`]: they check [`CancelToken::is_running`] every iteration
//! and sleep through [`CancelToken::sleep`], which returns early when the
//! token is stopped or woken.
//!
//! Shutdown is soft.  [`Worker::stop`] flips the token and waits for the
//! thread up to a bound; a thread that is stuck (typically inside a
//! blocking network call) is detached with a warning, never killed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::error::Error;

/// Stack size for worker threads.  The loops are shallow; reqwest needs
/// the most headroom.
const WORKER_STACK_KB: usize = 256;

/// How often [`Worker::stop`] re-checks a thread that has not exited yet.
const JOIN_POLL: Duration = Duration::from_millis(5);

// ───────────────────────────────────────────────────────────────
// Cancellation token
// ───────────────────────────────────────────────────────────────

struct TokenInner {
    running: AtomicBool,
    /// `true` while a wake-up is pending.
    woken: Mutex<bool>,
    cv: Condvar,
}

/// Shared running flag plus an interruptible sleep.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// A token in the running state.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TokenInner {
                running: AtomicBool::new(true),
                woken: Mutex::new(false),
                cv: Condvar::new(),
            }),
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Ask the loop to exit and interrupt any sleep in progress.
    pub fn cancel(&self) {
        self.inner.running.store(false, Ordering::Release);
        self.wake();
    }

    /// Interrupt the current (or next) sleep without cancelling.
    pub fn wake(&self) {
        let mut woken = self.inner.woken.lock().unwrap_or_else(PoisonError::into_inner);
        *woken = true;
        self.inner.cv.notify_all();
    }

    /// Sleep for up to `dur`.
    ///
    /// Returns early on [`cancel`](Self::cancel) or [`wake`](Self::wake);
    /// a pending wake is consumed.  Returns [`is_running`](Self::is_running)
    /// at exit so loops can write `while token.sleep(d) { .. }`.
    pub fn sleep(&self, dur: Duration) -> bool {
        // `None`: too far out to represent, wait for cancel or wake only.
        let deadline = Instant::now().checked_add(dur);
        let mut woken = self.inner.woken.lock().unwrap_or_else(PoisonError::into_inner);
        while !*woken && self.is_running() {
            woken = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    self.inner
                        .cv
                        .wait_timeout(woken, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => self.inner.cv.wait(woken).unwrap_or_else(PoisonError::into_inner),
            };
        }
        *woken = false;
        self.is_running()
    }
}

// ───────────────────────────────────────────────────────────────
// Worker thread
// ───────────────────────────────────────────────────────────────

/// Spawn a named worker thread.
pub fn spawn_worker(
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> crate::Result<JoinHandle<()>> {
    info!("Spawning '{}' (stack={}KB)", name, WORKER_STACK_KB);
    std::thread::Builder::new()
        .name(name.into())
        .stack_size(WORKER_STACK_KB * 1024)
        .spawn(f)
        .map_err(|source| Error::Spawn { name, source })
}

/// A running loop: its thread handle and the token that stops it.
pub struct Worker {
    name: &'static str,
    token: CancelToken,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn `body` on a new thread, handing it a fresh token.
    pub fn start(
        name: &'static str,
        body: impl FnOnce(CancelToken) + Send + 'static,
    ) -> crate::Result<Self> {
        let token = CancelToken::new();
        let loop_token = token.clone();
        let handle = spawn_worker(name, move || body(loop_token))?;
        Ok(Self {
            name,
            token,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Interrupt the loop's current sleep.
    pub fn wake(&self) {
        self.token.wake();
    }

    /// Whether the thread body has returned.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Cancel and wait up to `timeout` for the thread to exit.
    ///
    /// Returns `true` if the thread was joined.  A thread still running at
    /// the deadline is detached; it exits on its own once its blocking call
    /// returns and it observes the cancelled token.
    pub fn stop(mut self, timeout: Duration) -> bool {
        self.token.cancel();
        let Some(handle) = self.handle.take() else {
            return true;
        };

        let deadline = Instant::now() + timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                warn!(
                    "Worker '{}' did not stop within {:?}; detaching",
                    self.name, timeout
                );
                return false;
            }
            std::thread::sleep(JOIN_POLL);
        }
        if handle.join().is_err() {
            warn!("Worker '{}' exited by panic", self.name);
        }
        info!("Worker '{}' stopped", self.name);
        true
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // Dropping without stop() still signals the loop to exit.
        self.token.cancel();
    }
}
