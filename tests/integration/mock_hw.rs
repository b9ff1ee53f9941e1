//! Mock adapters for integration tests.
//!
//! Every mock records what it was asked so tests can assert on the full
//! history without GPIO, sockets, or a network.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use cyfox::app::events::AppEvent;
use cyfox::app::ports::{
    Clock, DigitalInput, EventSink, HttpClient, HttpResponse, PortProbe, ProbeOutcome,
};
use cyfox::error::{HttpError, InputError};
use serde_json::{Value, json};

// ── Manual clock ──────────────────────────────────────────────

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Instant::now()),
        })
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }
}

// ── Digital input ─────────────────────────────────────────────

/// Test-side handle to the levels a [`MockInput`] reports.
#[derive(Clone, Default)]
pub struct InputHandle {
    active: Arc<Mutex<HashSet<u8>>>,
    pub setup_calls: Arc<AtomicUsize>,
    pub cleanup_calls: Arc<AtomicUsize>,
    /// While set, `setup` fails as on a host without GPIO.
    pub fail_setup: Arc<AtomicBool>,
}

impl InputHandle {
    pub fn press(&self, line: u8) {
        self.active.lock().unwrap().insert(line);
    }

    pub fn release(&self, line: u8) {
        self.active.lock().unwrap().remove(&line);
    }
}

pub struct MockInput {
    handle: InputHandle,
}

impl MockInput {
    pub fn new() -> (Self, InputHandle) {
        let handle = InputHandle::default();
        (
            Self {
                handle: handle.clone(),
            },
            handle,
        )
    }

    /// An input whose setup fails, as on a host without GPIO.
    pub fn broken() -> (Self, InputHandle) {
        let (input, handle) = Self::new();
        handle.fail_setup.store(true, Ordering::SeqCst);
        (input, handle)
    }
}

impl DigitalInput for MockInput {
    fn setup(&mut self, _lines: &[u8]) -> Result<(), InputError> {
        self.handle.setup_calls.fetch_add(1, Ordering::SeqCst);
        if self.handle.fail_setup.load(Ordering::SeqCst) {
            return Err(InputError::Unavailable("no gpio in tests".into()));
        }
        Ok(())
    }

    fn is_active(&mut self, line: u8) -> bool {
        self.handle.active.lock().unwrap().contains(&line)
    }

    fn cleanup(&mut self) {
        self.handle.cleanup_calls.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Port probe ────────────────────────────────────────────────

/// Probe with a fixed set of open `(host, port)` pairs.
#[derive(Default)]
pub struct MockProbe {
    pub open: HashSet<(Ipv4Addr, u16)>,
    pub failing_hosts: HashSet<Ipv4Addr>,
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl MockProbe {
    pub fn with_open(open: &[(Ipv4Addr, u16)]) -> Self {
        Self {
            open: open.iter().copied().collect(),
            ..Self::default()
        }
    }
}

impl PortProbe for MockProbe {
    fn probe(&self, host: Ipv4Addr, port: u16, _timeout: Duration) -> io::Result<ProbeOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.failing_hosts.contains(&host) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        }
        Ok(if self.open.contains(&(host, port)) {
            ProbeOutcome::Open
        } else {
            ProbeOutcome::Closed
        })
    }
}

// ── HTTP ──────────────────────────────────────────────────────

#[derive(Clone)]
pub enum Reply {
    Json(u16, Value),
    Fail(String),
}

/// HTTP client answering from a URL → reply table.  Unknown URLs fail.
#[derive(Default)]
pub struct MockHttp {
    replies: Mutex<HashMap<String, Reply>>,
    pub requests: Mutex<Vec<String>>,
}

impl MockHttp {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, url: &str, reply: Reply) {
        self.replies.lock().unwrap().insert(url.to_string(), reply);
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl HttpClient for MockHttp {
    fn get_json(&self, url: &str, _timeout: Duration) -> Result<HttpResponse, HttpError> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.replies.lock().unwrap().get(url).cloned() {
            Some(Reply::Json(status, body)) => Ok(HttpResponse { status, body }),
            Some(Reply::Fail(msg)) => Err(HttpError::Transport(msg)),
            None => Err(HttpError::Transport(format!("no route to {url}"))),
        }
    }
}

/// Listing body with one child per `(title, score)`.
pub fn listing(items: &[(&str, i64)]) -> Value {
    let children: Vec<Value> = items
        .iter()
        .map(|(title, score)| json!({"data": {"title": title, "score": score, "url": "", "author": "a"}}))
        .collect();
    json!({"data": {"children": children}})
}

// ── Event sink ────────────────────────────────────────────────

/// Sink that keeps every event.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<AppEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<AppEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &AppEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Poll `cond` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}
