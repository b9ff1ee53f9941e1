//! Network host scanner.
//!
//! Connect-probes a fixed port list on the first hosts of a configured IPv4
//! range and keeps the hosts that answered on at least one port.
//!
//! ```text
//!   scan_interval tick ──┐   (mode == Scanner)
//!                        ├──▶ scan_network() ──▶ results + scan callback
//!   request_scan() ──────┘   (wakes the loop)
//! ```
//!
//! Only one scan runs at a time.  A second caller gets
//! [`ScanError::InProgress`] straight away and nothing is touched.

pub mod catalog;
pub mod cidr;

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Local};
use log::{error, info, warn};
use serde::Serialize;

use crate::app::ports::{PortProbe, ProbeOutcome};
use crate::config::ScannerConfig;
use crate::diagnostics::panic_message;
use crate::error::ScanError;
use crate::state::{OperatingMode, OperatingState, StateRegister};
use crate::worker::{CancelToken, Worker};

pub use cidr::Ipv4Cidr;

/// Hosts probed per scan, taken from the start of the range.
pub const MAX_HOSTS: usize = 10;

/// Bounded wait for the scanner loop on stop.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// One host with at least one open port.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResult {
    pub host: Ipv4Addr,
    /// Open ports in probe order.
    pub ports: Vec<u16>,
    /// Service label per open port.
    pub services: BTreeMap<u16, String>,
    /// Advisory notes for risky open ports.
    pub vulnerabilities: Vec<String>,
    pub timestamp: DateTime<Local>,
}

/// Observer of completed scans.  Receives the full (possibly empty) result list.
pub type ScanCallback = Box<dyn Fn(&[ScanResult]) + Send + Sync>;

/// Clears the in-progress flag when the scan ends, however it ends.
struct ScanGuard<'a>(&'a AtomicBool);

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct Shared {
    config: ScannerConfig,
    register: Arc<StateRegister>,
    probe: Arc<dyn PortProbe>,
    results: Mutex<Vec<ScanResult>>,
    last_scan: Mutex<Option<DateTime<Local>>>,
    in_progress: AtomicBool,
    requested: AtomicBool,
    callback: RwLock<Option<ScanCallback>>,
}

impl Shared {
    fn scan(&self, token: Option<&CancelToken>) -> Result<Vec<ScanResult>, ScanError> {
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ScanError::InProgress);
        }
        let _guard = ScanGuard(&self.in_progress);

        let range: Ipv4Cidr = match self.config.network_range.parse() {
            Ok(range) => range,
            Err(e) => {
                error!("Scanner: bad network range '{}': {}", self.config.network_range, e);
                self.register.set_state(OperatingState::Idle);
                return Err(e.into());
            }
        };

        self.register.set_state(OperatingState::Scanning);
        let hosts: heapless::Vec<Ipv4Addr, MAX_HOSTS> = range.hosts().take(MAX_HOSTS).collect();
        info!("Scanner: probing {} hosts of {}", hosts.len(), range);

        let mut results = Vec::new();
        for host in hosts {
            if token.is_some_and(|t| !t.is_running()) {
                info!("Scanner: cancelled before {}, discarding partial scan", host);
                self.register.set_state_if(
                    |snap| snap.state == OperatingState::Scanning,
                    OperatingState::Idle,
                );
                return Err(ScanError::Cancelled);
            }
            match self.scan_host(host) {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(e) => warn!("Scanner: skipping {}: {}", host, e),
            }
        }

        *self.results.lock().unwrap_or_else(PoisonError::into_inner) = results.clone();
        *self.last_scan.lock().unwrap_or_else(PoisonError::into_inner) = Some(Local::now());
        info!("Scanner: scan complete, {} hosts with open ports", results.len());

        self.register.set_state_if(
            |snap| snap.mode != OperatingMode::Scanner,
            OperatingState::Idle,
        );
        self.notify(&results);
        Ok(results)
    }

    fn scan_host(&self, host: Ipv4Addr) -> Result<Option<ScanResult>, ScanError> {
        let timeout = self.config.probe_timeout();
        let mut ports = Vec::new();
        for &port in &self.config.ports {
            let outcome = self
                .probe
                .probe(host, port, timeout)
                .map_err(|source| ScanError::Probe { host, port, source })?;
            if outcome == ProbeOutcome::Open {
                ports.push(port);
            }
        }
        if ports.is_empty() {
            return Ok(None);
        }

        let services = ports.iter().map(|&p| (p, catalog::service_name(p))).collect();
        let vulnerabilities = catalog::advisories(&ports);
        Ok(Some(ScanResult {
            host,
            ports,
            services,
            vulnerabilities,
            timestamp: Local::now(),
        }))
    }

    fn notify(&self, results: &[ScanResult]) {
        let callback = self.callback.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(callback) = callback.as_ref() {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback(results))) {
                error!("Error in scanner callback: {}", panic_message(payload.as_ref()));
            }
        }
    }
}

/// Periodic and on-demand network scanner.
pub struct NetworkScanner {
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
}

impl NetworkScanner {
    pub fn new(config: ScannerConfig, register: Arc<StateRegister>, probe: Arc<dyn PortProbe>) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                register,
                probe,
                results: Mutex::new(Vec::new()),
                last_scan: Mutex::new(None),
                in_progress: AtomicBool::new(false),
                requested: AtomicBool::new(false),
                callback: RwLock::new(None),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Set the callback invoked after every completed scan.
    pub fn register_scan_callback(&self, callback: impl Fn(&[ScanResult]) + Send + Sync + 'static) {
        *self
            .shared
            .callback
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Box::new(callback));
    }

    /// Scan the configured range on the calling thread.
    pub fn scan_network(&self) -> Result<Vec<ScanResult>, ScanError> {
        self.shared.scan(None)
    }

    /// Ask the background loop for an immediate scan and return at once.
    ///
    /// Without a running loop the request stays pending until `start()`.
    pub fn request_scan(&self) {
        self.shared.requested.store(true, Ordering::Release);
        if let Some(worker) = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            worker.wake();
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.shared.in_progress.load(Ordering::Acquire)
    }

    /// Results of the last completed scan.
    pub fn results(&self) -> Vec<ScanResult> {
        self.shared
            .results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_scan(&self) -> Option<DateTime<Local>> {
        *self.shared.last_scan.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the scan loop.  No-op if already running.
    pub fn start(&self) -> crate::Result<()> {
        let mut slot = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Ok(());
        }
        let shared = Arc::clone(&self.shared);
        let interval = shared.config.scan_interval();
        *slot = Some(Worker::start("scanner", move |token| {
            while token.is_running() {
                let requested = shared.requested.swap(false, Ordering::AcqRel);
                if requested || shared.register.mode() == OperatingMode::Scanner {
                    match shared.scan(Some(&token)) {
                        Ok(_) => {}
                        Err(ScanError::InProgress) => info!("Scanner: scan already running"),
                        Err(ScanError::Cancelled) => break,
                        Err(e) => warn!("Scanner: {}", e),
                    }
                }
                if !token.sleep(interval) {
                    break;
                }
            }
        })?);
        Ok(())
    }

    /// Stop the loop, waiting up to five seconds.  No-op if not running.
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

impl Drop for NetworkScanner {
    fn drop(&mut self) {
        self.stop();
    }
}
