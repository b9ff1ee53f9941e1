//! Cyfox: headless entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SysfsGpioInput   ReqwestClient   TcpProbe   SystemClock       │
//! │  (DigitalInput)   (HttpClient)    (Probe)    (Clock)           │
//! │  LogEventSink     YamlConfigAdapter                            │
//! │  (EventSink)      (ConfigPort)                                 │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │                 Companion (coordinator)                │    │
//! │  │  StateRegister · Reminders · Scanner · Feed · Buttons  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `cyfox [config.yaml]` (default `config/config.yaml`).

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use cyfox::adapters::gpio::SysfsGpioInput;
use cyfox::adapters::http::ReqwestClient;
use cyfox::adapters::log_sink::LogEventSink;
use cyfox::adapters::probe::TcpProbe;
use cyfox::adapters::time::SystemClock;
use cyfox::adapters::yaml_config::{DEFAULT_CONFIG_PATH, YamlConfigAdapter};
use cyfox::app::ports::ConfigPort;
use cyfox::app::service::{Adapters, Companion};
use cyfox::pins::SYSFS_GPIO_ROOT;
use cyfox::worker::CancelToken;

fn main() -> Result<()> {
    // ── 1. Logging + panic hook ───────────────────────────────
    cyfox::init_logging();
    cyfox::diagnostics::install_panic_handler();

    info!("╔══════════════════════════════════════╗");
    info!("║  Cyfox v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let source = YamlConfigAdapter::new(config_path);
    let config = source
        .load()
        .with_context(|| format!("loading config from {}", source.path().display()))?;

    // ── 3. Adapters + coordinator ─────────────────────────────
    let clock = Arc::new(SystemClock::new());
    let http = ReqwestClient::new(&config.feed.user_agent).context("building HTTP client")?;
    let adapters = Adapters {
        input: Box::new(SysfsGpioInput::new(SYSFS_GPIO_ROOT)),
        http: Arc::new(http),
        probe: Arc::new(TcpProbe),
        clock: clock.clone(),
        sink: Arc::new(LogEventSink::new()),
    };
    let companion = Companion::new(&config, adapters).context("wiring companion")?;

    // ── 4. Shutdown signal ────────────────────────────────────
    let shutdown = CancelToken::new();
    let signal = shutdown.clone();
    ctrlc::set_handler(move || {
        info!("Shutdown requested");
        signal.cancel();
    })
    .context("installing signal handler")?;

    // ── 5. Run ────────────────────────────────────────────────
    companion.start().context("starting workers")?;
    info!("Cyfox is running. Press Ctrl+C to stop.");

    while shutdown.sleep(config.status_interval()) {
        companion.emit_status();
    }

    // ── 6. Stop ───────────────────────────────────────────────
    companion.stop();
    info!("Cyfox stopped after {}s", clock.uptime_secs());
    Ok(())
}
