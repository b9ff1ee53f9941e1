//! Cyfox companion core library.
//!
//! Exposes the register, the workers, the coordinator, and the adapters
//! for the binary and for integration testing.  Hardware and network sit
//! behind the port traits in [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod diagnostics;
pub mod drivers;
pub mod error;
pub mod feed;
pub mod pins;
pub mod scanner;
pub mod scheduler;
pub mod state;
pub mod worker;

pub use error::{Error, Result};

/// Initialise the process logger.
///
/// Level defaults to `info`; `RUST_LOG` overrides it.  Safe to call more
/// than once (later calls are ignored).
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
