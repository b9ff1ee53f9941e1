//! Unified error types for the Cyfox core.
//!
//! Each subsystem owns a small error enum that its own operations return.
//! The crate-level [`Error`] covers lifecycle calls (wiring buttons,
//! spawning workers).  None of these errors is fatal to the process: the
//! workers log them and degrade to "no effect this cycle".

use std::net::Ipv4Addr;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Failure to wire or start the companion.
#[derive(Debug, Error)]
pub enum Error {
    /// Button registration was rejected.
    #[error("button: {0}")]
    Button(#[from] ButtonError),
    /// A worker thread could not be spawned.
    #[error("worker '{name}' failed to spawn: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Buttons
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ButtonError {
    /// Logical button id outside `1..=4`.
    #[error("invalid button number: {0}")]
    UnknownButton(u8),
    /// The button already has an action; re-registration is not supported.
    #[error("button {0} already has an action")]
    AlreadyBound(u8),
}

// ---------------------------------------------------------------------------
// Digital inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum InputError {
    /// The GPIO backend is missing on this host (not a Pi, no sysfs, ...).
    #[error("input backend unavailable: {0}")]
    Unavailable(String),
    /// A specific line could not be claimed or configured.
    #[error("line {line}: {source}")]
    Line {
        line: u8,
        #[source]
        source: std::io::Error,
    },
    /// No pin was supplied for a bound line.
    #[error("no pin for line {0}")]
    MissingPin(u8),
}

// ---------------------------------------------------------------------------
// Network range parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CidrError {
    /// No `/` separator between address and prefix.
    #[error("missing prefix length in '{0}'")]
    MissingPrefix(String),
    /// The address part is not a dotted IPv4 address.
    #[error("invalid IPv4 address '{0}'")]
    InvalidAddress(String),
    /// The prefix is not a number in `0..=32`.
    #[error("invalid prefix length '{0}'")]
    InvalidPrefix(String),
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScanError {
    /// Another scan already holds the in-progress flag.
    #[error("a scan is already in progress")]
    InProgress,
    /// The worker was stopped mid-scan; partial results were discarded.
    #[error("scan cancelled")]
    Cancelled,
    /// The configured range is malformed; the whole scan was aborted.
    #[error("bad network range: {0}")]
    Range(#[from] CidrError),
    /// A probe failed with something other than refused / timed out.
    #[error("probe {host}:{port} failed: {source}")]
    Probe {
        host: Ipv4Addr,
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum HttpError {
    /// Connection, TLS, or timeout failure.
    #[error("transport: {0}")]
    Transport(String),
    /// Body was not valid JSON.
    #[error("invalid body: {0}")]
    Body(String),
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid YAML.
    #[error("parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
