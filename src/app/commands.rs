//! Inbound commands to the companion.
//!
//! These represent actions requested by the outside world (the four
//! buttons today) that [`Controls`](super::service::Controls) interprets
//! against the current mode and state.

/// Commands that input adapters can send into the companion core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Acknowledge every pending reminder (only in `Alert` or `Buddy`).
    Acknowledge,

    /// Show the next feed item (only in `Feed` mode).
    NextPost,

    /// Ask the scanner for an immediate scan (only in `Scanner` mode).
    Scan,

    /// Advance to the next operating mode.
    CycleMode,
}

/// Button wiring: logical button id → command.
pub const BUTTON_COMMANDS: [(u8, AppCommand); 4] = [
    (1, AppCommand::Acknowledge),
    (2, AppCommand::NextPost),
    (3, AppCommand::Scan),
    (4, AppCommand::CycleMode),
];
