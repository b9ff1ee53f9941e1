//! Application core: the coordinator and its port boundary.
//!
//! This module wires the workers (reminders, scanner, feed, buttons) to
//! the shared state register and to the outside world.  All interaction
//! with hardware, network, and presentation happens through **port
//! traits** defined in [`ports`], keeping this layer testable with mocks.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
