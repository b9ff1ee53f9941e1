//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises one subsystem against
//! mock adapters.  Nothing here touches GPIO, sockets, or the network.

mod companion_tests;
mod feed_tests;
mod mock_hw;
mod scanner_tests;
mod state_tests;
