//! Fuzz target: `ConfigTree` + `CompanionConfig::from_tree`
//!
//! Whatever YAML arrives, building the config must never panic.
//!
//! cargo fuzz run fuzz_config_tree

#![no_main]

use cyfox::config::{CompanionConfig, ConfigTree};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(tree) = ConfigTree::parse(text) {
        let config = CompanionConfig::from_tree(&tree);
        let _ = config.status_interval();
    }
});
