//! Fuzz target: `Ipv4Cidr::from_str`
//!
//! Arbitrary text must either fail to parse or yield a range whose host
//! iterator stays inside network..=broadcast.
//!
//! cargo fuzz run fuzz_cidr_parse

#![no_main]

use cyfox::scanner::{Ipv4Cidr, MAX_HOSTS};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(cidr) = text.parse::<Ipv4Cidr>() else {
        return;
    };

    assert!(cidr.prefix() <= 32);
    let lo = u32::from(cidr.network());
    let hi = u32::from(cidr.broadcast());
    for host in cidr.hosts().take(MAX_HOSTS) {
        let h = u32::from(host);
        assert!(lo <= h && h <= hi, "host {host} outside {cidr}");
    }

    // Display output must parse back to the same range.
    assert_eq!(cidr.to_string().parse::<Ipv4Cidr>(), Ok(cidr));
});
