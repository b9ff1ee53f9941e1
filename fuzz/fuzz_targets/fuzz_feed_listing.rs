//! Fuzz target: `feed::parse_listing`
//!
//! Any JSON document is either rejected or yields at most `limit` items,
//! each tagged with the requested source.
//!
//! cargo fuzz run fuzz_feed_listing

#![no_main]

use cyfox::feed::{parse_listing, rank};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&limit, body)) = data.split_first() else {
        return;
    };
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
        return;
    };
    let limit = usize::from(limit % 16);

    if let Ok(items) = parse_listing("fuzz", &value, limit) {
        assert!(items.len() <= limit);
        assert!(items.iter().all(|i| i.source == "fuzz"));
        let ranked = rank(items, 5);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }
});
