#![no_main]

use libfuzzer_sys::fuzz_target;

use tint_ledger::{decode_payload, PayloadMatch};
use tint_types::RuleSet;

// Payload matching must never panic, and anything recognized must encode
// back to the bytes it came from.
fuzz_target!(|data: &[u8]| {
    let rules = RuleSet::genesis_rules();
    let count = 1 + data.first().map_or(0, |b| usize::from(*b % 4));
    for index in 0..count {
        if let PayloadMatch::Recognized(payload) = decode_payload(data, &rules, index, count) {
            assert_eq!(payload.encode(), data);
        }
    }
});
