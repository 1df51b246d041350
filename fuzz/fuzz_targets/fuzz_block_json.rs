#![no_main]

use libfuzzer_sys::fuzz_target;

use tint_node::{parse_blocks, NodeConfig, OverlayNode};

// Arbitrary JSON either fails to parse or replays without panicking.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(blocks) = parse_blocks(text) else {
        return;
    };
    let Ok(node) = OverlayNode::new(NodeConfig {
        classification_threads: 1,
        ..NodeConfig::default()
    }) else {
        return;
    };
    let _ = node.apply_blocks(&blocks);
});
