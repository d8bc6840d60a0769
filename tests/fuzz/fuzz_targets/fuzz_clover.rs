#![no_main]
use covtree::ingest::{build_tree, OnMalformed};
use covtree::parsers::{clover::CloverParser, CoverageParser};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Neither the parser nor tree building may panic on any input.
    if let Ok(coverage) = CloverParser.parse(data) {
        let _ = build_tree(coverage, OnMalformed::Skip);
    }
});
