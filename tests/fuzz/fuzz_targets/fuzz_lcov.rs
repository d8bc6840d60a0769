#![no_main]
use covtree::ingest::{build_tree, OnMalformed};
use covtree::parsers::{lcov::LcovParser, CoverageParser};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(coverage) = LcovParser.parse(data) {
        let _ = build_tree(coverage, OnMalformed::Skip);
    }
});
