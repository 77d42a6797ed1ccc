//! Fuzz target for the data parser and dataset typing.
//!
//! Malformed input must produce an error, never a panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use prisma::input::{DatasetOptions, Parser};
use prisma::{Dataset, GroundTruthEngine};

fuzz_target!(|data: &[u8]| {
    // Only process reasonable-sized inputs to avoid OOM
    if data.len() > 20_000 {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(table) = Parser::new().parse_str(text) {
        if let Ok(dataset) = Dataset::from_table("fuzz", &table, &DatasetOptions::default()) {
            let _ = GroundTruthEngine::new().compute(&dataset);
        }
    }
});
