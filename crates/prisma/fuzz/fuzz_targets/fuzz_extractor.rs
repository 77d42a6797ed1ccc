//! Fuzz target for claim extraction.
//!
//! Extraction must never panic and must keep claim spans inside the input.

#![no_main]

use libfuzzer_sys::fuzz_target;
use prisma::claims::ColumnProfile;
use prisma::{ClaimExtractor, ExtractionConfig};

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let columns = [
        ColumnProfile::numeric("age"),
        ColumnProfile::numeric("charges"),
        ColumnProfile::categorical("smoker", ["no", "yes"]),
    ];
    let extractor = ClaimExtractor::new(ExtractionConfig::default(), &columns);
    for claim in extractor.extract(text) {
        assert!(claim.span.end <= text.len());
    }
});
