//! Fuzz target for wire result parsing.
//!
//! This fuzzer feeds arbitrary byte sequences to the result-array parser
//! and, when they parse, runs validation over the entries, checking for
//! panics, crashes, or hangs.

#![no_main]

use labelstate::engine::results::parse_results;
use labelstate::validation::{validate_results, ValidateOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(payload) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(entries) = parse_results(payload) {
        let _ = validate_results(&entries, &ValidateOptions::default());
    }
});
