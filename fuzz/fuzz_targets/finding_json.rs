//! Fuzzing target for the canonical JSON finding report.
//!
//! Exercises the round-trip deserializer that downstream automation relies
//! on for lossless JSON; arbitrary byte input must never panic, only return
//! an error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use vulnscan_formats::json::JsonReport;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(report) = serde_json::from_str::<JsonReport>(s) {
            let _ = serde_json::to_string(&report);
        }
    }
    let _ = serde_json::from_slice::<serde_json::Value>(data);
});
