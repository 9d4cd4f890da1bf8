//! Fuzz target for dfdrift.json configuration parsing.
//!
//! Tests that parsing and validation reject arbitrary input with an error
//! instead of panicking.

#![no_main]

use std::path::Path;

use dfdrift_core::DriftConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        if let Ok(config) = DriftConfig::from_json_str(content, Path::new("fuzz.json")) {
            // Accepted configs are valid by construction
            assert!(config.epsilon >= 0.0);
            assert!(config.alpha > 0.0 && config.alpha < 1.0);
        }
    }
});
