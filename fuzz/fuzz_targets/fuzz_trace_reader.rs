//! Fuzz target for JSON Lines trace parsing.
//!
//! Arbitrary bytes must yield traces or line-numbered errors, never a panic.

#![no_main]

use dfdrift_common::Error;
use dfdrift_core::TraceReader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = TraceReader::new(data);
    while let Some(item) = reader.next() {
        match item {
            Ok(_) => {}
            Err(Error::TraceParse { line, .. }) => {
                assert_eq!(line, reader.line_number());
            }
            // Invalid UTF-8 surfaces as an I/O error
            Err(_) => break,
        }
    }
});
