//! Fuzz target for quality file parsing.
//!
//! Parsing arbitrary input must return an error or a map whose values are
//! dot-joined integers, never panic.

#![no_main]

use clonotrack::pairing::parse_qualities;
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    if let Ok(qualities) = parse_qualities(Cursor::new(data), Path::new("fuzz.qual")) {
        for scores in qualities.values() {
            assert!(scores
                .split('.')
                .filter(|s| !s.is_empty())
                .all(|s| s.parse::<u32>().is_ok()));
        }
    }
});
