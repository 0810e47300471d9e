//! Fuzz target for QDB description parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use nepc_curate::input::QdbDescription;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = QdbDescription::parse(text, Path::new("fuzz/description.xml"));
    }
});
