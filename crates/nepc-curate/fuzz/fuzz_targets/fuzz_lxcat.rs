//! Fuzz target for the LXCat parser.
//!
//! The parser must never panic: malformed blocks are skipped and bad
//! data tables surface as errors.

#![no_main]

use libfuzzer_sys::fuzz_target;
use nepc_curate::input::LxcatParser;

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }

    for has_arg in [true, false] {
        let mut parser = LxcatParser::new(data, "fuzz.txt");
        if !has_arg {
            parser = parser.without_arguments();
        }
        for record in parser {
            if record.is_err() {
                break;
            }
        }
    }
});
