#![no_main]

use fuzzcov_adapters_json::parse_record;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // Errors are expected; panics are not.
        let _ = parse_record(text, "fuzz.json");
    }
});
