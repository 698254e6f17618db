#![no_main]

use libfuzzer_sys::fuzz_target;
use uso::record;

fuzz_target!(|data: &[u8]| {
    // Convert arbitrary bytes to UTF-8 string (lossy conversion)
    if let Ok(input) = std::str::from_utf8(data) {
        // Attempt to parse the accounting output
        // This should not panic regardless of input
        let _ = record::parse_records(input, '|');
    }
});
