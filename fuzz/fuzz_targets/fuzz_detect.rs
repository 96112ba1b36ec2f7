#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let detected = fc_parser::detect_format_with_confidence(input, Some("fuzz.xml"));
        assert!((0.0..=1.0).contains(&detected.confidence));
    }
});
