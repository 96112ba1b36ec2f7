#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let _ = fc_parser::parse_drawio(input, "fuzz.drawio");
        let _ = fc_parser::parse_c4_text(input, "fuzz.mmd");
    }
});
