#![no_main]

use libfuzzer_sys::fuzz_target;
use shorthand_engine::ShorthandTemplate;

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        let _ = ShorthandTemplate::parse(source);
    }
});
