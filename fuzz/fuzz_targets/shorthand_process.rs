#![no_main]

use libfuzzer_sys::fuzz_target;
use shorthand_engine::ShorthandTemplate;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // first line is the template, the rest is the input line
    let (template, input) = match text.split_once('\n') {
        Some(split) => split,
        None => (text, ""),
    };

    if let Ok(template) = ShorthandTemplate::parse(template) {
        if let Ok(result) = template.process(input) {
            let _ = template.render(&result);
        }
    }
});
