#![no_main]
use libfuzzer_sys::fuzz_target;
use ocrnav_core::CoordinateParser;

fuzz_target!(|data: &str| {
    let Ok(parser) = CoordinateParser::new() else {
        return;
    };
    // Whatever OCR hands back, a parsed triplet is finite.
    if let Some(p) = parser.parse(data) {
        assert!(p.x.is_finite() && p.y.is_finite() && p.z.is_finite());
    }
});
