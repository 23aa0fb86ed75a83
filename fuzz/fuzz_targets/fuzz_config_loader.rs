#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parsing and validation may reject the input but must never panic.
    if let Ok(cfg) = ocrnav_config::load_toml(data) {
        if cfg.validate().is_ok() {
            // A valid config must convert into core settings without panicking.
            let _ = ocrnav_core::conversions::ascend_from(cfg.mapping.as_ref());
            if let Some(m) = &cfg.mapping {
                let _ = ocrnav_core::KeyMapping::try_from(m);
            }
        }
    }
});
