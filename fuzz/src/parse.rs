#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let engine = tincture::Engine::new();
    let _ = engine.parse(data);
});
