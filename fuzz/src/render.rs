#![no_main]

use std::collections::BTreeMap;
use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde::Serialize;

#[derive(Debug, Serialize, Arbitrary)]
#[serde(untagged)]
enum Value {
    None,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

fuzz_target!(|data: (&str, Vec<(&str, &str)>, BTreeMap<String, Value>)| {
    let (root, partials, value) = data;
    let mut fs = tincture::MemoryFileSystem::new();
    for (name, source) in partials {
        fs.insert(&format!("/{}", name), source);
    }
    let options = tincture::Options::builder()
        .root(["/"])
        .fs(fs)
        .parse_limit(1 << 16)
        .memory_limit(1 << 20)
        .render_limit(Duration::from_millis(100))
        .build();
    let engine = tincture::Engine::with_options(options);
    let Ok(template) = engine.parse(root) else {
        return;
    };
    let _ = engine.render(&template, &value).to_string_sync();
});
