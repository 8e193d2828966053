#![no_main]

use ledeploy_core::config::{parse_boolean_input, resolve_create_tag};
use ledeploy_core::output::safe_output_escape;
use ledeploy_core::InputConfig;
use libfuzzer_sys::fuzz_target;
use std::borrow::Cow;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let lines: Vec<&str> = text.lines().collect();

        let _ = parse_boolean_input("fuzz", lines.first().copied());
        let _ = resolve_create_tag(lines.first().copied(), lines.get(1).copied());

        if let (Some(&fleet), Some(&source)) = (lines.first(), lines.get(1)) {
            let config = InputConfig {
                fleet: Cow::Borrowed(fleet),
                source: Cow::Borrowed(source),
                ..Default::default()
            };
            if config.validate().is_ok() {
                let _ = config.source_path();
            }
            let _ = config.api_url();
        }

        // Escaped output must never contain a raw line break
        let escaped = safe_output_escape(text);
        assert!(!escaped.contains('\n') && !escaped.contains('\r'));
    }
});
