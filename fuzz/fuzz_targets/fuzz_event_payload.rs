#![no_main]

use ledeploy_core::{classify, Event};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(payload) = std::str::from_utf8(data) {
        for name in ["push", "pull_request", "workflow_dispatch"] {
            // Parsing and classification must never panic
            if let Ok(event) = Event::from_parts(name, "refs/heads/main", "abc123", payload) {
                let _ = event.commit_sha();
                let _ = classify(&event);
            }
        }
    }
});
