#![no_main]

use ledeploy_core::balena::push::parse_release_id;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Build logs are arbitrary text; scanning must never panic
    let output = String::from_utf8_lossy(data);
    let _ = parse_release_id(&output);
});
