#![no_main]
use libfuzzer_sys::fuzz_target;
use s2replay::{ReplayContext, VersionInfo};

fuzz_target!(|data: &[u8]| {
    let version = VersionInfo {
        major: 2,
        minor: 1,
        revision: 0,
        build: 27950,
    };
    let _ = s2replay::decode_tracker_events(data, &ReplayContext::new(27950, version));
});
