#![no_main]
use libfuzzer_sys::fuzz_target;
use s2replay::{ReplayContext, VersionInfo};

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    // the first bytes pick the build so every dispatch table gets exercised
    let build = 15405 + u32::from(u16::from_le_bytes([data[0], data[1]])) % 12000;
    let major = 1 + u16::from(data[2] & 1);
    let version = VersionInfo {
        major,
        minor: 0,
        revision: 0,
        build,
    };
    let context = ReplayContext::new(build, version).with_debug(true);
    let _ = s2replay::decode_game_events_with(
        &data[3..],
        &context,
        s2replay::GameEventOptions {
            keep_ignored: true,
            debug: true,
        },
    );
});
