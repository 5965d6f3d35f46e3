#![no_main]
use libfuzzer_sys::fuzz_target;
use s2replay::{ParserBuilder, ReplayContext, ReplayStreams, VersionInfo};

fuzz_target!(|data: &[u8]| {
    let version = VersionInfo {
        major: 2,
        minor: 0,
        revision: 0,
        build: 24944,
    };
    let streams = ReplayStreams {
        init_data: Some(data),
        details: Some(data),
        attributes: Some(data),
        messages: Some(data),
        game_events: Some(data),
        tracker_events: Some(data),
    };
    let _ = ParserBuilder::new(ReplayContext::new(24944, version), streams)
        .ignore_events_on_error()
        .parse();
});
