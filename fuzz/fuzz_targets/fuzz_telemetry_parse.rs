//! Fuzz target: `telemetry::parse`
//!
//! Drives arbitrary response buffers into the telemetry decoder and
//! asserts that it never panics and only accepts eleven-field lines.
//!
//! cargo fuzz run fuzz_telemetry_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use unbrake::sensors::telemetry::{self, FIELD_COUNT};

fuzz_target!(|data: &[u8]| {
    if let Some(sample) = telemetry::parse(data) {
        let text = core::str::from_utf8(data).expect("accepted input must be UTF-8");
        assert_eq!(text.split(',').count(), FIELD_COUNT);
        let speed: i32 = text.split(',').nth(6).unwrap().trim().parse().unwrap();
        assert_eq!(sample.speed, speed);
    }
});
