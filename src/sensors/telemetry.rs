//! Telemetry line decoder.
//!
//! The bench answers each `"` request with one ASCII line of exactly
//! eleven comma-separated decimal fields.  Only three are consumed:
//!
//! ```text
//!  idx:  0    1     2    3   4   5    6    7   8   9   10
//!        .., tempA, tempB, .., .., .., speed, .., .., .., ..
//! ```
//!
//! Short reads and device jitter are expected: anything that is not a
//! well-formed line yields `None` and is silently skipped by the poller.
//! A non-numeric value in a consumed field drops the whole sample rather
//! than defaulting to zero.

use heapless::Vec;

/// Number of fields in a well-formed telemetry line.
pub const FIELD_COUNT: usize = 11;

const TEMPERATURE_A_FIELD: usize = 1;
const TEMPERATURE_B_FIELD: usize = 2;
const SPEED_FIELD: usize = 6;

/// The two temperature sensor readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemperaturePair(pub i32, pub i32);

impl TemperaturePair {
    /// True if either sensor is strictly above `limit`.
    pub fn exceeds(&self, limit: i32) -> bool {
        self.0 > limit || self.1 > limit
    }
}

/// One decoded telemetry reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetrySample {
    pub speed: i32,
    pub temperatures: TemperaturePair,
}

/// Decode one response buffer.
pub fn parse(line: &[u8]) -> Option<TelemetrySample> {
    let text = core::str::from_utf8(line).ok()?;

    let mut fields: Vec<&str, FIELD_COUNT> = Vec::new();
    for field in text.split(',') {
        // More than FIELD_COUNT fields: not a telemetry line.
        fields.push(field).ok()?;
    }
    if fields.len() != FIELD_COUNT {
        return None;
    }

    let number = |idx: usize| fields[idx].trim().parse::<i32>().ok();

    Some(TelemetrySample {
        speed: number(SPEED_FIELD)?,
        temperatures: TemperaturePair(number(TEMPERATURE_A_FIELD)?, number(TEMPERATURE_B_FIELD)?),
    })
}
