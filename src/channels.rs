//! Telemetry streams.
//!
//! Uses `embassy-sync` bounded channels to bridge the polling thread with
//! the async decision loop.  Speed and temperature travel on independent
//! streams so the decision loop can serve them in priority order.
//!
//! ```text
//! ┌──────────────┐   speed: i32    ┌────────────────┐
//! │ Poller       │───────────────▶│ Decision loop   │
//! │ (OS thread)  │───────────────▶│ (LocalExecutor) │
//! └──────────────┘ TemperaturePair └────────────────┘
//! ```
//!
//! Each stream holds one sample.  The producer never blocks: a sample the
//! decision loop has not caught up with is kept and the newer one dropped.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::debug;

use crate::sensors::{TelemetrySample, TemperaturePair};

/// Channel depth for each telemetry stream.
const STREAM_DEPTH: usize = 1;

pub type SpeedStream = Channel<CriticalSectionRawMutex, i32, STREAM_DEPTH>;
pub type TemperatureStream = Channel<CriticalSectionRawMutex, TemperaturePair, STREAM_DEPTH>;

/// The two telemetry streams shared by the poller and the decision loop.
pub struct TelemetryStreams {
    pub speed: SpeedStream,
    pub temperature: TemperatureStream,
}

impl TelemetryStreams {
    pub const fn new() -> Self {
        Self {
            speed: Channel::new(),
            temperature: Channel::new(),
        }
    }

    /// Offer one sample to both streams without blocking.
    /// Returns how many of the two values were accepted.
    pub fn publish(&self, sample: TelemetrySample) -> usize {
        let mut accepted = 0;
        if self.speed.try_send(sample.speed).is_ok() {
            accepted += 1;
        } else {
            debug!("Streams: speed stream full, dropping {}", sample.speed);
        }
        if self.temperature.try_send(sample.temperatures).is_ok() {
            accepted += 1;
        } else {
            debug!(
                "Streams: temperature stream full, dropping {:?}",
                sample.temperatures
            );
        }
        accepted
    }
}

impl Default for TelemetryStreams {
    fn default() -> Self {
        Self::new()
    }
}
