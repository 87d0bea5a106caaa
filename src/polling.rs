//! Telemetry polling loop.
//!
//! Runs on its own OS thread.  Every period it asks the bench for one
//! telemetry line, decodes it and offers the sample to the decision loop:
//!
//! ```text
//!   ┌────────────┐  pending stop?  ┌──────────────────────────────┐
//!   │ Collecting │───── yes ──────▶│ write CoolDown ─▶ Stopped(r) │
//!   └─────┬──────┘                 └──────────────────────────────┘
//!         │ no
//!         ▼
//!   exchange('"') ─▶ parse ─▶ publish ─▶ sleep(period) ─▶ Collecting
//! ```
//!
//! Stop requests are honoured at tick boundaries only.  A read timeout is
//! just a missed sample; any other serial failure ends the loop after a
//! best-effort CoolDown and a `Fault` shutdown request.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info, trace, warn};

use crate::app::ports::SerialChannel;
use crate::channels::TelemetryStreams;
use crate::config::ControllerConfig;
use crate::error::{Result, SerialError};
use crate::fsm::{State, TELEMETRY_REQUEST};
use crate::link::SerialLink;
use crate::safety::{Shutdown, StopReason};
use crate::sensors::telemetry;

/// Poller thread name (shows up in debuggers and panic messages).
pub const THREAD_NAME: &str = "telemetry-poller";

/// Where the poller is after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Collecting,
    Stopped(StopReason),
}

pub struct Poller<C> {
    link: SerialLink<C>,
    streams: Arc<TelemetryStreams>,
    shutdown: Arc<Shutdown>,
    period: Duration,
    buffer_size: usize,
}

impl<C: SerialChannel> Poller<C> {
    pub fn new(
        link: SerialLink<C>,
        streams: Arc<TelemetryStreams>,
        shutdown: Arc<Shutdown>,
        config: &ControllerConfig,
    ) -> Self {
        Self {
            link,
            streams,
            shutdown,
            period: config.poll_period(),
            buffer_size: config.buffer_size,
        }
    }

    /// One poll step.  `buf` receives the raw response.
    pub fn tick(&self, buf: &mut [u8]) -> Result<PollerState> {
        if let Some(reason) = self.shutdown.pending() {
            self.link.send_state(State::CoolDown)?;
            info!("Poller: final CoolDown written ({})", reason);
            return Ok(PollerState::Stopped(reason));
        }

        match self.link.exchange(TELEMETRY_REQUEST, buf) {
            Ok(n) => {
                let line = &buf[..n];
                match telemetry::parse(line) {
                    Some(sample) => {
                        trace!(
                            "Poller: speed={} temps=({}, {})",
                            sample.speed, sample.temperatures.0, sample.temperatures.1
                        );
                        self.streams.publish(sample);
                    }
                    None => debug!(
                        "Poller: skipping malformed line {:?}",
                        String::from_utf8_lossy(line)
                    ),
                }
            }
            Err(SerialError::Timeout) => warn!("Poller: telemetry read timed out"),
            Err(e) => return Err(e.into()),
        }
        Ok(PollerState::Collecting)
    }

    /// Poll until stopped.  Always signals halt before returning.
    pub fn run(self) -> Result<StopReason> {
        let mut buf = vec![0u8; self.buffer_size];
        info!(
            "Poller started (period {:?}, buffer {} bytes)",
            self.period, self.buffer_size
        );

        loop {
            match self.tick(&mut buf) {
                Ok(PollerState::Collecting) => thread::sleep(self.period),
                Ok(PollerState::Stopped(reason)) => {
                    self.shutdown.halt(reason);
                    return Ok(reason);
                }
                Err(e) => {
                    error!("Poller: {}", e);
                    if let Err(cool) = self.link.send_state(State::CoolDown) {
                        error!("Poller: CoolDown after failure also failed: {}", cool);
                    }
                    self.shutdown.request(StopReason::Fault);
                    self.shutdown.halt(StopReason::Fault);
                    return Err(e);
                }
            }
        }
    }
}

impl<C: SerialChannel + 'static> Poller<C> {
    /// Run the poller on a dedicated named thread.
    pub fn spawn(self) -> std::io::Result<JoinHandle<Result<StopReason>>> {
        thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || self.run())
    }
}
