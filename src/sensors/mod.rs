//! Device-side readings.
//!
//! The snub bench reports speed and two temperature sensors as a single
//! CSV telemetry line; [`telemetry`] turns it into a typed sample.

pub mod telemetry;

pub use telemetry::{TelemetrySample, TemperaturePair};
