//! Controller configuration parameters
//!
//! All tunable parameters for the snub controller.  Defaults match the
//! bench firmware; any subset can be overridden from a JSON file (see
//! [`EnvConfig`](crate::adapters::env_config::EnvConfig)).

use core::time::Duration;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    // --- Serial link ---
    /// Serial device path of the bench or simulator
    pub device_path: String,
    /// Serial baud rate
    pub baud_rate: u32,
    /// Telemetry polls per second
    pub reading_frequency_hz: u32,
    /// Size of the telemetry response buffer (bytes)
    pub buffer_size: usize,
    /// How long one telemetry read may block (milliseconds)
    pub read_timeout_ms: u64,

    // --- Thresholds ---
    /// Speed at or above which acceleration is considered complete
    pub upper_speed_limit: i32,
    /// Speed below which braking is considered complete
    pub inferior_speed_limit: i32,
    /// Temperature above which the water cycle is triggered
    pub temperature_limit: i32,

    // --- Timing ---
    /// Settle delay between reaching speed and braking (milliseconds)
    pub settle_delay_ms: u64,
    /// Cool-down duration before the next acceleration (milliseconds)
    pub cooldown_delay_ms: u64,
    /// Duration of one water throw (milliseconds)
    pub water_soak_ms: u64,

    // --- Run ---
    /// Stop after this many completed snubs (None = run until stopped)
    pub snub_target: Option<u32>,
    /// Append logs to this file instead of stderr
    pub log_file: Option<PathBuf>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            // Serial link
            device_path: "/dev/ttyACM0".into(),
            baud_rate: 115_200,
            reading_frequency_hz: 10, // 100 ms per poll
            buffer_size: 48,
            read_timeout_ms: 1000,

            // Thresholds
            upper_speed_limit: 150,
            inferior_speed_limit: 150,
            temperature_limit: 400,

            // Timing
            settle_delay_ms: 2000,
            cooldown_delay_ms: 3000,
            water_soak_ms: 3000,

            // Run
            snub_target: None,
            log_file: None,
        }
    }
}

/// Threshold rules consumed by the decision loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub upper_speed: i32,
    pub inferior_speed: i32,
    pub temperature: i32,
}

impl Default for Thresholds {
    fn default() -> Self {
        ControllerConfig::default().thresholds()
    }
}

/// Fixed delays of the transition tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub settle: Duration,
    pub cooldown: Duration,
    pub soak: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        ControllerConfig::default().timing()
    }
}

impl ControllerConfig {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            upper_speed: self.upper_speed_limit,
            inferior_speed: self.inferior_speed_limit,
            temperature: self.temperature_limit,
        }
    }

    pub fn timing(&self) -> Timing {
        Timing {
            settle: Duration::from_millis(self.settle_delay_ms),
            cooldown: Duration::from_millis(self.cooldown_delay_ms),
            soak: Duration::from_millis(self.water_soak_ms),
        }
    }

    /// Time between two telemetry polls.
    pub fn poll_period(&self) -> Duration {
        Duration::from_secs(1) / self.reading_frequency_hz.max(1)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_path.trim().is_empty() {
            return Err(ConfigError::ValidationFailed("device_path is empty"));
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::ValidationFailed("baud_rate must be > 0"));
        }
        if self.reading_frequency_hz == 0 || self.reading_frequency_hz > 1000 {
            return Err(ConfigError::ValidationFailed(
                "reading_frequency_hz must be within 1..=1000",
            ));
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::ValidationFailed("buffer_size must be > 0"));
        }
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("read_timeout_ms must be > 0"));
        }
        if self.inferior_speed_limit > self.upper_speed_limit {
            return Err(ConfigError::ValidationFailed(
                "inferior_speed_limit must not exceed upper_speed_limit",
            ));
        }
        if self.snub_target == Some(0) {
            return Err(ConfigError::ValidationFailed("snub_target must be > 0"));
        }
        Ok(())
    }
}
