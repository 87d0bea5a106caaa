//! Port traits: the hexagonal boundary between controller logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! Driven adapters (serial device, event sinks, configuration sources)
//! implement these traits.  The controller consumes them via generics, so
//! the decision logic never touches a real port directly.

use core::fmt;
use std::io;

use crate::config::ControllerConfig;

// ───────────────────────────────────────────────────────────────
// Serial channel (driven adapter: domain ↔ bench)
// ───────────────────────────────────────────────────────────────

/// Raw byte transport to the snub bench or its simulator.
///
/// Implementations are shared between the polling thread and the
/// transition tasks through [`SerialLink`](crate::link::SerialLink),
/// which serializes every access.
pub trait SerialChannel: Send {
    /// Write `bytes`, returning how many were accepted.
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize>;

    /// Read whatever is available into `buf`, returning the byte count.
    /// A read that times out reports [`io::ErrorKind::TimedOut`].
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The controller emits structured [`ControllerEvent`](super::events::ControllerEvent)s
/// through this port.  Transition tasks share the sink, so it takes `&self`.
pub trait EventSink {
    fn emit(&self, event: &super::events::ControllerEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ← config source)
// ───────────────────────────────────────────────────────────────

/// Loads controller configuration.
///
/// Implementations MUST call [`ControllerConfig::validate`] before
/// returning a config; out-of-range values are rejected, not clamped.
pub trait ConfigPort {
    fn load(&self) -> Result<ControllerConfig, ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The config file could not be read.
    Io(String),
    /// The config file is not valid JSON for [`ControllerConfig`].
    Corrupted(String),
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
            Self::Corrupted(msg) => write!(f, "config corrupted: {}", msg),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
