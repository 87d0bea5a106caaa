//! Unified error types for the snub controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! decision loop, the poller and the binary's error handling uniform.
//! Variants are `Clone` so a fault can be both logged and emitted as a
//! controller event.

use core::fmt;
use std::io;

use crate::app::ports::ConfigError;
use crate::fsm::{State, Table};
use crate::safety::StopReason;

// ---------------------------------------------------------------------------
// Top-level controller error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The serial link failed.
    Serial(SerialError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// A transition table was consulted for a state it does not contain.
    UnmappedState { state: State, table: Table },
    /// A command write was withheld because a stop is pending.
    StopPending(StopReason),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial(e) => write!(f, "serial: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::UnmappedState { state, table } => {
                write!(f, "state {state} has no entry in the {} table", table.name())
            }
            Self::StopPending(reason) => write!(f, "write withheld, stop pending ({reason})"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Serial(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::UnmappedState { .. } | Self::StopPending(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Serial errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerialError {
    /// The device could not be opened.
    Open(String),
    /// A command write failed.
    Write(io::ErrorKind),
    /// The device accepted fewer bytes than were written.
    ShortWrite { expected: usize, written: usize },
    /// A telemetry read failed.
    Read(io::ErrorKind),
    /// No telemetry arrived within the read timeout.
    Timeout,
}

impl SerialError {
    pub(crate) fn from_read(e: &io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout,
            kind => Self::Read(kind),
        }
    }
}

impl fmt::Display for SerialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(msg) => write!(f, "open failed: {msg}"),
            Self::Write(kind) => write!(f, "write failed: {kind}"),
            Self::ShortWrite { expected, written } => {
                write!(f, "short write: {written} of {expected} bytes")
            }
            Self::Read(kind) => write!(f, "read failed: {kind}"),
            Self::Timeout => write!(f, "read timed out"),
        }
    }
}

impl std::error::Error for SerialError {}

impl From<SerialError> for Error {
    fn from(e: SerialError) -> Self {
        Self::Serial(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Controller-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
