//! Outbound controller events.
//!
//! The decision loop and its transition tasks emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use crate::error::Error;
use crate::fsm::State;
use crate::safety::StopReason;

/// Why a transition happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    /// Speed held above the upper limit for the settle delay.
    Stabilized,
    /// Speed dropped below the inferior limit while braking.
    Braked,
    /// The cool-down delay elapsed.
    CooledDown,
    /// A temperature sensor went over the limit.
    WaterOn,
    /// The water soak elapsed.
    WaterOff,
    /// A transition failed; the controller forced a cool-down.
    FailSafe,
}

/// Structured events emitted by the controller core.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// The decision loop started (carries the initial state).
    Started(State),

    /// The register moved between states and the command was written.
    StateChanged { from: State, to: State, cause: Cause },

    /// A full accelerate → brake → cool-down cycle finished.
    SnubCompleted(u32),

    /// A transition failed.
    Fault(Error),

    /// The decision loop stopped.
    Stopped(StopReason),
}
