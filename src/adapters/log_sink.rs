//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured controller events to
//! the `log` facade (rendered by the binary's `tracing-subscriber`).

use log::{error, info};

use crate::app::events::ControllerEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`ControllerEvent`].
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&self, event: &ControllerEvent) {
        match event {
            ControllerEvent::Started(state) => {
                info!("START | initial_state={}", state);
            }
            ControllerEvent::StateChanged { from, to, cause } => {
                info!(
                    "STATE | {} -> {} ({:?}) | cmd={:?}",
                    from,
                    to,
                    cause,
                    to.wire_command() as char
                );
            }
            ControllerEvent::SnubCompleted(n) => {
                info!("SNUB  | completed={}", n);
            }
            ControllerEvent::Fault(e) => {
                error!("FAULT | {}", e);
            }
            ControllerEvent::Stopped(reason) => {
                info!("STOP  | reason={}", reason);
            }
        }
    }
}
