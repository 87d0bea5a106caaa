//! Shutdown coordination.
//!
//! Any component may ask the controller to stop: the Ctrl-C handler, a
//! transition task that hit a fault, or the snub counter once the target
//! is reached.  The first request wins and its reason is latched.
//!
//! ## Stop lifecycle
//!
//! 1. [`Shutdown::request`] latches a [`StopReason`].
//! 2. The poller sees it at its next tick boundary, writes the final
//!    CoolDown command and calls [`Shutdown::halt`].
//! 3. The decision loop wakes on [`Shutdown::wait_halted`] and returns.
//!
//! The reason is stored as a `u8` in an atomic so it can be read from the
//! signal handler thread without locking.

use core::sync::atomic::{AtomicU8, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::{info, warn};

/// Sentinel for "no stop requested".
const RUNNING: u8 = 0;

/// Why the controller stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StopReason {
    /// Programmatic stop.
    Requested = 1,
    /// OS interrupt (Ctrl-C).
    Interrupt = 2,
    /// A serial write or a transition failed.
    Fault = 3,
    /// The configured number of snubs was completed.
    Completed = 4,
}

impl StopReason {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Requested),
            2 => Some(Self::Interrupt),
            3 => Some(Self::Fault),
            4 => Some(Self::Completed),
            _ => None,
        }
    }

    /// True if the run ended abnormally.
    pub fn is_failure(self) -> bool {
        self == Self::Fault
    }
}

impl core::fmt::Display for StopReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Self::Requested => "requested",
            Self::Interrupt => "interrupted",
            Self::Fault => "fault",
            Self::Completed => "snub target reached",
        };
        f.write_str(s)
    }
}

/// Stop request latch plus the poller's halt notification.
pub struct Shutdown {
    requested: AtomicU8,
    halted: Signal<CriticalSectionRawMutex, StopReason>,
}

impl Shutdown {
    pub const fn new() -> Self {
        Self {
            requested: AtomicU8::new(RUNNING),
            halted: Signal::new(),
        }
    }

    /// Ask the controller to stop.  Returns `false` if another reason was
    /// already latched, in which case that reason is kept.
    pub fn request(&self, reason: StopReason) -> bool {
        match self.requested.compare_exchange(
            RUNNING,
            reason as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                info!("Shutdown requested: {}", reason);
                true
            }
            Err(prev) => {
                if let Some(prev) = StopReason::from_u8(prev) {
                    if prev != reason {
                        warn!("Shutdown already pending ({}), ignoring {}", prev, reason);
                    }
                }
                false
            }
        }
    }

    /// The latched stop reason, if any.
    pub fn pending(&self) -> Option<StopReason> {
        StopReason::from_u8(self.requested.load(Ordering::Acquire))
    }

    /// Announce that the poller has stopped.
    pub fn halt(&self, reason: StopReason) {
        self.halted.signal(reason);
    }

    pub fn is_halted(&self) -> bool {
        self.halted.signaled()
    }

    /// Wait until the poller has stopped.
    pub async fn wait_halted(&self) -> StopReason {
        self.halted.wait().await
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
