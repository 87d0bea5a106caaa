//! Shared serial link.
//!
//! One [`SerialChannel`] is shared by the polling thread (telemetry
//! request/response) and the transition tasks (command bytes).  Every
//! access goes through a single mutex, so a telemetry exchange is never
//! interleaved with a command write and two command writes never overlap.
//!
//! ```text
//!   poller thread ──exchange("\"", buf)──┐
//!                                        ├──▶ Mutex<C> ──▶ device
//!   transition task ──send(state byte)───┘
//! ```
//!
//! Transition tasks write through [`SerialLink::send_unless_stopping`],
//! which checks the stop latch with the lock held.  The poller checks the
//! same latch before it takes the lock for its final CoolDown, so a task
//! command either lands before that CoolDown or is withheld.
//!
//! A telemetry exchange holds the lock across a blocking read of up to
//! `read_timeout_ms`.  A task write arriving meanwhile blocks the executor
//! thread, and with it the decision loop and every pending timer, until
//! the read returns.  Keep `read_timeout_ms` small against the
//! settle/cool-down/soak delays when tuning the bench.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::trace;

use crate::app::ports::SerialChannel;
use crate::error::{Error, SerialError};
use crate::fsm::State;
use crate::safety::Shutdown;

/// Cloneable handle to the exclusive serial channel.
pub struct SerialLink<C> {
    inner: Arc<Mutex<C>>,
}

impl<C> Clone for SerialLink<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: SerialChannel> SerialLink<C> {
    pub fn new(channel: C) -> Self {
        Self {
            inner: Arc::new(Mutex::new(channel)),
        }
    }

    /// Write exactly one command byte.
    pub fn send(&self, byte: u8) -> Result<(), SerialError> {
        let mut chan = self.lock();
        write_one(&mut *chan, byte)
    }

    /// Write one command byte unless a stop is pending.  The latch is read
    /// under the link lock; a pending stop yields [`Error::StopPending`]
    /// and nothing is written.
    pub fn send_unless_stopping(&self, byte: u8, shutdown: &Shutdown) -> Result<(), Error> {
        let mut chan = self.lock();
        if let Some(reason) = shutdown.pending() {
            return Err(Error::StopPending(reason));
        }
        Ok(write_one(&mut *chan, byte)?)
    }

    /// Write the command byte that selects `state`.
    pub fn send_state(&self, state: State) -> Result<(), SerialError> {
        self.send(state.wire_command())
    }

    /// Write `request` and read the response into `buf`, holding the link
    /// for the whole round trip.
    pub fn exchange(&self, request: u8, buf: &mut [u8]) -> Result<usize, SerialError> {
        let mut chan = self.lock();
        write_one(&mut *chan, request)?;
        let n = chan.read(buf).map_err(|e| SerialError::from_read(&e))?;
        trace!("Link: {} bytes of telemetry", n);
        Ok(n)
    }

    /// Run `f` with exclusive access to the underlying channel.
    pub fn with<R>(&self, f: impl FnOnce(&mut C) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, C> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn write_one<C: SerialChannel + ?Sized>(chan: &mut C, byte: u8) -> Result<(), SerialError> {
    match chan.write(&[byte]) {
        Ok(1) => Ok(()),
        Ok(written) => Err(SerialError::ShortWrite {
            expected: 1,
            written,
        }),
        Err(e) => Err(SerialError::Write(e.kind())),
    }
}
