//! Delayed transition tasks.
//!
//! Each task is a plain `async fn` spawned by the decision loop onto the
//! [`Supervisor`](crate::scheduler::Supervisor).  Tasks sleep with
//! `async_io_mini::Timer`, then move the register through
//! [`Actuation`], which writes the command and emits the event.
//!
//! A failed transition never panics a task: it goes through
//! [`Actuation::fail_safe`], which forces a CoolDown and requests a
//! `Fault` shutdown.

use async_io_mini::Timer;
use log::{debug, error, info};

use crate::app::events::{Cause, ControllerEvent};
use crate::app::ports::{EventSink, SerialChannel};
use crate::config::Timing;
use crate::error::{Error, Result};
use crate::fsm::register::{FlagClaim, StateRegister, Transition};
use crate::fsm::{State, Table};
use crate::link::SerialLink;
use crate::safety::{Shutdown, StopReason};

/// Everything a transition task needs, borrowed from the caller.
pub struct Actuation<'a, C, S> {
    pub register: &'a StateRegister,
    pub link: &'a SerialLink<C>,
    pub sink: &'a S,
    pub shutdown: &'a Shutdown,
    pub timing: Timing,
    pub snub_target: Option<u32>,
}

impl<C, S> Clone for Actuation<'_, C, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, S> Copy for Actuation<'_, C, S> {}

impl<C: SerialChannel, S: EventSink> Actuation<'_, C, S> {
    /// Look the current state up in `table`, write the successor and
    /// report the change.
    pub fn apply(&self, table: Table, cause: Cause) -> Result<Transition> {
        let t = self.register.apply(table, |byte| {
            self.link.send_unless_stopping(byte, self.shutdown)
        })?;
        info!("Change state: {} ---> {}", t.from, t.to);
        self.sink.emit(&ControllerEvent::StateChanged {
            from: t.from,
            to: t.to,
            cause,
        });
        if let Some(n) = t.snub {
            self.snub_completed(n);
        }
        Ok(t)
    }

    /// Like [`apply`](Self::apply), but a failure takes the fail-safe path.
    /// Nothing is written once a stop is pending; the poller owns the
    /// final CoolDown command.
    pub fn apply_or_fail_safe(&self, table: Table, cause: Cause) -> bool {
        match self.apply(table, cause) {
            Ok(_) => true,
            Err(Error::StopPending(reason)) => {
                debug!("Skipping {} transition, stop pending ({})", table.name(), reason);
                false
            }
            Err(e) => {
                self.fail_safe(e);
                false
            }
        }
    }

    /// Report `err`, attempt an immediate CoolDown and request a `Fault`
    /// shutdown.
    pub fn fail_safe(&self, err: Error) {
        error!("Transition failed: {}", err);
        self.sink.emit(&ControllerEvent::Fault(err));
        match self
            .register
            .force(State::CoolDown, |byte| Ok(self.link.send(byte)?))
        {
            Ok(t) if t.from != t.to => {
                info!("Change state: {} ---> {}", t.from, t.to);
                self.sink.emit(&ControllerEvent::StateChanged {
                    from: t.from,
                    to: t.to,
                    cause: Cause::FailSafe,
                });
            }
            Ok(_) => {}
            Err(e) => error!("Fail-safe CoolDown failed: {}", e),
        }
        self.shutdown.request(StopReason::Fault);
    }

    fn snub_completed(&self, n: u32) {
        match self.snub_target {
            Some(target) => info!("Snub {}/{} completed", n, target),
            None => info!("Snub {} completed", n),
        }
        self.sink.emit(&ControllerEvent::SnubCompleted(n));
        if self.snub_target.is_some_and(|target| n >= target) {
            self.shutdown.request(StopReason::Completed);
        }
    }
}

/// Hold speed for the settle delay, then start braking.
/// The `stabilizing` claim is released when the task ends.
pub async fn stabilize_then_advance<C, S>(act: Actuation<'_, C, S>, claim: FlagClaim<'_>)
where
    C: SerialChannel,
    S: EventSink,
{
    Timer::after(act.timing.settle).await;
    act.apply_or_fail_safe(Table::Next, Cause::Stabilized);
    drop(claim);
}

/// Stop braking now, then accelerate again after the cool-down delay.
pub async fn brake_cooldown<C, S>(act: Actuation<'_, C, S>)
where
    C: SerialChannel,
    S: EventSink,
{
    if !act.apply_or_fail_safe(Table::Next, Cause::Braked) {
        return;
    }
    Timer::after(act.timing.cooldown).await;
    act.apply_or_fail_safe(Table::Next, Cause::CooledDown);
}

/// Throw water for the soak duration.
/// The `throwing_water` claim is released when the task ends.
pub async fn water_cycle<C, S>(act: Actuation<'_, C, S>, claim: FlagClaim<'_>)
where
    C: SerialChannel,
    S: EventSink,
{
    if act.apply_or_fail_safe(Table::WaterOn, Cause::WaterOn) {
        Timer::after(act.timing.soak).await;
        act.apply_or_fail_safe(Table::WaterOff, Cause::WaterOff);
    }
    drop(claim);
}
