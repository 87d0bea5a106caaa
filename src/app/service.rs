//! Decision loop, the hexagonal core.
//!
//! [`Controller`] consumes the two telemetry streams and decides which
//! delayed transition to launch.  The rules themselves are pure functions
//! over a register [`Snapshot`], so they are testable without an executor.
//!
//! ```text
//!  halted ─────┐
//!  speed ──────┼─▶ ┌────────────────────────┐ ──spawn──▶ transition tasks
//!  temperature ┘   │      Controller        │ ──emit───▶ EventSink
//!                  └────────────────────────┘
//! ```
//!
//! Sources are served in priority order: a halted poller first, then
//! speed, then temperature.  The loop never awaits a transition task.

use futures_lite::future;
use log::{debug, info};

use crate::channels::TelemetryStreams;
use crate::config::Thresholds;
use crate::fsm::register::{Flag, Snapshot};
use crate::safety::StopReason;
use crate::scheduler::Supervisor;
use crate::sensors::TemperaturePair;

use super::events::ControllerEvent;
use super::ports::{EventSink, SerialChannel};
use super::tasks::{self, Actuation};

// ───────────────────────────────────────────────────────────────
// Decision rules
// ───────────────────────────────────────────────────────────────

/// A delayed transition chosen by the decision rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Accelerating and at speed: brake after the settle delay.
    Stabilize,
    /// Braking and slowed down: cool down, then accelerate again.
    BrakeCooldown,
    /// A sensor is too hot: throw water for the soak duration.
    WaterCycle,
}

/// Speed rule.
pub fn speed_trigger(snap: &Snapshot, speed: i32, limits: &Thresholds) -> Option<Trigger> {
    if snap.state.is_accelerating() && !snap.stabilizing && speed >= limits.upper_speed {
        Some(Trigger::Stabilize)
    } else if snap.state.is_braking() && speed < limits.inferior_speed {
        Some(Trigger::BrakeCooldown)
    } else {
        None
    }
}

/// Temperature rule.
pub fn temperature_trigger(
    snap: &Snapshot,
    temperatures: TemperaturePair,
    limits: &Thresholds,
) -> Option<Trigger> {
    (temperatures.exceeds(limits.temperature) && !snap.throwing_water && snap.state.is_dry_cycle())
        .then_some(Trigger::WaterCycle)
}

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

enum Wake {
    Halted(StopReason),
    Speed(i32),
    Temperature(TemperaturePair),
}

/// The decision loop.
pub struct Controller<'s, 'a, C, S> {
    supervisor: &'s Supervisor<'a>,
    actuation: Actuation<'a, C, S>,
    thresholds: Thresholds,
}

impl<'s, 'a, C, S> Controller<'s, 'a, C, S>
where
    C: SerialChannel + 'a,
    S: EventSink + 'a,
{
    pub fn new(
        supervisor: &'s Supervisor<'a>,
        actuation: Actuation<'a, C, S>,
        thresholds: Thresholds,
    ) -> Self {
        Self {
            supervisor,
            actuation,
            thresholds,
        }
    }

    /// Apply the speed rule to one sample, launching the chosen task.
    pub fn on_speed(&self, speed: i32) -> Option<Trigger> {
        let snap = self.actuation.register.snapshot();
        let trigger = speed_trigger(&snap, speed, &self.thresholds)?;
        self.launch(trigger)
    }

    /// Apply the temperature rule to one sample, launching the chosen task.
    pub fn on_temperature(&self, temperatures: TemperaturePair) -> Option<Trigger> {
        let snap = self.actuation.register.snapshot();
        let trigger = temperature_trigger(&snap, temperatures, &self.thresholds)?;
        self.launch(trigger)
    }

    /// Claim the trigger's flag and spawn its task.  Returns `None` if the
    /// flag was taken between the snapshot and the claim.
    fn launch(&self, trigger: Trigger) -> Option<Trigger> {
        let act = self.actuation;
        match trigger {
            Trigger::Stabilize => {
                let claim = act.register.claim(Flag::Stabilizing)?;
                info!("Speed stabilizing, braking in {:?}", act.timing.settle);
                self.supervisor
                    .spawn(tasks::stabilize_then_advance(act, claim));
            }
            Trigger::BrakeCooldown => {
                info!("Speed dropped, cooling down for {:?}", act.timing.cooldown);
                self.supervisor.spawn(tasks::brake_cooldown(act));
            }
            Trigger::WaterCycle => {
                let claim = act.register.claim(Flag::ThrowingWater)?;
                info!("Temperature over limit, throwing water for {:?}", act.timing.soak);
                self.supervisor.spawn(tasks::water_cycle(act, claim));
            }
        }
        Some(trigger)
    }

    /// Serve the telemetry streams until the poller halts.
    pub async fn run(&self, streams: &TelemetryStreams) -> StopReason {
        let register = self.actuation.register;
        let shutdown = self.actuation.shutdown;
        let sink = self.actuation.sink;

        sink.emit(&ControllerEvent::Started(register.read()));

        let reason = loop {
            let wake = future::or(
                async { Wake::Halted(shutdown.wait_halted().await) },
                future::or(
                    async { Wake::Speed(streams.speed.receive().await) },
                    async { Wake::Temperature(streams.temperature.receive().await) },
                ),
            )
            .await;

            let launched = match wake {
                Wake::Halted(reason) => break reason,
                Wake::Speed(speed) => {
                    debug!("Speed: {}", speed);
                    self.on_speed(speed)
                }
                Wake::Temperature(t) => {
                    debug!("Temperatures: {}, {}", t.0, t.1);
                    self.on_temperature(t)
                }
            };

            // Let a new task take its first step before the next sample.
            if launched.is_some() {
                future::yield_now().await;
            }
        };

        info!("Decision loop stopped: {}", reason);
        sink.emit(&ControllerEvent::Stopped(reason));
        reason
    }
}
