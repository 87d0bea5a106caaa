//! Decision loop and transition task scenarios against a mock device.

use std::io;
use std::time::Duration;

use async_io_mini::Timer;
use futures_lite::future;

use unbrake::app::events::{Cause, ControllerEvent};
use unbrake::app::service::Trigger;
use unbrake::config::Timing;
use unbrake::error::{Error, SerialError};
use unbrake::fsm::State;
use unbrake::safety::StopReason;
use unbrake::scheduler::Supervisor;
use unbrake::sensors::TemperaturePair;

use crate::mock_serial::{Rig, fast_timing};

fn slow(field: &str) -> Timing {
    let long = Duration::from_millis(300);
    let mut t = fast_timing();
    match field {
        "settle" => t.settle = long,
        "cooldown" => t.cooldown = long,
        "soak" => t.soak = long,
        _ => unreachable!(),
    }
    t
}

// ── Speed rule ────────────────────────────────────────────────

#[test]
fn accelerate_at_speed_brakes_once_after_settle() {
    let rig = Rig::new(State::Accelerate);
    let sup = Supervisor::new();
    let ctl = rig.controller(&sup, slow("settle"), None);

    sup.block_on(async {
        assert_eq!(ctl.on_speed(150), Some(Trigger::Stabilize));
        assert!(rig.register.snapshot().stabilizing);

        // Still accelerating during the settle delay.
        Timer::after(Duration::from_millis(50)).await;
        assert_eq!(rig.register.read(), State::Accelerate);
        assert!(rig.commands().is_empty());

        sup.join_all().await;
    });

    assert_eq!(rig.register.read(), State::Brake);
    assert_eq!(rig.commands(), vec![b'&']);
    assert!(!rig.register.snapshot().stabilizing);
}

#[test]
fn repeated_samples_while_stabilizing_launch_nothing() {
    let rig = Rig::new(State::Accelerate);
    let sup = Supervisor::new();
    let ctl = rig.controller(&sup, fast_timing(), None);

    sup.block_on(async {
        assert_eq!(ctl.on_speed(150), Some(Trigger::Stabilize));
        for speed in [151, 160, 200] {
            assert_eq!(ctl.on_speed(speed), None);
        }
        assert_eq!(sup.in_flight(), 1);
        sup.join_all().await;
    });

    assert_eq!(rig.commands(), vec![b'&']);
}

#[test]
fn below_upper_limit_does_nothing() {
    let rig = Rig::new(State::Accelerate);
    let sup = Supervisor::new();
    let ctl = rig.controller(&sup, fast_timing(), None);

    assert_eq!(ctl.on_speed(149), None);
    assert_eq!(sup.in_flight(), 0);
    assert!(rig.commands().is_empty());
}

#[test]
fn brake_below_limit_cools_down_then_accelerates() {
    let rig = Rig::new(State::Brake);
    let sup = Supervisor::new();
    let ctl = rig.controller(&sup, slow("cooldown"), None);

    sup.block_on(async {
        assert_eq!(ctl.on_speed(100), Some(Trigger::BrakeCooldown));

        Timer::after(Duration::from_millis(50)).await;
        assert_eq!(rig.register.read(), State::CoolDown);
        assert_eq!(rig.commands(), vec![b'$']);

        sup.join_all().await;
    });

    assert_eq!(rig.register.read(), State::Accelerate);
    assert_eq!(rig.commands(), b"$%".to_vec());

    let snap = rig.register.snapshot();
    assert_eq!(snap.completed_snubs, 1);
    assert_eq!(
        rig.sink.count(|e| matches!(e, ControllerEvent::SnubCompleted(1))),
        1
    );
    assert_eq!(rig.shutdown.pending(), None);
}

#[test]
fn brake_water_keeps_water_through_cooldown() {
    let rig = Rig::new(State::BrakeWater);
    let sup = Supervisor::new();
    let ctl = rig.controller(&sup, fast_timing(), None);

    sup.block_on(async {
        ctl.on_speed(0);
        sup.join_all().await;
    });

    assert_eq!(rig.register.read(), State::AccelerateWater);
    assert_eq!(rig.commands(), b"()".to_vec());
}

#[test]
fn overlapping_brake_triggers_stay_consistent() {
    let rig = Rig::new(State::Brake);
    let sup = Supervisor::new();
    let ctl = rig.controller(&sup, fast_timing(), None);

    sup.block_on(async {
        // Nothing runs until the loop yields, so both samples see Brake.
        assert_eq!(ctl.on_speed(100), Some(Trigger::BrakeCooldown));
        assert_eq!(ctl.on_speed(90), Some(Trigger::BrakeCooldown));
        sup.join_all().await;
    });

    let final_state = rig.register.read();
    let commands = rig.commands();
    assert_eq!(commands.len(), 4);
    assert_eq!(commands.last(), Some(&final_state.wire_command()));
    assert!(State::ALL.contains(&final_state));
    assert!(!final_state.is_water());

    // Every command is the next-table successor of the one before it.
    let mut prev = State::Brake;
    for &byte in &commands {
        let state = State::from_wire(byte).unwrap();
        assert_eq!(prev.next(), Some(state));
        prev = state;
    }
}

// ── Temperature rule ──────────────────────────────────────────

#[test]
fn hot_cooldown_throws_water_then_reverts() {
    let rig = Rig::new(State::CoolDown);
    let sup = Supervisor::new();
    let ctl = rig.controller(&sup, slow("soak"), None);

    assert!(!rig.register.snapshot().throwing_water);

    sup.block_on(async {
        assert_eq!(
            ctl.on_temperature(TemperaturePair(410, 200)),
            Some(Trigger::WaterCycle)
        );

        Timer::after(Duration::from_millis(50)).await;
        let snap = rig.register.snapshot();
        assert_eq!(snap.state, State::CoolDownWater);
        assert!(snap.throwing_water);

        // Still hot mid-soak: suppressed.
        assert_eq!(ctl.on_temperature(TemperaturePair(420, 420)), None);

        sup.join_all().await;
    });

    let snap = rig.register.snapshot();
    assert_eq!(snap.state, State::CoolDown);
    assert!(!snap.throwing_water);
    assert_eq!(rig.commands(), b"($".to_vec());
}

#[test]
fn water_states_are_not_retriggered() {
    for state in [State::CoolDownWater, State::AccelerateWater, State::BrakeWater] {
        let rig = Rig::new(state);
        let sup = Supervisor::new();
        let ctl = rig.controller(&sup, fast_timing(), None);
        assert_eq!(ctl.on_temperature(TemperaturePair(500, 500)), None);
        assert!(rig.commands().is_empty());
    }
}

#[test]
fn cool_sensors_do_nothing() {
    let rig = Rig::new(State::Brake);
    let sup = Supervisor::new();
    let ctl = rig.controller(&sup, fast_timing(), None);
    assert_eq!(ctl.on_temperature(TemperaturePair(400, 399)), None);
    assert!(!rig.register.snapshot().throwing_water);
}

// ── Failures and stop conditions ──────────────────────────────

#[test]
fn write_failure_forces_cooldown_and_requests_fault() {
    let rig = Rig::new(State::Accelerate);
    rig.fail_next_writes(1);
    let sup = Supervisor::new();
    let ctl = rig.controller(&sup, fast_timing(), None);

    sup.block_on(async {
        ctl.on_speed(150);
        sup.join_all().await;
    });

    // The Brake write was rejected; only the fail-safe CoolDown landed.
    assert_eq!(rig.commands(), vec![b'$']);
    assert_eq!(rig.register.read(), State::CoolDown);
    assert!(!rig.register.snapshot().stabilizing);
    assert_eq!(rig.shutdown.pending(), Some(StopReason::Fault));

    let events = rig.sink.events();
    assert!(events.contains(&ControllerEvent::Fault(Error::Serial(SerialError::Write(
        io::ErrorKind::BrokenPipe
    )))));
    assert!(events.contains(&ControllerEvent::StateChanged {
        from: State::Accelerate,
        to: State::CoolDown,
        cause: Cause::FailSafe,
    }));
}

#[test]
fn failed_write_does_not_commit_state() {
    let rig = Rig::new(State::Brake);
    rig.fail_next_writes(2);
    let sup = Supervisor::new();
    let ctl = rig.controller(&sup, fast_timing(), None);

    sup.block_on(async {
        ctl.on_speed(10);
        sup.join_all().await;
    });

    // Both the transition and the fail-safe write failed.
    assert!(rig.commands().is_empty());
    assert_eq!(rig.register.read(), State::Brake);
    assert_eq!(rig.shutdown.pending(), Some(StopReason::Fault));
}

#[test]
fn snub_target_requests_completion() {
    let rig = Rig::new(State::Brake);
    let sup = Supervisor::new();
    let ctl = rig.controller(&sup, fast_timing(), Some(1));

    sup.block_on(async {
        ctl.on_speed(100);
        sup.join_all().await;
    });

    assert_eq!(rig.shutdown.pending(), Some(StopReason::Completed));
    assert_eq!(rig.register.snapshot().completed_snubs, 1);
}

#[test]
fn pending_stop_skips_delayed_transition() {
    let rig = Rig::new(State::Accelerate);
    let sup = Supervisor::new();
    let ctl = rig.controller(&sup, fast_timing(), None);

    sup.block_on(async {
        ctl.on_speed(150);
        rig.shutdown.request(StopReason::Interrupt);
        sup.join_all().await;
    });

    assert!(rig.commands().is_empty());
    assert_eq!(rig.register.read(), State::Accelerate);
    assert!(!rig.register.snapshot().stabilizing);
}

// ── Decision loop ─────────────────────────────────────────────

#[test]
fn run_serves_streams_until_halted() {
    let rig = Rig::new(State::Accelerate);
    let sup = Supervisor::new();
    let ctl = rig.controller(&sup, fast_timing(), None);

    let reason = sup.block_on(async {
        let (reason, ()) = future::zip(ctl.run(&rig.streams), async {
            rig.streams.speed.send(150).await;
            rig.streams.temperature.send(TemperaturePair(20, 20)).await;
            Timer::after(Duration::from_millis(100)).await;
            rig.shutdown.halt(StopReason::Requested);
        })
        .await;
        sup.join_all().await;
        reason
    });

    assert_eq!(reason, StopReason::Requested);
    assert_eq!(rig.commands(), vec![b'&']);

    let events = rig.sink.events();
    assert_eq!(events.first(), Some(&ControllerEvent::Started(State::Accelerate)));
    assert_eq!(
        events.last(),
        Some(&ControllerEvent::Stopped(StopReason::Requested))
    );
}

#[test]
fn halt_takes_priority_over_pending_samples() {
    let rig = Rig::new(State::Accelerate);
    let sup = Supervisor::new();
    let ctl = rig.controller(&sup, fast_timing(), None);

    rig.streams.speed.try_send(500).unwrap();
    rig.streams
        .temperature
        .try_send(TemperaturePair(900, 900))
        .unwrap();
    rig.shutdown.halt(StopReason::Interrupt);

    let reason = sup.block_on(ctl.run(&rig.streams));

    assert_eq!(reason, StopReason::Interrupt);
    assert_eq!(sup.in_flight(), 0);
    let snap = rig.register.snapshot();
    assert!(!snap.stabilizing);
    assert!(!snap.throwing_water);
}
