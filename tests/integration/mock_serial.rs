//! Mock serial device and event sink for integration tests.
//!
//! Records every byte the controller writes so tests can assert on the
//! full command history without a bench attached.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use unbrake::app::events::ControllerEvent;
use unbrake::app::ports::{EventSink, SerialChannel};
use unbrake::app::service::Controller;
use unbrake::app::tasks::Actuation;
use unbrake::channels::TelemetryStreams;
use unbrake::config::{Thresholds, Timing};
use unbrake::fsm::register::StateRegister;
use unbrake::fsm::{State, TELEMETRY_REQUEST};
use unbrake::link::SerialLink;
use unbrake::safety::Shutdown;
use unbrake::scheduler::Supervisor;

// ── MockDevice ────────────────────────────────────────────────

#[derive(Default)]
pub struct MockDevice {
    /// Every byte accepted by `write`, in order.
    pub writes: Vec<u8>,
    /// Scripted read results, consumed front to back.
    pub replies: VecDeque<io::Result<Vec<u8>>>,
    /// Returned by `read` once `replies` is empty (`None` = time out).
    pub idle_reply: Option<Vec<u8>>,
    /// Number of upcoming writes to reject with `BrokenPipe`.
    pub failing_writes: usize,
}

#[allow(dead_code)]
impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, line: &str) -> Self {
        self.replies.push_back(Ok(line.as_bytes().to_vec()));
        self
    }

    pub fn reply_err(mut self, kind: io::ErrorKind) -> Self {
        self.replies.push_back(Err(io::Error::new(kind, "mock")));
        self
    }

    pub fn idle(mut self, line: &str) -> Self {
        self.idle_reply = Some(line.as_bytes().to_vec());
        self
    }
}

impl SerialChannel for MockDevice {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock unplugged"));
        }
        self.writes.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let data = match self.replies.pop_front() {
            Some(reply) => reply?,
            None => match &self.idle_reply {
                Some(line) => line.clone(),
                None => return Err(io::Error::new(io::ErrorKind::TimedOut, "mock idle")),
            },
        };
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        Ok(n)
    }
}

/// Build one eleven-field telemetry line.
pub fn line(speed: i32, temp_a: i32, temp_b: i32) -> String {
    format!("0,{},{},0,0,0,{},0,0,0,0", temp_a, temp_b, speed)
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: RefCell<Vec<ControllerEvent>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn events(&self) -> Vec<ControllerEvent> {
        self.events.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&ControllerEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &ControllerEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// Delays short enough for tests, long enough to observe mid-task state.
pub fn fast_timing() -> Timing {
    Timing {
        settle: Duration::from_millis(30),
        cooldown: Duration::from_millis(30),
        soak: Duration::from_millis(30),
    }
}

/// Everything a controller needs, owned in one place.
pub struct Rig {
    pub register: StateRegister,
    pub link: SerialLink<MockDevice>,
    pub sink: RecordingSink,
    pub shutdown: Arc<Shutdown>,
    pub streams: Arc<TelemetryStreams>,
}

#[allow(dead_code)]
impl Rig {
    pub fn new(initial: State) -> Self {
        Self::with_device(initial, MockDevice::new())
    }

    pub fn with_device(initial: State, device: MockDevice) -> Self {
        Self {
            register: StateRegister::new(initial),
            link: SerialLink::new(device),
            sink: RecordingSink::default(),
            shutdown: Arc::new(Shutdown::new()),
            streams: Arc::new(TelemetryStreams::new()),
        }
    }

    pub fn actuation(
        &self,
        timing: Timing,
        snub_target: Option<u32>,
    ) -> Actuation<'_, MockDevice, RecordingSink> {
        Actuation {
            register: &self.register,
            link: &self.link,
            sink: &self.sink,
            shutdown: &self.shutdown,
            timing,
            snub_target,
        }
    }

    pub fn controller<'s, 'a>(
        &'a self,
        supervisor: &'s Supervisor<'a>,
        timing: Timing,
        snub_target: Option<u32>,
    ) -> Controller<'s, 'a, MockDevice, RecordingSink> {
        Controller::new(
            supervisor,
            self.actuation(timing, snub_target),
            Thresholds::default(),
        )
    }

    /// Raw bytes written to the device, telemetry requests included.
    pub fn writes(&self) -> Vec<u8> {
        self.link.with(|dev| dev.writes.clone())
    }

    /// State commands written to the device (telemetry requests removed).
    pub fn commands(&self) -> Vec<u8> {
        self.writes()
            .into_iter()
            .filter(|&b| b != TELEMETRY_REQUEST)
            .collect()
    }

    pub fn fail_next_writes(&self, n: usize) {
        self.link.with(|dev| dev.failing_writes = n);
    }
}
