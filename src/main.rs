//! UnBrake controller entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SerialPortChannel   LogEventSink   EnvConfig   ctrlc handler  │
//! │  (SerialChannel)     (EventSink)    (Config)    (Shutdown)     │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌──────────────────┐  streams  ┌───────────────────────────┐  │
//! │  │ Poller (thread)  │─────────▶│ Controller (LocalExecutor) │  │
//! │  └────────┬─────────┘           └─────────────┬─────────────┘  │
//! │           │          SerialLink               │                │
//! │           └──────────────┬────────────────────┘                │
//! │                          ▼                                     │
//! │                    StateRegister                               │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::fs::OpenOptions;
use std::path::Path;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use log::{error, info};
use tracing_subscriber::EnvFilter;

use unbrake::adapters::env_config::EnvConfig;
use unbrake::adapters::log_sink::LogEventSink;
use unbrake::adapters::serial::SerialPortChannel;
use unbrake::app::ports::ConfigPort;
use unbrake::app::service::Controller;
use unbrake::app::tasks::Actuation;
use unbrake::channels::TelemetryStreams;
use unbrake::config::ControllerConfig;
use unbrake::fsm::State;
use unbrake::fsm::register::StateRegister;
use unbrake::link::SerialLink;
use unbrake::polling::Poller;
use unbrake::safety::{Shutdown, StopReason};
use unbrake::scheduler::Supervisor;

// ── Logging ───────────────────────────────────────────────────

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            builder
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    }
    .map_err(|e| anyhow!(e))
}

fn log_parameters(config: &ControllerConfig) {
    info!("╔══════════════════════════════════════╗");
    info!("║  UnBrake v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");
    info!("Device: {}", config.device_path);
    info!("Baud rate: {}", config.baud_rate);
    info!("Buffer size: {} bytes", config.buffer_size);
    info!("Reading delay: {:?}", config.poll_period());
    info!(
        "Limits: speed >= {} / < {}, temperature > {}",
        config.upper_speed_limit, config.inferior_speed_limit, config.temperature_limit
    );
    match config.snub_target {
        Some(n) => info!("Snub target: {}", n),
        None => info!("Snub target: none (run until stopped)"),
    }
}

// ── Main ──────────────────────────────────────────────────────

fn run() -> Result<StopReason> {
    let config = EnvConfig::from_env()
        .load()
        .context("loading configuration")?;
    init_logging(config.log_file.as_deref())?;
    log_parameters(&config);

    let channel =
        SerialPortChannel::open(&config.device_path, config.baud_rate, config.read_timeout())
            .context("opening serial device")?;
    let link = SerialLink::new(channel);
    let streams = Arc::new(TelemetryStreams::new());
    let shutdown = Arc::new(Shutdown::new());

    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            shutdown.request(StopReason::Interrupt);
        })
        .context("installing Ctrl-C handler")?;
    }

    let register = StateRegister::new(State::Accelerate);
    let sink = LogEventSink::new();

    let poller = Poller::new(
        link.clone(),
        Arc::clone(&streams),
        Arc::clone(&shutdown),
        &config,
    )
    .spawn()
    .context("spawning telemetry poller")?;

    let supervisor = Supervisor::new();
    let controller = Controller::new(
        &supervisor,
        Actuation {
            register: &register,
            link: &link,
            sink: &sink,
            shutdown: &shutdown,
            timing: config.timing(),
            snub_target: config.snub_target,
        },
        config.thresholds(),
    );
    let reason = supervisor.block_on(controller.run(&streams));

    drop(controller);
    supervisor.abandon();
    // The poller already wrote the final CoolDown.
    register
        .force(State::CoolDown, |_| Ok(()))
        .context("recording final CoolDown")?;

    match poller.join() {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => error!("Poller stopped with error: {}", e),
        Err(_) => error!("Poller thread panicked"),
    }

    info!(
        "Application finished! ({} snubs completed)",
        register.snapshot().completed_snubs
    );
    Ok(reason)
}

fn main() -> ExitCode {
    match run() {
        Ok(reason) if !reason.is_failure() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            // Logging may not be up yet.
            eprintln!("unbrake: {:#}", e);
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
