//! chiller-sim: the full control loop against the host simulation plant.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SimPlant             LogEventSink   SettingsStore  WriterTransport
//! │  (Sensor+Actuator)    (EventSink)    (SettingsPort) (Transport)│
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            ChillerService (pure logic)                 │    │
//! │  │  Sensors · Faults · Cooling state machine              │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  TelemetryPublisher: one framed snapshot per cycle             │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Telemetry frames go to stdout (or `--out FILE`); logs go to stderr.
//! Pipe the frames into `telemetry-dump` to read them.
//!
//! ```text
//! chiller-sim [--cycles N] [--revision a|b] [--setpoint C] [--out FILE]
//!             [--inject FAULT@CYCLE]... [--clear-at CYCLE] [--realtime]
//! ```
//!
//! FAULT is one of `reservoir-probe`, `outside-probe`, `environment`,
//! `level`, `top-fan`, `bottom-fan`, `no-flow`.
#![deny(unused_must_use)]

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use log::{info, warn};

use chiller::adapters::log_sink::LogEventSink;
use chiller::adapters::sim::{SimFaults, SimPlant};
use chiller::adapters::storage::{MemoryStorage, SettingsStore};
use chiller::adapters::time::MonotonicClock;
use chiller::app::commands::AppCommand;
use chiller::app::ports::SettingsPort;
use chiller::app::service::ChillerService;
use chiller::board::{BoardProfile, BoardRevision};
use chiller::config::RuntimeConfig;
use chiller::link::transport::WriterTransport;
use chiller::sensors::tach::{BOTTOM_FAN_TACH, TOP_FAN_TACH};
use chiller::telemetry::TelemetryPublisher;

// ── Command line ──────────────────────────────────────────────

/// Faults the simulation plant can be told to develop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InjectedFault {
    ReservoirProbe,
    OutsideProbe,
    Environment,
    Level,
    TopFan,
    BottomFan,
    NoFlow,
}

impl InjectedFault {
    fn apply(self, faults: &mut SimFaults) {
        match self {
            Self::ReservoirProbe => faults.reservoir_probe_disconnected = true,
            Self::OutsideProbe => faults.outside_probe_disconnected = true,
            Self::Environment => faults.environment_failed = true,
            Self::Level => faults.level_failed = true,
            Self::TopFan => faults.top_fan_stalled = true,
            Self::BottomFan => faults.bottom_fan_stalled = true,
            Self::NoFlow => faults.no_flow = true,
        }
    }
}

/// `FAULT@CYCLE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Injection {
    cycle: u64,
    fault: InjectedFault,
}

fn parse_injection(s: &str) -> Result<Injection, String> {
    let (name, cycle) = s
        .split_once('@')
        .ok_or_else(|| format!("expected FAULT@CYCLE, got '{s}'"))?;
    let fault = InjectedFault::from_str(name, true)?;
    let cycle = cycle.parse().map_err(|e| format!("cycle '{cycle}': {e}"))?;
    Ok(Injection { cycle, fault })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Revision {
    /// Prototype board (time-of-flight level sensor)
    A,
    /// Production board (eTape level sensor)
    B,
}

impl From<Revision> for BoardRevision {
    fn from(r: Revision) -> Self {
        match r {
            Revision::A => Self::RevA,
            Revision::B => Self::RevB,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "chiller-sim")]
#[command(about = "Run the chiller control loop against a simulated plant")]
#[command(version)]
struct Options {
    /// Control cycles to run
    #[arg(long, default_value_t = 600)]
    cycles: u64,

    /// Board revision
    #[arg(long, value_enum, ignore_case = true, default_value_t = Revision::B)]
    revision: Revision,

    /// Initial reservoir setpoint (°C)
    #[arg(long)]
    setpoint: Option<f32>,

    /// Telemetry output file (default: stdout)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Inject a plant fault at a cycle, e.g. `top-fan@120`
    #[arg(long, value_name = "FAULT@CYCLE", value_parser = parse_injection)]
    inject: Vec<Injection>,

    /// Clear injected faults and the latched alarm at this cycle
    #[arg(long, value_name = "CYCLE")]
    clear_at: Option<u64>,

    /// Pace cycles in wall-clock time
    #[arg(long)]
    realtime: bool,
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opts = Options::parse();

    info!("chiller-sim v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Board + settings ───────────────────────────────────
    let profile = BoardProfile::for_revision(opts.revision.into());
    info!("Board: {:?} ({:?} level sensing)", profile.revision, profile.level_sensing);

    let mut store = SettingsStore::new(MemoryStorage::new());
    let settings = store.load().map_err(|e| anyhow!("settings load failed: {e}"))?;
    let runtime = RuntimeConfig {
        initial_setpoint: opts.setpoint.unwrap_or(RuntimeConfig::default().initial_setpoint),
        ..RuntimeConfig::default()
    };

    // ── 2. Adapters ───────────────────────────────────────────
    let mut plant = SimPlant::new(profile, &TOP_FAN_TACH, &BOTTOM_FAN_TACH);
    if let Err(e) = plant.set_pump(true) {
        warn!("pump relay: {e}");
    }
    let mut sink = LogEventSink::new();

    let writer: Box<dyn Write> = match &opts.out {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut link = WriterTransport::new(BufWriter::new(writer));
    let mut publisher = TelemetryPublisher::new();

    // ── 3. Service ────────────────────────────────────────────
    let mut app = ChillerService::new(profile, settings, runtime, &TOP_FAN_TACH, &BOTTOM_FAN_TACH);
    let now = plant.now_ms();
    app.start(&mut plant, &mut sink, now);

    info!("Running {} cycles of {} ms", opts.cycles, runtime.cycle_interval_ms);

    // ── 4. Control loop ───────────────────────────────────────
    let clock = MonotonicClock::new();
    for cycle in 1..=opts.cycles {
        let cycle_start = clock.now_ms();

        for injection in opts.inject.iter().filter(|i| i.cycle == cycle) {
            info!("Injecting {:?} at cycle {cycle}", injection.fault);
            injection.fault.apply(&mut plant.faults);
        }
        if opts.clear_at == Some(cycle) {
            plant.faults = SimFaults::default();
            app.handle_command(AppCommand::ClearFault, &mut plant, &mut sink)?;
        }

        plant.advance(runtime.cycle_interval_ms);
        let now = plant.now_ms();
        let readings = app.tick(&mut plant, &mut sink, now);

        // Delivery is best effort; the publisher already logged the drop.
        let _ = publisher.publish(&readings, &mut link);

        if opts.realtime {
            let spent = clock.now_ms().wrapping_sub(cycle_start);
            let remaining = runtime.cycle_interval_ms.saturating_sub(spent);
            std::thread::sleep(Duration::from_millis(u64::from(remaining)));
        }
    }

    let readings = app.readings();
    info!(
        "Done: {} cycles, state={}, T={:.2}\u{00b0}C, fault code {}, frames sent={} dropped={}",
        app.tick_count(),
        app.state(),
        readings.reservoir.temperature,
        readings.error.code,
        publisher.sent(),
        publisher.dropped()
    );
    Ok(())
}
