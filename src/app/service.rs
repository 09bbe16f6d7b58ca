//! Application service: the hexagonal core.
//!
//! [`ChillerService`] owns the sensor hub, the fault monitor and the control
//! context.  It exposes a clean, hardware-agnostic API.  All I/O flows
//! through port traits injected at call sites, making the entire service
//! testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │        ChillerService         │
//! ActuatorPort ◀──│ Sensors · Faults · Thermal    │
//!                 └──────────────────────────────┘
//! ```

use log::{info, warn};

use crate::board::BoardProfile;
use crate::config::{RuntimeConfig, Settings};
use crate::control::{ControlContext, CoolingState, LockoutTimers, thermal};
use crate::error::{Error, FaultCode, Result};
use crate::readings::Readings;
use crate::safety::FaultMonitor;
use crate::sensors::SensorHub;
use crate::sensors::tach::TachChannel;

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{ActuatorPort, EventSink, SensorPort};

// ───────────────────────────────────────────────────────────────
// ChillerService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct ChillerService {
    ctx: ControlContext,
    sensors: SensorHub,
    monitor: FaultMonitor,
    settings: Settings,
    runtime: RuntimeConfig,
    tick_count: u64,
}

impl ChillerService {
    /// Construct the service.
    ///
    /// `settings` must already be validated (the settings store only hands
    /// out valid records).  Does **not** touch the outputs; call
    /// [`start`](Self::start) next.
    pub fn new(
        profile: &BoardProfile,
        settings: Settings,
        runtime: RuntimeConfig,
        top_fan: &'static TachChannel,
        bottom_fan: &'static TachChannel,
    ) -> Self {
        Self {
            ctx: ControlContext::new(&runtime, 0),
            sensors: SensorHub::new(profile, top_fan, bottom_fan),
            monitor: FaultMonitor::new(&runtime),
            settings,
            runtime,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive every output to its safe state and start the lockout timers
    /// at `now_ms`, so the compressor cannot start within
    /// `compressor_lockout` of power-up.
    pub fn start(
        &mut self,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
        now_ms: u32,
    ) {
        self.ctx.timers = LockoutTimers::starting_at(now_ms);
        self.apply_outputs(hw);
        self.read_back(hw);
        self.ctx.refresh_elapsed(now_ms);
        let state = self.ctx.state();
        sink.emit(&AppEvent::Started(state));
        info!(
            "ChillerService started in {state} (SP={:.1} running={})",
            self.ctx.readings.reservoir.setpoint, self.ctx.running
        );
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one full control cycle:
    /// sensors → faults → state machine → actuators → read-back.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`]; this avoids a double mutable borrow while keeping
    /// the port boundary explicit.  Returns the end-of-cycle snapshot.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
        now_ms: u32,
    ) -> Readings {
        self.tick_count += 1;

        // 1. Ground truth of the relays (the pump is switched elsewhere)
        self.read_back(hw);

        // 2. Sensors via SensorPort
        let status =
            self.sensors
                .refresh(hw, &self.settings, &self.runtime, &mut self.ctx.readings);
        self.ctx.refresh_elapsed(now_ms);

        // 3. Fault evaluation
        let before = self.ctx.readings.error;
        let latched = self.monitor.evaluate(&mut self.ctx.readings, &status, &self.settings);
        if let Some(fault) = latched {
            if self.ctx.readings.error != before {
                sink.emit(&AppEvent::FaultLatched(fault));
            }
        }

        // 4. Cooling state machine
        if let Some(t) = thermal::step(&mut self.ctx, &self.settings, now_ms) {
            sink.emit(&AppEvent::StateChanged { from: t.from, to: t.to });
        }

        // 5. Apply outputs via ActuatorPort, then observe what happened
        self.apply_outputs(hw);
        self.read_back(hw);
        self.ctx.refresh_elapsed(now_ms);

        sink.emit(&AppEvent::Telemetry(self.ctx.readings));
        self.ctx.readings
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        match cmd {
            AppCommand::SetSetpoint(setpoint) => {
                if !setpoint.is_finite() {
                    return Err(Error::Config("setpoint must be finite"));
                }
                info!("Setpoint {:.1} -> {setpoint:.1}", self.ctx.readings.reservoir.setpoint);
                self.ctx.readings.reservoir.setpoint = setpoint;
            }
            AppCommand::SetRunning(running) => {
                if running != self.ctx.running {
                    info!("Running override: {running}");
                }
                self.ctx.running = running;
            }
            AppCommand::ClearFault => {
                self.monitor.clear(&mut self.ctx.readings);
                if let Err(e) = hw.set_alarm(false) {
                    warn!("alarm relay: {e}");
                }
                sink.emit(&AppEvent::FaultCleared);
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    /// Latest snapshot.
    pub fn readings(&self) -> &Readings {
        &self.ctx.readings
    }

    /// Current cooling state.
    pub fn state(&self) -> CoolingState {
        self.ctx.state()
    }

    pub fn running(&self) -> bool {
        self.ctx.running
    }

    /// Total control cycles executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Every check that failed in the last cycle, in evaluation order.
    pub fn cycle_faults(&self) -> &[FaultCode] {
        self.monitor.cycle_faults()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn runtime(&self) -> &RuntimeConfig {
        &self.runtime
    }

    // ── Internal ──────────────────────────────────────────────

    /// Translate the commanded outputs into port calls.
    ///
    /// A failed write is logged and left for the read-back to expose; the
    /// next cycle writes again.
    fn apply_outputs(&self, hw: &mut impl ActuatorPort) {
        let cmds = &self.ctx.commands;

        if let Err(e) = hw.set_compressor(cmds.compressor) {
            warn!("compressor relay: {e}");
        }
        if let Err(e) = hw.set_valve(cmds.valve) {
            warn!("valve relay: {e}");
        }
        if let Err(e) = hw.set_fan_pwm(cmds.fan_pwm) {
            warn!("fan PWM: {e}");
        }
        if let Err(e) = hw.set_alarm(self.ctx.readings.error.alert) {
            warn!("alarm relay: {e}");
        }
    }

    fn read_back(&mut self, hw: &mut impl ActuatorPort) {
        match hw.relay_state() {
            Ok(state) => {
                let r = &mut self.ctx.readings;
                r.compressor.valve = state.valve;
                r.compressor.running = state.compressor;
                r.pump.running = state.pump;
                r.chassis.fan.pwm = state.fan_pwm;
            }
            Err(e) => warn!("relay read-back: {e}"),
        }
    }
}
