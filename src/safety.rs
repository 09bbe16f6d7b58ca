//! Fault monitor.
//!
//! Runs **every cycle after the sensor refresh and before the cooling state
//! machine**.  Each failing check latches its [`FaultCode`] into
//! `Readings.error` and raises the alert.
//!
//! ## Latch semantics
//!
//! There is a single latch slot.  Checks run in a fixed order and a later
//! failing check overwrites the code of an earlier one, so the reported
//! code is the last failing check of the most recent cycle that had one.
//! A cycle where everything passes leaves the latch untouched: the code and
//! the alert output stay set until [`FaultMonitor::clear`] is called.
//!
//! Check order:
//!
//! 1. sensor faults (a probe that did not answer, a dead environment or
//!    level sensor)
//! 2. reservoir level low
//! 3. case temperature high, then low
//! 4. case humidity high
//! 5. reservoir temperature high, then low
//! 6. outside temperature high, then low
//! 7. filter ΔP high
//! 8. top fan stall, then bottom fan stall
//! 9. pump running without flow
//!
//! A quantity whose sensor failed this cycle skips its threshold checks, so
//! its zero placeholder cannot also trip a low-limit fault and hide the
//! disconnect code.
//!
//! Faults never change the outputs of the cooling state machine; the alert
//! relay is the only actuator a fault drives.

use heapless::Vec;
use log::{error, info, warn};

use crate::config::{RuntimeConfig, Settings};
use crate::error::FaultCode;
use crate::readings::Readings;
use crate::sensors::SensorStatus;
use crate::sensors::tach::TachReport;

/// Upper bound on distinct checks that can fail in one cycle.
pub const MAX_CYCLE_FAULTS: usize = 16;

/// Fault monitor.
pub struct FaultMonitor {
    /// Every check that failed in the last evaluated cycle, in check order.
    cycle_faults: Vec<FaultCode, MAX_CYCLE_FAULTS>,
    /// Cycles the fan PWM has been continuously non-zero.
    fan_on_cycles: u32,
    fan_spinup_cycles: u32,
    /// Cycles the pump has been continuously running.
    pump_on_cycles: u32,
    flow_grace_cycles: u32,
}

impl FaultMonitor {
    pub fn new(runtime: &RuntimeConfig) -> Self {
        Self {
            cycle_faults: Vec::new(),
            fan_on_cycles: 0,
            fan_spinup_cycles: runtime.fan_spinup_cycles,
            pump_on_cycles: 0,
            flow_grace_cycles: runtime.flow_grace_cycles,
        }
    }

    /// Evaluate every check against freshly refreshed readings.
    ///
    /// Returns the code latched by this cycle, if any check failed.
    pub fn evaluate(
        &mut self,
        readings: &mut Readings,
        status: &SensorStatus,
        settings: &Settings,
    ) -> Option<FaultCode> {
        self.cycle_faults.clear();
        self.track_grace(readings);

        // ── Sensors ───────────────────────────────────────────────
        self.check(readings, FaultCode::ReservoirProbeDisconnected, !status.reservoir_probe_ok);
        self.check(readings, FaultCode::OutsideProbeDisconnected, !status.outside_probe_ok);
        self.check(readings, FaultCode::EnvironmentSensorFault, !status.environment_ok);
        self.check(readings, FaultCode::LevelSensorFault, !status.level_ok);

        // ── Reservoir level ───────────────────────────────────────
        if let Some(level) = status.level {
            self.check(
                readings,
                FaultCode::ReservoirLevelLow,
                level < f32::from(settings.reservoir_volume_low_limit),
            );
        }

        // ── Case environment ──────────────────────────────────────
        if status.environment_ok {
            let inside = readings.chassis.inside_temperature;
            self.check(
                readings,
                FaultCode::CaseTemperatureHigh,
                inside > f32::from(settings.case_temperature_high_limit),
            );
            self.check(
                readings,
                FaultCode::CaseTemperatureLow,
                inside < f32::from(settings.case_temperature_low_limit),
            );
            let humidity = readings.chassis.humidity;
            self.check(
                readings,
                FaultCode::CaseHumidityHigh,
                humidity > f32::from(settings.case_humidity_high_limit),
            );
        }

        // ── Reservoir temperature ─────────────────────────────────
        if status.reservoir_probe_ok {
            let t = readings.reservoir.temperature;
            self.check(
                readings,
                FaultCode::ReservoirTemperatureHigh,
                t > f32::from(settings.reservoir_temp_high_limit),
            );
            self.check(
                readings,
                FaultCode::ReservoirTemperatureLow,
                t < f32::from(settings.reservoir_temp_low_limit),
            );
        }

        // ── Outside temperature ───────────────────────────────────
        if status.outside_probe_ok {
            let t = readings.chassis.outside_temperature;
            self.check(
                readings,
                FaultCode::OutsideTemperatureHigh,
                t > f32::from(settings.outside_temp_high_limit),
            );
            self.check(
                readings,
                FaultCode::OutsideTemperatureLow,
                t < f32::from(settings.outside_temp_low_limit),
            );
        }

        // ── Filter ΔP ─────────────────────────────────────────────
        if status.filter_dp_valid {
            let dp = readings.chassis.filter_dp;
            self.check(readings, FaultCode::FilterPressureHigh, dp > settings.filter_high_limit);
        }

        // ── Fans (only once spun up) ──────────────────────────────
        if self.fans_armed() {
            self.check(readings, FaultCode::TopFanStall, stalled(status.top_fan));
            self.check(readings, FaultCode::BottomFanStall, stalled(status.bottom_fan));
        }

        // ── Pump flow (only after grace period while running) ─────
        if readings.pump.running && self.pump_on_cycles > self.flow_grace_cycles {
            let no_flow = !readings.pump.flow_ok;
            self.check(readings, FaultCode::PumpNoFlow, no_flow);
        }

        self.cycle_faults.last().copied()
    }

    /// Latch `fault` into the readings and raise the alert.
    ///
    /// Logs once per change of the latched code.
    pub(crate) fn latch(&mut self, readings: &mut Readings, fault: FaultCode) {
        if !readings.error.alert || readings.error.code != fault.code() {
            error!("FAULT LATCHED: {fault}");
        }
        readings.error.code = fault.code();
        readings.error.alert = true;
        if self.cycle_faults.push(fault).is_err() {
            warn!("cycle fault list full, {fault} not recorded");
        }
    }

    /// Explicitly clear the latch and the alert.
    pub fn clear(&mut self, readings: &mut Readings) {
        if readings.error.alert {
            info!("FAULT CLEARED (code {})", readings.error.code);
        }
        readings.error.code = 0;
        readings.error.alert = false;
        self.cycle_faults.clear();
    }

    /// Checks that failed in the last evaluated cycle, in check order.
    pub fn cycle_faults(&self) -> &[FaultCode] {
        &self.cycle_faults
    }

    // ── Internal ──────────────────────────────────────────────────

    fn check(&mut self, readings: &mut Readings, fault: FaultCode, failed: bool) {
        if failed {
            self.latch(readings, fault);
        }
    }

    fn track_grace(&mut self, readings: &Readings) {
        if readings.chassis.fan.pwm > 0 {
            self.fan_on_cycles = self.fan_on_cycles.saturating_add(1);
        } else {
            self.fan_on_cycles = 0;
        }
        if readings.pump.running {
            self.pump_on_cycles = self.pump_on_cycles.saturating_add(1);
        } else {
            self.pump_on_cycles = 0;
        }
    }

    fn fans_armed(&self) -> bool {
        self.fan_on_cycles > self.fan_spinup_cycles
    }
}

/// A closed tach window with no pulses.
fn stalled(report: Option<TachReport>) -> bool {
    report.is_some_and(|r| r.pulses == 0)
}
