//! Sensor subsystem: smoothing, capture and probe policy, plus the
//! aggregating [`SensorHub`].
//!
//! The hub owns the smoothing state of every noisy channel and refreshes the
//! measurement half of [`Readings`] once per control cycle.  What failed is
//! reported separately in a [`SensorStatus`] so fault evaluation can tell a
//! dead sensor from a bad value.

pub mod filter;
pub mod level;
pub mod pressure;
pub mod probe;
pub mod tach;

use log::warn;

use crate::app::ports::SensorPort;
use crate::board::{BoardProfile, LevelSensing};
use crate::config::{RuntimeConfig, Settings};
use crate::readings::Readings;
use level::{LevelSample, ReservoirLevel};
use pressure::FilterPressure;
use probe::TemperatureProbe;
use tach::{TachChannel, TachReport, Tachometer};

/// Per-cycle health of every sensor, alongside the values in [`Readings`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorStatus {
    pub reservoir_probe_ok: bool,
    pub outside_probe_ok: bool,
    pub environment_ok: bool,
    pub level_ok: bool,
    /// Compensated reservoir level, `None` until a sample is held.
    pub level: Option<f32>,
    /// At least one ΔP sample is held.
    pub filter_dp_valid: bool,
    /// Set on the cycle a tach window closes.
    pub top_fan: Option<TachReport>,
    pub bottom_fan: Option<TachReport>,
}

impl Default for SensorStatus {
    fn default() -> Self {
        Self {
            reservoir_probe_ok: true,
            outside_probe_ok: true,
            environment_ok: true,
            level_ok: true,
            level: None,
            filter_dp_valid: false,
            top_fan: None,
            bottom_fan: None,
        }
    }
}

/// Owns every sensor's smoothing state.
pub struct SensorHub {
    reservoir_probe: TemperatureProbe,
    outside_probe: TemperatureProbe,
    level: ReservoirLevel,
    level_sensing: LevelSensing,
    pressure: FilterPressure,
    top_fan: Tachometer,
    bottom_fan: Tachometer,
}

impl SensorHub {
    /// Build the hub for a board.  The tach channels are the cells the fan
    /// interrupts feed; production passes
    /// [`TOP_FAN_TACH`](tach::TOP_FAN_TACH) and
    /// [`BOTTOM_FAN_TACH`](tach::BOTTOM_FAN_TACH).
    pub fn new(
        profile: &BoardProfile,
        top_fan: &'static TachChannel,
        bottom_fan: &'static TachChannel,
    ) -> Self {
        Self {
            reservoir_probe: TemperatureProbe::new(
                profile.reservoir_probe,
                profile.probe_read_attempts,
            ),
            outside_probe: TemperatureProbe::new(profile.outside_probe, profile.probe_read_attempts),
            level: ReservoirLevel::new(),
            level_sensing: profile.level_sensing,
            pressure: FilterPressure::new(),
            top_fan: Tachometer::new(top_fan, profile.tach_rpm_factor),
            bottom_fan: Tachometer::new(bottom_fan, profile.tach_rpm_factor),
        }
    }

    /// Sample every sensor once and write the results into `readings`.
    ///
    /// A failed sensor leaves `0.0` in its fields and is flagged in the
    /// returned status; one bad sensor never stops the cycle.
    pub fn refresh(
        &mut self,
        port: &mut impl SensorPort,
        settings: &Settings,
        runtime: &RuntimeConfig,
        readings: &mut Readings,
    ) -> SensorStatus {
        let mut status = SensorStatus::default();

        // ── Reservoir level ───────────────────────────────────────
        match port.read_level() {
            Ok(sample) => {
                if let Some(sample) = sample {
                    self.level.add(self.normalise_level(sample));
                }
                readings.reservoir.level_sense = self.level.sense();
                readings.reservoir.level_ref = self.level.reference();
                status.level = self.level.compensated(settings.reservoir_ref_zero);
            }
            Err(e) => {
                warn!("level sensor: {e}");
                readings.reservoir.level_sense = 0.0;
                readings.reservoir.level_ref = 0.0;
                status.level_ok = false;
            }
        }

        // ── Case environment ──────────────────────────────────────
        match port.read_environment() {
            Ok(env) => {
                readings.chassis.inside_temperature = env.temperature;
                readings.chassis.humidity = env.humidity;
            }
            Err(e) => {
                warn!("environment sensor: {e}");
                readings.chassis.inside_temperature = 0.0;
                readings.chassis.humidity = 0.0;
                status.environment_ok = false;
            }
        }

        // ── Fan tachometers ───────────────────────────────────────
        status.top_fan = self.top_fan.sample(runtime.tach_window_cycles);
        if let Some(report) = status.top_fan {
            readings.chassis.fan.top_tach = report.rpm;
        }
        status.bottom_fan = self.bottom_fan.sample(runtime.tach_window_cycles);
        if let Some(report) = status.bottom_fan {
            readings.chassis.fan.bottom_tach = report.rpm;
        }

        // ── Filter ΔP ─────────────────────────────────────────────
        self.pressure.add(port.read_filter_adc());
        status.filter_dp_valid = self.pressure.has_data();
        readings.chassis.filter_dp = self.pressure.differential(settings.filter_zero);

        // ── Temperature probes ────────────────────────────────────
        match self.reservoir_probe.read(port) {
            Ok(t) => readings.reservoir.temperature = t,
            Err(e) => {
                warn!("reservoir probe {}: {e}", self.reservoir_probe.address());
                readings.reservoir.temperature = 0.0;
                status.reservoir_probe_ok = false;
            }
        }
        match self.outside_probe.read(port) {
            Ok(t) => readings.chassis.outside_temperature = t,
            Err(e) => {
                warn!("outside probe {}: {e}", self.outside_probe.address());
                readings.chassis.outside_temperature = 0.0;
                status.outside_probe_ok = false;
            }
        }

        // ── Flow switch ───────────────────────────────────────────
        readings.pump.flow_ok = port.flow_ok();

        status
    }

    /// Time-of-flight boards report distance only; a stray reference value
    /// from such a driver is dropped.
    fn normalise_level(&self, sample: LevelSample) -> LevelSample {
        match self.level_sensing {
            LevelSensing::TimeOfFlight => LevelSample { reference: None, ..sample },
            LevelSensing::ETape => sample,
        }
    }
}
