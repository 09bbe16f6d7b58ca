//! Host simulation plant.
//!
//! A coarse model of the chiller hardware so the full control loop can run
//! on a development machine: simulated `embedded-hal` pins behind the real
//! [`OutputBank`] and [`FlowSwitch`], a first-order reservoir thermal model,
//! fans that emit tach edges into the real [`TachChannel`]s, and switches
//! for injecting sensor and plant faults.

use core::convert::Infallible;

use embedded_hal::digital::{self, ErrorType, InputPin, OutputPin, StatefulOutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};
use log::warn;

use crate::adapters::hardware::{FlowSwitch, OutputBank};
use crate::app::ports::{ActuatorPort, Environment, RelayState, SensorPort};
use crate::board::{BoardProfile, LevelSensing};
use crate::error::{ActuatorError, SensorError};
use crate::sensors::level::LevelSample;
use crate::sensors::probe::{DEVICE_DISCONNECTED_C, DeviceAddress, OneWireThermometer};
use crate::sensors::tach::TachChannel;

// ── Simulated pins ────────────────────────────────────────────

/// Error raised by a simulated pin with `fail_writes` set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimFault;

impl digital::Error for SimFault {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

impl pwm::Error for SimFault {
    fn kind(&self) -> pwm::ErrorKind {
        pwm::ErrorKind::Other
    }
}

/// Push-pull output that remembers its level.
#[derive(Debug, Default)]
pub struct SimPin {
    high: bool,
    /// Reject every write (stuck relay driver).
    pub fail_writes: bool,
}

impl ErrorType for SimPin {
    type Error = SimFault;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), SimFault> {
        if self.fail_writes {
            return Err(SimFault);
        }
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), SimFault> {
        if self.fail_writes {
            return Err(SimFault);
        }
        self.high = true;
        Ok(())
    }
}

impl StatefulOutputPin for SimPin {
    fn is_set_high(&mut self) -> Result<bool, SimFault> {
        Ok(self.high)
    }

    fn is_set_low(&mut self) -> Result<bool, SimFault> {
        Ok(!self.high)
    }
}

/// 8-bit PWM channel.
#[derive(Debug, Default)]
pub struct SimPwm {
    duty: u16,
    pub fail_writes: bool,
}

impl SimPwm {
    pub fn duty(&self) -> u16 {
        self.duty
    }
}

impl pwm::ErrorType for SimPwm {
    type Error = SimFault;
}

impl SetDutyCycle for SimPwm {
    fn max_duty_cycle(&self) -> u16 {
        255
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), SimFault> {
        if self.fail_writes {
            return Err(SimFault);
        }
        self.duty = duty;
        Ok(())
    }
}

/// Input whose level the plant sets.  Idles high (pulled up).
#[derive(Debug)]
pub struct SimInput {
    high: bool,
}

impl Default for SimInput {
    fn default() -> Self {
        Self { high: true }
    }
}

impl SimInput {
    pub fn set_level(&mut self, high: bool) {
        self.high = high;
    }
}

impl ErrorType for SimInput {
    type Error = Infallible;
}

impl InputPin for SimInput {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.high)
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.high)
    }
}

// ── Plant model ───────────────────────────────────────────────

/// Fan speed at full duty.
pub const FAN_MAX_RPM: f32 = 3000.0;

/// Physical state of the simulated chiller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantModel {
    pub reservoir_c: f32,
    pub outside_c: f32,
    pub case_c: f32,
    pub humidity: f32,
    /// Reservoir warming from the cooled load (°C/s).
    pub heat_load_c_per_s: f32,
    /// Reservoir cooling while valve and compressor run (°C/s).
    pub cooling_c_per_s: f32,
    pub level_sense: f32,
    pub level_ref: f32,
    pub filter_adc: u16,
}

impl Default for PlantModel {
    fn default() -> Self {
        Self {
            reservoir_c: 24.0,
            outside_c: 22.0,
            case_c: 30.0,
            humidity: 45.0,
            heat_load_c_per_s: 0.02,
            cooling_c_per_s: 0.06,
            level_sense: 420.0,
            level_ref: 620.0,
            filter_adc: 250,
        }
    }
}

/// Fault injection switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimFaults {
    pub reservoir_probe_disconnected: bool,
    pub outside_probe_disconnected: bool,
    pub environment_failed: bool,
    pub level_failed: bool,
    pub top_fan_stalled: bool,
    pub bottom_fan_stalled: bool,
    pub no_flow: bool,
}

/// One fan's edge generator.
struct SimFan {
    channel: &'static TachChannel,
    next_edge_us: Option<u64>,
}

impl SimFan {
    fn run(&mut self, rpm: f32, rpm_factor: f32, from_us: u64, to_us: u64) {
        if rpm <= 0.0 {
            self.next_edge_us = None;
            return;
        }
        let pulse_us = ((rpm_factor * 1_000_000.0 / rpm) as u64).max(1);
        let mut next = self.next_edge_us.unwrap_or(from_us + pulse_us);
        while next <= to_us {
            // The ISR sees a wrapping 32-bit microsecond timer.
            self.channel.on_edge(next as u32);
            next += pulse_us;
        }
        self.next_edge_us = Some(next);
    }
}

type SimOutputs = OutputBank<SimPin, SimPwm>;

/// The simulated chiller: sensors in, relays out.
pub struct SimPlant {
    outputs: SimOutputs,
    flow_switch: FlowSwitch<SimInput>,
    pub model: PlantModel,
    pub faults: SimFaults,
    profile: &'static BoardProfile,
    top_fan: SimFan,
    bottom_fan: SimFan,
    clock_us: u64,
    seed: u32,
}

impl SimPlant {
    pub fn new(
        profile: &'static BoardProfile,
        top_fan: &'static TachChannel,
        bottom_fan: &'static TachChannel,
    ) -> Self {
        Self {
            outputs: OutputBank::new(
                SimPin::default(),
                SimPin::default(),
                SimPin::default(),
                SimPin::default(),
                SimPwm::default(),
            ),
            flow_switch: FlowSwitch::new(SimInput::default()),
            model: PlantModel::default(),
            faults: SimFaults::default(),
            profile,
            top_fan: SimFan { channel: top_fan, next_edge_us: None },
            bottom_fan: SimFan { channel: bottom_fan, next_edge_us: None },
            clock_us: 0,
            seed: 0x2545_F491,
        }
    }

    /// Switch the coolant pump (the board layer's job on real hardware).
    pub fn set_pump(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.outputs.set_pump(on)
    }

    /// Simulated time since start (ms).
    pub fn now_ms(&self) -> u32 {
        (self.clock_us / 1000) as u32
    }

    /// Advance the physics by `dt_ms`.
    pub fn advance(&mut self, dt_ms: u32) {
        let relays = self.outputs.relay_state().unwrap_or_default();
        let from_us = self.clock_us;
        let to_us = from_us + u64::from(dt_ms) * 1000;
        let dt_s = dt_ms as f32 / 1000.0;

        // ── Reservoir ─────────────────────────────────────────
        let mut rate = self.model.heat_load_c_per_s;
        if relays.valve && relays.compressor {
            rate -= self.model.cooling_c_per_s;
        }
        self.model.reservoir_c += rate * dt_s;

        // ── Fans ──────────────────────────────────────────────
        let rpm = FAN_MAX_RPM * f32::from(relays.fan_pwm) / 255.0;
        let factor = self.profile.tach_rpm_factor;
        let top_rpm = if self.faults.top_fan_stalled { 0.0 } else { rpm };
        let bottom_rpm = if self.faults.bottom_fan_stalled { 0.0 } else { rpm };
        self.top_fan.run(top_rpm, factor, from_us, to_us);
        self.bottom_fan.run(bottom_rpm, factor, from_us, to_us);

        // ── Flow switch (pulled low while flowing) ────────────
        let flowing = relays.pump && !self.faults.no_flow;
        self.flow_switch.pin_mut().set_level(!flowing);

        self.clock_us = to_us;
    }

    /// Small deterministic noise in `[-amplitude, amplitude]`.
    fn jitter(&mut self, amplitude: f32) -> f32 {
        self.seed = self.seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let unit = (self.seed >> 8) as f32 / (1u32 << 24) as f32;
        (unit * 2.0 - 1.0) * amplitude
    }

    fn probe_value(&self, address: &DeviceAddress) -> f32 {
        if *address == self.profile.reservoir_probe && !self.faults.reservoir_probe_disconnected {
            self.model.reservoir_c
        } else if *address == self.profile.outside_probe && !self.faults.outside_probe_disconnected
        {
            self.model.outside_c
        } else {
            DEVICE_DISCONNECTED_C
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl OneWireThermometer for SimPlant {
    fn request_temperatures(&mut self) {}

    fn temperature_c(&mut self, address: &DeviceAddress) -> f32 {
        self.probe_value(address)
    }
}

impl SensorPort for SimPlant {
    fn read_environment(&mut self) -> Result<Environment, SensorError> {
        if self.faults.environment_failed {
            return Err(SensorError::EnvironmentReadFailed);
        }
        Ok(Environment {
            temperature: self.model.case_c,
            humidity: self.model.humidity,
        })
    }

    fn read_level(&mut self) -> Result<Option<LevelSample>, SensorError> {
        if self.faults.level_failed {
            return Err(SensorError::OutOfRange);
        }
        let sense = self.model.level_sense + self.jitter(4.0);
        let reference = match self.profile.level_sensing {
            LevelSensing::ETape => Some(self.model.level_ref + self.jitter(4.0)),
            LevelSensing::TimeOfFlight => None,
        };
        Ok(Some(LevelSample { sense, reference }))
    }

    fn read_filter_adc(&mut self) -> u16 {
        let noisy = f32::from(self.model.filter_adc) + self.jitter(3.0);
        noisy.round().max(0.0) as u16
    }

    fn flow_ok(&mut self) -> bool {
        self.flow_switch.is_flowing().unwrap_or_else(|e| {
            warn!("flow switch: {e}");
            false
        })
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl ActuatorPort for SimPlant {
    fn set_valve(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.outputs.set_valve(on)
    }

    fn set_compressor(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.outputs.set_compressor(on)
    }

    fn set_alarm(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.outputs.set_alarm(on)
    }

    fn set_fan_pwm(&mut self, duty: u8) -> Result<(), ActuatorError> {
        self.outputs.set_fan_pwm(duty)
    }

    fn relay_state(&mut self) -> Result<RelayState, ActuatorError> {
        self.outputs.relay_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::CW5200_REV_B;

    #[test]
    fn compressor_cools_reservoir() {
        static TOP: TachChannel = TachChannel::new();
        static BOTTOM: TachChannel = TachChannel::new();
        let mut plant = SimPlant::new(&CW5200_REV_B, &TOP, &BOTTOM);
        let start = plant.model.reservoir_c;
        plant.advance(10_000);
        assert!(plant.model.reservoir_c > start);

        plant.set_valve(true).unwrap();
        plant.set_compressor(true).unwrap();
        let warm = plant.model.reservoir_c;
        plant.advance(10_000);
        assert!(plant.model.reservoir_c < warm);
    }

    #[test]
    fn spinning_fan_feeds_tach_channel() {
        static TOP: TachChannel = TachChannel::new();
        static BOTTOM: TachChannel = TachChannel::new();
        let mut plant = SimPlant::new(&CW5200_REV_B, &TOP, &BOTTOM);
        plant.set_fan_pwm(255).unwrap();
        plant.advance(1_000);
        // 3000 RPM with two pulses per revolution: 10 ms between edges.
        assert_eq!(TOP.take(), Some(10_000));

        plant.faults.bottom_fan_stalled = true;
        plant.advance(1_000);
        assert_eq!(BOTTOM.take(), Some(10_000)); // left over from the first second
        plant.advance(1_000);
        assert_eq!(BOTTOM.take(), None);
    }

    #[test]
    fn flow_follows_pump() {
        static TOP: TachChannel = TachChannel::new();
        static BOTTOM: TachChannel = TachChannel::new();
        let mut plant = SimPlant::new(&CW5200_REV_B, &TOP, &BOTTOM);
        plant.advance(1_000);
        assert!(!plant.flow_ok());
        plant.set_pump(true).unwrap();
        plant.advance(1_000);
        assert!(plant.flow_ok());
        plant.faults.no_flow = true;
        plant.advance(1_000);
        assert!(!plant.flow_ok());
    }

    #[test]
    fn disconnected_probe_reports_sentinel() {
        static TOP: TachChannel = TachChannel::new();
        static BOTTOM: TachChannel = TachChannel::new();
        let mut plant = SimPlant::new(&CW5200_REV_B, &TOP, &BOTTOM);
        plant.faults.outside_probe_disconnected = true;
        assert_eq!(plant.temperature_c(&CW5200_REV_B.outside_probe), DEVICE_DISCONNECTED_C);
        assert_eq!(plant.temperature_c(&CW5200_REV_B.reservoir_probe), 24.0);
    }
}
