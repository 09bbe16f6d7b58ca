//! Mock hardware adapter for integration tests.
//!
//! A bench stand-in for the chiller board: fixed sensor values the test can
//! change between cycles, relays that remember their state, and fans that
//! feed real tach channels while the fan PWM is on.  Every actuator call is
//! recorded so tests can assert on the full command history.

use chiller::app::events::AppEvent;
use chiller::app::ports::{ActuatorPort, Environment, EventSink, RelayState, SensorPort};
use chiller::app::service::ChillerService;
use chiller::board::{BoardProfile, CW5200_REV_B};
use chiller::config::{RuntimeConfig, Settings};
use chiller::error::{ActuatorError, SensorError};
use chiller::sensors::level::LevelSample;
use chiller::sensors::probe::{DEVICE_DISCONNECTED_C, DeviceAddress, OneWireThermometer};
use chiller::sensors::tach::TachChannel;

/// Board every mock runs as.
pub const PROFILE: &BoardProfile = &CW5200_REV_B;
/// Control cycle used by the tests (ms).
pub const CYCLE_MS: u32 = 1000;

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    Valve(bool),
    Compressor(bool),
    Alarm(bool),
    FanPwm(u8),
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
    pub relays: RelayState,

    pub reservoir_c: f32,
    pub outside_c: f32,
    pub reservoir_disconnected: bool,
    pub environment: Result<Environment, SensorError>,
    pub level: LevelSample,
    pub filter_adc: u16,
    pub flowing: bool,

    pub fail_compressor_writes: bool,
    pub top_fan_stalled: bool,
    pub bottom_fan_stalled: bool,

    pub top_tach: &'static TachChannel,
    pub bottom_tach: &'static TachChannel,
    clock_us: u32,
}

#[allow(dead_code)]
impl MockHardware {
    /// Healthy bench: reservoir at `reservoir_c`, pump running with flow.
    pub fn new(reservoir_c: f32) -> Self {
        Self {
            calls: Vec::new(),
            relays: RelayState {
                pump: true,
                ..RelayState::default()
            },
            reservoir_c,
            outside_c: 22.0,
            reservoir_disconnected: false,
            environment: Ok(Environment {
                temperature: 30.0,
                humidity: 45.0,
            }),
            level: LevelSample {
                sense: 420.0,
                reference: Some(620.0),
            },
            filter_adc: 250,
            flowing: true,
            fail_compressor_writes: false,
            top_fan_stalled: false,
            bottom_fan_stalled: false,
            // Each mock gets its own channels so parallel tests never share edges.
            top_tach: Box::leak(Box::new(TachChannel::new())),
            bottom_tach: Box::leak(Box::new(TachChannel::new())),
            clock_us: 0,
        }
    }

    /// Let one control cycle of wall time pass: spinning fans emit tach
    /// edges 10 ms apart (3000 RPM at two pulses per revolution).
    pub fn run_fans(&mut self) {
        let spinning = self.relays.fan_pwm > 0;
        for _ in 0..3 {
            self.clock_us = self.clock_us.wrapping_add(10_000);
            if spinning && !self.top_fan_stalled {
                self.top_tach.on_edge(self.clock_us);
            }
            if spinning && !self.bottom_fan_stalled {
                self.bottom_tach.on_edge(self.clock_us);
            }
        }
        self.clock_us = self.clock_us.wrapping_add(CYCLE_MS * 1000);
    }

    pub fn count(&self, call: ActuatorCall) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }
}

impl OneWireThermometer for MockHardware {
    fn request_temperatures(&mut self) {}

    fn temperature_c(&mut self, address: &DeviceAddress) -> f32 {
        if *address == PROFILE.reservoir_probe {
            if self.reservoir_disconnected {
                DEVICE_DISCONNECTED_C
            } else {
                self.reservoir_c
            }
        } else if *address == PROFILE.outside_probe {
            self.outside_c
        } else {
            DEVICE_DISCONNECTED_C
        }
    }
}

impl SensorPort for MockHardware {
    fn read_environment(&mut self) -> Result<Environment, SensorError> {
        self.environment
    }

    fn read_level(&mut self) -> Result<Option<LevelSample>, SensorError> {
        Ok(Some(self.level))
    }

    fn read_filter_adc(&mut self) -> u16 {
        self.filter_adc
    }

    fn flow_ok(&mut self) -> bool {
        self.relays.pump && self.flowing
    }
}

impl ActuatorPort for MockHardware {
    fn set_valve(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.calls.push(ActuatorCall::Valve(on));
        self.relays.valve = on;
        Ok(())
    }

    fn set_compressor(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.calls.push(ActuatorCall::Compressor(on));
        if self.fail_compressor_writes {
            return Err(ActuatorError::GpioWriteFailed);
        }
        self.relays.compressor = on;
        Ok(())
    }

    fn set_alarm(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.calls.push(ActuatorCall::Alarm(on));
        self.relays.alarm = on;
        Ok(())
    }

    fn set_fan_pwm(&mut self, duty: u8) -> Result<(), ActuatorError> {
        self.calls.push(ActuatorCall::FanPwm(duty));
        self.relays.fan_pwm = duty;
        Ok(())
    }

    fn relay_state(&mut self) -> Result<RelayState, ActuatorError> {
        Ok(self.relays)
    }
}

// ── Event recorder ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events other than the per-cycle telemetry.
    pub fn notable(&self) -> Vec<&AppEvent> {
        self.events
            .iter()
            .filter(|e| !matches!(e, AppEvent::Telemetry(_)))
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Bench ─────────────────────────────────────────────────────

/// Service, hardware and sink wired together, with simulated time.
pub struct Bench {
    pub app: ChillerService,
    pub hw: MockHardware,
    pub sink: RecordingSink,
    pub now_ms: u32,
}

#[allow(dead_code)]
impl Bench {
    /// Started at t = 0 with default settings and setpoint 20 °C.
    pub fn new(reservoir_c: f32) -> Self {
        Self::with_settings(reservoir_c, Settings::default())
    }

    pub fn with_settings(reservoir_c: f32, settings: Settings) -> Self {
        let mut hw = MockHardware::new(reservoir_c);
        let mut sink = RecordingSink::new();
        let mut app = ChillerService::new(
            PROFILE,
            settings,
            RuntimeConfig::default(),
            hw.top_tach,
            hw.bottom_tach,
        );
        app.start(&mut hw, &mut sink, 0);
        Self { app, hw, sink, now_ms: 0 }
    }

    /// Advance one cycle and run the control loop.
    pub fn cycle(&mut self) -> chiller::readings::Readings {
        self.hw.run_fans();
        self.now_ms = self.now_ms.wrapping_add(CYCLE_MS);
        self.app.tick(&mut self.hw, &mut self.sink, self.now_ms)
    }

    /// Run cycles until `now_ms` reaches `t` (inclusive).
    pub fn run_until(&mut self, t: u32) {
        while self.now_ms < t {
            self.cycle();
        }
    }

    /// Run up to the cycle before `t`, then return the snapshot of the
    /// cycle at `t`.
    pub fn run_until_then_cycle(&mut self, t: u32) -> chiller::readings::Readings {
        self.run_until(t.saturating_sub(CYCLE_MS));
        self.cycle()
    }
}
