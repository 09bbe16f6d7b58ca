//! The control-state snapshot.
//!
//! [`Readings`] is owned by the control loop, overwritten in place once per
//! cycle and lives for the whole process.  Every field holds the most
//! recent successful measurement, or `0.0`/`0` when its sensor failed.
//! The telemetry encoder serialises it field by field in declaration order.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Reservoir {
    pub temperature: f32,
    pub setpoint: f32,
    pub level_sense: f32,
    pub level_ref: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Fans {
    /// Top fan speed (RPM).
    pub top_tach: f32,
    /// Bottom fan speed (RPM).
    pub bottom_tach: f32,
    /// Fan duty, 0–255.
    pub pwm: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Chassis {
    pub inside_temperature: f32,
    pub outside_temperature: f32,
    pub humidity: f32,
    /// Filter differential pressure above the zero offset (ADC counts).
    pub filter_dp: u16,
    pub fan: Fans,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compressor {
    pub running: bool,
    pub valve: bool,
    /// Milliseconds since the compressor relay last toggled.
    pub compressor_time: u32,
    /// Milliseconds since the valve relay last toggled.
    pub valve_time: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pump {
    pub running: bool,
    pub flow_ok: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorState {
    /// Latched; cleared only by an explicit clear.
    pub alert: bool,
    /// Latched [`FaultCode`](crate::error::FaultCode) value, 0 = none.
    pub code: u16,
}

/// Full control-state snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Readings {
    pub reservoir: Reservoir,
    pub chassis: Chassis,
    pub compressor: Compressor,
    pub pump: Pump,
    pub error: ErrorState,
}

impl Readings {
    /// Power-up snapshot: everything zeroed except the setpoint.
    pub fn with_setpoint(setpoint: f32) -> Self {
        let mut readings = Self::default();
        readings.reservoir.setpoint = setpoint;
        readings
    }
}
