//! Unified error types for the chiller firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! control loop's error handling uniform.  All variants are `Copy` so they
//! can be passed through the fault monitor and the service without
//! allocation.
//!
//! [`FaultCode`] is separate: it is the latched code space carried in
//! `Readings.error.code` and on the telemetry wire, not a Rust error.

use core::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned out-of-range data.
    Sensor(SensorError),
    /// An actuator command failed.
    Actuator(ActuatorError),
    /// The serial link failed to frame, unframe or carry a packet.
    Link(LinkError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// One-wire probe answered with the disconnected sentinel.
    Disconnected,
    /// Environment (temperature/humidity) sensor read failed.
    EnvironmentReadFailed,
    /// GPIO read returned an error.
    GpioReadFailed,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "probe disconnected"),
            Self::EnvironmentReadFailed => write!(f, "environment sensor read failed"),
            Self::GpioReadFailed => write!(f, "GPIO read failed"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// PWM duty-cycle write failed.
    PwmWriteFailed,
    /// Relay GPIO set failed.
    GpioWriteFailed,
    /// Relay read-back failed.
    GpioReadFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
            Self::GpioReadFailed => write!(f, "GPIO read-back failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// Received checksum does not match the payload.
    Crc,
    /// Length byte exceeds the maximum payload size, or the payload does
    /// not have the expected size.
    PayloadLength,
    /// Frame did not terminate with the stop byte.
    StopByte,
    /// Output buffer too small for the encoded frame.
    BufferTooSmall,
    /// Transport refused or truncated the write.
    Transport,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crc => write!(f, "CRC mismatch"),
            Self::PayloadLength => write!(f, "bad payload length"),
            Self::StopByte => write!(f, "missing stop byte"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::Transport => write!(f, "transport write failed"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Latched fault codes
// ---------------------------------------------------------------------------

/// Code latched into `Readings.error.code` and carried on the wire.
///
/// `0` is reserved for "no fault".  Threshold and interlock codes are
/// evaluated in discriminant order by the fault monitor; sensor codes are
/// raised while measuring, before the ordered checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum FaultCode {
    ReservoirLevelLow = 1,
    CaseTemperatureHigh = 2,
    CaseTemperatureLow = 3,
    CaseHumidityHigh = 4,
    ReservoirTemperatureHigh = 5,
    ReservoirTemperatureLow = 6,
    OutsideTemperatureHigh = 7,
    OutsideTemperatureLow = 8,
    FilterPressureHigh = 9,
    TopFanStall = 10,
    BottomFanStall = 11,
    PumpNoFlow = 12,

    ReservoirProbeDisconnected = 20,
    OutsideProbeDisconnected = 21,
    EnvironmentSensorFault = 22,
    LevelSensorFault = 23,
}

impl FaultCode {
    /// Wire value of this code.
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Map a wire value back to a code.  `0` and unknown values are `None`.
    pub fn from_code(code: u16) -> Option<Self> {
        let fault = match code {
            1 => Self::ReservoirLevelLow,
            2 => Self::CaseTemperatureHigh,
            3 => Self::CaseTemperatureLow,
            4 => Self::CaseHumidityHigh,
            5 => Self::ReservoirTemperatureHigh,
            6 => Self::ReservoirTemperatureLow,
            7 => Self::OutsideTemperatureHigh,
            8 => Self::OutsideTemperatureLow,
            9 => Self::FilterPressureHigh,
            10 => Self::TopFanStall,
            11 => Self::BottomFanStall,
            12 => Self::PumpNoFlow,
            20 => Self::ReservoirProbeDisconnected,
            21 => Self::OutsideProbeDisconnected,
            22 => Self::EnvironmentSensorFault,
            23 => Self::LevelSensorFault,
            _ => return None,
        };
        Some(fault)
    }

    /// Sensor-class faults come from a failed measurement rather than a
    /// measured value crossing a limit.
    pub const fn is_sensor_fault(self) -> bool {
        matches!(
            self,
            Self::ReservoirProbeDisconnected
                | Self::OutsideProbeDisconnected
                | Self::EnvironmentSensorFault
                | Self::LevelSensorFault
        )
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::ReservoirLevelLow => "reservoir level low",
            Self::CaseTemperatureHigh => "case temperature high",
            Self::CaseTemperatureLow => "case temperature low",
            Self::CaseHumidityHigh => "case humidity high",
            Self::ReservoirTemperatureHigh => "reservoir temperature high",
            Self::ReservoirTemperatureLow => "reservoir temperature low",
            Self::OutsideTemperatureHigh => "outside temperature high",
            Self::OutsideTemperatureLow => "outside temperature low",
            Self::FilterPressureHigh => "filter differential pressure high",
            Self::TopFanStall => "top fan stalled",
            Self::BottomFanStall => "bottom fan stalled",
            Self::PumpNoFlow => "pump running without flow",
            Self::ReservoirProbeDisconnected => "reservoir probe disconnected",
            Self::OutsideProbeDisconnected => "outside probe disconnected",
            Self::EnvironmentSensorFault => "environment sensor fault",
            Self::LevelSensorFault => "level sensor fault",
        };
        write!(f, "{text} (code {})", self.code())
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
