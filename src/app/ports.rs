//! Port traits: the hexagonal boundary between the control core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ChillerService (domain)
//! ```
//!
//! Driven adapters (board sensors, relay bank, event sinks, storage)
//! implement these traits.  [`ChillerService`](super::service::ChillerService)
//! consumes them via generics, so the control core never touches hardware
//! directly.

use crate::config::Settings;
use crate::error::{ActuatorError, SensorError};
use crate::sensors::level::LevelSample;
use crate::sensors::probe::OneWireThermometer;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Case temperature / humidity from the BME-class environment sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    pub temperature: f32,
    pub humidity: f32,
}

/// Read-side port: raw samples for one control cycle.
///
/// The one-wire probe bus is part of the port through the
/// [`OneWireThermometer`] supertrait.
pub trait SensorPort: OneWireThermometer {
    /// Case temperature and humidity.
    fn read_environment(&mut self) -> Result<Environment, SensorError>;

    /// A new reservoir level sample, `Ok(None)` if none completed since the
    /// last call (ranging sensors finish asynchronously).
    fn read_level(&mut self) -> Result<Option<LevelSample>, SensorError>;

    /// Raw filter differential-pressure ADC counts.
    fn read_filter_adc(&mut self) -> u16;

    /// Flow switch state: `true` when coolant is flowing.
    fn flow_ok(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Relay and PWM state as read back from the output hardware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayState {
    pub valve: bool,
    pub compressor: bool,
    pub alarm: bool,
    /// Pump relay; switched by the board layer, only observed here.
    pub pump: bool,
    /// Last duty successfully written to the fan PWM.
    pub fan_pwm: u8,
}

/// Write-side port: the domain calls this to drive outputs.
pub trait ActuatorPort {
    fn set_valve(&mut self, on: bool) -> Result<(), ActuatorError>;

    fn set_compressor(&mut self, on: bool) -> Result<(), ActuatorError>;

    fn set_alarm(&mut self, on: bool) -> Result<(), ActuatorError>;

    /// Fan duty, 0 = off, 255 = full.
    fn set_fan_pwm(&mut self, duty: u8) -> Result<(), ActuatorError>;

    /// Ground truth of every output.
    fn relay_state(&mut self) -> Result<RelayState, ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / display)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Settings port (driven adapter: domain ↔ persistent settings)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the [`Settings`] record.
///
/// Implementations MUST validate before persisting and MUST fall back to
/// (and write) the compiled defaults when the stored record is missing,
/// corrupt or of another version.
pub trait SettingsPort {
    fn load(&mut self) -> Result<Settings, ConfigError>;

    fn save(&mut self, settings: &Settings) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ EEPROM / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// Write operations MUST be atomic: no partial records on power loss.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`SettingsPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field failed range validation.
    ValidationFailed(&'static str),
    /// Underlying storage failed.
    Storage(StorageError),
    /// Record could not be serialised.
    Encode,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::Storage(e) => write!(f, "storage: {}", e),
            Self::Encode => write!(f, "encode failed"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
