//! DS18B20-class one-wire temperature probes.
//!
//! The bus itself (reset, ROM match, scratchpad reads) belongs to the board
//! support layer and is reached through [`OneWireThermometer`].  This
//! module adds the policy: one conversion request, read by ROM address,
//! map the disconnected sentinel to [`SensorError::Disconnected`], and
//! optionally retry a bounded number of times.

use log::warn;

use crate::error::SensorError;

/// Value a one-wire thermometer bus reports for a probe that did not answer.
pub const DEVICE_DISCONNECTED_C: f32 = -127.0;

/// 64-bit one-wire ROM code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceAddress(pub [u8; 8]);

impl core::fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ":")?;
            }
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}

/// Board-side one-wire temperature bus.
pub trait OneWireThermometer {
    /// Start a conversion on every probe on the bus.
    fn request_temperatures(&mut self);

    /// Read the last conversion of the probe at `address` in °C, or
    /// [`DEVICE_DISCONNECTED_C`] if it did not respond.
    fn temperature_c(&mut self, address: &DeviceAddress) -> f32;
}

/// Read policy for one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemperatureProbe {
    address: DeviceAddress,
    attempts: u8,
}

impl TemperatureProbe {
    /// `attempts` is clamped to at least one read.
    pub fn new(address: DeviceAddress, attempts: u8) -> Self {
        Self {
            address,
            attempts: attempts.max(1),
        }
    }

    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    /// Request a conversion and read the result.
    ///
    /// Each retry issues a fresh conversion request.  Never blocks beyond
    /// what the bus implementation does for a single conversion.
    pub fn read(&self, bus: &mut impl OneWireThermometer) -> Result<f32, SensorError> {
        for attempt in 1..=self.attempts {
            bus.request_temperatures();
            let value = bus.temperature_c(&self.address);
            if is_valid(value) {
                return Ok(value);
            }
            if attempt < self.attempts {
                warn!(
                    "probe {}: no response (attempt {}/{})",
                    self.address, attempt, self.attempts
                );
            }
        }
        Err(SensorError::Disconnected)
    }
}

fn is_valid(value: f32) -> bool {
    value != DEVICE_DISCONNECTED_C && value.is_finite()
}
