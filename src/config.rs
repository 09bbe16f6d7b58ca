//! Chiller configuration.
//!
//! [`Settings`] is the persisted, versioned record of thresholds, lockout
//! durations and hysteresis.  It is loaded once at startup by
//! [`SettingsStore`](crate::adapters::storage::SettingsStore) and handed to
//! the control core by reference every cycle; the core never mutates it.
//!
//! [`RuntimeConfig`] holds loop tuning that is not persisted.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Layout version of the persisted [`Settings`] record.  A stored record
/// with any other version byte is replaced by the compiled defaults.
pub const SETTINGS_VERSION: u8 = 3;

/// Persisted chiller settings.
///
/// Field order is the storage order; `version` must stay first so the
/// version byte sits at offset 0 of the serialised record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub version: u8,

    // --- Filter differential pressure (raw ADC counts) ---
    pub filter_high_limit: u16,
    pub filter_zero: u16,

    // --- Case environment ---
    pub case_temperature_high_limit: u8,
    pub case_temperature_low_limit: u8,
    pub case_humidity_high_limit: u8,

    // --- Reservoir ---
    pub reservoir_volume_low_limit: u16,
    pub reservoir_ref_zero: u16,
    pub reservoir_temp_high_limit: u8,
    pub reservoir_temp_low_limit: u8,

    // --- Outside air ---
    pub outside_temp_high_limit: u8,
    pub outside_temp_low_limit: u8,

    // --- Lockouts (milliseconds) ---
    /// Minimum time the valve must be open before the compressor engages.
    pub valve_lockout: u32,
    /// Minimum time between compressor toggles.
    pub compressor_lockout: u32,

    /// Dead-band half width around the setpoint (°C).
    pub hysteresis: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            filter_high_limit: 500,
            filter_zero: 100,
            case_temperature_high_limit: 100,
            case_temperature_low_limit: 0,
            case_humidity_high_limit: 80,
            reservoir_volume_low_limit: 0,
            reservoir_ref_zero: 620,
            reservoir_temp_high_limit: 30,
            reservoir_temp_low_limit: 5,
            outside_temp_high_limit: 100,
            outside_temp_low_limit: 0,
            valve_lockout: 30 * 1000,
            compressor_lockout: 60 * 1000,
            hysteresis: 2.0,
        }
    }
}

impl Settings {
    /// Range-check every field.  Invalid records are rejected, not clamped.
    pub fn validate(&self) -> Result<()> {
        if self.version != SETTINGS_VERSION {
            return Err(Error::Config("version mismatch"));
        }
        if self.case_temperature_low_limit >= self.case_temperature_high_limit {
            return Err(Error::Config("case temperature low limit must be below high limit"));
        }
        if self.reservoir_temp_low_limit >= self.reservoir_temp_high_limit {
            return Err(Error::Config("reservoir temperature low limit must be below high limit"));
        }
        if self.outside_temp_low_limit >= self.outside_temp_high_limit {
            return Err(Error::Config("outside temperature low limit must be below high limit"));
        }
        if self.case_humidity_high_limit > 100 {
            return Err(Error::Config("case humidity limit above 100 %"));
        }
        if self.filter_zero >= self.filter_high_limit {
            return Err(Error::Config("filter zero must be below filter high limit"));
        }
        if !self.hysteresis.is_finite() || self.hysteresis <= 0.0 {
            return Err(Error::Config("hysteresis must be positive and finite"));
        }
        if self.valve_lockout == 0 || self.compressor_lockout == 0 {
            return Err(Error::Config("lockouts must be nonzero"));
        }
        Ok(())
    }
}

/// Loop tuning that lives only in RAM.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuntimeConfig {
    /// Control cycle period (milliseconds).
    pub cycle_interval_ms: u32,
    /// Reservoir setpoint at power-up (°C).
    pub initial_setpoint: f32,
    /// Whether the cooling state machine runs at power-up.
    pub initial_running: bool,
    /// Control cycles per tachometer reporting window.
    pub tach_window_cycles: u32,
    /// Extra cycles after the fan PWM reads back non-zero before stall
    /// detection arms.  0 checks the first window the fan ran through.
    pub fan_spinup_cycles: u32,
    /// Cycles after the pump starts before the no-flow check arms.
    pub flow_grace_cycles: u32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cycle_interval_ms: 1000, // 1 Hz
            initial_setpoint: 20.0,
            initial_running: true,
            tach_window_cycles: 1,
            fan_spinup_cycles: 0,
            flow_grace_cycles: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let s = Settings::default();
        assert!(s.validate().is_ok());
        assert_eq!(s.version, SETTINGS_VERSION);
    }

    #[test]
    fn compressor_lockout_exceeds_valve_lockout() {
        let s = Settings::default();
        assert!(
            s.compressor_lockout > s.valve_lockout,
            "compressor must rest longer than the valve takes to equalise"
        );
    }

    #[test]
    fn inverted_limits_rejected() {
        let s = Settings {
            reservoir_temp_low_limit: 40,
            ..Settings::default()
        };
        assert_eq!(
            s.validate(),
            Err(Error::Config("reservoir temperature low limit must be below high limit"))
        );
    }

    #[test]
    fn non_finite_hysteresis_rejected() {
        for h in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let s = Settings {
                hysteresis: h,
                ..Settings::default()
            };
            assert!(s.validate().is_err(), "hysteresis {h} accepted");
        }
    }

    #[test]
    fn serde_roundtrip() {
        let s = Settings::default();
        let json = serde_json::to_string(&s).unwrap();
        let s2: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(s, s2);
    }

    #[test]
    fn postcard_record_starts_with_version_byte() {
        let s = Settings::default();
        let bytes = postcard::to_allocvec(&s).unwrap();
        assert_eq!(bytes[0], SETTINGS_VERSION);
        let s2: Settings = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(s, s2);
    }

    #[test]
    fn runtime_defaults_are_sane() {
        let r = RuntimeConfig::default();
        assert!(r.cycle_interval_ms > 0);
        assert!(r.tach_window_cycles > 0);
        assert!(r.initial_running);
    }
}
