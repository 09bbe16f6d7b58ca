//! Board capability table.
//!
//! Single source of truth for everything that differs between hardware
//! revisions of the CW-5200 controller: pin map, probe ROM addresses,
//! tachometer scaling, level sensing and the probe read policy.  The
//! revision is chosen once at startup; nothing else in the crate branches
//! on hardware.

use crate::sensors::probe::DeviceAddress;

/// Known controller board revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardRevision {
    /// Prototype: time-of-flight reservoir level, retrying probe reads.
    RevA,
    /// Production: eTape level sense + reference resistor, single-shot probe reads.
    RevB,
}

/// How the reservoir level is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelSensing {
    /// Time-of-flight ranging; no reference channel.
    TimeOfFlight,
    /// Resistive eTape with a reference strip for temperature compensation.
    ETape,
}

/// GPIO / analog assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    /// Digital input: top fan tachometer (falling-edge interrupt).
    pub top_fan_tach: u8,
    /// Digital input: bottom fan tachometer (falling-edge interrupt).
    pub bottom_fan_tach: u8,
    /// PWM output: fan speed.
    pub fan_pwm: u8,
    /// Digital input with pull-up: flow switch, LOW = flow OK.
    pub flow_switch: u8,
    pub pump_relay: u8,
    pub valve_relay: u8,
    pub compressor_relay: u8,
    pub alarm_relay: u8,
    /// DS18B20 one-wire bus.
    pub one_wire: u8,
    pub i2c_sda: u8,
    pub i2c_scl: u8,
    /// Analog input: filter differential pressure.
    pub filter_dp_adc: u8,
}

/// Everything the control core needs to know about one board revision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardProfile {
    pub revision: BoardRevision,
    pub pins: PinMap,
    pub reservoir_probe: DeviceAddress,
    pub outside_probe: DeviceAddress,
    /// Tachometer scaling: RPM = `tach_rpm_factor` × 1e6 / pulse µs.
    /// 30.0 for two tach pulses per revolution.
    pub tach_rpm_factor: f32,
    pub level_sensing: LevelSensing,
    /// Attempts per probe read before accepting a disconnection.
    pub probe_read_attempts: u8,
}

const PINS: PinMap = PinMap {
    top_fan_tach: 0,
    bottom_fan_tach: 1,
    fan_pwm: 5,
    flow_switch: 8,
    pump_relay: 9,
    valve_relay: 10,
    compressor_relay: 11,
    alarm_relay: 12,
    one_wire: 2,
    i2c_sda: 18,
    i2c_scl: 19,
    filter_dp_adc: 14, // A0
};

const RESERVOIR_PROBE: DeviceAddress =
    DeviceAddress([0x28, 0xFF, 0x02, 0x5D, 0xC1, 0x17, 0x05, 0xCB]);
const OUTSIDE_PROBE: DeviceAddress =
    DeviceAddress([0x28, 0x4E, 0x6A, 0x45, 0x92, 0x17, 0x02, 0xEC]);

/// Two tach pulses per revolution: 60 s/min ÷ 2.
pub const TACH_RPM_FACTOR: f32 = 30.0;

pub const CW5200_REV_A: BoardProfile = BoardProfile {
    revision: BoardRevision::RevA,
    pins: PINS,
    reservoir_probe: RESERVOIR_PROBE,
    outside_probe: OUTSIDE_PROBE,
    tach_rpm_factor: TACH_RPM_FACTOR,
    level_sensing: LevelSensing::TimeOfFlight,
    probe_read_attempts: 3,
};

pub const CW5200_REV_B: BoardProfile = BoardProfile {
    revision: BoardRevision::RevB,
    pins: PINS,
    reservoir_probe: RESERVOIR_PROBE,
    outside_probe: OUTSIDE_PROBE,
    tach_rpm_factor: TACH_RPM_FACTOR,
    level_sensing: LevelSensing::ETape,
    probe_read_attempts: 1,
};

impl BoardProfile {
    /// Look up the profile for a revision.
    pub const fn for_revision(revision: BoardRevision) -> &'static Self {
        match revision {
            BoardRevision::RevA => &CW5200_REV_A,
            BoardRevision::RevB => &CW5200_REV_B,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_matches_revision() {
        for rev in [BoardRevision::RevA, BoardRevision::RevB] {
            assert_eq!(BoardProfile::for_revision(rev).revision, rev);
        }
    }

    #[test]
    fn lookup_returns_the_revision_table() {
        assert_eq!(*BoardProfile::for_revision(BoardRevision::RevA), CW5200_REV_A);
        assert_eq!(*BoardProfile::for_revision(BoardRevision::RevB), CW5200_REV_B);
        assert_ne!(CW5200_REV_A, CW5200_REV_B);
    }

    #[test]
    fn probes_have_distinct_ds18b20_addresses() {
        let p = BoardProfile::for_revision(BoardRevision::RevB);
        assert_ne!(p.reservoir_probe, p.outside_probe);
        // DS18B20 family code.
        assert_eq!(p.reservoir_probe.0[0], 0x28);
        assert_eq!(p.outside_probe.0[0], 0x28);
    }

    #[test]
    fn only_prototype_retries_probe_reads() {
        assert_eq!(CW5200_REV_A.probe_read_attempts, 3);
        assert_eq!(CW5200_REV_B.probe_read_attempts, 1);
    }

    #[test]
    fn relay_pins_do_not_collide() {
        let p = PINS;
        let relays = [p.pump_relay, p.valve_relay, p.compressor_relay, p.alarm_relay];
        for (i, a) in relays.iter().enumerate() {
            for b in &relays[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
