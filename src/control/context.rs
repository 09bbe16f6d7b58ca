//! Shared mutable context threaded through the control cycle.
//!
//! `ControlContext` is the single struct the sensor hub, the fault monitor
//! and the cooling state machine read from and write to: the latest
//! [`Readings`], the commanded outputs, the lockout timestamps and the
//! running override.

use crate::config::RuntimeConfig;
use crate::readings::Readings;

use super::thermal::CoolingState;

/// Fan duty with the compressor running.
pub const FAN_FULL: u8 = 255;
/// Fan duty at rest.
pub const FAN_OFF: u8 = 0;

// ---------------------------------------------------------------------------
// Lockout timers
// ---------------------------------------------------------------------------

/// Timestamps (ms since boot) of the last relay toggles.
///
/// Elapsed times use wrapping arithmetic, so the 49.7-day rollover of the
/// millisecond counter does not stall the lockouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockoutTimers {
    pub last_compressor_toggle: u32,
    pub last_valve_toggle: u32,
}

impl LockoutTimers {
    pub fn starting_at(now_ms: u32) -> Self {
        Self {
            last_compressor_toggle: now_ms,
            last_valve_toggle: now_ms,
        }
    }

    pub fn compressor_elapsed(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.last_compressor_toggle)
    }

    pub fn valve_elapsed(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.last_valve_toggle)
    }
}

// ---------------------------------------------------------------------------
// Output commands (written by the state machine; applied by the service)
// ---------------------------------------------------------------------------

/// Outputs the cooling state machine wants.  The service applies them to
/// the actuator port every cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputCommands {
    pub valve: bool,
    pub compressor: bool,
    pub fan_pwm: u8,
}

impl OutputCommands {
    /// Everything off.
    pub fn all_off() -> Self {
        Self::default()
    }

    /// State implied by the commanded relays.
    pub fn state(&self) -> CoolingState {
        match (self.valve, self.compressor) {
            (_, true) => CoolingState::Cooling,
            (true, false) => CoolingState::ValveOpen,
            (false, false) => CoolingState::Idle,
        }
    }
}

// ---------------------------------------------------------------------------
// ControlContext
// ---------------------------------------------------------------------------

pub struct ControlContext {
    pub readings: Readings,
    pub commands: OutputCommands,
    pub timers: LockoutTimers,
    /// Operator run/stop override.  While `false` the state machine holds
    /// its outputs.
    pub running: bool,
}

impl ControlContext {
    pub fn new(runtime: &RuntimeConfig, now_ms: u32) -> Self {
        Self {
            readings: Readings::with_setpoint(runtime.initial_setpoint),
            commands: OutputCommands::all_off(),
            timers: LockoutTimers::starting_at(now_ms),
            running: runtime.initial_running,
        }
    }

    /// Recompute `compressor_time` and `valve_time` in the readings.
    pub fn refresh_elapsed(&mut self, now_ms: u32) {
        self.readings.compressor.compressor_time = self.timers.compressor_elapsed(now_ms);
        self.readings.compressor.valve_time = self.timers.valve_elapsed(now_ms);
    }

    pub fn state(&self) -> CoolingState {
        self.commands.state()
    }
}
