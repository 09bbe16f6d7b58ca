//! Cooling state machine.
//!
//! ```text
//!            T > SP + H            valve_time ≥ valve_lockout
//!   ┌──────┐ ───────────▶ ┌───────────┐ ─────────────────────────▶ ┌─────────┐
//!   │ Idle │              │ ValveOpen │  compressor_time ≥ lockout │ Cooling │
//!   └──────┘ ◀─────────── └───────────┘                            └─────────┘
//!       ▲      T ≤ SP − H,                                              │
//!       │      compressor_time ≥ compressor_lockout                     │
//!       └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Engaging opens the valve first and only starts the compressor after the
//! valve has been open for `valve_lockout` and the compressor has been idle
//! for `compressor_lockout`.  Disengaging drops everything at once, but
//! only `compressor_lockout` after the last compressor toggle.  A cold
//! reservoir keeps re-arming both lockouts from Idle too, once per elapsed
//! `compressor_lockout`.  Between the two thresholds (the dead band)
//! nothing changes.
//!
//! The state is not stored; it is derived from the commanded relays, so the
//! two can never disagree.

use log::info;

use crate::config::Settings;

use super::context::{ControlContext, FAN_FULL, FAN_OFF};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CoolingState {
    Idle = 0,
    ValveOpen = 1,
    Cooling = 2,
}

impl CoolingState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::ValveOpen => "ValveOpen",
            Self::Cooling => "Cooling",
        }
    }
}

impl core::fmt::Display for CoolingState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// A state change made by one [`step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: CoolingState,
    pub to: CoolingState,
}

/// Run one cycle of the state machine against `ctx.readings`.
///
/// Expects `compressor_time` and `valve_time` to have been refreshed for
/// `now_ms`.  Does nothing while the running override is off.
pub fn step(ctx: &mut ControlContext, settings: &Settings, now_ms: u32) -> Option<Transition> {
    if !ctx.running {
        return None;
    }

    let from = ctx.state();
    let temperature = ctx.readings.reservoir.temperature;
    let setpoint = ctx.readings.reservoir.setpoint;
    let compressor_time = ctx.readings.compressor.compressor_time;
    let mut valve_time = ctx.readings.compressor.valve_time;

    // ── Engage ────────────────────────────────────────────────────
    if temperature > setpoint + settings.hysteresis {
        if !ctx.commands.valve {
            ctx.commands.valve = true;
            ctx.timers.last_valve_toggle = now_ms;
            valve_time = 0;
        }
        if !ctx.commands.compressor
            && valve_time >= settings.valve_lockout
            && compressor_time >= settings.compressor_lockout
        {
            ctx.commands.compressor = true;
            ctx.commands.fan_pwm = FAN_FULL;
            ctx.timers.last_compressor_toggle = now_ms;
        }
    }

    // ── Disengage ─────────────────────────────────────────────────
    if temperature <= setpoint - settings.hysteresis
        && compressor_time >= settings.compressor_lockout
    {
        ctx.commands.valve = false;
        ctx.commands.compressor = false;
        ctx.commands.fan_pwm = FAN_OFF;
        ctx.timers.last_valve_toggle = now_ms;
        ctx.timers.last_compressor_toggle = now_ms;
    }

    let to = ctx.state();
    if to == from {
        return None;
    }
    info!("COOLING: {from} -> {to} (T={temperature:.2} SP={setpoint:.2})");
    Some(Transition { from, to })
}
