//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (UART console on the board, `env_logger` on the host).
//! A front-panel display adapter would implement the same trait.

use log::{error, info};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::error::FaultCode;

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(r) => {
                info!(
                    "TELEM | T={:.2}/{:.1}\u{00b0}C | level={:.0}/{:.0} | case={:.1}\u{00b0}C \
                     {:.0}%RH | out={:.1}\u{00b0}C | dP={} | fans={:.0}/{:.0}rpm pwm={} | \
                     valve={} comp={} ({}ms/{}ms) | pump={} flow={} | alert={} code={}",
                    r.reservoir.temperature,
                    r.reservoir.setpoint,
                    r.reservoir.level_sense,
                    r.reservoir.level_ref,
                    r.chassis.inside_temperature,
                    r.chassis.humidity,
                    r.chassis.outside_temperature,
                    r.chassis.filter_dp,
                    r.chassis.fan.top_tach,
                    r.chassis.fan.bottom_tach,
                    r.chassis.fan.pwm,
                    on_off(r.compressor.valve),
                    on_off(r.compressor.running),
                    r.compressor.valve_time,
                    r.compressor.compressor_time,
                    on_off(r.pump.running),
                    if r.pump.flow_ok { "OK" } else { "NONE" },
                    r.error.alert,
                    r.error.code,
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {from} -> {to}");
            }
            AppEvent::FaultLatched(code) => {
                error!("FAULT | latched {code}");
            }
            AppEvent::FaultCleared => {
                info!("FAULT | cleared");
            }
            AppEvent::Started(state) => {
                info!("START | initial_state={state}");
            }
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

/// Human-readable name for a raw wire code (0 = no fault).
pub fn describe_code(code: u16) -> String {
    match FaultCode::from_code(code) {
        Some(fault) => fault.to_string(),
        None if code == 0 => "no fault".to_owned(),
        None => format!("unknown fault (code {code})"),
    }
}
