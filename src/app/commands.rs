//! Inbound commands to the application service.
//!
//! Actions requested by the outside world (front panel, serial console,
//! test harness) that the [`ChillerService`](super::service::ChillerService)
//! interprets and acts upon.

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppCommand {
    /// Change the reservoir setpoint (°C).
    SetSetpoint(f32),

    /// Manual run/stop override.  While stopped the cooling state machine
    /// holds its current outputs.
    SetRunning(bool),

    /// Clear the latched fault code and silence the alarm.
    ClearFault,
}
