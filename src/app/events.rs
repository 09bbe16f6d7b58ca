//! Outbound application events.
//!
//! The [`ChillerService`](super::service::ChillerService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on the
//! other side decide what to do with them: log to the console, drive a
//! front-panel display, forward over the telemetry link.

use crate::control::CoolingState;
use crate::error::FaultCode;
use crate::readings::Readings;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started (carries the initial cooling state).
    Started(CoolingState),

    /// The cooling state machine changed state.
    StateChanged { from: CoolingState, to: CoolingState },

    /// A fault was latched, or replaced the previously latched code.
    FaultLatched(FaultCode),

    /// The latch was explicitly cleared.
    FaultCleared,

    /// End-of-cycle snapshot.
    Telemetry(Readings),
}
