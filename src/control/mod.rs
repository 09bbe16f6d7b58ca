//! Reservoir temperature control.
//!
//! [`context`] holds the blackboard shared by one control cycle and
//! [`thermal`] the valve/compressor state machine that acts on it.

pub mod context;
pub mod thermal;

pub use context::{ControlContext, LockoutTimers, OutputCommands};
pub use thermal::{CoolingState, Transition};
