//! CW-5200 chiller controller library.
//!
//! Exposes the control core for the simulator binary, host tooling and
//! integration tests.  Everything outside `adapters` is free of I/O and
//! talks to the outside world through the traits in [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod board;
pub mod config;
pub mod control;
pub mod error;
pub mod link;
pub mod readings;
pub mod safety;
pub mod sensors;
pub mod telemetry;
