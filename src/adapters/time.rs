//! Monotonic time source for the control loop and the tach interrupts.
//!
//! The control core works in wrapping 32-bit milliseconds; the tach edge
//! handlers in wrapping 32-bit microseconds, the resolution of the MCU's
//! free-running timer.  On the host both derive from
//! `std::time::Instant`.

use std::time::Instant;

pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Milliseconds since start, wrapping at `u32::MAX`.
    pub fn now_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }

    /// Microseconds since start, wrapping at `u32::MAX`.
    pub fn now_us(&self) -> u32 {
        self.start.elapsed().as_micros() as u32
    }
}
