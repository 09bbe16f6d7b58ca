//! Fan tachometer capture.
//!
//! Each fan's tach line raises a falling-edge interrupt.  The ISR records
//! the time since the previous edge into a [`PulseCapture`] and sets
//! `ready` as its last action.  The control loop takes the record once per
//! cycle: it copies the pulse length and clears `ready` inside the same
//! critical section, so it can never observe a half-written record.
//!
//! ```text
//!  ISR (producer)                     control loop (consumer)
//!  ──────────────                     ───────────────────────
//!  on_edge(now) ─▶ [ PulseCapture ] ─▶ take() ─▶ SampleFilter<10>
//!                   ready / len            once per cycle
//! ```
//!
//! Edges between two consumptions overwrite each other: only the most
//! recent pulse of each cycle is sampled.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use super::filter::SampleFilter;

/// Pulse-length smoothing window (samples).
pub const TACH_FILTER_LEN: usize = 10;

/// The record shared between the edge interrupt and the control loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PulseCapture {
    /// A fresh `pulse_len_us` is waiting to be consumed.
    pub ready: bool,
    /// Timestamp of the previous edge (µs).
    pub last_pulse_us: u32,
    /// Timestamp of the latest edge (µs).
    pub current_pulse_us: u32,
    /// Time between the last two edges (µs).
    pub pulse_len_us: u32,
    /// At least one edge has been seen, so `last_pulse_us` is meaningful.
    primed: bool,
}

/// Interrupt-safe handoff cell for one fan.
pub struct TachChannel {
    capture: Mutex<CriticalSectionRawMutex, Cell<PulseCapture>>,
}

impl Default for TachChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl TachChannel {
    pub const fn new() -> Self {
        Self {
            capture: Mutex::new(Cell::new(PulseCapture {
                ready: false,
                last_pulse_us: 0,
                current_pulse_us: 0,
                pulse_len_us: 0,
                primed: false,
            })),
        }
    }

    /// Record a falling edge.  Called from interrupt context.
    ///
    /// The first edge after reset only primes the timestamp.
    pub fn on_edge(&self, now_us: u32) {
        self.capture.lock(|cell| {
            let mut c = cell.get();
            c.current_pulse_us = now_us;
            let len = now_us.wrapping_sub(c.last_pulse_us);
            let primed = c.primed;
            c.last_pulse_us = now_us;
            c.primed = true;
            if primed && len > 0 {
                c.pulse_len_us = len;
                c.ready = true;
            }
            cell.set(c);
        });
    }

    /// Consume the pending pulse, if any, and clear `ready`.
    pub fn take(&self) -> Option<u32> {
        self.capture.lock(|cell| {
            let mut c = cell.get();
            if !c.ready {
                return None;
            }
            c.ready = false;
            cell.set(c);
            Some(c.pulse_len_us)
        })
    }

    /// Copy of the whole record (diagnostics).
    pub fn snapshot(&self) -> PulseCapture {
        self.capture.lock(Cell::get)
    }

    /// Forget every edge seen so far.
    pub fn reset(&self) {
        self.capture.lock(|cell| cell.set(PulseCapture::default()));
    }
}

/// Top fan capture, fed by [`top_fan_isr`].
pub static TOP_FAN_TACH: TachChannel = TachChannel::new();
/// Bottom fan capture, fed by [`bottom_fan_isr`].
pub static BOTTOM_FAN_TACH: TachChannel = TachChannel::new();

/// Falling-edge handler for the top fan tach pin.
pub fn top_fan_isr(now_us: u32) {
    TOP_FAN_TACH.on_edge(now_us);
}

/// Falling-edge handler for the bottom fan tach pin.
pub fn bottom_fan_isr(now_us: u32) {
    BOTTOM_FAN_TACH.on_edge(now_us);
}

/// RPM = `factor` × 1 000 000 / pulse length (µs).
pub fn rpm_from_pulse_us(pulse_us: f32, factor: f32) -> f32 {
    if pulse_us <= 0.0 {
        return 0.0;
    }
    factor * 1_000_000.0 / pulse_us
}

/// Result of one reporting window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TachReport {
    /// Smoothed speed, `0.0` if the window saw no pulses.
    pub rpm: f32,
    /// Pulses consumed during the window.
    pub pulses: u32,
}

/// Loop-side consumer for one fan.
pub struct Tachometer {
    channel: &'static TachChannel,
    filter: SampleFilter<TACH_FILTER_LEN>,
    rpm_factor: f32,
    window_pulses: u32,
    window_cycles: u32,
}

impl Tachometer {
    pub fn new(channel: &'static TachChannel, rpm_factor: f32) -> Self {
        Self {
            channel,
            filter: SampleFilter::new(),
            rpm_factor,
            window_pulses: 0,
            window_cycles: 0,
        }
    }

    /// Consume this cycle's pulse and, at the end of a reporting window of
    /// `window_len` cycles, return the window's report.
    pub fn sample(&mut self, window_len: u32) -> Option<TachReport> {
        if let Some(len) = self.channel.take() {
            self.filter.add(len as f32);
            self.window_pulses = self.window_pulses.saturating_add(1);
        }

        self.window_cycles += 1;
        if self.window_cycles < window_len.max(1) {
            return None;
        }

        let pulses = self.window_pulses;
        let rpm = if pulses == 0 {
            // Stale samples from an earlier window must not keep reporting
            // a speed for a fan that stopped.
            self.filter.clear();
            0.0
        } else {
            rpm_from_pulse_us(self.filter.average(), self.rpm_factor)
        };
        self.window_pulses = 0;
        self.window_cycles = 0;
        Some(TachReport { rpm, pulses })
    }

    /// Samples currently held by the smoothing window.
    pub fn filtered_samples(&self) -> usize {
        self.filter.count()
    }
}
