//! Filter differential-pressure sensor.
//!
//! Analog ΔP transducer across the coolant filter, read as raw ADC counts
//! and averaged over 100 samples.  The reported value is the average above
//! the configured zero offset; a clogging filter pushes it up.

use super::filter::SampleFilter;

/// ΔP smoothing window (samples).
pub const PRESSURE_FILTER_LEN: usize = 100;

pub struct FilterPressure {
    filter: SampleFilter<PRESSURE_FILTER_LEN>,
}

impl Default for FilterPressure {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterPressure {
    pub const fn new() -> Self {
        Self {
            filter: SampleFilter::new(),
        }
    }

    pub fn add(&mut self, raw: u16) {
        self.filter.add(f32::from(raw));
    }

    pub fn has_data(&self) -> bool {
        !self.filter.is_empty()
    }

    /// Averaged counts above `zero`, saturating at 0.
    pub fn differential(&self, zero: u16) -> u16 {
        let avg = self.filter.average().round().clamp(0.0, f32::from(u16::MAX)) as u16;
        avg.saturating_sub(zero)
    }
}
