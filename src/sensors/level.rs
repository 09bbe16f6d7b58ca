//! Reservoir level smoothing.
//!
//! The eTape board samples a sense strip and a reference strip; both are
//! noisy ADC channels averaged over 100 samples.  The reference tracks
//! temperature drift of the strip, so the compensated level is the sense
//! average scaled by `reservoir_ref_zero / level_ref`.  Time-of-flight
//! boards have no reference channel and use the sense average directly.

use super::filter::SampleFilter;

/// Level smoothing window (samples).
pub const LEVEL_FILTER_LEN: usize = 100;

/// One raw level acquisition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelSample {
    pub sense: f32,
    /// `None` on boards without a reference strip.
    pub reference: Option<f32>,
}

pub struct ReservoirLevel {
    sense: SampleFilter<LEVEL_FILTER_LEN>,
    reference: SampleFilter<LEVEL_FILTER_LEN>,
}

impl Default for ReservoirLevel {
    fn default() -> Self {
        Self::new()
    }
}

impl ReservoirLevel {
    pub const fn new() -> Self {
        Self {
            sense: SampleFilter::new(),
            reference: SampleFilter::new(),
        }
    }

    pub fn add(&mut self, sample: LevelSample) {
        self.sense.add(sample.sense);
        if let Some(reference) = sample.reference {
            self.reference.add(reference);
        }
    }

    pub fn sense(&self) -> f32 {
        self.sense.average()
    }

    pub fn reference(&self) -> f32 {
        self.reference.average()
    }

    /// True once at least one sense sample is held.
    pub fn has_data(&self) -> bool {
        !self.sense.is_empty()
    }

    /// Temperature-compensated level, or `None` before the first sample.
    pub fn compensated(&self, ref_zero: u16) -> Option<f32> {
        if !self.has_data() {
            return None;
        }
        let reference = self.reference();
        if self.reference.is_empty() || reference <= 0.0 {
            return Some(self.sense());
        }
        Some(self.sense() * f32::from(ref_zero) / reference)
    }
}
