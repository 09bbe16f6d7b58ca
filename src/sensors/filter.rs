//! Fixed-window running average.
//!
//! A circular buffer of the last `N` samples with an incrementally
//! maintained sum, so both insertion and the mean are O(1).  Once full,
//! each new sample overwrites the oldest in place.

/// Running-average smoother over the most recent `N` samples.
#[derive(Debug, Clone)]
pub struct SampleFilter<const N: usize> {
    ring: [f32; N],
    head: usize,
    count: usize,
    sum: f32,
}

impl<const N: usize> Default for SampleFilter<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> SampleFilter<N> {
    pub const fn new() -> Self {
        Self {
            ring: [0.0; N],
            head: 0,
            count: 0,
            sum: 0.0,
        }
    }

    /// Insert one sample, evicting the oldest when the window is full.
    pub fn add(&mut self, sample: f32) {
        if N == 0 {
            return;
        }
        if self.count == N {
            self.sum -= self.ring[self.head];
        } else {
            self.count += 1;
        }
        self.ring[self.head] = sample;
        self.sum += sample;
        self.head = (self.head + 1) % N;
    }

    /// Mean of the samples currently held; `0.0` when empty.
    ///
    /// Check [`count`](Self::count) first: an empty filter has no data,
    /// which is not the same thing as an average of zero.
    pub fn average(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum / self.count as f32
    }

    /// Samples currently held (≤ `N`).
    pub fn count(&self) -> usize {
        self.count
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Drop every sample.
    pub fn clear(&mut self) {
        self.head = 0;
        self.count = 0;
        self.sum = 0.0;
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn mean_covers_exactly_the_last_window(
            samples in proptest::collection::vec(-500i32..500, 10..300),
        ) {
            let mut f = SampleFilter::<10>::new();
            for s in &samples {
                f.add(*s as f32);
            }
            prop_assert_eq!(f.count(), 10);

            let tail = &samples[samples.len() - 10..];
            let expected = tail.iter().sum::<i32>() as f32 / 10.0;
            prop_assert!((f.average() - expected).abs() < 1e-3,
                "average {} != {}", f.average(), expected);
        }

        #[test]
        fn count_never_exceeds_capacity(n in 0usize..250) {
            let mut f = SampleFilter::<100>::new();
            for i in 0..n {
                f.add(i as f32);
            }
            prop_assert_eq!(f.count(), n.min(100));
        }
    }
}
