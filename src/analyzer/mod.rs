use rayon::prelude::*;

use crate::decoder::FrameData;

/// Channel values per rayon task when summing squared differences.
const DIFF_CHUNK: usize = 64 * 1024;

/// Decides whether a sampled frame repeats the last kept one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimilarityFilter {
    threshold: f64,
}

impl SimilarityFilter {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Identical frames always skip; otherwise skip when the score is below the threshold.
    pub fn should_skip(&self, previous: Option<&FrameData>, current: &FrameData) -> bool {
        match previous {
            None => false,
            Some(prev) => {
                let score = Self::difference_score(prev, current);
                score == 0.0 || score < self.threshold
            }
        }
    }

    /// Mean squared difference over every channel value.
    ///
    /// Frames of different shape score `f64::INFINITY` so they are never treated as repeats.
    pub fn difference_score(a: &FrameData, b: &FrameData) -> f64 {
        if !a.same_shape(b) {
            return f64::INFINITY;
        }
        if a.buffer.is_empty() {
            return 0.0;
        }

        // |a-b|^2 fits u32 per value; u64 keeps the sum exact for any real frame size
        let sum: u64 = a
            .buffer
            .par_chunks(DIFF_CHUNK)
            .zip(b.buffer.par_chunks(DIFF_CHUNK))
            .map(|(ca, cb)| {
                ca.iter()
                    .zip(cb)
                    .map(|(&x, &y)| {
                        let d = x.abs_diff(y) as u64;
                        d * d
                    })
                    .sum::<u64>()
            })
            .sum();

        sum as f64 / a.buffer.len() as f64
    }
}
