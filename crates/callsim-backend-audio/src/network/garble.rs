//! Garble: short windows pitch-warped by a random resampling factor.

use rand::Rng;

use crate::buffer::{ms_to_samples, stretch_to_len};

/// Garble window length in milliseconds.
pub const WINDOW_MS: f64 = 60.0;

/// Largest deviation of the resampling factor from 1.0.
pub const MAX_WARP: f64 = 0.2;

/// Resamples random 60 ms windows by `1 ± U(0.2)`, zero-padding or
/// truncating each back to its original length.
pub fn apply<R: Rng + ?Sized>(samples: &mut [f64], prob: f64, sample_rate: u32, rng: &mut R) {
    if prob <= 0.0 {
        return;
    }
    let prob = prob.min(1.0);
    let window = ms_to_samples(WINDOW_MS, sample_rate).max(1);
    for block in samples.chunks_mut(window) {
        if rng.gen::<f64>() >= prob {
            continue;
        }
        let factor = 1.0 + rng.gen_range(-MAX_WARP..MAX_WARP);
        let new_len = (block.len() as f64 / factor) as usize;
        if new_len == 0 {
            continue;
        }
        let warped = stretch_to_len(block, new_len);
        for (i, s) in block.iter_mut().enumerate() {
            *s = warped.get(i).copied().unwrap_or(0.0);
        }
    }
}
