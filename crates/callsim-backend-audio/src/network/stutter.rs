//! Stutter: 50 ms windows repeated as if a jitter buffer replayed them.

use rand::Rng;

use crate::buffer::ms_to_samples;

/// Stutter window length in milliseconds.
pub const WINDOW_MS: f64 = 50.0;

/// Writes each 50 ms window once, or with probability `amount` 1 to 3 times,
/// then truncates back to the input length.
pub fn apply<R: Rng + ?Sized>(samples: &[f64], amount: f64, sample_rate: u32, rng: &mut R) -> Vec<f64> {
    if amount <= 0.0 || samples.is_empty() {
        return samples.to_vec();
    }
    let amount = amount.min(1.0);
    let window = ms_to_samples(WINDOW_MS, sample_rate).max(1);

    let mut out = Vec::with_capacity(samples.len() + window * 2);
    for chunk in samples.chunks(window) {
        let copies = if rng.gen::<f64>() < amount { rng.gen_range(1..=3) } else { 1 };
        for _ in 0..copies {
            out.extend_from_slice(chunk);
        }
        if out.len() >= samples.len() {
            break;
        }
    }
    out.truncate(samples.len());
    out
}
