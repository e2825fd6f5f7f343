//! Out-of-order packet delivery.
//!
//! The buffer is split into 20–40 ms packets. A held packet leaves a silent
//! gap in its slot and is later played back, shuffled with the other held
//! packets, when the hold buffer flushes.

use rand::seq::SliceRandom;
use rand::Rng;

/// A hold buffer flushes once it holds this many packets.
const MAX_HELD: usize = 3;

/// Chance a held packet triggers an early flush.
const EARLY_FLUSH_PROB: f64 = 0.3;

/// Reorders packets with probability `prob`; output length equals input length.
pub fn apply<R: Rng + ?Sized>(samples: &[f64], prob: f64, sample_rate: u32, rng: &mut R) -> Vec<f64> {
    if prob <= 0.0 || samples.is_empty() {
        return samples.to_vec();
    }
    let prob = prob.min(1.0);
    let packet = ((rng.gen_range(0.02..0.04) * sample_rate as f64) as usize).max(1);

    let mut out: Vec<f64> = Vec::with_capacity(samples.len() + packet * MAX_HELD);
    let mut held: Vec<&[f64]> = Vec::with_capacity(MAX_HELD);

    for chunk in samples.chunks(packet) {
        if rng.gen::<f64>() < prob {
            held.push(chunk);
            if held.len() >= MAX_HELD || rng.gen::<f64>() < EARLY_FLUSH_PROB {
                flush(&mut held, &mut out, rng);
            } else {
                out.extend(std::iter::repeat(0.0).take(chunk.len()));
            }
        } else {
            if !held.is_empty() {
                flush(&mut held, &mut out, rng);
            }
            out.extend_from_slice(chunk);
        }
    }
    if !held.is_empty() {
        flush(&mut held, &mut out, rng);
    }

    out.resize(samples.len(), 0.0);
    out
}

fn flush<R: Rng + ?Sized>(held: &mut Vec<&[f64]>, out: &mut Vec<f64>, rng: &mut R) {
    held.shuffle(rng);
    for p in held.drain(..) {
        out.extend_from_slice(p);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::create_rng;

    #[test]
    fn test_zero_prob_is_identity() {
        let x: Vec<f64> = (0..4800).map(|i| i as f64).collect();
        assert_eq!(apply(&x, 0.0, 48_000, &mut create_rng(1)), x);
    }

    #[test]
    fn test_length_preserved() {
        let x: Vec<f64> = (0..48_000).map(|i| i as f64 + 1.0).collect();
        for seed in 0..5 {
            let y = apply(&x, 0.4, 48_000, &mut create_rng(seed));
            assert_eq!(y.len(), x.len());
        }
    }

    #[test]
    fn test_reordering_moves_samples() {
        let x: Vec<f64> = (0..48_000).map(|i| i as f64 + 1.0).collect();
        let y = apply(&x, 0.5, 48_000, &mut create_rng(9));
        assert_ne!(y, x);
        // Every non-gap sample is an input sample
        assert!(y.iter().all(|&v| v == 0.0 || (v >= 1.0 && v <= 48_000.0 && v.fract() == 0.0)));
    }
}
