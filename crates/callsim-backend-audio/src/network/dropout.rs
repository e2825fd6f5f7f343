//! Packet-loss concealment dropouts.
//!
//! The buffer is cut into PLC-sized chunks and each chunk is independently
//! attenuated with the given probability. Concealment is modeled as a deep
//! level drop rather than digital silence.

use rand::Rng;

use crate::buffer::{db_to_amp, ms_to_samples};

/// Smallest chunk, in samples.
pub const MIN_CHUNK: usize = 8;

/// Attenuates random `chunk_ms` chunks by `depth_db` with probability `prob`.
///
/// A probability at or below zero leaves the buffer untouched.
pub fn apply<R: Rng + ?Sized>(
    samples: &mut [f64],
    prob: f64,
    chunk_ms: f64,
    depth_db: f64,
    sample_rate: u32,
    rng: &mut R,
) {
    if prob <= 0.0 {
        return;
    }
    let prob = prob.min(1.0);
    let chunk = ms_to_samples(chunk_ms, sample_rate).max(MIN_CHUNK);
    let gain = db_to_amp(depth_db);
    for block in samples.chunks_mut(chunk) {
        if rng.gen::<f64>() < prob {
            for s in block.iter_mut() {
                *s *= gain;
            }
        }
    }
}
