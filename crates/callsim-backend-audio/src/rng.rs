//! Deterministic RNG using PCG32 with BLAKE3 seed derivation.
//!
//! All randomness in a render flows through this module. Each stochastic
//! stage gets its own stream from [`create_stage_rng`], keyed by the stage
//! name, the render's global seed and a local index.

use callsim_spec::hash::substream_seed;
use rand::Rng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use rand_pcg::Pcg32;

/// Creates a PCG32 RNG from a 32-bit seed.
///
/// The 32-bit seed is expanded to 64 bits by duplicating the value in both
/// halves, as required by PCG32's state initialization.
pub fn create_rng(seed: u32) -> Pcg32 {
    let seed64 = (seed as u64) | ((seed as u64) << 32);
    Pcg32::seed_from_u64(seed64)
}

/// Creates the RNG for one stochastic stage of a render.
///
/// # Arguments
/// * `stage` - Stable stage name (e.g. "dropout")
/// * `global_seed` - The render's global seed
/// * `local_index` - Distinguishes several uses of one stage
pub fn create_stage_rng(stage: &str, global_seed: u32, local_index: u32) -> Pcg32 {
    create_rng(substream_seed(stage, global_seed, local_index))
}

/// Draws one standard normal sample.
#[inline]
pub fn gaussian<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    StandardNormal.sample(rng)
}

/// Fills a vector with `n` normal samples of standard deviation `sigma`.
pub fn gaussian_noise<R: Rng + ?Sized>(rng: &mut R, n: usize, sigma: f64) -> Vec<f64> {
    (0..n).map(|_| sigma * gaussian(rng)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_determinism() {
        let mut rng1 = create_rng(42);
        let mut rng2 = create_rng(42);

        let values1: Vec<f64> = (0..100).map(|_| rng1.gen()).collect();
        let values2: Vec<f64> = (0..100).map(|_| rng2.gen()).collect();

        assert_eq!(values1, values2);
    }

    #[test]
    fn test_stage_streams_are_independent() {
        let mut dropout = create_stage_rng("dropout", 42, 0);
        let mut garble = create_stage_rng("garble", 42, 0);

        let a: Vec<u32> = (0..10).map(|_| dropout.gen()).collect();
        let b: Vec<u32> = (0..10).map(|_| garble.gen()).collect();

        assert_ne!(a, b);
    }

    #[test]
    fn test_gaussian_noise_statistics() {
        let mut rng = create_rng(7);
        let noise = gaussian_noise(&mut rng, 20_000, 0.5);
        let mean = noise.iter().sum::<f64>() / noise.len() as f64;
        let var = noise.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / noise.len() as f64;

        assert!(mean.abs() < 0.02, "mean {mean}");
        assert!((var.sqrt() - 0.5).abs() < 0.02, "std {}", var.sqrt());
    }
}
