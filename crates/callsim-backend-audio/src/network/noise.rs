//! Additive gaussian noise: RF interference and codec sizzle.

use rand::Rng;

use crate::rng::gaussian;

/// Standard deviation of RF noise at amount 1.0.
pub const RF_SIGMA: f64 = 0.02;

/// Standard deviation of sizzle at amount 1.0.
pub const SIZZLE_SIGMA: f64 = 0.01;

/// Adds gaussian noise of standard deviation `sigma`.
pub fn add_gaussian<R: Rng + ?Sized>(samples: &mut [f64], sigma: f64, rng: &mut R) {
    if sigma <= 0.0 {
        return;
    }
    for s in samples.iter_mut() {
        *s += sigma * gaussian(rng);
    }
}

/// RF interference, σ = 0.02·amount.
pub fn rf<R: Rng + ?Sized>(samples: &mut [f64], amount: f64, rng: &mut R) {
    add_gaussian(samples, RF_SIGMA * amount, rng);
}

/// High-frequency codec sizzle, σ = 0.01·amount.
pub fn sizzle<R: Rng + ?Sized>(samples: &mut [f64], amount: f64, rng: &mut R) {
    add_gaussian(samples, SIZZLE_SIGMA * amount, rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::rms;
    use crate::rng::create_rng;

    #[test]
    fn test_rf_noise_level() {
        let mut x = vec![0.0; 100_000];
        rf(&mut x, 1.0, &mut create_rng(8));
        assert!((rms(&x) - RF_SIGMA).abs() < 0.001);
    }

    #[test]
    fn test_zero_amount_is_noop() {
        let mut x = vec![0.25; 100];
        sizzle(&mut x, 0.0, &mut create_rng(8));
        assert_eq!(x, vec![0.25; 100]);
    }
}
