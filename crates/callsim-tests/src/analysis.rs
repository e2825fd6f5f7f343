//! Spectral measurements for render assertions.

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Power spectrum of the whole signal as (frequency in Hz, power) pairs for
/// the non-negative bins.
pub fn power_spectrum(samples: &[f64], sample_rate: u32) -> Vec<(f64, f64)> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    let mut buf: Vec<Complex<f64>> = samples.iter().map(|&s| Complex::new(s, 0.0)).collect();
    fft.process(&mut buf);

    let bin_hz = sample_rate as f64 / n as f64;
    buf[..n / 2 + 1]
        .iter()
        .enumerate()
        .map(|(k, z)| (k as f64 * bin_hz, z.norm_sqr()))
        .collect()
}

/// Spectral energy between `low_hz` and `high_hz`.
pub fn band_energy(samples: &[f64], sample_rate: u32, low_hz: f64, high_hz: f64) -> f64 {
    power_spectrum(samples, sample_rate)
        .into_iter()
        .filter(|(f, _)| *f >= low_hz && *f < high_hz)
        .map(|(_, p)| p)
        .sum()
}

/// Fraction of the total spectral energy at or above `hz`.
pub fn energy_fraction_above(samples: &[f64], sample_rate: u32, hz: f64) -> f64 {
    let spectrum = power_spectrum(samples, sample_rate);
    let total: f64 = spectrum.iter().map(|(_, p)| p).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let above: f64 = spectrum.iter().filter(|(f, _)| *f >= hz).map(|(_, p)| p).sum();
    above / total
}

/// Mean spectral magnitude of `a - b` between `low_hz` and `high_hz`.
pub fn mean_difference_magnitude(a: &[f64], b: &[f64], sample_rate: u32, low_hz: f64, high_hz: f64) -> f64 {
    let diff: Vec<f64> = a.iter().zip(b).map(|(x, y)| x - y).collect();
    let bins: Vec<f64> = power_spectrum(&diff, sample_rate)
        .into_iter()
        .filter(|(f, _)| *f >= low_hz && *f < high_hz)
        .map(|(_, p)| p.sqrt())
        .collect();
    if bins.is_empty() {
        return 0.0;
    }
    bins.iter().sum::<f64>() / bins.len() as f64
}

/// Largest absolute sample difference.
pub fn max_abs_difference(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max)
}
