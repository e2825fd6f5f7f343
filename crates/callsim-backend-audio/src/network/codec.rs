//! Parametric codec-artifact emulation.
//!
//! These are heuristics that approximate the audible character of each codec
//! family, not bitstream implementations.

use std::f64::consts::PI;

use callsim_spec::CodecProfile;
use rand::Rng;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use tracing::warn;

use crate::buffer::ms_to_samples;
use crate::resample::resample;

/// Core length of one analytic-envelope block.
const HILBERT_BLOCK: usize = 16_384;

/// Context on each side of a block, discarded after the transform.
const HILBERT_MARGIN: usize = 1_024;

/// Applies the artifacts of `profile` scaled by `intensity` in [0, 1].
pub fn apply<R: Rng + ?Sized>(
    samples: &[f64],
    profile: CodecProfile,
    intensity: f64,
    sample_rate: u32,
    rng: &mut R,
) -> Vec<f64> {
    if intensity <= 0.0 || samples.is_empty() {
        return samples.to_vec();
    }
    let intensity = intensity.min(1.0);
    match profile {
        CodecProfile::AmrNb => amr_nb(samples, intensity, sample_rate, rng),
        CodecProfile::AmrWb => amr_wb(samples, intensity, sample_rate, rng),
        CodecProfile::Opus => opus(samples, intensity, sample_rate),
        CodecProfile::Evs => warble(samples, intensity * 0.02, rng.gen_range(0.1..0.5), sample_rate),
    }
}

/// Narrowband round trip through 8 kHz, a ~200 Hz comb modulation and
/// softened attacks.
fn amr_nb<R: Rng + ?Sized>(samples: &[f64], intensity: f64, sample_rate: u32, rng: &mut R) -> Vec<f64> {
    let n = samples.len();
    let narrow = match resample(samples, sample_rate, 8_000)
        .and_then(|down| resample(&down, 8_000, sample_rate))
    {
        Ok(mut up) => {
            up.resize(n, 0.0);
            up
        }
        Err(e) => {
            warn!(error = %e, "narrowband round trip failed");
            samples.to_vec()
        }
    };

    let comb_hz = 200.0 + rng.gen_range(-50.0..50.0);
    let envelope = analytic_envelope(samples);
    let smooth = moving_average(&envelope, ms_to_samples(5.0, sample_rate).max(1));

    (0..n)
        .map(|i| {
            let t = i as f64 / sample_rate as f64;
            let comb = 1.0 + intensity * 0.1 * (2.0 * PI * comb_hz * t).sin();
            let ratio = envelope[i] / (smooth[i] + 1e-10);
            let softening = 1.0 - intensity * 0.3 * (ratio - 1.0).clamp(0.0, 1.0);
            narrow[i] * comb * softening
        })
        .collect()
}

/// Light spectral smoothing plus a slow warble.
fn amr_wb<R: Rng + ?Sized>(samples: &[f64], intensity: f64, sample_rate: u32, rng: &mut R) -> Vec<f64> {
    let warble_hz = rng.gen_range(0.5..2.0);
    let smoothed = savitzky_golay_21(samples);
    let blended: Vec<f64> = samples
        .iter()
        .zip(&smoothed)
        .map(|(&x, &s)| x * (1.0 - intensity * 0.2) + s * intensity * 0.2)
        .collect();
    warble(&blended, intensity * 0.05, warble_hz, sample_rate)
}

/// Faint 2 ms pre-echo ahead of detected transients.
fn opus(samples: &[f64], intensity: f64, sample_rate: u32) -> Vec<f64> {
    let n = samples.len();
    let envelope = analytic_envelope(samples);

    let diff: Vec<f64> = (0..n)
        .map(|i| if i == 0 { 0.0 } else { envelope[i] - envelope[i - 1] })
        .collect();
    let mean = diff.iter().sum::<f64>() / n as f64;
    let std = (diff.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n as f64).sqrt();
    let threshold = 2.0 * std;

    let pre = ms_to_samples(2.0, sample_rate).max(1);
    let mut out = samples.to_vec();
    for i in pre..n {
        if diff[i] <= threshold {
            continue;
        }
        let strength = samples[i] * intensity * 0.1 * envelope[i];
        let start = i - pre;
        for (k, o) in out[start..i].iter_mut().enumerate() {
            *o += strength * k as f64 / (pre - 1).max(1) as f64;
        }
    }
    out
}

fn warble(samples: &[f64], depth: f64, rate_hz: f64, sample_rate: u32) -> Vec<f64> {
    samples
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let t = i as f64 / sample_rate as f64;
            x * (1.0 + depth * (2.0 * PI * rate_hz * t).sin())
        })
        .collect()
}

/// Centered moving average of width `width`.
fn moving_average(samples: &[f64], width: usize) -> Vec<f64> {
    let n = samples.len();
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    for &s in samples {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + s);
    }
    let half = width / 2;
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + width - half).min(n);
            (prefix[hi] - prefix[lo]) / width as f64
        })
        .collect()
}

/// 21-point cubic Savitzky-Golay smoothing; the 10 samples at each edge
/// are passed through.
fn savitzky_golay_21(samples: &[f64]) -> Vec<f64> {
    const M: i64 = 10;
    let n = samples.len();
    if n <= 2 * M as usize {
        return samples.to_vec();
    }
    let norm = ((2 * M - 1) * (2 * M + 1) * (2 * M + 3)) as f64;
    let weights: Vec<f64> = (-M..=M)
        .map(|k| 3.0 * (3 * M * M + 3 * M - 1 - 5 * k * k) as f64 / norm)
        .collect();

    let mut out = samples.to_vec();
    for i in M as usize..n - M as usize {
        out[i] = weights
            .iter()
            .enumerate()
            .map(|(j, w)| w * samples[i + j - M as usize])
            .sum();
    }
    out
}

/// Magnitude of the analytic signal, computed blockwise with rustfft.
fn analytic_envelope(samples: &[f64]) -> Vec<f64> {
    let n = samples.len();
    let mut envelope = vec![0.0; n];
    let mut planner = FftPlanner::<f64>::new();

    let mut start = 0;
    while start < n {
        let end = (start + HILBERT_BLOCK).min(n);
        let lo = start.saturating_sub(HILBERT_MARGIN);
        let hi = (end + HILBERT_MARGIN).min(n);
        let len = hi - lo;

        let forward = planner.plan_fft_forward(len);
        let inverse = planner.plan_fft_inverse(len);
        let mut buf: Vec<Complex<f64>> = samples[lo..hi].iter().map(|&s| Complex::new(s, 0.0)).collect();
        forward.process(&mut buf);

        // Keep DC and Nyquist, double positive bins, zero negative bins
        let half = len / 2;
        for (k, z) in buf.iter_mut().enumerate() {
            let weight = if k == 0 || (len % 2 == 0 && k == half) {
                1.0
            } else if k <= (len - 1) / 2 {
                2.0
            } else {
                0.0
            };
            *z *= weight;
        }
        inverse.process(&mut buf);

        let scale = 1.0 / len as f64;
        for i in start..end {
            envelope[i] = buf[i - lo].norm() * scale;
        }
        start = end;
    }
    envelope
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::create_rng;

    fn tone(freq: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f64 / 48_000.0).sin())
            .collect()
    }

    #[test]
    fn test_zero_intensity_is_identity() {
        let x = tone(440.0, 4800);
        for profile in [CodecProfile::AmrNb, CodecProfile::AmrWb, CodecProfile::Opus, CodecProfile::Evs] {
            assert_eq!(apply(&x, profile, 0.0, 48_000, &mut create_rng(1)), x);
        }
    }

    #[test]
    fn test_every_profile_preserves_length() {
        let x = tone(440.0, 9_601);
        for profile in [CodecProfile::AmrNb, CodecProfile::AmrWb, CodecProfile::Opus, CodecProfile::Evs] {
            let y = apply(&x, profile, 0.8, 48_000, &mut create_rng(2));
            assert_eq!(y.len(), x.len(), "{profile:?}");
            assert!(y.iter().all(|s| s.is_finite()));
        }
    }

    #[test]
    fn test_envelope_of_tone_is_flat() {
        let x = tone(1000.0, 40_000);
        let env = analytic_envelope(&x);
        for &e in &env[2_000..38_000] {
            assert!((e - 0.5).abs() < 0.02, "envelope {e}");
        }
    }

    #[test]
    fn test_amr_nb_removes_high_band() {
        let x = tone(6000.0, 48_000);
        let y = apply(&x, CodecProfile::AmrNb, 1.0, 48_000, &mut create_rng(3));
        let rms = (y[10_000..40_000].iter().map(|v| v * v).sum::<f64>() / 30_000.0).sqrt();
        assert!(rms < 0.05, "rms {rms}");
    }

    #[test]
    fn test_savitzky_golay_keeps_cubics() {
        let x: Vec<f64> = (0..100).map(|i| (i as f64 * 0.1).powi(3) - i as f64).collect();
        let y = savitzky_golay_21(&x);
        for (a, b) in x.iter().zip(&y) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_opus_adds_pre_echo_before_click() {
        let mut x = vec![0.0; 4800];
        x[2400] = 1.0;
        let y = apply(&x, CodecProfile::Opus, 1.0, 48_000, &mut create_rng(4));
        let pre = ms_to_samples(2.0, 48_000);
        assert!(y[2400 - pre..2400].iter().any(|&v| v != 0.0));
        assert_eq!(y[100], 0.0);
    }
}
