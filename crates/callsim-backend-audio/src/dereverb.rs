//! STFT spectral-gate cleanup.
//!
//! Estimates a per-bin floor from the quietest frames and subtracts it from
//! every frame's magnitude. Reverb tails and steady noise sit near that floor,
//! so they are pulled down while the direct voice survives.

use std::f64::consts::PI;

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

const FRAME: usize = 512;
const HOP: usize = 128;

/// Percentile of each bin's magnitudes taken as its floor.
const FLOOR_PERCENTILE: f64 = 0.10;

/// Largest accepted strength; values above 1.0 run a second pass.
pub const MAX_STRENGTH: f64 = 2.0;

/// Runs the spectral gate at `strength` in [0, 2].
///
/// Strength 0 returns the input unchanged. Above 1.0 the gate is chained:
/// a full-strength pass followed by a pass with the remainder.
pub fn dereverb(samples: &[f64], strength: f64) -> Vec<f64> {
    let mut remaining = if strength.is_finite() {
        strength.clamp(0.0, MAX_STRENGTH)
    } else {
        0.0
    };
    let mut out = samples.to_vec();
    while remaining > 1e-9 {
        let pass = remaining.min(1.0);
        out = spectral_gate(&out, pass);
        remaining -= pass;
    }
    out
}

fn hann(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos())
        .collect()
}

/// Linear-interpolated percentile of `values` (`q` in [0, 1]).
fn percentile(values: &mut [f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let pos = q * (values.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    values[lo] * (1.0 - frac) + values[hi] * frac
}

fn spectral_gate(samples: &[f64], strength: f64) -> Vec<f64> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }

    let over_subtraction = 1.4 + 1.6 * strength;
    let spectral_floor = 0.05 + 0.10 * strength;
    let window = hann(FRAME);

    // Zero-pad half a frame on each side and round up to whole hops
    let half = FRAME / 2;
    let frames = (n + 2 * half).saturating_sub(FRAME) / HOP + 2;
    let padded_len = (frames - 1) * HOP + FRAME;
    let mut padded = vec![0.0; padded_len];
    padded[half..half + n].copy_from_slice(samples);

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(FRAME);
    let inverse = planner.plan_fft_inverse(FRAME);

    let mut spectra: Vec<Vec<Complex<f64>>> = Vec::with_capacity(frames);
    for f in 0..frames {
        let start = f * HOP;
        let mut frame: Vec<Complex<f64>> = padded[start..start + FRAME]
            .iter()
            .zip(&window)
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();
        forward.process(&mut frame);
        spectra.push(frame);
    }

    let floors: Vec<f64> = (0..FRAME)
        .map(|bin| {
            let mut mags: Vec<f64> = spectra.iter().map(|s| s[bin].norm()).collect();
            percentile(&mut mags, FLOOR_PERCENTILE)
        })
        .collect();

    let mut out = vec![0.0; padded_len];
    let mut norm = vec![0.0; padded_len];
    let scale = 1.0 / FRAME as f64;
    for (f, spectrum) in spectra.iter_mut().enumerate() {
        for (bin, z) in spectrum.iter_mut().enumerate() {
            let mag = z.norm();
            if mag <= 0.0 {
                continue;
            }
            let gated = (mag - over_subtraction * floors[bin]).max(spectral_floor * mag);
            *z *= gated / mag;
        }
        inverse.process(spectrum);

        let start = f * HOP;
        for (i, (z, &w)) in spectrum.iter().zip(&window).enumerate() {
            out[start + i] += z.re * scale * w;
            norm[start + i] += w * w;
        }
    }

    out[half..half + n]
        .iter()
        .zip(&norm[half..half + n])
        .map(|(&v, &w)| if w > 1e-10 { v / w } else { 0.0 })
        .collect()
}
