//! Jitter-buffer artifacts: playback-rate wobble and rebuffering smears.

use rand::Rng;

use crate::buffer::{fade_window, interpolate, ms_to_samples, stretch_to_len};
use crate::filter::BiquadFilter;
use crate::rng::gaussian;

/// Samples per control point of the timewarp curve.
const CONTROL_SPACING: usize = 160;

/// Largest playback-rate deviation at intensity 1.0.
const MAX_RATE_DEVIATION: f64 = 0.05;

/// Low-pass corner of the control curve as a fraction of its sample rate.
const CONTROL_CUTOFF: f64 = 0.15 * 0.5;

/// Rebuffer events per second at probability 1.0.
const REBUFFERS_PER_SECOND: f64 = 2.0;

/// Varies the playback rate by up to 5%·`intensity` along a smoothed random
/// curve. The warped time axis is rescaled to span the whole buffer, so the
/// duration is preserved.
pub fn timewarp<R: Rng + ?Sized>(samples: &[f64], intensity: f64, rng: &mut R) -> Vec<f64> {
    let a = intensity.clamp(0.0, 1.0);
    let n = samples.len();
    if a <= 0.0 || n < 2 {
        return samples.to_vec();
    }

    let mut lowpass = BiquadFilter::lowpass(CONTROL_CUTOFF, std::f64::consts::FRAC_1_SQRT_2, 1.0);
    let control: Vec<f64> = (0..n / CONTROL_SPACING + 2)
        .map(|_| lowpass.process(gaussian(rng)))
        .collect();
    let control = stretch_to_len(&control, n);
    let max = control.iter().fold(0.0_f64, |m, c| m.max(c.abs())) + 1e-9;

    let max_dev = MAX_RATE_DEVIATION * a;
    let mut t = Vec::with_capacity(n);
    let mut acc = 0.0;
    for c in &control {
        acc += 1.0 + max_dev * c / max;
        t.push(acc);
    }
    let total = acc;
    let span = (n - 1) as f64;
    t.iter().map(|&pos| interpolate(samples, pos / total * span)).collect()
}

/// Replaces random 70–300 ms spans with a 0.8–1.2× time-stretched copy,
/// crossfaded back in over 10 ms at each edge.
pub fn rebuffer<R: Rng + ?Sized>(samples: &mut [f64], prob: f64, sample_rate: u32, rng: &mut R) {
    let n = samples.len();
    let sr = sample_rate as f64;
    if prob <= 0.0 || (n as f64) < sr * 0.1 {
        return;
    }
    let events = (prob.min(1.0) * n as f64 / sr * REBUFFERS_PER_SECOND) as usize;
    let max_start = n.saturating_sub(ms_to_samples(300.0, sample_rate)).max(1);

    for _ in 0..events {
        let start = rng.gen_range(0..max_start);
        let duration = (rng.gen_range(0.07..0.3) * sr) as usize;
        let end = (start + duration).min(n);
        let segment = samples[start..end].to_vec();
        if segment.is_empty() {
            continue;
        }

        let factor = rng.gen_range(0.8..1.2);
        let stretched_len = ((segment.len() as f64 * factor) as usize).max(1);
        let stretched = stretch_to_len(&segment, stretched_len);
        let last = stretched[stretched.len() - 1];
        let fitted: Vec<f64> = (0..segment.len())
            .map(|i| stretched.get(i).copied().unwrap_or(last))
            .collect();

        // w is 0 at both edges, so the smear starts and ends on the dry span
        let fade = (segment.len() / 4).min(ms_to_samples(10.0, sample_rate));
        let w = fade_window(segment.len(), fade);
        for (i, s) in samples[start..end].iter_mut().enumerate() {
            *s = segment[i] * (1.0 - w[i]) + fitted[i] * w[i];
        }
    }
}

/// Timewarp followed by rebuffering.
pub fn apply<R: Rng + ?Sized>(
    samples: &[f64],
    jitter_intensity: f64,
    buffer_prob: f64,
    sample_rate: u32,
    rng: &mut R,
) -> Vec<f64> {
    if jitter_intensity <= 0.0 && buffer_prob <= 0.0 {
        return samples.to_vec();
    }
    let mut out = timewarp(samples, jitter_intensity, rng);
    rebuffer(&mut out, buffer_prob, sample_rate, rng);
    out
}
