//! ITU-R BS.1770 integrated loudness and loudness normalization.

use tracing::debug;

use crate::buffer::{db_to_amp, peak};
use crate::dynamics::normalize_peak;
use crate::filter::{BiquadCoeffs, BiquadFilter};

/// Gate threshold relative to ungated loudness (in dB).
const ABSOLUTE_GATE_THRESHOLD_DB: f64 = -70.0;
const RELATIVE_GATE_OFFSET_DB: f64 = -10.0;

/// ITU-R BS.1770 constant for mono weighting.
const LUFS_REFERENCE_OFFSET: f64 = -0.691;

/// Sample peak a loudness-normalized render is never allowed to exceed.
pub const LOUDNESS_PEAK_CEILING: f64 = 0.97;

/// K-weighting pre-filter: high shelf at ~1.7 kHz with +4 dB gain.
fn k_weighting_pre(sample_rate: u32) -> BiquadCoeffs {
    let fs = sample_rate as f64;
    if (fs - 48000.0).abs() < 1.0 {
        return BiquadCoeffs {
            b0: 1.53512485958697,
            b1: -2.69169618940638,
            b2: 1.19839281085285,
            a1: -1.69065929318241,
            a2: 0.73248077421585,
        };
    }

    let f0 = 1681.974450955533;
    let g = 3.999843853973347_f64;
    let q = 0.7071752369554196;

    let k = (std::f64::consts::PI * f0 / fs).tan();
    let vg = 10.0_f64.powf(g / 20.0);
    let k2 = k * k;
    let a0 = 1.0 + k / q + k2;

    BiquadCoeffs {
        b0: (vg + vg.sqrt() * k / q + k2) / a0,
        b1: 2.0 * (k2 - vg) / a0,
        b2: (vg - vg.sqrt() * k / q + k2) / a0,
        a1: 2.0 * (k2 - 1.0) / a0,
        a2: (1.0 - k / q + k2) / a0,
    }
}

/// K-weighting RLB filter: high-pass at ~38 Hz.
fn k_weighting_rlb(sample_rate: u32) -> BiquadCoeffs {
    let fs = sample_rate as f64;
    if (fs - 48000.0).abs() < 1.0 {
        return BiquadCoeffs {
            b0: 1.0,
            b1: -2.0,
            b2: 1.0,
            a1: -1.99004745483398,
            a2: 0.99007225036621,
        };
    }

    let fc = 38.13547087602444;
    let q = 0.5003270373238773;

    let k = (std::f64::consts::PI * fc / fs).tan();
    let k2 = k * k;
    let a0 = 1.0 + k / q + k2;

    BiquadCoeffs {
        b0: 1.0 / a0,
        b1: -2.0 / a0,
        b2: 1.0 / a0,
        a1: 2.0 * (k2 - 1.0) / a0,
        a2: (1.0 - k / q + k2) / a0,
    }
}

fn apply_k_weighting(samples: &[f64], sample_rate: u32) -> Vec<f64> {
    let mut pre = BiquadFilter::new(k_weighting_pre(sample_rate));
    let mut rlb = BiquadFilter::new(k_weighting_rlb(sample_rate));
    samples.iter().map(|&s| rlb.process(pre.process(s))).collect()
}

fn mean_square(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s * s).sum::<f64>() / samples.len() as f64
}

fn mean_square_to_lufs(ms: f64) -> f64 {
    if ms <= 0.0 {
        return f64::NEG_INFINITY;
    }
    LUFS_REFERENCE_OFFSET + 10.0 * ms.log10()
}

fn lufs_to_mean_square(lufs: f64) -> f64 {
    10.0_f64.powf((lufs - LUFS_REFERENCE_OFFSET) / 10.0)
}

/// Integrated loudness in LUFS.
///
/// Returns `None` if the audio is shorter than one 400 ms block or gated
/// away as silence.
pub fn integrated_lufs(samples: &[f64], sample_rate: u32) -> Option<f64> {
    let block_size = (sample_rate as f64 * 0.4).round() as usize;
    let hop_size = block_size / 4;
    if block_size == 0 || samples.len() < block_size {
        return None;
    }

    let weighted = apply_k_weighting(samples, sample_rate);

    let mut blocks = Vec::new();
    let mut pos = 0;
    while pos + block_size <= weighted.len() {
        blocks.push(mean_square(&weighted[pos..pos + block_size]));
        pos += hop_size.max(1);
    }

    let absolute = lufs_to_mean_square(ABSOLUTE_GATE_THRESHOLD_DB);
    let gated: Vec<f64> = blocks.into_iter().filter(|&ms| ms > absolute).collect();
    if gated.is_empty() {
        return None;
    }

    let ungated = mean_square_to_lufs(gated.iter().sum::<f64>() / gated.len() as f64);
    let relative = lufs_to_mean_square(ungated + RELATIVE_GATE_OFFSET_DB);
    let kept: Vec<f64> = gated.into_iter().filter(|&ms| ms >= relative).collect();
    if kept.is_empty() {
        return None;
    }

    let lufs = mean_square_to_lufs(kept.iter().sum::<f64>() / kept.len() as f64);
    lufs.is_finite().then_some(lufs)
}

/// Scales `samples` to `target_lufs`, capping the sample peak at
/// [`LOUDNESS_PEAK_CEILING`].
///
/// Falls back to peak normalization when the loudness cannot be measured.
/// Returns `true` if the loudness path was taken.
pub fn normalize_loudness(samples: &mut [f64], sample_rate: u32, target_lufs: f64) -> bool {
    let Some(current) = integrated_lufs(samples, sample_rate) else {
        debug!("loudness unmeasurable, falling back to peak normalization");
        normalize_peak(samples, LOUDNESS_PEAK_CEILING);
        return false;
    };

    let mut gain = db_to_amp(target_lufs - current);
    let p = peak(samples) * gain;
    if p > LOUDNESS_PEAK_CEILING {
        gain *= LOUDNESS_PEAK_CEILING / p;
    }
    debug!(current, target_lufs, gain, "loudness normalization");
    for s in samples.iter_mut() {
        *s *= gain;
    }
    true
}
