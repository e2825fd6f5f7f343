//! Level control: the one-knob leveler, peak limiting and soft clipping.

use crate::buffer::{db_to_amp, ms_to_samples, peak};

const EPSILON: f64 = 1e-9;

/// Raw leveler gain never leaves this range, so silence is not pumped up
/// to the noise floor and loud passages are not crushed to nothing.
const MIN_GAIN: f64 = 0.2;
const MAX_GAIN: f64 = 5.0;

/// Limiter threshold in dBFS.
const THRESHOLD_DB: f64 = -0.5;

/// Lookahead of the limiter in milliseconds.
const LOOKAHEAD_MS: f64 = 3.0;

/// Peak the mix is scaled down to before nonlinear coloration.
pub const PRELIMIT_THRESHOLD: f64 = 0.707;

/// Drive of the safety clip applied when a render exceeds full scale.
pub const SAFETY_DRIVE: f64 = 1.1;

/// One-knob leveler.
///
/// `amount` in [0, 1] sets target RMS (-28 to -16 dBFS), attack (10 to 4 ms),
/// release (320 to 120 ms), knee width and squeeze ratio together. An amount
/// of zero returns the input unchanged.
pub fn leveler(samples: &[f64], amount: f64, sample_rate: u32) -> Vec<f64> {
    let a = if amount.is_finite() { amount.clamp(0.0, 1.0) } else { 0.0 };
    if a <= 0.0 || samples.is_empty() {
        return samples.to_vec();
    }

    let target = db_to_amp(-28.0 + 12.0 * a);
    let attack = ms_to_samples(10.0 - 6.0 * a, sample_rate).max(1) as f64;
    let release = ms_to_samples(320.0 - 200.0 * a, sample_rate).max(1) as f64;

    // Envelope and raw gain curve
    let mut env = 0.0;
    let mut raw = Vec::with_capacity(samples.len());
    for &s in samples {
        let v = s.abs() + EPSILON;
        let n = if v > env { attack } else { release };
        env += (v - env) / n;
        raw.push((target / (env + EPSILON)).clamp(MIN_GAIN, MAX_GAIN));
    }

    // Smooth the gain so it never jumps between samples
    let alpha = 0.15 + 0.35 * (1.0 - a);
    let mut g = raw[0];
    let mut y: Vec<f64> = samples
        .iter()
        .zip(&raw)
        .map(|(&s, &r)| {
            g = alpha * g + (1.0 - alpha) * r;
            s * g
        })
        .collect();

    // Soft knee
    let knee_db = 6.0 + 6.0 * a;
    let squeeze = 2.0 + 6.0 * a;
    let threshold = db_to_amp(THRESHOLD_DB);
    let knee = db_to_amp(THRESHOLD_DB - knee_db);
    for s in &mut y {
        let mag = s.abs();
        if mag > knee {
            let squeezed = (knee + (mag - knee) / squeeze).min(threshold);
            *s = squeezed.copysign(*s);
        }
    }

    // Lookahead: advance the signal so the gain reacts ahead of transients
    let look = ms_to_samples(LOOKAHEAD_MS, sample_rate).min(y.len());
    if look > 1 {
        let tail = y[y.len() - look..].to_vec();
        y.drain(..look);
        y.extend_from_slice(&tail);
    }

    let ceiling = 0.92 - 0.25 * a;
    y.into_iter().map(|s| (s / ceiling).tanh() * ceiling).collect()
}

/// Scales the buffer down so its peak is at most `threshold`.
pub fn prelimit(samples: &mut [f64], threshold: f64) {
    let p = peak(samples);
    if p > threshold {
        let scale = threshold / p;
        for s in samples.iter_mut() {
            *s *= scale;
        }
    }
}

/// tanh saturation with input drive.
pub fn soft_clip(samples: &mut [f64], drive: f64) {
    for s in samples.iter_mut() {
        *s = (drive * *s).tanh();
    }
}

/// Applies the safety soft clip only when the peak exceeds full scale.
///
/// Returns `true` if the clip ran.
pub fn safety_clip(samples: &mut [f64]) -> bool {
    if peak(samples) > 1.0 {
        soft_clip(samples, SAFETY_DRIVE);
        true
    } else {
        false
    }
}

/// Scales the buffer so its peak equals `target`. Silence is left alone.
pub fn normalize_peak(samples: &mut [f64], target: f64) {
    let p = peak(samples);
    if p > 0.0 {
        let scale = target / p;
        for s in samples.iter_mut() {
            *s *= scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::rms;
    use std::f64::consts::PI;

    fn tone(amp: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| amp * (2.0 * PI * 220.0 * i as f64 / 48_000.0).sin())
            .collect()
    }

    #[test]
    fn test_zero_amount_is_passthrough() {
        let x = tone(0.3, 4800);
        assert_eq!(leveler(&x, 0.0, 48_000), x);
    }

    #[test]
    fn test_leveler_raises_quiet_and_tames_loud() {
        let quiet = tone(0.01, 48_000);
        let loud = tone(0.9, 48_000);

        let q = leveler(&quiet, 0.8, 48_000);
        let l = leveler(&loud, 0.8, 48_000);

        assert!(rms(&q[24_000..]) > rms(&quiet[24_000..]));
        assert!(rms(&l[24_000..]) < rms(&loud[24_000..]));
        assert_eq!(q.len(), quiet.len());
    }

    #[test]
    fn test_leveler_respects_ceiling() {
        let x = tone(1.0, 9600);
        for amount in [0.1, 0.5, 1.0] {
            let y = leveler(&x, amount, 48_000);
            assert!(peak(&y) < 0.92 - 0.25 * amount + 1e-9);
        }
    }

    #[test]
    fn test_leveler_silence_stays_finite() {
        let y = leveler(&vec![0.0; 2000], 1.0, 48_000);
        assert!(y.iter().all(|s| s.is_finite()));
        assert!(peak(&y) < 1e-6);
    }

    #[test]
    fn test_prelimit_only_reduces() {
        let mut loud = vec![0.0, 1.4, -0.7];
        prelimit(&mut loud, PRELIMIT_THRESHOLD);
        assert!((peak(&loud) - PRELIMIT_THRESHOLD).abs() < 1e-12);

        let mut quiet = vec![0.1, -0.2];
        prelimit(&mut quiet, PRELIMIT_THRESHOLD);
        assert_eq!(quiet, vec![0.1, -0.2]);
    }

    #[test]
    fn test_safety_clip_only_over_unity() {
        let mut ok = vec![0.5, -0.99];
        assert!(!safety_clip(&mut ok));
        assert_eq!(ok, vec![0.5, -0.99]);

        let mut hot = vec![0.5, -1.5];
        assert!(safety_clip(&mut hot));
        assert!(peak(&hot) < 1.0);
    }

    #[test]
    fn test_normalize_peak() {
        let mut x = vec![0.1, -0.5, 0.25];
        normalize_peak(&mut x, 0.97);
        assert!((peak(&x) - 0.97).abs() < 1e-12);

        let mut silent = vec![0.0; 4];
        normalize_peak(&mut silent, 0.97);
        assert_eq!(silent, vec![0.0; 4]);
    }
}
