//! Phone-band filtering.
//!
//! Low- and high-pass sections come from the bilinear-transformed analog
//! prototypes. Butterworth responses of higher order are cascades of those
//! sections, and every cascade can run causally or forward-backward (zero
//! phase).

use std::f64::consts::PI;

/// Normalized second-order section coefficients (`a0 == 1`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Low,
    High,
}

impl BiquadCoeffs {
    /// Second-order low-pass at `cutoff` Hz.
    pub fn lowpass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        Self::pass(Pass::Low, cutoff, q, sample_rate)
    }

    /// Second-order high-pass at `cutoff` Hz.
    pub fn highpass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        Self::pass(Pass::High, cutoff, q, sample_rate)
    }

    fn pass(kind: Pass, cutoff: f64, q: f64, sample_rate: f64) -> Self {
        let w = 2.0 * PI * cutoff / sample_rate;
        let (sin_w, cos_w) = w.sin_cos();
        let alpha = sin_w / (2.0 * q.max(0.5));
        let norm = 1.0 / (1.0 + alpha);

        // Numerator is b * [1, -2, 1] for the high-pass and b * [1, 2, 1] for the low-pass
        let (b, sign) = match kind {
            Pass::Low => ((1.0 - cos_w) / 2.0, 1.0),
            Pass::High => ((1.0 + cos_w) / 2.0, -1.0),
        };
        Self {
            b0: b * norm,
            b1: 2.0 * sign * b * norm,
            b2: b * norm,
            a1: -2.0 * cos_w * norm,
            a2: (1.0 - alpha) * norm,
        }
    }
}

/// One second-order section in transposed direct form II.
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    coeffs: BiquadCoeffs,
    s1: f64,
    s2: f64,
}

impl BiquadFilter {
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        Self { coeffs, s1: 0.0, s2: 0.0 }
    }

    pub fn lowpass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        Self::new(BiquadCoeffs::lowpass(cutoff, q, sample_rate))
    }

    pub fn highpass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        Self::new(BiquadCoeffs::highpass(cutoff, q, sample_rate))
    }

    /// Clears the section state.
    pub fn reset(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
    }

    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        let c = &self.coeffs;
        let y = c.b0 * x + self.s1;
        self.s1 = c.b1 * x - c.a1 * y + self.s2;
        self.s2 = c.b2 * x - c.a2 * y;
        y
    }

    pub fn process_buffer(&mut self, buffer: &mut [f64]) {
        buffer.iter_mut().for_each(|s| *s = self.process(*s));
    }
}

/// A series of biquads run one after another.
#[derive(Debug, Clone, Default)]
pub struct FilterCascade {
    stages: Vec<BiquadFilter>,
}

impl FilterCascade {
    /// Creates a cascade from individual stages.
    pub fn new(stages: Vec<BiquadFilter>) -> Self {
        Self { stages }
    }

    /// Butterworth lowpass of even `order` (odd orders round up).
    pub fn butterworth_lowpass(order: usize, cutoff: f64, sample_rate: f64) -> Self {
        Self::new(
            butterworth_qs(order)
                .into_iter()
                .map(|q| BiquadFilter::lowpass(cutoff, q, sample_rate))
                .collect(),
        )
    }

    /// Butterworth highpass of even `order` (odd orders round up).
    pub fn butterworth_highpass(order: usize, cutoff: f64, sample_rate: f64) -> Self {
        Self::new(
            butterworth_qs(order)
                .into_iter()
                .map(|q| BiquadFilter::highpass(cutoff, q, sample_rate))
                .collect(),
        )
    }

    /// Appends the stages of `other` after this cascade's stages.
    pub fn then(mut self, other: FilterCascade) -> Self {
        self.stages.extend(other.stages);
        self
    }

    /// Returns `true` if the cascade has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Resets every stage.
    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }

    /// Processes a buffer in place.
    pub fn process_buffer(&mut self, buffer: &mut [f64]) {
        for stage in &mut self.stages {
            stage.process_buffer(buffer);
        }
    }

    /// Filters a copy of `samples` causally, starting from rest.
    pub fn apply(&self, samples: &[f64]) -> Vec<f64> {
        let mut cascade = self.clone();
        cascade.reset();
        let mut out = samples.to_vec();
        cascade.process_buffer(&mut out);
        out
    }

    /// Filters a copy of `samples` forward then backward.
    ///
    /// The signal is extended at both ends by odd reflection before filtering
    /// so the start-up transients fall outside the returned span.
    pub fn apply_zero_phase(&self, samples: &[f64]) -> Vec<f64> {
        let n = samples.len();
        if n < 2 || self.is_empty() {
            return samples.to_vec();
        }
        let pad = (3 * (2 * self.stages.len() + 1)).min(n - 1);

        let mut ext = Vec::with_capacity(n + 2 * pad);
        let first = samples[0];
        let last = samples[n - 1];
        for i in (1..=pad).rev() {
            ext.push(2.0 * first - samples[i]);
        }
        ext.extend_from_slice(samples);
        for i in 1..=pad {
            ext.push(2.0 * last - samples[n - 1 - i]);
        }

        let mut forward = self.apply(&ext);
        forward.reverse();
        let mut backward = self.apply(&forward);
        backward.reverse();

        backward[pad..pad + n].to_vec()
    }
}

/// Section Q factors of a Butterworth filter of the given order.
fn butterworth_qs(order: usize) -> Vec<f64> {
    let order = order.max(2);
    let order = order + order % 2;
    let sections = order / 2;
    (1..=sections)
        .map(|k| {
            let theta = (2 * k - 1) as f64 * PI / (2 * order) as f64;
            1.0 / (2.0 * theta.sin())
        })
        .collect()
}

/// High-pass then low-pass with the canonical phone-filter orders.
///
/// The high-pass is a 2-pole Butterworth applied when `hpf_hz` is at least
/// 20 Hz; the low-pass is a 4-pole Butterworth applied when `lpf_hz` is
/// positive and below Nyquist. Either corner can be disabled independently.
pub fn hpf_lpf(samples: &[f64], hpf_hz: f64, lpf_hz: f64, sample_rate: u32, zero_phase: bool) -> Vec<f64> {
    let sr = sample_rate as f64;
    let nyquist = sr / 2.0;
    let mut cascade = FilterCascade::default();
    if hpf_hz >= 20.0 && hpf_hz < nyquist {
        cascade = cascade.then(FilterCascade::butterworth_highpass(2, hpf_hz, sr));
    }
    if lpf_hz > 0.0 && lpf_hz < nyquist {
        cascade = cascade.then(FilterCascade::butterworth_lowpass(4, lpf_hz, sr));
    }
    if cascade.is_empty() {
        return samples.to_vec();
    }
    if zero_phase {
        cascade.apply_zero_phase(samples)
    } else {
        cascade.apply(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sr: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| (2.0 * PI * freq * i as f64 / sr).sin()).collect()
    }

    fn steady_rms(x: &[f64]) -> f64 {
        let tail = &x[x.len() / 2..];
        (tail.iter().map(|v| v * v).sum::<f64>() / tail.len() as f64).sqrt()
    }

    #[test]
    fn test_section_dc_gain() {
        let mut dc = vec![1.0; 2000];
        BiquadFilter::lowpass(800.0, 0.707, 16_000.0).process_buffer(&mut dc);
        assert!((dc[1999] - 1.0).abs() < 1e-6);

        let mut dc = vec![1.0; 2000];
        BiquadFilter::highpass(800.0, 0.707, 16_000.0).process_buffer(&mut dc);
        assert!(dc[1999].abs() < 1e-6);
    }

    #[test]
    fn test_reset_restarts_from_rest() {
        let mut f = BiquadFilter::lowpass(500.0, 0.707, 8_000.0);
        let first = f.process(1.0);
        f.process(0.3);
        f.reset();
        assert_eq!(f.process(1.0), first);
    }

    #[test]
    fn test_butterworth_q_values() {
        let qs = butterworth_qs(4);
        assert_eq!(qs.len(), 2);
        assert!((qs[0] - 1.3066).abs() < 1e-3);
        assert!((qs[1] - 0.5412).abs() < 1e-3);
        assert!((butterworth_qs(2)[0] - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn test_butterworth_lowpass_is_minus_3db_at_cutoff() {
        let sr = 48_000.0;
        let cascade = FilterCascade::butterworth_lowpass(4, 2000.0, sr);
        let out = cascade.apply(&sine(2000.0, sr, 48_000));
        let gain = steady_rms(&out) / std::f64::consts::FRAC_1_SQRT_2;
        assert!((gain - std::f64::consts::FRAC_1_SQRT_2).abs() < 0.02, "gain {gain}");
    }

    #[test]
    fn test_zero_phase_squares_magnitude() {
        let sr = 48_000.0;
        let cascade = FilterCascade::butterworth_lowpass(4, 2000.0, sr);
        let out = cascade.apply_zero_phase(&sine(2000.0, sr, 48_000));
        let gain = steady_rms(&out) / std::f64::consts::FRAC_1_SQRT_2;
        assert!((gain - 0.5).abs() < 0.02, "gain {gain}");
    }

    #[test]
    fn test_zero_phase_has_no_delay() {
        let sr = 48_000.0;
        let x = sine(200.0, sr, 9600);
        let y = hpf_lpf(&x, 0.0, 4000.0, 48_000, true);
        let mid = 4800;
        for i in mid..mid + 100 {
            assert!((x[i] - y[i]).abs() < 0.01);
        }
    }

    #[test]
    fn test_hpf_lpf_disabled_corners_pass_through() {
        let x = sine(440.0, 48_000.0, 1000);
        assert_eq!(hpf_lpf(&x, 0.0, 24_000.0, 48_000, false), x);
        assert_eq!(hpf_lpf(&x, 10.0, 30_000.0, 48_000, true), x);
    }

    #[test]
    fn test_hpf_removes_low_tone() {
        let sr = 48_000.0;
        let out = hpf_lpf(&sine(50.0, sr, 48_000), 300.0, 0.0, 48_000, false);
        assert!(steady_rms(&out) < 0.03);
    }
}
