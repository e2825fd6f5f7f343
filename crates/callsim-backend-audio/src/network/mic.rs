//! Microphone type and talker-distance coloration.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use callsim_spec::MicType;
use rand::Rng;

use crate::buffer::ms_to_samples;
use crate::filter::{BiquadFilter, FilterCascade};

fn causal(cascade: FilterCascade, samples: &[f64]) -> Vec<f64> {
    cascade.apply(samples)
}

fn band(low: f64, high: f64, sr: f64) -> FilterCascade {
    FilterCascade::new(vec![
        BiquadFilter::highpass(low, FRAC_1_SQRT_2, sr),
        BiquadFilter::lowpass(high, FRAC_1_SQRT_2, sr),
    ])
}

/// Colors the voice for `mic_type` at `proximity` in [0, 1].
///
/// Proximity 0 leaves the buffer untouched, as does [`MicType::Studio`].
pub fn apply<R: Rng + ?Sized>(
    samples: &[f64],
    proximity: f64,
    mic_type: MicType,
    sample_rate: u32,
    rng: &mut R,
) -> Vec<f64> {
    if proximity <= 0.0 || samples.is_empty() {
        return samples.to_vec();
    }
    let p = proximity.min(1.0);
    let sr = sample_rate as f64;

    match mic_type {
        MicType::Handset => {
            // Only close talking brings out proximity bass and breath
            if p <= 0.5 {
                return samples.to_vec();
            }
            let high = causal(FilterCascade::butterworth_highpass(2, 200.0, sr), samples);
            let breath = causal(band(80.0, 300.0, sr), samples);
            samples
                .iter()
                .zip(&high)
                .zip(&breath)
                .map(|((&x, &h), &b)| x + (x - h) * p * 0.3 + b * p * 0.1)
                .collect()
        }
        MicType::Headset => {
            let presence = causal(band(2000.0, 4000.0, sr), samples);
            samples
                .iter()
                .zip(&presence)
                .map(|(&x, &pr)| x + pr * p * 0.15)
                .collect()
        }
        MicType::Speakerphone => {
            let muffled = causal(FilterCascade::butterworth_lowpass(2, 6000.0, sr), samples);
            let delay = ms_to_samples(10.0, sample_rate);
            let far = 1.0 - p;
            (0..samples.len())
                .map(|i| {
                    let delayed = if i >= delay { samples[i - delay] } else { 0.0 };
                    samples[i] * p + (muffled[i] * 0.7 + delayed * 0.3) * far
                })
                .collect()
        }
        MicType::Car => {
            let cabin = causal(
                FilterCascade::butterworth_highpass(2, 150.0, sr)
                    .then(FilterCascade::butterworth_lowpass(2, 5000.0, sr)),
                samples,
            );
            let resonance_hz = rng.gen_range(200.0..400.0);
            cabin
                .iter()
                .zip(samples)
                .enumerate()
                .map(|(i, (&c, &x))| {
                    let t = i as f64 / sr;
                    c + x * (2.0 * PI * resonance_hz * t).sin() * p * 0.05
                })
                .collect()
        }
        MicType::Studio => samples.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::rms;
    use crate::rng::create_rng;

    fn tone(freq: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 0.3 * (2.0 * PI * freq * i as f64 / 48_000.0).sin())
            .collect()
    }

    #[test]
    fn test_studio_and_zero_proximity_pass_through() {
        let x = tone(300.0, 4800);
        let mut rng = create_rng(1);
        assert_eq!(apply(&x, 1.0, MicType::Studio, 48_000, &mut rng), x);
        assert_eq!(apply(&x, 0.0, MicType::Car, 48_000, &mut rng), x);
    }

    #[test]
    fn test_handset_bass_only_when_close() {
        let x = tone(100.0, 48_000);
        let mut rng = create_rng(1);
        assert_eq!(apply(&x, 0.4, MicType::Handset, 48_000, &mut rng), x);

        let close = apply(&x, 0.9, MicType::Handset, 48_000, &mut rng);
        assert!(rms(&close[24_000..]) > rms(&x[24_000..]));
    }

    #[test]
    fn test_headset_lifts_presence() {
        let x = tone(3000.0, 48_000);
        let y = apply(&x, 1.0, MicType::Headset, 48_000, &mut create_rng(1));
        assert!(rms(&y[24_000..]) > rms(&x[24_000..]));
    }

    #[test]
    fn test_far_speakerphone_dulls_highs() {
        let x = tone(12_000.0, 48_000);
        let y = apply(&x, 0.1, MicType::Speakerphone, 48_000, &mut create_rng(1));
        assert!(rms(&y[24_000..]) < rms(&x[24_000..]));
    }

    #[test]
    fn test_car_band_limits() {
        let x = tone(10_000.0, 48_000);
        let y = apply(&x, 0.5, MicType::Car, 48_000, &mut create_rng(1));
        assert!(rms(&y[24_000..]) < 0.5 * rms(&x[24_000..]));
    }
}
