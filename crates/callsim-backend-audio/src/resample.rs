//! Sample-rate conversion with rubato.
//!
//! Every decoded buffer passes through [`resample`] on its way to the
//! canonical rate. The FFT resampler's output delay is trimmed and the result
//! is cut to the exact expected length, so a resampled buffer lines up with
//! its source sample for sample.

use rubato::{FftFixedIn, Resampler};
use tracing::debug;

use crate::error::{AudioError, AudioResult};

const CHUNK: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// Resamples mono `samples` from `from_rate` to `to_rate`.
///
/// Output length is `round(len * to_rate / from_rate)`.
pub fn resample(samples: &[f64], from_rate: u32, to_rate: u32) -> AudioResult<Vec<f64>> {
    if from_rate == 0 {
        return Err(AudioError::InvalidSampleRate { rate: from_rate });
    }
    if to_rate == 0 {
        return Err(AudioError::InvalidSampleRate { rate: to_rate });
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    debug!(from_rate, to_rate, frames = samples.len(), "resampling");

    let expected = (samples.len() as f64 * to_rate as f64 / from_rate as f64).round() as usize;
    let mut resampler =
        FftFixedIn::<f64>::new(from_rate as usize, to_rate as usize, CHUNK, SUB_CHUNKS, 1)
            .map_err(|e| AudioError::resample(e.to_string()))?;
    let delay = resampler.output_delay();

    let mut out = Vec::with_capacity(expected + delay + CHUNK);
    let mut block = Vec::with_capacity(CHUNK);
    let mut pos = 0;
    while out.len() < expected + delay {
        let needed = resampler.input_frames_next();
        block.clear();
        let end = (pos + needed).min(samples.len());
        if pos < end {
            block.extend_from_slice(&samples[pos..end]);
        }
        block.resize(needed, 0.0);
        pos += needed;

        let frames = resampler
            .process(&[block.as_slice()], None)
            .map_err(|e| AudioError::resample(e.to_string()))?;
        match frames.first() {
            Some(channel) if !channel.is_empty() => out.extend_from_slice(channel),
            _ => return Err(AudioError::resample("resampler produced no output")),
        }
    }

    out.drain(..delay.min(out.len()));
    out.truncate(expected);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_same_rate_is_identity() {
        let x = vec![0.1, -0.2, 0.3];
        assert_eq!(resample(&x, 48_000, 48_000).unwrap(), x);
    }

    #[test]
    fn test_zero_rate_rejected() {
        assert!(matches!(
            resample(&[0.0; 4], 0, 48_000),
            Err(AudioError::InvalidSampleRate { rate: 0 })
        ));
    }

    #[test]
    fn test_output_length_matches_ratio() {
        let x = vec![0.0; 32_000];
        assert_eq!(resample(&x, 32_000, 48_000).unwrap().len(), 48_000);

        let y = vec![0.0; 1000];
        assert_eq!(resample(&y, 44_100, 48_000).unwrap().len(), 1088);
    }

    #[test]
    fn test_tone_level_survives_upsampling() {
        let sr_in = 32_000.0;
        let x: Vec<f64> = (0..32_000)
            .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f64 / sr_in).sin())
            .collect();
        let y = resample(&x, 32_000, 48_000).unwrap();

        let mid = &y[4_000..44_000];
        let rms = (mid.iter().map(|v| v * v).sum::<f64>() / mid.len() as f64).sqrt();
        assert!((rms - 0.5 / 2f64.sqrt()).abs() < 0.01, "rms {rms}");
    }
}
