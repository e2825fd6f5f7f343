//! Background bed mixing with sidechain ducking.
//!
//! One candidate bed is picked per render, rotated to a random start, looped
//! to the voice length and mixed under the voice. The bed level follows the
//! voice envelope so it dips while someone is talking.

use std::path::{Path, PathBuf};

use callsim_spec::{EffectParameters, IrOutcome};
use rand::Rng;
use tracing::debug;

use crate::buffer::{db_to_amp, envelope_follow};
use crate::convolve::convolve_ir;
use crate::decode::decode_or_empty;
use crate::dynamics::soft_clip;
use crate::filter::hpf_lpf;

/// Headroom applied to the bed before filtering.
pub const BED_HEADROOM: f64 = 0.85;

/// Ducking follower attack.
pub const DUCK_ATTACK_MS: f64 = 15.0;

/// Ducking follower release.
pub const DUCK_RELEASE_MS: f64 = 350.0;

/// Bed settings taken from [`EffectParameters`].
#[derive(Debug, Clone, PartialEq)]
pub struct BedSettings {
    pub files: Vec<PathBuf>,
    pub ir: Option<PathBuf>,
    pub ir_mix: f64,
    pub gain_db: f64,
    pub duck_db: f64,
    pub hpf_hz: f64,
    pub lpf_hz: f64,
}

impl BedSettings {
    pub fn from_params(params: &EffectParameters) -> Self {
        Self {
            files: params.background_files.clone(),
            ir: params.background_ir.clone(),
            ir_mix: params.background_ir_mix,
            gain_db: params.background_gain_db,
            duck_db: params.background_duck_db,
            hpf_hz: params.background_hpf_hz,
            lpf_hz: params.background_lpf_hz,
        }
    }
}

/// Result of [`mix_background`].
#[derive(Debug, Clone)]
pub struct BackgroundMix {
    /// Voice with the bed mixed in, or the untouched voice.
    pub samples: Vec<f64>,
    /// File name of the bed that was mixed.
    pub chosen: Option<String>,
    /// Outcome of the bed-only IR.
    pub ir: IrOutcome,
}

/// Mixes one background bed under `voice`.
///
/// No candidates, or a bed that fails to decode, returns the voice unchanged.
pub fn mix_background<R: Rng + ?Sized>(
    voice: Vec<f64>,
    settings: &BedSettings,
    sample_rate: u32,
    rng: &mut R,
    scratch_dir: Option<&Path>,
) -> BackgroundMix {
    let untouched = |samples: Vec<f64>| BackgroundMix {
        samples,
        chosen: None,
        ir: IrOutcome::None,
    };
    if settings.files.is_empty() || voice.is_empty() {
        return untouched(voice);
    }

    let path = &settings.files[rng.gen_range(0..settings.files.len())];
    let decoded = decode_or_empty(path, sample_rate, scratch_dir);
    if decoded.is_empty() {
        return untouched(voice);
    }

    let start = rng.gen_range(0..decoded.len());
    let bed = loop_from(&decoded, start, voice.len());

    let (bed, ir_name) = convolve_ir(bed, settings.ir.as_deref(), settings.ir_mix, sample_rate, scratch_dir);
    let ir = match ir_name {
        Some(name) => IrOutcome::Applied {
            name,
            mix_percent: settings.ir_mix,
        },
        None => IrOutcome::None,
    };

    let mut bed: Vec<f64> = bed.into_iter().map(|s| s * BED_HEADROOM).collect();
    bed = hpf_lpf(&bed, settings.hpf_hz, settings.lpf_hz, sample_rate, true);
    soft_clip(&mut bed, 1.0);

    let env = envelope_follow(&voice, DUCK_ATTACK_MS, DUCK_RELEASE_MS, sample_rate);
    let duck_lin = db_to_amp(settings.duck_db);
    let gain = db_to_amp(settings.gain_db);
    let samples = voice
        .iter()
        .zip(&bed)
        .zip(&env)
        .map(|((&v, &b), &e)| v + gain * b * (duck_lin + (1.0 - duck_lin) * (1.0 - e)))
        .collect();

    let chosen = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    debug!(bed = %chosen, start, ir = %ir, "background mixed");

    BackgroundMix {
        samples,
        chosen: Some(chosen),
        ir,
    }
}

/// Reads `source` from `start`, wrapping around, for `len` samples.
fn loop_from(source: &[f64], start: usize, len: usize) -> Vec<f64> {
    source[start..]
        .iter()
        .chain(&source[..start])
        .copied()
        .cycle()
        .take(len)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::create_rng;

    fn write_wav(path: &Path, samples: &[f64]) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 48_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample((s * 32767.0) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn settings(files: Vec<PathBuf>) -> BedSettings {
        BedSettings {
            files,
            ir: None,
            ir_mix: 0.0,
            gain_db: -6.0,
            duck_db: -12.0,
            hpf_hz: 0.0,
            lpf_hz: 8_000.0,
        }
    }

    #[test]
    fn test_loop_from_wraps() {
        assert_eq!(loop_from(&[1.0, 2.0, 3.0], 1, 7), vec![2.0, 3.0, 1.0, 2.0, 3.0, 1.0, 2.0]);
        assert_eq!(loop_from(&[1.0, 2.0, 3.0], 0, 2), vec![1.0, 2.0]);
    }

    #[test]
    fn test_no_candidates_is_noop() {
        let voice = vec![0.1; 4800];
        let mix = mix_background(voice.clone(), &settings(Vec::new()), 48_000, &mut create_rng(1), None);
        assert_eq!(mix.samples, voice);
        assert_eq!(mix.chosen, None);
    }

    #[test]
    fn test_missing_bed_is_noop() {
        let voice = vec![0.1; 4800];
        let s = settings(vec![PathBuf::from("/nonexistent/bed.wav")]);
        let mix = mix_background(voice.clone(), &s, 48_000, &mut create_rng(1), None);
        assert_eq!(mix.samples, voice);
        assert_eq!(mix.chosen, None);
    }

    #[test]
    fn test_bed_mixed_and_named() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("street.wav");
        let bed: Vec<f64> = (0..4800).map(|i| 0.3 * (i as f64 * 0.05).sin()).collect();
        write_wav(&path, &bed);

        let voice = vec![0.0; 48_000];
        let mix = mix_background(voice.clone(), &settings(vec![path]), 48_000, &mut create_rng(3), None);
        assert_eq!(mix.chosen.as_deref(), Some("street.wav"));
        assert_eq!(mix.samples.len(), voice.len());
        assert!(mix.samples.iter().any(|&s| s.abs() > 0.01));
    }

    #[test]
    fn test_bed_ducks_under_voice() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hum.wav");
        let bed: Vec<f64> = (0..48_000).map(|i| 0.3 * (i as f64 * 0.05).sin()).collect();
        write_wav(&path, &bed);

        // Silence then a loud steady voice
        let mut voice = vec![0.0; 96_000];
        for v in &mut voice[48_000..] {
            *v = 0.5;
        }
        let mix = mix_background(voice.clone(), &settings(vec![path]), 48_000, &mut create_rng(4), None);
        let bed_only: Vec<f64> = mix.samples.iter().zip(&voice).map(|(m, v)| m - v).collect();
        let quiet = crate::buffer::rms(&bed_only[10_000..40_000]);
        let ducked = crate::buffer::rms(&bed_only[80_000..94_000]);
        assert!(ducked < quiet * 0.5, "quiet {quiet} ducked {ducked}");
    }
}
