//! Opus codec round trip through ffmpeg.
//!
//! Narrowband and mobile tiers below 32 kbps are encoded with libopus and
//! decoded back, which adds the real codec's pre-echo and band smearing on
//! top of the simulated network artifacts. Without ffmpeg the stage is a
//! no-op.

use std::path::Path;
use std::process::Command;

use callsim_spec::QualityTier;
use tracing::{debug, warn};

use crate::decode::read_wav;
use crate::resample::resample;
use crate::wav::WavResult;

/// Bitrates at or above this leave the voice untouched.
pub const BYPASS_KBPS: f64 = 32.0;

/// Bitrate retried once when the requested one fails.
pub const FALLBACK_KBPS: f64 = 12.0;

/// Returns `true` when `tier` takes the Opus round trip at `kbps`.
///
/// Modern tiers and the landline family never do.
pub fn applies(tier: QualityTier, kbps: f64) -> bool {
    !(tier.is_modern() || tier.is_landline()) && kbps > 0.0 && kbps < BYPASS_KBPS
}

/// Encodes `samples` to Opus at `kbps` and decodes them back.
///
/// A failed encode is retried once at [`FALLBACK_KBPS`]. Returns the decoded
/// samples, trimmed or zero-padded to the input length, and the bitrate that
/// succeeded. `None` when ffmpeg is missing or both attempts fail.
pub fn round_trip(
    samples: &[f64],
    kbps: f64,
    sample_rate: u32,
    scratch_dir: Option<&Path>,
) -> Option<(Vec<f64>, f64)> {
    let ffmpeg = match which::which("ffmpeg") {
        Ok(path) => path,
        Err(_) => {
            debug!("ffmpeg not found, skipping Opus round trip");
            return None;
        }
    };

    let owned;
    let dir = match scratch_dir {
        Some(dir) => dir,
        None => {
            owned = tempfile::tempdir().ok()?;
            owned.path()
        }
    };

    let input = tempfile::Builder::new()
        .prefix("opus-in-")
        .suffix(".wav")
        .tempfile_in(dir)
        .ok()?;
    if let Err(e) = WavResult::from_mono(samples, sample_rate).write_to(input.path()) {
        warn!(error = %e, "could not stage Opus input");
        return None;
    }

    let mut attempts = vec![kbps];
    if kbps != FALLBACK_KBPS {
        attempts.push(FALLBACK_KBPS);
    }
    for rate in attempts {
        match encode_decode(&ffmpeg, input.path(), rate, sample_rate, dir) {
            Some(mut decoded) => {
                decoded.resize(samples.len(), 0.0);
                debug!(kbps = rate, "Opus round trip");
                return Some((decoded, rate));
            }
            None => warn!(kbps = rate, "Opus round trip failed"),
        }
    }
    None
}

fn encode_decode(ffmpeg: &Path, input: &Path, kbps: f64, sample_rate: u32, dir: &Path) -> Option<Vec<f64>> {
    let encoded = tempfile::Builder::new()
        .prefix("opus-")
        .suffix(".opus")
        .tempfile_in(dir)
        .ok()?;
    let decoded = tempfile::Builder::new()
        .prefix("opus-out-")
        .suffix(".wav")
        .tempfile_in(dir)
        .ok()?;
    let rate = sample_rate.to_string();

    let status = Command::new(ffmpeg)
        .args(["-y", "-hide_banner", "-loglevel", "error", "-i"])
        .arg(input)
        .args(["-c:a", "libopus", "-b:a", &format!("{}k", kbps as u32), "-ar", &rate])
        .arg(encoded.path())
        .status()
        .ok()?;
    if !status.success() {
        return None;
    }

    let status = Command::new(ffmpeg)
        .args(["-y", "-hide_banner", "-loglevel", "error", "-i"])
        .arg(encoded.path())
        .args(["-ac", "1", "-ar", &rate, "-f", "wav"])
        .arg(decoded.path())
        .status()
        .ok()?;
    if !status.success() {
        return None;
    }

    let buffer = read_wav(decoded.path()).ok()?;
    if buffer.sample_rate == sample_rate {
        Some(buffer.samples)
    } else {
        resample(&buffer.samples, buffer.sample_rate, sample_rate).ok()
    }
}
