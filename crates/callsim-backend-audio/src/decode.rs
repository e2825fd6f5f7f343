//! Media decoding to mono PCM.
//!
//! Files are decoded with symphonia, mixed down to mono and resampled to the
//! requested rate. When symphonia cannot open a container and an `ffmpeg`
//! binary is on `PATH`, the file is transcoded to a mono WAV in a scratch
//! directory and read back with hound.
//!
//! The voice input goes through [`decode_to_rate`], which reports failure.
//! Auxiliary media (impulse responses, beds, event clips) go through
//! [`decode_or_empty`], which degrades to an empty buffer instead.

use std::fs::File;
use std::path::Path;
use std::process::Command;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use crate::buffer::AudioBuffer;
use crate::error::{AudioError, AudioResult};
use crate::resample::resample;

/// Decodes `path` to mono at its native sample rate with symphonia.
pub fn decode_native(path: &Path) -> AudioResult<AudioBuffer> {
    let shown = path.display().to_string();
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();
    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &fmt_opts, &meta_opts)
        .map_err(|e| AudioError::undecodable(&shown, e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::undecodable(&shown, "no supported audio tracks"))?;

    let dec_opts: DecoderOptions = Default::default();
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &dec_opts)
        .map_err(|e| AudioError::undecodable(&shown, e.to_string()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);

    let mut mono: Vec<f64> = Vec::new();
    let mut scratch: Option<SampleBuffer<f32>> = None;
    let mut scratch_shape = (0usize, 0usize);

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            // End of stream, or a chained stream we treat as the end
            Err(SymphoniaError::IoError(_)) | Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(AudioError::undecodable(&shown, e.to_string())),
        };

        while !format.metadata().is_latest() {
            format.metadata().pop();
        }

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(msg)) => {
                debug!(path = %shown, msg = %msg, "skipping corrupt packet");
                continue;
            }
            Err(SymphoniaError::IoError(_)) => break,
            Err(e) => return Err(AudioError::undecodable(&shown, e.to_string())),
        };

        let spec = *decoded.spec();
        sample_rate = spec.rate;
        let channels = spec.channels.count().max(1);

        let frames = decoded.capacity();
        if scratch_shape != (frames, channels) || scratch.is_none() {
            scratch = Some(SampleBuffer::<f32>::new(frames as u64, spec));
            scratch_shape = (frames, channels);
        }
        let Some(buf) = scratch.as_mut() else {
            continue;
        };
        buf.copy_interleaved_ref(decoded);

        let scale = 1.0 / channels as f64;
        for frame in buf.samples().chunks_exact(channels) {
            mono.push(frame.iter().map(|&s| s as f64).sum::<f64>() * scale);
        }
    }

    if sample_rate == 0 {
        return Err(AudioError::undecodable(&shown, "unknown sample rate"));
    }
    Ok(AudioBuffer::new(mono, sample_rate))
}

/// Transcodes `path` with ffmpeg into `scratch_dir` and reads it back.
///
/// Returns `None` when ffmpeg is not installed or the transcode fails.
pub fn decode_with_ffmpeg(path: &Path, target_rate: u32, scratch_dir: &Path) -> Option<AudioBuffer> {
    let ffmpeg = which::which("ffmpeg").ok()?;
    let out = tempfile::Builder::new()
        .prefix("decode-")
        .suffix(".wav")
        .tempfile_in(scratch_dir)
        .ok()?;

    let status = Command::new(ffmpeg)
        .args(["-hide_banner", "-loglevel", "error", "-y", "-i"])
        .arg(path)
        .args(["-ac", "1", "-ar", &target_rate.to_string(), "-f", "wav"])
        .arg(out.path())
        .status()
        .ok()?;
    if !status.success() {
        warn!(path = %path.display(), "ffmpeg transcode failed");
        return None;
    }

    read_wav(out.path()).ok()
}

/// Reads a WAV file with hound, mixing down to mono.
pub fn read_wav(path: &Path) -> AudioResult<AudioBuffer> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|v| v as f64))
            .collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let full_scale = (1_i64 << (spec.bits_per_sample.max(1) - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 / full_scale))
                .collect::<Result<_, _>>()?
        }
    };

    let mono = interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f64>() / channels as f64)
        .collect();
    Ok(AudioBuffer::new(mono, spec.sample_rate))
}

/// Decodes `path` to mono at `target_rate`.
///
/// Symphonia is tried first; on failure the ffmpeg fallback runs in
/// `scratch_dir` (a private temp directory when `None`).
pub fn decode_to_rate(path: &Path, target_rate: u32, scratch_dir: Option<&Path>) -> AudioResult<AudioBuffer> {
    if !path.is_file() {
        return Err(AudioError::undecodable(
            path.display().to_string(),
            "file not found",
        ));
    }

    let native = match decode_native(path) {
        Ok(buffer) => buffer,
        Err(primary) => {
            debug!(path = %path.display(), error = %primary, "trying ffmpeg fallback");
            let fallback = match scratch_dir {
                Some(dir) => decode_with_ffmpeg(path, target_rate, dir),
                None => tempfile::tempdir()
                    .ok()
                    .and_then(|dir| decode_with_ffmpeg(path, target_rate, dir.path())),
            };
            match fallback {
                Some(buffer) => buffer,
                None => return Err(primary),
            }
        }
    };

    let samples = resample(&native.samples, native.sample_rate, target_rate)?;
    Ok(AudioBuffer::new(samples, target_rate))
}

/// Decodes auxiliary media, returning an empty buffer on any failure.
pub fn decode_or_empty(path: &Path, target_rate: u32, scratch_dir: Option<&Path>) -> Vec<f64> {
    match decode_to_rate(path, target_rate, scratch_dir) {
        Ok(buffer) => buffer.samples,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "auxiliary media unavailable");
            Vec::new()
        }
    }
}
