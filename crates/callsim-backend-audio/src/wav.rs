//! Deterministic WAV file writer.
//!
//! Renders are written as mono 16-bit PCM with a fixed 44-byte header and no
//! timestamps or other variable metadata, so identical samples always give
//! identical files. The BLAKE3 hash of the PCM payload identifies a render.

use std::io;
use std::path::Path;

/// Bits per sample of every render.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Size of the canonical RIFF/WAVE header.
pub const HEADER_LEN: usize = 44;

/// Builds a complete mono WAV file around `pcm_data`.
pub fn wav_bytes(sample_rate: u32, pcm_data: &[u8]) -> Vec<u8> {
    let block_align: u16 = BITS_PER_SAMPLE / 8;
    let byte_rate = sample_rate * block_align as u32;
    let data_size = pcm_data.len() as u32;

    let mut out = Vec::with_capacity(HEADER_LEN + pcm_data.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_size).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());
    out.extend_from_slice(pcm_data);
    out
}

/// Converts samples to little-endian 16-bit PCM, clipping to [-1, 1].
pub fn samples_to_pcm16(samples: &[f64]) -> Vec<u8> {
    samples
        .iter()
        .flat_map(|s| ((s.clamp(-1.0, 1.0) * 32767.0).round() as i16).to_le_bytes())
        .collect()
}

/// Returns the `data` chunk of a WAV file, or `None` if it is not one.
pub fn extract_pcm_data(wav: &[u8]) -> Option<&[u8]> {
    if wav.len() < HEADER_LEN || !wav.starts_with(b"RIFF") || wav.get(8..12) != Some(b"WAVE".as_slice()) {
        return None;
    }

    let mut rest = &wav[12..];
    while rest.len() >= 8 {
        let (header, body) = rest.split_at(8);
        let size = u32::from_le_bytes(header[4..8].try_into().ok()?) as usize;
        if &header[..4] == b"data" {
            return body.get(..size);
        }
        // Chunks are word aligned
        rest = body.get(size + size % 2..)?;
    }
    None
}

/// BLAKE3 hash of a PCM payload as lowercase hex.
pub fn pcm_hash(pcm: &[u8]) -> String {
    blake3::hash(pcm).to_hex().to_string()
}

/// An encoded render.
#[derive(Debug, Clone)]
pub struct WavResult {
    /// Complete WAV file bytes.
    pub wav_data: Vec<u8>,
    /// BLAKE3 hash of the PCM payload only.
    pub pcm_hash: String,
    pub sample_rate: u32,
    pub num_samples: usize,
}

impl WavResult {
    /// Encodes mono samples.
    pub fn from_mono(samples: &[f64], sample_rate: u32) -> Self {
        let pcm = samples_to_pcm16(samples);
        Self {
            pcm_hash: pcm_hash(&pcm),
            wav_data: wav_bytes(sample_rate, &pcm),
            sample_rate,
            num_samples: samples.len(),
        }
    }

    /// Writes the file to `path`.
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, &self.wav_data)
    }

    pub fn duration_seconds(&self) -> f64 {
        self.num_samples as f64 / self.sample_rate as f64
    }
}
