//! Media fixtures written into a temporary directory.

use std::path::{Path, PathBuf};
use std::process::Command;

use callsim_backend_audio::rng::{create_rng, gaussian_noise};
use tempfile::TempDir;

/// A temporary directory of generated media files.
pub struct MediaFixture {
    pub root: TempDir,
}

impl MediaFixture {
    /// Create a new empty fixture directory.
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp dir");
        Self { root }
    }

    /// Get the fixture root path.
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Write mono 16-bit samples as a WAV file.
    pub fn write_wav(&self, name: &str, samples: &[f64], sample_rate: u32) -> PathBuf {
        let path = self.root.path().join(name);
        write_wav(&path, samples, sample_rate);
        path
    }

    /// Write seeded Gaussian noise.
    pub fn noise(&self, name: &str, seconds: f64, sample_rate: u32, sigma: f64, seed: u32) -> PathBuf {
        let n = (seconds * sample_rate as f64) as usize;
        let samples = noise_samples(n, sigma, seed);
        self.write_wav(name, &samples, sample_rate)
    }

    /// Write a sine tone.
    pub fn tone(&self, name: &str, freq: f64, seconds: f64, sample_rate: u32, amplitude: f64) -> PathBuf {
        let samples = tone_samples(freq, seconds, sample_rate, amplitude);
        self.write_wav(name, &samples, sample_rate)
    }

    /// Write an exponentially decaying noise burst, a stand-in for a room IR.
    pub fn impulse_response(&self, name: &str, seconds: f64, seed: u32) -> PathBuf {
        let n = (seconds * 48_000.0) as usize;
        let noise = noise_samples(n, 0.3, seed);
        let mut samples: Vec<f64> = noise
            .iter()
            .enumerate()
            .map(|(i, s)| s * (-(i as f64) / (n as f64 / 6.0)).exp())
            .collect();
        samples[0] = 0.9;
        self.write_wav(name, &samples, 48_000)
    }

    /// Transcode a WAV in the fixture to Ogg Vorbis.
    ///
    /// Returns `None` when ffmpeg is not installed.
    pub fn to_ogg(&self, wav: &Path, name: &str) -> Option<PathBuf> {
        let ffmpeg = which::which("ffmpeg").ok()?;
        let out = self.root.path().join(name);
        let status = Command::new(ffmpeg)
            .args(["-hide_banner", "-loglevel", "error", "-y", "-i"])
            .arg(wav)
            .args(["-c:a", "libvorbis"])
            .arg(&out)
            .status()
            .ok()?;
        status.success().then_some(out)
    }
}

impl Default for MediaFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Write mono 16-bit samples to `path`.
pub fn write_wav(path: &Path, samples: &[f64], sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create WAV");
    for &s in samples {
        let v = (s.clamp(-1.0, 1.0) * 32767.0).round() as i16;
        writer.write_sample(v).expect("Failed to write sample");
    }
    writer.finalize().expect("Failed to finalize WAV");
}

/// Seeded Gaussian noise.
pub fn noise_samples(n: usize, sigma: f64, seed: u32) -> Vec<f64> {
    gaussian_noise(&mut create_rng(seed), n, sigma)
}

/// A sine tone.
pub fn tone_samples(freq: f64, seconds: f64, sample_rate: u32, amplitude: f64) -> Vec<f64> {
    let n = (seconds * sample_rate as f64) as usize;
    (0..n)
        .map(|i| amplitude * (2.0 * std::f64::consts::PI * freq * i as f64 / sample_rate as f64).sin())
        .collect()
}
