//! Render sessions.
//!
//! A [`RenderSession`] owns a private temporary directory. Rendered WAVs and
//! ffmpeg transcodes live there and are removed when the session is dropped,
//! unless the caller keeps the directory.

use std::path::{Path, PathBuf};

use callsim_spec::{EffectParameters, RenderStatus};
use tempfile::TempDir;
use tracing::info;

use crate::error::AudioResult;
use crate::pipeline::process_file;
use crate::wav::WavResult;

/// One finished render.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// WAV file inside the session directory.
    pub path: PathBuf,
    pub status: RenderStatus,
    /// Processed samples at the canonical rate.
    pub samples: Vec<f64>,
    /// BLAKE3 hash of the 16-bit PCM payload.
    pub pcm_hash: String,
}

/// Owner of the temporary files of one or more renders.
#[derive(Debug)]
pub struct RenderSession {
    dir: TempDir,
    renders: usize,
}

impl RenderSession {
    /// Creates a session in the system temp directory.
    pub fn new() -> AudioResult<Self> {
        let dir = tempfile::Builder::new().prefix("callsim-").tempdir()?;
        Ok(Self { dir, renders: 0 })
    }

    /// Session directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Renders the voice at `voice_path` and writes it into the session.
    pub fn render(&mut self, voice_path: &Path, params: &EffectParameters, seed: u32) -> AudioResult<RenderOutput> {
        let (buffer, status) = process_file(voice_path, params, seed, Some(self.dir.path()))?;

        let wav = WavResult::from_mono(&buffer.samples, buffer.sample_rate);
        self.renders += 1;
        let path = self.dir.path().join(format!("render-{:03}.wav", self.renders));
        wav.write_to(&path)?;
        info!(path = %path.display(), pcm_hash = %wav.pcm_hash, "render written");

        Ok(RenderOutput {
            path,
            status,
            samples: buffer.samples,
            pcm_hash: wav.pcm_hash,
        })
    }

    /// Persists the session directory and returns its path.
    pub fn keep(self) -> PathBuf {
        self.dir.keep()
    }
}
