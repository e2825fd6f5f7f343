//! Impulse-response convolution.
//!
//! An IR is decoded, resampled to the render rate, peak-normalized and
//! applied by FFT overlap-add convolution with a linear dry/wet crossfade.
//! [`same_file`] decides whether two IR paths point at the same physical
//! file so a render never convolves one IR twice.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use tracing::{debug, warn};

use crate::buffer::peak;
use crate::decode::decode_or_empty;

/// Shortest IR accepted, in taps.
pub const MIN_IR_TAPS: usize = 8;

/// Files larger than this are never content-hashed for identity.
pub const HASH_COMPARE_LIMIT: u64 = 10 * 1024 * 1024;

/// Physical identity of an IR file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrIdentity {
    /// Canonicalized path.
    pub canonical: PathBuf,
    /// File size in bytes.
    pub len: u64,
}

impl IrIdentity {
    /// Resolves the identity of `path`, or `None` if it is not a readable file.
    pub fn of(path: &Path) -> Option<Self> {
        let meta = fs::metadata(path).ok()?;
        if !meta.is_file() {
            return None;
        }
        let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        Some(Self {
            canonical,
            len: meta.len(),
        })
    }

    /// BLAKE3 of the file contents.
    pub fn content_hash(&self) -> Option<blake3::Hash> {
        fs::read(&self.canonical).ok().map(|bytes| blake3::hash(&bytes))
    }

    /// File name for status reporting.
    pub fn name(&self) -> String {
        self.canonical
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.canonical.display().to_string())
    }

    /// Returns `true` if both identities are the same physical file.
    ///
    /// Equal canonical paths match directly. Otherwise files of equal size up
    /// to [`HASH_COMPARE_LIMIT`] match when their contents hash equal.
    pub fn same_as(&self, other: &IrIdentity) -> bool {
        if self.canonical == other.canonical {
            return true;
        }
        if self.len != other.len || self.len > HASH_COMPARE_LIMIT {
            return false;
        }
        match (self.content_hash(), other.content_hash()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

/// Returns `true` if `a` and `b` both exist and are the same file.
pub fn same_file(a: Option<&Path>, b: Option<&Path>) -> bool {
    match (a.and_then(IrIdentity::of), b.and_then(IrIdentity::of)) {
        (Some(a), Some(b)) => a.same_as(&b),
        _ => false,
    }
}

/// A decoded, peak-normalized impulse response.
#[derive(Debug, Clone)]
pub struct ImpulseResponse {
    /// Taps at the render rate, peak 1.0.
    pub taps: Vec<f64>,
    /// Source file identity.
    pub identity: IrIdentity,
}

impl ImpulseResponse {
    /// Loads an IR, returning `None` when the file is missing, undecodable or
    /// shorter than [`MIN_IR_TAPS`].
    pub fn load(path: &Path, sample_rate: u32, scratch_dir: Option<&Path>) -> Option<Self> {
        let identity = IrIdentity::of(path)?;
        let mut taps = decode_or_empty(path, sample_rate, scratch_dir);
        if taps.len() < MIN_IR_TAPS {
            warn!(path = %path.display(), taps = taps.len(), "impulse response too short");
            return None;
        }
        let norm = peak(&taps) + 1e-9;
        for t in &mut taps {
            *t /= norm;
        }
        Some(Self { taps, identity })
    }

    /// Convolves `samples` with this IR and crossfades by `mix_percent`.
    ///
    /// The wet signal is the full linear convolution truncated to the input
    /// length, so the direct sound stays aligned with the dry signal.
    pub fn apply(&self, samples: &[f64], mix_percent: f64) -> Vec<f64> {
        let mix = (mix_percent / 100.0).clamp(0.0, 1.0);
        let wet = fft_convolve(samples, &self.taps, samples.len());
        samples
            .iter()
            .zip(&wet)
            .map(|(&dry, &w)| dry * (1.0 - mix) + w * mix)
            .collect()
    }
}

/// Applies the IR at `path` to `samples`.
///
/// A missing path, a mix at or below zero, or an unusable IR returns the
/// input untouched. On success the IR's file name is returned alongside.
pub fn convolve_ir(
    samples: Vec<f64>,
    path: Option<&Path>,
    mix_percent: f64,
    sample_rate: u32,
    scratch_dir: Option<&Path>,
) -> (Vec<f64>, Option<String>) {
    let Some(path) = path else {
        return (samples, None);
    };
    if mix_percent <= 0.0 || samples.is_empty() {
        return (samples, None);
    }
    match ImpulseResponse::load(path, sample_rate, scratch_dir) {
        Some(ir) => {
            debug!(ir = %ir.identity.name(), taps = ir.taps.len(), mix_percent, "convolving");
            let out = ir.apply(&samples, mix_percent);
            (out, Some(ir.identity.name()))
        }
        None => (samples, None),
    }
}

/// Computes the first `out_len` samples of the linear convolution of
/// `signal` with `kernel` using FFT overlap-add.
pub fn fft_convolve(signal: &[f64], kernel: &[f64], out_len: usize) -> Vec<f64> {
    let mut out = vec![0.0; out_len];
    if signal.is_empty() || kernel.is_empty() || out_len == 0 {
        return out;
    }

    let fft_size = (2 * kernel.len()).max(4096).next_power_of_two();
    let block = fft_size - kernel.len() + 1;

    let mut planner = FftPlanner::<f64>::new();
    let forward: Arc<dyn Fft<f64>> = planner.plan_fft_forward(fft_size);
    let inverse: Arc<dyn Fft<f64>> = planner.plan_fft_inverse(fft_size);

    let mut kernel_spec: Vec<Complex<f64>> = kernel
        .iter()
        .map(|&k| Complex::new(k, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(fft_size)
        .collect();
    forward.process(&mut kernel_spec);

    let scale = 1.0 / fft_size as f64;
    let mut frame = vec![Complex::new(0.0, 0.0); fft_size];
    let mut start = 0;
    while start < signal.len() && start < out_len {
        let end = (start + block).min(signal.len());
        for (i, slot) in frame.iter_mut().enumerate() {
            let idx = start + i;
            *slot = if idx < end {
                Complex::new(signal[idx], 0.0)
            } else {
                Complex::new(0.0, 0.0)
            };
        }
        forward.process(&mut frame);
        for (f, k) in frame.iter_mut().zip(&kernel_spec) {
            *f *= *k;
        }
        inverse.process(&mut frame);

        for (i, v) in frame.iter().enumerate() {
            let idx = start + i;
            if idx >= out_len {
                break;
            }
            out[idx] += v.re * scale;
        }
        start += block;
    }
    out
}
