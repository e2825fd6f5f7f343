//! Mono sample buffers and small sample-level helpers shared by the stages.

/// Mono audio at a known sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Samples, nominally in [-1, 1].
    pub samples: Vec<f64>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Creates a buffer.
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Creates an empty buffer.
    pub fn empty(sample_rate: u32) -> Self {
        Self::new(Vec::new(), sample_rate)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Converts decibels to a linear amplitude factor.
#[inline]
pub fn db_to_amp(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Absolute sample peak, 0 for an empty slice.
pub fn peak(samples: &[f64]) -> f64 {
    samples.iter().fold(0.0_f64, |m, &s| m.max(s.abs()))
}

/// Root-mean-square level, 0 for an empty slice.
pub fn rms(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f64>() / samples.len() as f64).sqrt()
}

/// Number of samples in `ms` milliseconds at `sample_rate`.
#[inline]
pub fn ms_to_samples(ms: f64, sample_rate: u32) -> usize {
    (ms * sample_rate as f64 / 1000.0).max(0.0) as usize
}

/// Linear fade-in/fade-out window of `n` samples with `fade`-sample ramps.
///
/// Returns all ones when the ramps would overlap.
pub fn fade_window(n: usize, fade: usize) -> Vec<f64> {
    let mut window = vec![1.0; n];
    if fade == 0 || fade * 2 >= n {
        return window;
    }
    let denom = (fade - 1).max(1) as f64;
    for i in 0..fade {
        let g = i as f64 / denom;
        window[i] = g;
        window[n - 1 - i] = g;
    }
    window
}

/// Asymmetric envelope follower on |x|.
///
/// Each step moves 1/N of the way toward the rectified input, with N the
/// attack or release time in samples depending on direction. The result is
/// normalized so its maximum is 1.
pub fn envelope_follow(samples: &[f64], attack_ms: f64, release_ms: f64, sample_rate: u32) -> Vec<f64> {
    let atk = ms_to_samples(attack_ms, sample_rate).max(1) as f64;
    let rel = ms_to_samples(release_ms, sample_rate).max(1) as f64;
    let mut env = Vec::with_capacity(samples.len());
    let mut g = 0.0;
    for &s in samples {
        let v = s.abs();
        let n = if v > g { atk } else { rel };
        g += (v - g) / n;
        env.push(g);
    }
    let max = env.iter().fold(0.0_f64, |m, &e| m.max(e));
    if max > 0.0 {
        for e in &mut env {
            *e /= max;
        }
    }
    env
}

/// Linearly resamples `samples` to exactly `target_len` samples.
///
/// Endpoints map onto endpoints, so the first and last samples are kept.
pub fn stretch_to_len(samples: &[f64], target_len: usize) -> Vec<f64> {
    if target_len == 0 || samples.is_empty() {
        return vec![0.0; target_len];
    }
    if samples.len() == 1 || target_len == 1 {
        return vec![samples[0]; target_len];
    }
    let scale = (samples.len() - 1) as f64 / (target_len - 1) as f64;
    (0..target_len)
        .map(|i| interpolate(samples, i as f64 * scale))
        .collect()
}

/// Reads `samples` at fractional index `pos` with linear interpolation,
/// clamping to the ends.
#[inline]
pub fn interpolate(samples: &[f64], pos: f64) -> f64 {
    let last = samples.len() - 1;
    if pos <= 0.0 {
        return samples[0];
    }
    if pos >= last as f64 {
        return samples[last];
    }
    let i = pos.floor() as usize;
    let frac = pos - i as f64;
    samples[i] * (1.0 - frac) + samples[i + 1] * frac
}
