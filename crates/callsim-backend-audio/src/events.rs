//! Foreground sound-effect placement.
//!
//! Clips are scattered over the output as an additive overlay. Short clips
//! become one-shots; clips of [`AMBIENT_MIN_SECONDS`] or more become a single
//! ambient scene biased toward the start of the call. A per-sample occupancy
//! counter keeps placements from piling up.

use std::path::{Path, PathBuf};

use callsim_spec::{EffectParameters, EventLayer};
use rand::Rng;
use tracing::debug;

use crate::buffer::{db_to_amp, fade_window, ms_to_samples, rms};
use crate::decode::decode_or_empty;
use crate::rng::create_stage_rng;

/// Per-sample occupancy saturates here.
pub const MAX_OCCUPANCY: u8 = 3;

/// Placement attempts per event before it is dropped.
pub const RETRY_BUDGET: usize = 12;

/// Largest accepted mean occupancy over a candidate span.
pub const MAX_OVERLAP: f64 = 0.5;

/// Clips at least this long are treated as ambient scenes.
pub const AMBIENT_MIN_SECONDS: f64 = 3.0;

/// One-shots up to this length are used whole.
pub const ONE_SHOT_MAX_SECONDS: f64 = 2.0;

/// Shortest random slice taken from a longer one-shot.
pub const ONE_SHOT_MIN_SECONDS: f64 = 0.8;

/// RMS every clip is normalized to before its volume is applied.
pub const EVENT_RMS: f64 = 0.1;

/// Category names paired with their substream index.
const CATEGORIES: [(&str, u32); 3] = [("traffic", 0), ("baby", 1), ("dog", 2)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    OneShot,
    Ambient,
}

/// One placed clip.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedEvent {
    pub category: String,
    pub source: PathBuf,
    pub kind: EventKind,
    pub start_sample: usize,
    pub length: usize,
    /// Linear gain applied after RMS normalization.
    pub gain: f64,
    /// Mean occupancy of the span just before the clip was added.
    pub overlap: f64,
}

/// Additive overlay plus its bookkeeping.
#[derive(Debug, Clone)]
pub struct EventOverlay {
    pub samples: Vec<f64>,
    pub occupancy: Vec<u8>,
    pub events: Vec<PlacedEvent>,
}

impl EventOverlay {
    /// Creates a silent overlay of `len` samples.
    pub fn new(len: usize) -> Self {
        Self {
            samples: vec![0.0; len],
            occupancy: vec![0; len],
            events: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Highest occupancy of any sample.
    pub fn max_occupancy(&self) -> u8 {
        self.occupancy.iter().copied().max().unwrap_or(0)
    }

    /// Mean occupancy over `start..start + len`.
    pub fn overlap(&self, start: usize, len: usize) -> f64 {
        let sum: u64 = self.occupancy[start..start + len].iter().map(|&o| o as u64).sum();
        sum as f64 / len.max(1) as f64
    }

    fn add(&mut self, start: usize, clip: &[f64]) {
        for (i, &s) in clip.iter().enumerate() {
            self.samples[start + i] += s;
            let occ = &mut self.occupancy[start + i];
            *occ = (*occ + 1).min(MAX_OCCUPANCY);
        }
    }
}

/// Places events from one category into `overlay`.
///
/// Returns the number of events placed. An empty file list or a rate at or
/// below zero places nothing.
pub fn place_layer<R: Rng + ?Sized>(
    overlay: &mut EventOverlay,
    category: &str,
    layer: &EventLayer,
    sample_rate: u32,
    rng: &mut R,
    scratch_dir: Option<&Path>,
) -> usize {
    let total = overlay.len();
    if layer.files.is_empty() || layer.events_per_min <= 0.0 || total == 0 {
        return 0;
    }
    let sr = sample_rate as f64;
    let minutes = total as f64 / sr / 60.0;
    let expected = (layer.events_per_min * minutes).floor() as usize;
    let volume = db_to_amp(layer.volume_db);

    let mut ambient_placed = false;
    let mut placed = 0;

    for _ in 0..expected {
        let source = &layer.files[rng.gen_range(0..layer.files.len())];
        let decoded = decode_or_empty(source, sample_rate, scratch_dir);
        if decoded.is_empty() {
            continue;
        }

        let kind = if decoded.len() as f64 / sr >= AMBIENT_MIN_SECONDS {
            EventKind::Ambient
        } else {
            EventKind::OneShot
        };
        let mut clip = match kind {
            EventKind::Ambient => {
                if ambient_placed {
                    continue;
                }
                ambient_slice(&decoded, total, rng)
            }
            EventKind::OneShot => one_shot_slice(&decoded, sample_rate, rng),
        };

        let (start, overlap) = if clip.len() >= total {
            clip.truncate(total);
            (0, overlay.overlap(0, total))
        } else {
            match find_start(overlay, clip.len(), kind, rng) {
                Some(found) => found,
                None => continue,
            }
        };

        let fade = match kind {
            EventKind::OneShot => ms_to_samples(4.0, sample_rate).max(4),
            EventKind::Ambient => ms_to_samples(150.0, sample_rate),
        };
        let level = rms(&clip);
        let norm = if level > 0.0 { EVENT_RMS / level } else { 1.0 };
        let window = fade_window(clip.len(), fade);
        for (s, w) in clip.iter_mut().zip(&window) {
            *s *= norm * w * volume;
        }
        overlay.add(start, &clip);

        if kind == EventKind::Ambient {
            ambient_placed = true;
        }
        overlay.events.push(PlacedEvent {
            category: category.to_string(),
            source: source.clone(),
            kind,
            start_sample: start,
            length: clip.len(),
            gain: volume,
            overlap,
        });
        placed += 1;
    }
    placed
}

/// Renders every event category of `params` into one overlay of `len` samples.
///
/// Each category draws from its own `events` substream.
pub fn render_events(
    len: usize,
    params: &EffectParameters,
    sample_rate: u32,
    seed: u32,
    scratch_dir: Option<&Path>,
) -> EventOverlay {
    let mut overlay = EventOverlay::new(len);
    for ((category, index), layer) in CATEGORIES.iter().zip([&params.traffic, &params.baby, &params.dog]) {
        let mut rng = create_stage_rng("events", seed, *index);
        let placed = place_layer(&mut overlay, category, layer, sample_rate, &mut rng, scratch_dir);
        if placed > 0 {
            debug!(category, placed, "events placed");
        }
    }
    overlay
}

/// Random offset into a long clip, at most 60% of the output long.
fn ambient_slice<R: Rng + ?Sized>(clip: &[f64], total: usize, rng: &mut R) -> Vec<f64> {
    let max_offset = clip.len().saturating_sub((total as f64 * 0.8) as usize);
    let offset = if max_offset > 0 { rng.gen_range(0..max_offset) } else { 0 };
    let rest = &clip[offset..];
    let len = rest.len().min((total as f64 * 0.6) as usize);
    rest[..len].to_vec()
}

/// Whole clip up to two seconds, otherwise a random 0.8–2.0 s slice.
fn one_shot_slice<R: Rng + ?Sized>(clip: &[f64], sample_rate: u32, rng: &mut R) -> Vec<f64> {
    let sr = sample_rate as f64;
    if clip.len() as f64 / sr <= ONE_SHOT_MAX_SECONDS {
        return clip.to_vec();
    }
    let len = ((rng.gen_range(ONE_SHOT_MIN_SECONDS..ONE_SHOT_MAX_SECONDS) * sr) as usize).clamp(1, clip.len());
    let start = rng.gen_range(0..=clip.len() - len);
    clip[start..start + len].to_vec()
}

/// Random start whose span is at most [`MAX_OVERLAP`] occupied, with its overlap.
fn find_start<R: Rng + ?Sized>(
    overlay: &EventOverlay,
    len: usize,
    kind: EventKind,
    rng: &mut R,
) -> Option<(usize, f64)> {
    let total = overlay.len();
    let room = total - len;
    let limit = match kind {
        EventKind::Ambient => room.min((total as f64 * 0.2) as usize),
        EventKind::OneShot => room,
    };
    for _ in 0..RETRY_BUDGET {
        let start = if limit > 0 { rng.gen_range(0..limit) } else { 0 };
        let overlap = overlay.overlap(start, len);
        if overlap <= MAX_OVERLAP {
            return Some((start, overlap));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::create_rng;

    fn write_clip(dir: &Path, name: &str, seconds: f64) -> PathBuf {
        let path = dir.join(name);
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 48_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..(seconds * 48_000.0) as usize {
            let s = 0.4 * (i as f64 * 0.07).sin();
            writer.write_sample((s * 32767.0) as i16).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn test_empty_layer_places_nothing() {
        let mut overlay = EventOverlay::new(48_000);
        let layer = EventLayer::default();
        assert_eq!(place_layer(&mut overlay, "dog", &layer, 48_000, &mut create_rng(1), None), 0);
        assert!(overlay.samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_zero_rate_places_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let clip = write_clip(dir.path(), "bark.wav", 0.5);
        let mut overlay = EventOverlay::new(48_000 * 60);
        let layer = EventLayer::new(vec![clip], 0.0, -6.0);
        assert_eq!(place_layer(&mut overlay, "dog", &layer, 48_000, &mut create_rng(1), None), 0);
    }

    #[test]
    fn test_occupancy_never_exceeds_cap() {
        let dir = tempfile::tempdir().unwrap();
        let clip = write_clip(dir.path(), "horn.wav", 1.5);
        let mut overlay = EventOverlay::new(48_000 * 10);
        let layer = EventLayer::new(vec![clip], 60.0, -6.0);
        for seed in 0..3 {
            place_layer(&mut overlay, "traffic", &layer, 48_000, &mut create_rng(seed), None);
        }
        assert!(overlay.max_occupancy() <= MAX_OCCUPANCY);
        assert!(!overlay.events.is_empty());
    }

    #[test]
    fn test_placements_respect_overlap_limit() {
        let dir = tempfile::tempdir().unwrap();
        let clip = write_clip(dir.path(), "horn.wav", 1.5);
        let mut overlay = EventOverlay::new(48_000 * 10);
        let layer = EventLayer::new(vec![clip], 60.0, -6.0);
        for seed in 0..3 {
            place_layer(&mut overlay, "traffic", &layer, 48_000, &mut create_rng(seed), None);
        }
        assert!(overlay.events.iter().all(|e| e.overlap <= MAX_OVERLAP));
        assert!(overlay.events.iter().any(|e| e.overlap > 0.0));
    }

    #[test]
    fn test_only_one_ambient_per_layer() {
        let dir = tempfile::tempdir().unwrap();
        let clip = write_clip(dir.path(), "street.wav", 4.0);
        let mut overlay = EventOverlay::new(48_000 * 20);
        let layer = EventLayer::new(vec![clip], 30.0, -6.0);
        let placed = place_layer(&mut overlay, "traffic", &layer, 48_000, &mut create_rng(2), None);
        assert_eq!(placed, 1);
        let event = &overlay.events[0];
        assert_eq!(event.kind, EventKind::Ambient);
        assert!(event.length <= (48_000.0 * 20.0 * 0.6) as usize);
        assert!(event.start_sample < 48_000 * 4);
    }

    #[test]
    fn test_clip_longer_than_output_is_truncated_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let clip = write_clip(dir.path(), "cry.wav", 1.0);
        let mut overlay = EventOverlay::new(24_000);
        let layer = EventLayer::new(vec![clip], 240.0, 0.0);
        let placed = place_layer(&mut overlay, "baby", &layer, 48_000, &mut create_rng(3), None);
        assert!(placed >= 1);
        assert_eq!(overlay.events[0].start_sample, 0);
        assert_eq!(overlay.events[0].length, 24_000);
    }

    #[test]
    fn test_one_shot_slice_bounds() {
        let clip = vec![0.1; 48_000 * 2 + 4_800];
        let mut rng = create_rng(5);
        for _ in 0..20 {
            let s = one_shot_slice(&clip, 48_000, &mut rng);
            assert!(s.len() >= (0.8 * 48_000.0) as usize - 1);
            assert!(s.len() <= 2 * 48_000);
        }
        assert_eq!(one_shot_slice(&clip[..48_000], 48_000, &mut rng).len(), 48_000);
    }

    #[test]
    fn test_render_events_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let clip = write_clip(dir.path(), "bark.wav", 0.6);
        let params = EffectParameters {
            dog: EventLayer::new(vec![clip], 30.0, -6.0),
            ..Default::default()
        };
        let a = render_events(48_000 * 8, &params, 48_000, 11, None);
        let b = render_events(48_000 * 8, &params, 48_000, 11, None);
        assert_eq!(a.samples, b.samples);
        assert_eq!(a.events.len(), 4);
    }
}
