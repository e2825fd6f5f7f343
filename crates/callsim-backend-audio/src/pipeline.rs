//! The render pipeline.
//!
//! [`process_audio`] turns a clean voice recording into a phone call. Stage
//! order:
//!
//! 1. Resample to the canonical rate and check the length limits.
//! 2. Source conditioning: dereverb, HPF/LPF, leveler.
//! 3. Room IR, withheld when it is also the background IR.
//! 4. Foreground events.
//! 5. Background bed with ducking.
//! 6. Pre-limit.
//! 7. Tier passband and coloration.
//! 8. Legacy bandwidth override (non-modern tiers).
//! 9. Opus round trip (mobile tiers below 32 kbps, when ffmpeg is present).
//! 10. Post-tier μ-law grit.
//! 11. Handset IR (non-modern tiers whose room IR did not apply).
//! 12. Network artifacts, or the landline subset.
//! 13. Safety clip.
//! 14. Final normalization, falling back to peak when loudness is unmeasurable.
//!
//! Only the primary input can fail a render. Every auxiliary file that is
//! missing or unreadable turns its stage into a no-op.

use std::path::Path;

use callsim_spec::{
    EffectParameters, HandsetOutcome, IrOutcome, NormalizeMode, RenderStatus, CANONICAL_SAMPLE_RATE,
};
use tracing::{debug, warn};

use crate::background::{mix_background, BedSettings};
use crate::buffer::AudioBuffer;
use crate::convolve::{convolve_ir, same_file};
use crate::decode::decode_to_rate;
use crate::dereverb::dereverb;
use crate::dynamics::{leveler, normalize_peak, prelimit, safety_clip, PRELIMIT_THRESHOLD};
use crate::error::{AudioError, AudioResult};
use crate::events::render_events;
use crate::filter::hpf_lpf;
use crate::loudness::normalize_loudness;
use crate::network;
use crate::opus;
use crate::resample::resample;
use crate::rng::create_stage_rng;
use crate::tier::{apply_bandwidth_override, apply_tier, mu_law_grit, resolve_profile, POST_GRIT_MAX};

/// Shortest accepted voice input.
pub const MIN_INPUT_SECONDS: f64 = 0.05;

/// Longest accepted voice input.
pub const MAX_INPUT_SECONDS: f64 = 30.0 * 60.0;

/// Decodes the voice at `path` and renders it.
///
/// An undecodable input is an error; see [`process_audio`] for the rest.
pub fn process_file(
    path: &Path,
    params: &EffectParameters,
    seed: u32,
    scratch_dir: Option<&Path>,
) -> AudioResult<(AudioBuffer, RenderStatus)> {
    let voice = decode_to_rate(path, CANONICAL_SAMPLE_RATE, scratch_dir)?;
    process_audio(voice, params, seed, scratch_dir)
}

/// Renders `voice` through the full pipeline.
///
/// The result is a mono buffer at [`CANONICAL_SAMPLE_RATE`] plus the status
/// record of every optional branch. Identical inputs, parameters and seed
/// give bit-identical output.
///
/// # Errors
/// [`AudioError::InputTooShort`] and [`AudioError::InputTooLong`] when the
/// voice is outside the accepted duration, or a resampling failure.
pub fn process_audio(
    voice: AudioBuffer,
    params: &EffectParameters,
    seed: u32,
    scratch_dir: Option<&Path>,
) -> AudioResult<(AudioBuffer, RenderStatus)> {
    let sr = CANONICAL_SAMPLE_RATE;
    let voice = if voice.sample_rate == sr {
        voice
    } else {
        AudioBuffer::new(resample(&voice.samples, voice.sample_rate, sr)?, sr)
    };
    check_length(&voice)?;

    let resolved = params.resolve();
    for fallback in &resolved.fallbacks {
        warn!(%fallback, "parameter adjusted");
    }
    let p = &resolved.params;
    let tier = resolved.tier;
    let mut status = RenderStatus::new(tier, resolve_profile(tier, p).description);
    status.fallbacks = resolved.fallbacks.clone();
    status.normalization = p.normalize;

    let mut y = voice.samples;

    // Source conditioning
    if p.dereverb_amount > 0.0 {
        let cleaned = dereverb(&y, p.dereverb_amount);
        if tier.is_modern() {
            if p.cleanup_mix > 0.0 {
                let mix = p.cleanup_mix;
                y = y
                    .iter()
                    .zip(&cleaned)
                    .map(|(&dry, &wet)| dry * (1.0 - mix) + wet * mix)
                    .collect();
                status.cleanup_applied = true;
            }
        } else {
            y = cleaned;
            status.cleanup_applied = true;
        }
    }
    y = hpf_lpf(&y, p.source_hpf_hz, p.source_lpf_hz, sr, false);
    y = leveler(&y, p.leveler_amount, sr);

    // Room IR, unless the same file is the bed's IR
    if p.room_ir.is_some() && same_file(p.room_ir.as_deref(), p.background_ir.as_deref()) {
        debug!("room IR is the background IR, applying it to the bed only");
        status.room_ir = IrOutcome::Guarded;
        status.ir_guard = true;
    } else {
        let (out, name) = convolve_ir(y, p.room_ir.as_deref(), p.room_ir_mix, sr, scratch_dir);
        y = out;
        if let Some(name) = name {
            status.room_ir = IrOutcome::Applied {
                name,
                mix_percent: p.room_ir_mix,
            };
        }
    }

    // Foreground events
    let overlay = render_events(y.len(), p, sr, seed, scratch_dir);
    for (s, e) in y.iter_mut().zip(&overlay.samples) {
        *s += e;
    }
    status.events_placed = overlay.events.len();

    // Background bed
    let bed = BedSettings::from_params(p);
    status.background_candidates = bed.files.len();
    let mut rng = create_stage_rng("background", seed, 0);
    let mixed = mix_background(y, &bed, sr, &mut rng, scratch_dir);
    y = mixed.samples;
    status.background = mixed.chosen;
    status.background_ir = mixed.ir;

    prelimit(&mut y, PRELIMIT_THRESHOLD);

    // Phone frame
    let rendered = apply_tier(&y, tier, p, sr, seed);
    y = rendered.samples;
    status.passband_hz = rendered.passband_hz;
    status.mu_law_amount = rendered.mu_law_amount;

    if !tier.is_modern() {
        status.bandwidth_override = apply_bandwidth_override(&mut y, p.bandwidth_mode, sr);
    }

    if opus::applies(tier, p.opus_bitrate_kbps) {
        if let Some((out, kbps)) = opus::round_trip(&y, p.opus_bitrate_kbps, sr, scratch_dir) {
            y = out;
            status.opus_kbps = Some(kbps);
        }
    }

    mu_law_grit(&mut y, p.post_mu_grit.min(POST_GRIT_MAX));

    // Handset IR
    if tier.is_modern() || status.room_ir.is_applied() {
        status.handset_ir = HandsetOutcome::Skipped;
        debug!(tier = %tier, "handset IR skipped");
    } else {
        let (out, name) = convolve_ir(y, p.handset_ir.as_deref(), p.handset_ir_mix, sr, scratch_dir);
        y = out;
        if let Some(name) = name {
            status.handset_ir = HandsetOutcome::Applied {
                name,
                mix_percent: p.handset_ir_mix,
            };
        }
    }

    let (out, branch) = network::apply(y, tier, &rendered.profile, p, sr, seed);
    y = out;
    status.network = branch;

    if safety_clip(&mut y) {
        debug!("safety clip engaged");
    }

    match p.normalize {
        NormalizeMode::Peak => normalize_peak(&mut y, NormalizeMode::PEAK_TARGET),
        NormalizeMode::Loudness => {
            if !normalize_loudness(&mut y, sr, NormalizeMode::LOUDNESS_TARGET_LUFS) {
                status.normalization = NormalizeMode::Peak;
            }
        }
    }

    debug!(%status, "render complete");
    Ok((AudioBuffer::new(y, sr), status))
}

fn check_length(voice: &AudioBuffer) -> AudioResult<()> {
    let seconds = voice.duration_seconds();
    if seconds < MIN_INPUT_SECONDS {
        return Err(AudioError::InputTooShort {
            seconds,
            minimum: MIN_INPUT_SECONDS,
        });
    }
    if seconds > MAX_INPUT_SECONDS {
        return Err(AudioError::InputTooLong {
            seconds,
            maximum: MAX_INPUT_SECONDS,
        });
    }
    Ok(())
}
