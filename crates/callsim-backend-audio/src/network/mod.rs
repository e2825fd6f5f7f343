//! Network-impairment simulators.
//!
//! Digital tiers run the full chain in a fixed order:
//! RF → garble → dropout → stutter → jitter/buffering → reorder → codec →
//! mic → sizzle. Landline tiers instead run a small analog subset. Every
//! stochastic stage draws from its own substream, so changing one knob never
//! shifts the randomness of another stage.

pub mod codec;
pub mod dropout;
pub mod garble;
pub mod jitter;
pub mod mic;
pub mod noise;
pub mod reorder;
pub mod stutter;

use callsim_spec::{CodecProfile, EffectParameters, MicType, NetworkBranch, QualityTier, TierProfile};
use tracing::debug;

use crate::rng::create_stage_rng;

/// Substream index used by the digital chain.
const DIGITAL_INDEX: u32 = 0;

/// Substream index used by the landline subset.
const LANDLINE_INDEX: u32 = 1;

/// Network knobs after tier scaling.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSettings {
    pub rf_amount: f64,
    /// RF noise is not part of a wired landline.
    pub rf_enabled: bool,
    pub garble_prob: f64,
    pub dropout_prob: f64,
    pub plc_ms: f64,
    pub dropout_depth_db: f64,
    pub stutter_amount: f64,
    pub jitter_intensity: f64,
    pub buffer_prob: f64,
    pub reorder_prob: f64,
    pub codec_profile: CodecProfile,
    pub codec_intensity: f64,
    pub mic_proximity: f64,
    pub mic_type: MicType,
    pub sizzle_amount: f64,
}

impl NetworkSettings {
    /// Scales the user knobs by the tier's artifact multipliers.
    ///
    /// Garble and dropout probabilities are multiplied and clamped to [0, 1].
    /// A non-zero tier stutter replaces the user stutter.
    pub fn scaled(params: &EffectParameters, tier: QualityTier, profile: &TierProfile) -> Self {
        let stutter_amount = if profile.stutter_amount > 0.0 {
            profile.stutter_amount
        } else {
            params.stutter_amount
        };
        Self {
            rf_amount: params.rf_amount,
            rf_enabled: !matches!(tier, QualityTier::GoodLandline | QualityTier::BadLandline),
            garble_prob: (params.garble_prob * profile.garble_mult).clamp(0.0, 1.0),
            dropout_prob: (params.dropout_prob * profile.dropout_mult).clamp(0.0, 1.0),
            plc_ms: params.plc_ms,
            dropout_depth_db: params.dropout_depth_db,
            stutter_amount,
            jitter_intensity: params.jitter_intensity,
            buffer_prob: params.buffer_prob,
            reorder_prob: params.reorder_prob,
            codec_profile: params.codec_profile,
            codec_intensity: params.codec_intensity,
            mic_proximity: params.mic_proximity,
            mic_type: params.mic_type,
            sizzle_amount: params.sizzle_amount,
        }
    }

    /// Returns `true` when every impairment knob is zero and the mic adds no
    /// coloration.
    pub fn is_idle(&self) -> bool {
        let mic_idle = self.mic_proximity <= 0.0 || self.mic_type == MicType::Studio;
        mic_idle
            && [
                self.dropout_prob,
                self.garble_prob,
                self.stutter_amount,
                self.jitter_intensity,
                self.buffer_prob,
                self.reorder_prob,
                self.codec_intensity,
                self.sizzle_amount,
                self.rf_amount,
            ]
            .iter()
            .all(|&v| v <= 0.0)
    }
}

/// Runs the digital impairment chain.
pub fn apply_chain(samples: Vec<f64>, settings: &NetworkSettings, sample_rate: u32, seed: u32) -> Vec<f64> {
    let mut y = samples;

    if settings.rf_enabled {
        let mut rng = create_stage_rng("rf", seed, DIGITAL_INDEX);
        noise::rf(&mut y, settings.rf_amount, &mut rng);
    }

    let mut rng = create_stage_rng("garble", seed, DIGITAL_INDEX);
    garble::apply(&mut y, settings.garble_prob, sample_rate, &mut rng);

    let mut rng = create_stage_rng("dropout", seed, DIGITAL_INDEX);
    dropout::apply(
        &mut y,
        settings.dropout_prob,
        settings.plc_ms,
        settings.dropout_depth_db,
        sample_rate,
        &mut rng,
    );

    let mut rng = create_stage_rng("stutter", seed, DIGITAL_INDEX);
    y = stutter::apply(&y, settings.stutter_amount, sample_rate, &mut rng);

    let mut rng = create_stage_rng("jitter", seed, DIGITAL_INDEX);
    y = jitter::apply(&y, settings.jitter_intensity, settings.buffer_prob, sample_rate, &mut rng);

    let mut rng = create_stage_rng("reorder", seed, DIGITAL_INDEX);
    y = reorder::apply(&y, settings.reorder_prob, sample_rate, &mut rng);

    let mut rng = create_stage_rng("codec", seed, DIGITAL_INDEX);
    y = codec::apply(&y, settings.codec_profile, settings.codec_intensity, sample_rate, &mut rng);

    let mut rng = create_stage_rng("mic", seed, DIGITAL_INDEX);
    y = mic::apply(&y, settings.mic_proximity, settings.mic_type, sample_rate, &mut rng);

    let mut rng = create_stage_rng("sizzle", seed, DIGITAL_INDEX);
    noise::sizzle(&mut y, settings.sizzle_amount, &mut rng);

    y
}

/// Runs the analog impairments of a landline tier.
///
/// Good landlines stay clean. Bad landlines get a slight wow and rare
/// crackle-like dropouts. Cordless phones get range dropouts, a light stutter
/// and RF noise.
pub fn apply_landline(
    samples: Vec<f64>,
    tier: QualityTier,
    params: &EffectParameters,
    sample_rate: u32,
    seed: u32,
) -> Vec<f64> {
    let mut y = samples;
    match tier {
        QualityTier::BadLandline => {
            let mut rng = create_stage_rng("jitter", seed, LANDLINE_INDEX);
            y = jitter::timewarp(&y, (params.jitter_intensity * 0.5).min(0.01), &mut rng);

            let mut rng = create_stage_rng("dropout", seed, LANDLINE_INDEX);
            dropout::apply(
                &mut y,
                (params.dropout_prob * 0.2).min(0.05),
                params.plc_ms,
                params.dropout_depth_db,
                sample_rate,
                &mut rng,
            );
        }
        QualityTier::Cordless => {
            let mut rng = create_stage_rng("dropout", seed, LANDLINE_INDEX);
            dropout::apply(
                &mut y,
                (params.dropout_prob * 0.5).min(0.15),
                params.plc_ms,
                params.dropout_depth_db,
                sample_rate,
                &mut rng,
            );

            let mut rng = create_stage_rng("stutter", seed, LANDLINE_INDEX);
            y = stutter::apply(&y, (params.stutter_amount * 0.5).min(0.04), sample_rate, &mut rng);

            let mut rng = create_stage_rng("rf", seed, LANDLINE_INDEX);
            noise::rf(&mut y, params.rf_amount, &mut rng);
        }
        _ => {}
    }
    y
}

/// Applies the network stage appropriate to `tier`.
pub fn apply(
    samples: Vec<f64>,
    tier: QualityTier,
    profile: &TierProfile,
    params: &EffectParameters,
    sample_rate: u32,
    seed: u32,
) -> (Vec<f64>, NetworkBranch) {
    if tier.is_landline() {
        debug!(tier = %tier, "landline impairments");
        return (apply_landline(samples, tier, params, sample_rate, seed), NetworkBranch::Landline);
    }

    let settings = NetworkSettings::scaled(params, tier, profile);
    if settings.is_idle() {
        debug!("network chain idle");
        return (samples, NetworkBranch::Idle);
    }
    debug!(?settings, "network chain");
    (apply_chain(samples, &settings, sample_rate, seed), NetworkBranch::Digital)
}
