//! Render parameters.
//!
//! [`EffectParameters`] is one flat record holding every knob of every stage.
//! Missing fields take the canonical default table ([`Default`]), so a JSON
//! document only needs to list what it changes. Values are never rejected for
//! being out of range; [`EffectParameters::resolve`] clamps them and records
//! each adjustment as a [`ConfigFallback`].

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ParamsError;
use crate::tier::QualityTier;

/// Every knob of a render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EffectParameters {
    // Source conditioning
    /// Spectral-gate noise/reverb reduction, 0..2 (values above 1 run a second pass).
    pub dereverb_amount: f64,
    /// Blend of the cleaned voice against the original, 0..1. Only honored by modern tiers.
    pub cleanup_mix: f64,
    /// Source high-pass corner in Hz (below 20 disables).
    pub source_hpf_hz: f64,
    /// Source low-pass corner in Hz.
    pub source_lpf_hz: f64,
    /// One-knob leveler amount, 0..1.
    pub leveler_amount: f64,

    // Room impulse response
    /// Room IR applied before the phone frame.
    pub room_ir: Option<PathBuf>,
    /// Room IR wet mix in percent.
    pub room_ir_mix: f64,

    // Background bed
    /// Candidate bed files; one is picked per render.
    pub background_files: Vec<PathBuf>,
    /// IR applied to the bed only.
    pub background_ir: Option<PathBuf>,
    /// Bed IR wet mix in percent.
    pub background_ir_mix: f64,
    /// Bed level in dB.
    pub background_gain_db: f64,
    /// Bed level under full voice activity, in dB (0 disables ducking).
    pub background_duck_db: f64,
    /// Bed high-pass corner in Hz.
    pub background_hpf_hz: f64,
    /// Bed low-pass corner in Hz.
    pub background_lpf_hz: f64,

    // Phone quality tier
    /// Tier identifier; unknown ids fall back to "standard".
    pub quality_tier: String,
    /// Custom tier high-pass corner in Hz.
    pub custom_low_hz: f64,
    /// Custom tier low-pass corner in Hz.
    pub custom_high_hz: f64,
    /// Custom tier full-band μ-law amount, 0..1.
    pub custom_compression: f64,
    /// Custom tier noise level relative to the signal peak.
    pub custom_noise: f64,
    /// Custom tier dropout multiplier.
    pub custom_dropout_mult: f64,
    /// Custom tier garble multiplier.
    pub custom_garble_mult: f64,

    // Legacy phone frame
    /// Fixed bandwidth override for non-modern tiers.
    pub bandwidth_mode: BandwidthMode,
    /// Extra post-tier μ-law grit, 0..0.15.
    pub post_mu_grit: f64,
    /// Opus round-trip bitrate in kbps for mobile tiers; 0 or 32 and above skip it.
    pub opus_bitrate_kbps: f64,

    // Network artifacts
    /// Packet-loss concealment chunk length in ms.
    pub plc_ms: f64,
    /// Dropout probability per PLC chunk.
    pub dropout_prob: f64,
    /// Attenuation applied to a dropped chunk, in dB.
    pub dropout_depth_db: f64,
    /// Garble probability per 60 ms window.
    pub garble_prob: f64,
    /// Stutter probability per 50 ms window.
    pub stutter_amount: f64,
    /// Jitter timewarp intensity, 0..1.
    pub jitter_intensity: f64,
    /// Rebuffering smear intensity, 0..1.
    pub buffer_prob: f64,
    /// Packet reorder probability.
    pub reorder_prob: f64,
    /// Codec artifact profile.
    pub codec_profile: CodecProfile,
    /// Codec artifact intensity, 0..1.
    pub codec_intensity: f64,
    /// Mic proximity, 0 (far) .. 1 (close).
    pub mic_proximity: f64,
    /// Mic type used for proximity coloration.
    pub mic_type: MicType,
    /// High-frequency sizzle noise amount.
    pub sizzle_amount: f64,
    /// Broadband RF noise amount.
    pub rf_amount: f64,

    // Handset impulse response
    /// Handset IR applied after the phone frame.
    pub handset_ir: Option<PathBuf>,
    /// Handset IR wet mix in percent.
    pub handset_ir_mix: f64,

    // Foreground events
    /// Traffic one-shots and ambiences.
    pub traffic: EventLayer,
    /// Baby one-shots.
    pub baby: EventLayer,
    /// Dog one-shots.
    pub dog: EventLayer,

    // Output
    /// Final normalization mode.
    pub normalize: NormalizeMode,
}

impl Default for EffectParameters {
    fn default() -> Self {
        Self {
            dereverb_amount: 0.0,
            cleanup_mix: 1.0,
            source_hpf_hz: 0.0,
            source_lpf_hz: 20_000.0,
            leveler_amount: 0.6,
            room_ir: None,
            room_ir_mix: 0.0,
            background_files: Vec::new(),
            background_ir: None,
            background_ir_mix: 0.0,
            background_gain_db: -14.0,
            background_duck_db: -12.0,
            background_hpf_hz: 0.0,
            background_lpf_hz: 1_800.0,
            quality_tier: QualityTier::Standard.as_str().to_string(),
            custom_low_hz: 300.0,
            custom_high_hz: 3_400.0,
            custom_compression: 0.3,
            custom_noise: 0.03,
            custom_dropout_mult: 1.0,
            custom_garble_mult: 1.0,
            bandwidth_mode: BandwidthMode::Off,
            post_mu_grit: 0.0,
            opus_bitrate_kbps: 24.0,
            plc_ms: 60.0,
            dropout_prob: 0.01,
            dropout_depth_db: -40.0,
            garble_prob: 0.01,
            stutter_amount: 0.0,
            jitter_intensity: 0.0,
            buffer_prob: 0.0,
            reorder_prob: 0.0,
            codec_profile: CodecProfile::AmrNb,
            codec_intensity: 0.0,
            mic_proximity: 0.5,
            mic_type: MicType::Handset,
            sizzle_amount: 0.0,
            rf_amount: 0.0,
            handset_ir: None,
            handset_ir_mix: 0.0,
            traffic: EventLayer::with_defaults(4.0, -6.0),
            baby: EventLayer::with_defaults(3.0, -8.0),
            dog: EventLayer::with_defaults(3.0, -8.0),
            normalize: NormalizeMode::Peak,
        }
    }
}

/// One category of foreground events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventLayer {
    /// Candidate clips.
    #[serde(default)]
    pub files: Vec<PathBuf>,
    /// Expected events per minute of output.
    #[serde(default = "default_events_per_min")]
    pub events_per_min: f64,
    /// Level of each event after RMS normalization, in dB.
    #[serde(default = "default_event_volume_db")]
    pub volume_db: f64,
}

fn default_events_per_min() -> f64 {
    3.0
}

fn default_event_volume_db() -> f64 {
    -12.0
}

impl EventLayer {
    fn with_defaults(events_per_min: f64, volume_db: f64) -> Self {
        Self {
            files: Vec::new(),
            events_per_min,
            volume_db,
        }
    }

    /// Creates a layer from a file list.
    pub fn new(files: Vec<PathBuf>, events_per_min: f64, volume_db: f64) -> Self {
        Self {
            files,
            events_per_min,
            volume_db,
        }
    }
}

impl Default for EventLayer {
    fn default() -> Self {
        Self::with_defaults(default_events_per_min(), default_event_volume_db())
    }
}

/// Legacy fixed bandwidth override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BandwidthMode {
    /// Tier passband only.
    #[default]
    Off,
    /// 300–3500 Hz.
    Narrowband,
    /// 80–7000 Hz.
    Wideband,
}

impl BandwidthMode {
    /// Returns the (high-pass, low-pass) corners, or `None` when off.
    pub fn corners(&self) -> Option<(f64, f64)> {
        match self {
            BandwidthMode::Off => None,
            BandwidthMode::Narrowband => Some((300.0, 3500.0)),
            BandwidthMode::Wideband => Some((80.0, 7000.0)),
        }
    }
}

/// Codec artifact profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CodecProfile {
    /// Narrowband AMR: decimation aliasing, comb modulation, transient softening.
    #[default]
    AmrNb,
    /// Wideband AMR: slow warble and spectral smoothing.
    AmrWb,
    /// Opus: pre-echo ahead of transients.
    Opus,
    /// EVS: very slow, gentle warble.
    Evs,
}

/// Microphone types for proximity coloration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MicType {
    #[default]
    Handset,
    Headset,
    Speakerphone,
    Car,
    /// No proximity coloration.
    Studio,
}

/// Final normalization mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeMode {
    /// Scale to a 0.97 sample peak.
    #[default]
    Peak,
    /// Scale to -18 LUFS integrated loudness.
    Loudness,
}

impl NormalizeMode {
    /// Peak target of [`NormalizeMode::Peak`].
    pub const PEAK_TARGET: f64 = 0.97;
    /// Loudness target of [`NormalizeMode::Loudness`], in LUFS.
    pub const LOUDNESS_TARGET_LUFS: f64 = -18.0;
}

impl fmt::Display for NormalizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeMode::Peak => write!(f, "peak {:.2}", Self::PEAK_TARGET),
            NormalizeMode::Loudness => write!(f, "{} LUFS", Self::LOUDNESS_TARGET_LUFS),
        }
    }
}

/// A parameter that was clamped or replaced during resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigFallback {
    /// Field name.
    pub field: String,
    /// Value as requested.
    pub requested: String,
    /// Value actually used.
    pub applied: String,
}

impl fmt::Display for ConfigFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}→{}", self.field, self.requested, self.applied)
    }
}

/// Parameters after clamping, with the resolved tier.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParameters {
    /// Clamped parameters; `quality_tier` holds the resolved id.
    pub params: EffectParameters,
    /// Resolved tier.
    pub tier: QualityTier,
    /// Every adjustment made during resolution.
    pub fallbacks: Vec<ConfigFallback>,
}

struct Clamp<'a> {
    fallbacks: &'a mut Vec<ConfigFallback>,
}

impl Clamp<'_> {
    fn range(&mut self, field: &str, value: &mut f64, lo: f64, hi: f64, default: f64) {
        let applied = if !value.is_finite() {
            default
        } else {
            value.clamp(lo, hi)
        };
        if applied != *value {
            self.fallbacks.push(ConfigFallback {
                field: field.to_string(),
                requested: value.to_string(),
                applied: applied.to_string(),
            });
            *value = applied;
        }
    }
}

impl EffectParameters {
    /// Parses a parameter record from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ParamsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a parameter record from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ParamsError> {
        let text = std::fs::read_to_string(path).map_err(|source| ParamsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Serializes the record to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, ParamsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Clamps every knob into its documented range and resolves the tier.
    ///
    /// Non-finite values are replaced by their default. Resolution is
    /// idempotent: resolving an already resolved record reports no fallbacks.
    pub fn resolve(&self) -> ResolvedParameters {
        let mut p = self.clone();
        let mut fallbacks = Vec::new();
        let d = EffectParameters::default();

        let (tier, fell_back) = QualityTier::resolve(&p.quality_tier);
        if fell_back {
            fallbacks.push(ConfigFallback {
                field: "quality_tier".to_string(),
                requested: p.quality_tier.clone(),
                applied: tier.as_str().to_string(),
            });
        }
        p.quality_tier = tier.as_str().to_string();

        let mut c = Clamp {
            fallbacks: &mut fallbacks,
        };

        c.range("dereverb_amount", &mut p.dereverb_amount, 0.0, 2.0, d.dereverb_amount);
        c.range("cleanup_mix", &mut p.cleanup_mix, 0.0, 1.0, d.cleanup_mix);
        c.range("source_hpf_hz", &mut p.source_hpf_hz, 0.0, 1_000.0, d.source_hpf_hz);
        c.range("source_lpf_hz", &mut p.source_lpf_hz, 1_000.0, 24_000.0, d.source_lpf_hz);
        c.range("leveler_amount", &mut p.leveler_amount, 0.0, 1.0, d.leveler_amount);

        c.range("room_ir_mix", &mut p.room_ir_mix, 0.0, 100.0, d.room_ir_mix);

        c.range("background_ir_mix", &mut p.background_ir_mix, 0.0, 100.0, d.background_ir_mix);
        c.range("background_gain_db", &mut p.background_gain_db, -60.0, 24.0, d.background_gain_db);
        c.range("background_duck_db", &mut p.background_duck_db, -60.0, 0.0, d.background_duck_db);
        c.range("background_hpf_hz", &mut p.background_hpf_hz, 0.0, 1_000.0, d.background_hpf_hz);
        c.range("background_lpf_hz", &mut p.background_lpf_hz, 20.0, 24_000.0, d.background_lpf_hz);

        c.range("custom_low_hz", &mut p.custom_low_hz, 20.0, 1_000.0, d.custom_low_hz);
        c.range("custom_high_hz", &mut p.custom_high_hz, 1_000.0, 24_000.0, d.custom_high_hz);
        c.range("custom_compression", &mut p.custom_compression, 0.0, 1.0, d.custom_compression);
        c.range("custom_noise", &mut p.custom_noise, 0.0, 0.2, d.custom_noise);
        c.range("custom_dropout_mult", &mut p.custom_dropout_mult, 0.0, 3.0, d.custom_dropout_mult);
        c.range("custom_garble_mult", &mut p.custom_garble_mult, 0.0, 3.0, d.custom_garble_mult);

        c.range("post_mu_grit", &mut p.post_mu_grit, 0.0, 0.15, d.post_mu_grit);
        c.range("opus_bitrate_kbps", &mut p.opus_bitrate_kbps, 0.0, 128.0, d.opus_bitrate_kbps);

        c.range("plc_ms", &mut p.plc_ms, 20.0, 120.0, d.plc_ms);
        c.range("dropout_prob", &mut p.dropout_prob, 0.0, 1.0, d.dropout_prob);
        c.range("dropout_depth_db", &mut p.dropout_depth_db, -60.0, 0.0, d.dropout_depth_db);
        c.range("garble_prob", &mut p.garble_prob, 0.0, 1.0, d.garble_prob);
        c.range("stutter_amount", &mut p.stutter_amount, 0.0, 1.0, d.stutter_amount);
        c.range("jitter_intensity", &mut p.jitter_intensity, 0.0, 1.0, d.jitter_intensity);
        c.range("buffer_prob", &mut p.buffer_prob, 0.0, 1.0, d.buffer_prob);
        c.range("reorder_prob", &mut p.reorder_prob, 0.0, 1.0, d.reorder_prob);
        c.range("codec_intensity", &mut p.codec_intensity, 0.0, 1.0, d.codec_intensity);
        c.range("mic_proximity", &mut p.mic_proximity, 0.0, 1.0, d.mic_proximity);
        c.range("sizzle_amount", &mut p.sizzle_amount, 0.0, 1.0, d.sizzle_amount);
        c.range("rf_amount", &mut p.rf_amount, 0.0, 1.0, d.rf_amount);

        c.range("handset_ir_mix", &mut p.handset_ir_mix, 0.0, 100.0, d.handset_ir_mix);

        for (name, layer, default) in [
            ("traffic", &mut p.traffic, &d.traffic),
            ("baby", &mut p.baby, &d.baby),
            ("dog", &mut p.dog, &d.dog),
        ] {
            c.range(
                &format!("{name}.events_per_min"),
                &mut layer.events_per_min,
                0.0,
                60.0,
                default.events_per_min,
            );
            c.range(
                &format!("{name}.volume_db"),
                &mut layer.volume_db,
                -60.0,
                12.0,
                default.volume_db,
            );
        }

        // Custom corners must leave a passband
        if p.custom_high_hz <= p.custom_low_hz {
            let applied = p.custom_low_hz + 1_000.0;
            fallbacks.push(ConfigFallback {
                field: "custom_high_hz".to_string(),
                requested: p.custom_high_hz.to_string(),
                applied: applied.to_string(),
            });
            p.custom_high_hz = applied;
        }

        ResolvedParameters {
            params: p,
            tier,
            fallbacks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_resolve_cleanly() {
        let resolved = EffectParameters::default().resolve();
        assert_eq!(resolved.tier, QualityTier::Standard);
        assert!(resolved.fallbacks.is_empty());
        assert_eq!(resolved.params, EffectParameters::default());
    }

    #[test]
    fn test_partial_json_uses_default_table() {
        let params = EffectParameters::from_json(
            r#"{ "quality_tier": "cordless", "traffic": { "files": ["a.wav"] } }"#,
        )
        .unwrap();

        assert_eq!(params.quality_tier, "cordless");
        assert_eq!(params.leveler_amount, 0.6);
        assert_eq!(params.traffic.files, vec![PathBuf::from("a.wav")]);
        assert_eq!(params.traffic.events_per_min, 3.0);
        assert_eq!(params.traffic.volume_db, -12.0);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = EffectParameters::from_json(r#"{ "levler_amount": 0.2 }"#).unwrap_err();
        assert!(err.to_string().contains("levler_amount"));
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let params = EffectParameters {
            dropout_prob: 3.0,
            room_ir_mix: -5.0,
            post_mu_grit: 0.35,
            ..Default::default()
        };
        let resolved = params.resolve();

        assert_eq!(resolved.params.dropout_prob, 1.0);
        assert_eq!(resolved.params.room_ir_mix, 0.0);
        assert_eq!(resolved.params.post_mu_grit, 0.15);
        let fields: Vec<_> = resolved.fallbacks.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, vec!["room_ir_mix", "post_mu_grit", "dropout_prob"]);
    }

    #[test]
    fn test_opus_bitrate_default_and_clamp() {
        assert_eq!(EffectParameters::default().opus_bitrate_kbps, 24.0);
        let params = EffectParameters {
            opus_bitrate_kbps: 500.0,
            ..Default::default()
        };
        let resolved = params.resolve();
        assert_eq!(resolved.params.opus_bitrate_kbps, 128.0);
        assert_eq!(resolved.fallbacks[0].field, "opus_bitrate_kbps");
    }

    #[test]
    fn test_non_finite_value_takes_default() {
        let params = EffectParameters {
            leveler_amount: f64::NAN,
            ..Default::default()
        };
        let resolved = params.resolve();
        assert_eq!(resolved.params.leveler_amount, 0.6);
        assert_eq!(resolved.fallbacks.len(), 1);
    }

    #[test]
    fn test_unknown_tier_recorded_as_fallback() {
        let params = EffectParameters {
            quality_tier: "tin_can".to_string(),
            ..Default::default()
        };
        let resolved = params.resolve();

        assert_eq!(resolved.tier, QualityTier::Standard);
        assert_eq!(resolved.params.quality_tier, "standard");
        assert_eq!(resolved.fallbacks[0].to_string(), "quality_tier=tin_can→standard");
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let params = EffectParameters {
            quality_tier: "nope".to_string(),
            jitter_intensity: 9.0,
            ..Default::default()
        };
        let once = params.resolve();
        let twice = once.params.resolve();
        assert_eq!(once.params, twice.params);
        assert!(twice.fallbacks.is_empty());
    }

    #[test]
    fn test_inverted_custom_band_is_repaired() {
        let params = EffectParameters {
            custom_low_hz: 900.0,
            custom_high_hz: 1_000.0,
            ..Default::default()
        };
        assert!(params.resolve().fallbacks.is_empty());

        let params = EffectParameters {
            custom_low_hz: 1_000.0,
            custom_high_hz: 1_000.0,
            ..Default::default()
        };
        let resolved = params.resolve();
        assert_eq!(resolved.params.custom_high_hz, 2_000.0);
    }

    #[test]
    fn test_bandwidth_mode_corners() {
        assert_eq!(BandwidthMode::Off.corners(), None);
        assert_eq!(BandwidthMode::Narrowband.corners(), Some((300.0, 3500.0)));
        assert_eq!(BandwidthMode::Wideband.corners(), Some((80.0, 7000.0)));
    }

    #[test]
    fn test_enum_serde_names() {
        let params = EffectParameters::from_json(
            r#"{ "codec_profile": "amr_wb", "mic_type": "speakerphone", "normalize": "loudness", "bandwidth_mode": "narrowband" }"#,
        )
        .unwrap();
        assert_eq!(params.codec_profile, CodecProfile::AmrWb);
        assert_eq!(params.mic_type, MicType::Speakerphone);
        assert_eq!(params.normalize, NormalizeMode::Loudness);
        assert_eq!(params.bandwidth_mode, BandwidthMode::Narrowband);
    }

    #[test]
    fn test_json_round_trip_preserves_record() {
        let params = EffectParameters {
            room_ir: Some(PathBuf::from("rooms/kitchen.wav")),
            background_files: vec![PathBuf::from("beds/cafe.ogg")],
            ..Default::default()
        };
        let json = params.to_json_pretty().unwrap();
        assert_eq!(EffectParameters::from_json(&json).unwrap(), params);
    }
}
