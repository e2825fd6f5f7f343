//! Phone-quality tiers.
//!
//! A tier bundles the passband, filter phase behaviour, landline coloration
//! and network-artifact multipliers that make a render sound like a given
//! kind of call. Eight tiers carry a fixed profile; `custom` is built from
//! explicit parameters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tier used when a requested id is not recognized.
pub const FALLBACK_TIER: QualityTier = QualityTier::Standard;

/// The closed set of phone-quality tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    GoodLandline,
    BadLandline,
    Cordless,
    UltraLow,
    Low,
    Standard,
    High,
    UltraHigh,
    Custom,
}

impl QualityTier {
    /// All tiers in presentation order.
    pub const ALL: [QualityTier; 9] = [
        QualityTier::GoodLandline,
        QualityTier::BadLandline,
        QualityTier::Cordless,
        QualityTier::UltraLow,
        QualityTier::Low,
        QualityTier::Standard,
        QualityTier::High,
        QualityTier::UltraHigh,
        QualityTier::Custom,
    ];

    /// Returns the snake_case identifier of the tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::GoodLandline => "good_landline",
            QualityTier::BadLandline => "bad_landline",
            QualityTier::Cordless => "cordless",
            QualityTier::UltraLow => "ultra_low",
            QualityTier::Low => "low",
            QualityTier::Standard => "standard",
            QualityTier::High => "high",
            QualityTier::UltraHigh => "ultra_high",
            QualityTier::Custom => "custom",
        }
    }

    /// Parses a tier identifier, returning `None` for unknown ids.
    pub fn parse(id: &str) -> Option<Self> {
        let id = id.trim();
        Self::ALL.iter().copied().find(|tier| tier.as_str() == id)
    }

    /// Resolves a tier identifier, falling back to [`FALLBACK_TIER`].
    ///
    /// The second element is `true` when the fallback was taken.
    pub fn resolve(id: &str) -> (Self, bool) {
        match Self::parse(id) {
            Some(tier) => (tier, false),
            None => (FALLBACK_TIER, true),
        }
    }

    /// HD voice and near-source tiers. These skip the legacy phone frame and
    /// the handset IR, and filter with zero phase.
    pub fn is_modern(&self) -> bool {
        matches!(self, QualityTier::High | QualityTier::UltraHigh)
    }

    /// Analog tiers that get the landline artifact subset instead of the
    /// digital network chain.
    pub fn is_landline(&self) -> bool {
        matches!(
            self,
            QualityTier::GoodLandline | QualityTier::BadLandline | QualityTier::Cordless
        )
    }

    /// Returns the fixed profile of the tier, or `None` for [`QualityTier::Custom`].
    pub fn profile(&self) -> Option<TierProfile> {
        let landline = |amount, drive| {
            Some(LandlineColor {
                amount,
                band_low_hz: 300.0,
                band_high_hz: 2400.0,
                drive,
            })
        };

        let profile = match self {
            QualityTier::GoodLandline => TierProfile {
                description: "Clean PSTN Landline".to_string(),
                passband_low_hz: 300.0,
                passband_high_hz: Some(3400.0),
                zero_phase: false,
                landline_color: landline(0.20, 0.70),
                dropout_mult: 0.0,
                garble_mult: 0.0,
                stutter_amount: 0.0,
            },
            QualityTier::BadLandline => TierProfile {
                description: "Poor Landline - Hiss & Crackles".to_string(),
                passband_low_hz: 300.0,
                passband_high_hz: Some(3000.0),
                zero_phase: false,
                landline_color: landline(0.35, 0.65),
                dropout_mult: 0.3,
                garble_mult: 0.0,
                stutter_amount: 0.0,
            },
            QualityTier::Cordless => TierProfile {
                description: "Cordless Phone - RF Interference".to_string(),
                passband_low_hz: 300.0,
                passband_high_hz: Some(2800.0),
                zero_phase: false,
                landline_color: landline(0.35, 0.75),
                dropout_mult: 0.5,
                garble_mult: 0.3,
                stutter_amount: 0.001,
            },
            QualityTier::UltraLow => TierProfile {
                description: "2G/3G Poor Signal".to_string(),
                passband_low_hz: 200.0,
                passband_high_hz: Some(1800.0),
                zero_phase: false,
                landline_color: None,
                dropout_mult: 2.0,
                garble_mult: 1.8,
                stutter_amount: 0.006,
            },
            QualityTier::Low => TierProfile {
                description: "3G/Weak 4G Signal".to_string(),
                passband_low_hz: 200.0,
                passband_high_hz: Some(4000.0),
                zero_phase: false,
                landline_color: None,
                dropout_mult: 1.5,
                garble_mult: 1.4,
                stutter_amount: 0.004,
            },
            QualityTier::Standard => TierProfile {
                description: "Standard Cellular/PSTN".to_string(),
                passband_low_hz: 250.0,
                passband_high_hz: Some(6000.0),
                zero_phase: false,
                landline_color: None,
                dropout_mult: 1.0,
                garble_mult: 1.0,
                stutter_amount: 0.002,
            },
            QualityTier::High => TierProfile {
                description: "HD Voice/High-Quality VoIP".to_string(),
                passband_low_hz: 20.0,
                passband_high_hz: Some(8000.0),
                zero_phase: true,
                landline_color: None,
                dropout_mult: 0.5,
                garble_mult: 0.5,
                stutter_amount: 0.001,
            },
            QualityTier::UltraHigh => TierProfile {
                description: "FaceTime/WhatsApp (Near-Source Quality)".to_string(),
                passband_low_hz: 20.0,
                passband_high_hz: None,
                zero_phase: true,
                landline_color: None,
                dropout_mult: 0.2,
                garble_mult: 0.2,
                stutter_amount: 0.0,
            },
            QualityTier::Custom => return None,
        };
        Some(profile)
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Band-limited μ-law coloration applied by the landline tiers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandlineColor {
    /// Wet blend of the companded band, 0..1.
    pub amount: f64,
    /// Lower edge of the colored band in Hz.
    pub band_low_hz: f64,
    /// Upper edge of the colored band in Hz.
    pub band_high_hz: f64,
    /// Input drive into the compander.
    pub drive: f64,
}

/// Resolved description of a tier.
#[derive(Debug, Clone, PartialEq)]
pub struct TierProfile {
    /// Human-readable name shown in the render status.
    pub description: String,
    /// High-pass corner in Hz.
    pub passband_low_hz: f64,
    /// Low-pass corner in Hz; `None` keeps the full band up to Nyquist.
    pub passband_high_hz: Option<f64>,
    /// Filter forward-backward instead of causally.
    pub zero_phase: bool,
    /// Landline μ-law coloration, if any.
    pub landline_color: Option<LandlineColor>,
    /// Multiplier on the dropout probability.
    pub dropout_mult: f64,
    /// Multiplier on the garble probability.
    pub garble_mult: f64,
    /// Tier stutter amount; overrides the user setting when non-zero.
    pub stutter_amount: f64,
}

impl TierProfile {
    /// Builds the profile for the `custom` tier.
    pub fn custom(low_hz: f64, high_hz: f64, dropout_mult: f64, garble_mult: f64) -> Self {
        Self {
            description: format!("Custom Quality ({}-{}Hz)", low_hz as i64, high_hz as i64),
            passband_low_hz: low_hz,
            passband_high_hz: Some(high_hz),
            zero_phase: false,
            landline_color: None,
            dropout_mult,
            garble_mult,
            stutter_amount: 0.0,
        }
    }

    /// Returns the low-pass corner, substituting `nyquist` for the full band.
    pub fn high_cut_or(&self, nyquist: f64) -> f64 {
        self.passband_high_hz.unwrap_or(nyquist)
    }
}
