//! Render status reporting.

use std::fmt;

use serde::Serialize;

use crate::params::{ConfigFallback, NormalizeMode};
use crate::tier::QualityTier;

/// Outcome of one impulse-response role.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IrOutcome {
    /// No IR configured, file missing, or mix at zero.
    None,
    /// The IR was convolved in.
    Applied {
        /// File name of the IR.
        name: String,
        /// Wet mix in percent.
        mix_percent: f64,
    },
    /// The IR was configured but withheld because another role already
    /// applies the same file.
    Guarded,
}

impl IrOutcome {
    /// Returns `true` if the IR colored the signal.
    pub fn is_applied(&self) -> bool {
        matches!(self, IrOutcome::Applied { .. })
    }
}

impl fmt::Display for IrOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrOutcome::None => f.write_str("none"),
            IrOutcome::Applied { name, mix_percent } => {
                write!(f, "{}({}%)", name, mix_percent.round() as i64)
            }
            IrOutcome::Guarded => f.write_str("guarded"),
        }
    }
}

/// Outcome of the handset IR stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum HandsetOutcome {
    /// Skipped because the tier is modern or the room IR already colored the voice.
    Skipped,
    /// Allowed, but no usable handset IR was configured.
    None,
    /// The handset IR was convolved in.
    Applied {
        /// File name of the IR.
        name: String,
        /// Wet mix in percent.
        mix_percent: f64,
    },
}

impl fmt::Display for HandsetOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandsetOutcome::Skipped => f.write_str("skipped"),
            HandsetOutcome::None => f.write_str("none"),
            HandsetOutcome::Applied { name, mix_percent } => {
                write!(f, "{}({}%)", name, mix_percent.round() as i64)
            }
        }
    }
}

/// Which network-impairment branch ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkBranch {
    /// The digital chain ran.
    Digital,
    /// The digital chain was skipped because every scaled knob was zero.
    Idle,
    /// The analog landline subset ran instead of the digital chain.
    Landline,
}

impl fmt::Display for NetworkBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NetworkBranch::Digital => "digital",
            NetworkBranch::Idle => "idle",
            NetworkBranch::Landline => "landline",
        })
    }
}

/// Structured record of which optional branches of a render fired.
///
/// `Display` renders the one-line status string shown to users.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderStatus {
    /// Resolved tier.
    pub tier: QualityTier,
    /// Tier description.
    pub tier_description: String,
    /// Effective passband (high-pass, low-pass) in Hz.
    pub passband_hz: (f64, f64),
    /// μ-law amount applied by the tier.
    pub mu_law_amount: f64,
    /// Bitrate of the Opus round trip, when it ran.
    pub opus_kbps: Option<f64>,
    /// Whether source cleanup changed the voice.
    pub cleanup_applied: bool,
    /// Room IR outcome.
    pub room_ir: IrOutcome,
    /// Background IR outcome.
    pub background_ir: IrOutcome,
    /// The room IR was withheld because it is the background IR.
    pub ir_guard: bool,
    /// File name of the chosen background bed.
    pub background: Option<String>,
    /// Number of background candidates offered.
    pub background_candidates: usize,
    /// Foreground events placed across all categories.
    pub events_placed: usize,
    /// Legacy bandwidth override applied, as (high-pass, low-pass).
    pub bandwidth_override: Option<(f64, f64)>,
    /// Handset IR outcome.
    pub handset_ir: HandsetOutcome,
    /// Network branch that ran.
    pub network: NetworkBranch,
    /// Final normalization mode.
    pub normalization: NormalizeMode,
    /// Parameters adjusted during resolution.
    pub fallbacks: Vec<ConfigFallback>,
}

impl RenderStatus {
    /// Creates a status for `tier` with every optional branch marked as not taken.
    pub fn new(tier: QualityTier, tier_description: impl Into<String>) -> Self {
        Self {
            tier,
            tier_description: tier_description.into(),
            passband_hz: (0.0, 0.0),
            mu_law_amount: 0.0,
            opus_kbps: None,
            cleanup_applied: false,
            room_ir: IrOutcome::None,
            background_ir: IrOutcome::None,
            ir_guard: false,
            background: None,
            background_candidates: 0,
            events_placed: 0,
            bandwidth_override: None,
            handset_ir: HandsetOutcome::None,
            network: NetworkBranch::Idle,
            normalization: NormalizeMode::Peak,
            fallbacks: Vec::new(),
        }
    }
}

impl fmt::Display for RenderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OK · Codec: {}", self.tier_description)?;
        if let Some(kbps) = self.opus_kbps {
            write!(f, " + Opus {} kbps", kbps as i64)?;
        }
        write!(
            f,
            " · BW {}–{} Hz · μ-law {:.2}",
            self.passband_hz.0.round() as i64,
            self.passband_hz.1.round() as i64,
            self.mu_law_amount
        )?;
        if self.cleanup_applied {
            f.write_str(" · Cleanup")?;
        }
        write!(f, " · RoomIR:{} · BGIR:{}", self.room_ir, self.background_ir)?;
        match (&self.background, self.background_candidates) {
            (Some(name), _) => write!(f, " · BG:{name}")?,
            (None, 0) => f.write_str(" · BG:none")?,
            (None, n) => write!(f, " · BG:unreadable ({n} candidates)")?,
        }
        if self.ir_guard {
            f.write_str(" · IR:BG only (guard)")?;
        }
        if self.events_placed > 0 {
            write!(f, " · Events:{}", self.events_placed)?;
        }
        if let Some((lo, hi)) = self.bandwidth_override {
            write!(f, " · Override {}–{} Hz", lo as i64, hi as i64)?;
        }
        write!(
            f,
            " · HandsetIR:{} · Net:{} · Norm:{}",
            self.handset_ir, self.network, self.normalization
        )?;
        for fallback in &self.fallbacks {
            write!(f, " · Fallback:{fallback}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_status() -> RenderStatus {
        let mut status = RenderStatus::new(QualityTier::Standard, "Standard Cellular/PSTN");
        status.passband_hz = (250.0, 6000.0);
        status.background = Some("cafe.ogg".to_string());
        status.background_candidates = 2;
        status
    }

    #[test]
    fn test_status_contains_contract_fields() {
        let text = sample_status().to_string();
        assert!(text.contains("Standard Cellular/PSTN"));
        assert!(text.contains("BW 250–6000 Hz"));
        assert!(text.contains("RoomIR:none"));
        assert!(text.contains("BG:cafe.ogg"));
        assert!(text.contains("Norm:peak 0.97"));
    }

    #[test]
    fn test_guard_note() {
        let mut status = sample_status();
        status.ir_guard = true;
        status.room_ir = IrOutcome::Guarded;
        status.background_ir = IrOutcome::Applied {
            name: "hall.wav".to_string(),
            mix_percent: 100.0,
        };
        let text = status.to_string();
        assert!(text.contains("IR:BG only (guard)"));
        assert!(text.contains("BGIR:hall.wav(100%)"));
        assert!(text.contains("RoomIR:guarded"));
    }

    #[test]
    fn test_handset_and_fallback_notes() {
        let mut status = sample_status();
        status.handset_ir = HandsetOutcome::Skipped;
        status.fallbacks.push(ConfigFallback {
            field: "quality_tier".to_string(),
            requested: "tin_can".to_string(),
            applied: "standard".to_string(),
        });
        let text = status.to_string();
        assert!(text.contains("HandsetIR:skipped"));
        assert!(text.contains("Fallback:quality_tier=tin_can→standard"));
    }

    #[test]
    fn test_opus_bitrate_follows_codec() {
        let mut status = sample_status();
        assert!(!status.to_string().contains("Opus"));
        status.opus_kbps = Some(24.0);
        assert!(status
            .to_string()
            .starts_with("OK · Codec: Standard Cellular/PSTN + Opus 24 kbps · BW"));
    }

    #[test]
    fn test_unreadable_background_candidates() {
        let mut status = sample_status();
        status.background = None;
        assert!(status.to_string().contains("BG:unreadable (2 candidates)"));
    }

    #[test]
    fn test_status_serializes() {
        let value = serde_json::to_value(sample_status()).unwrap();
        assert_eq!(value["tier"], "standard");
        assert_eq!(value["room_ir"]["outcome"], "none");
        assert_eq!(value["network"], "idle");
    }
}
