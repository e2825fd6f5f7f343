//! Phone-quality tier rendering: passband filtering plus tier coloration.
//!
//! Every tier band-limits the voice with a 2-pole high-pass and a 4-pole
//! low-pass. The landline family additionally colors the 300–2400 Hz voice
//! band with an 8-bit μ-law round trip, leaving the rest of the spectrum
//! untouched. The custom tier applies its own compression and seeded noise
//! full-band.

use callsim_spec::{BandwidthMode, EffectParameters, QualityTier, TierProfile};
use tracing::debug;

use crate::buffer::peak;
use crate::dynamics::{prelimit, soft_clip, PRELIMIT_THRESHOLD};
use crate::filter::hpf_lpf;
use crate::rng::{create_stage_rng, gaussian_noise};

/// μ-law compression constant.
pub const MU: f64 = 255.0;

/// Quantization steps per polarity of the companded signal.
const MU_LAW_LEVELS: f64 = 127.0;

/// Largest legacy post-tier μ-law grit.
pub const POST_GRIT_MAX: f64 = 0.15;

/// Compresses one sample in [-1, 1] onto the μ-law curve.
#[inline]
pub fn mu_law_compress(x: f64) -> f64 {
    x.signum() * (MU * x.abs()).ln_1p() / MU.ln_1p()
}

/// Inverse of [`mu_law_compress`].
#[inline]
pub fn mu_law_expand(y: f64) -> f64 {
    y.signum() * (MU.ln_1p() * y.abs()).exp_m1() / MU
}

/// μ-law codec coloration.
///
/// The input is pre-limited to 0.707, driven into an 8-bit μ-law encode and
/// decode, blended with the dry signal by `amount` and softly saturated.
pub fn mu_law_color(samples: &[f64], amount: f64, drive: f64) -> Vec<f64> {
    if amount <= 0.0 {
        return samples.to_vec();
    }
    let mut x = samples.to_vec();
    prelimit(&mut x, PRELIMIT_THRESHOLD);

    let mut out: Vec<f64> = x
        .iter()
        .map(|&s| {
            let encoded = mu_law_compress((s * drive).clamp(-1.0, 1.0));
            let quantized = (encoded * MU_LAW_LEVELS).round() / MU_LAW_LEVELS;
            let decoded = mu_law_expand(quantized);
            (1.0 - amount) * s + amount * decoded
        })
        .collect();
    soft_clip(&mut out, 1.02);
    out
}

/// Blends the μ-law companded signal into the buffer without expanding it.
///
/// This is the raw compression grit used by the custom tier and the legacy
/// post-tier control.
pub fn mu_law_grit(samples: &mut [f64], amount: f64) {
    let a = amount.clamp(0.0, 1.0);
    if a <= 0.0 {
        return;
    }
    for s in samples.iter_mut() {
        let comp = mu_law_compress(s.clamp(-1.0, 1.0));
        *s = (1.0 - a) * *s + a * comp;
    }
}

/// Result of the tier stage.
#[derive(Debug, Clone)]
pub struct TierRender {
    /// Processed samples.
    pub samples: Vec<f64>,
    /// Profile that was applied.
    pub profile: TierProfile,
    /// Effective (high-pass, low-pass) corners in Hz.
    pub passband_hz: (f64, f64),
    /// μ-law amount the tier applied.
    pub mu_law_amount: f64,
}

/// Returns the profile for `tier`, building the custom one from `params`.
pub fn resolve_profile(tier: QualityTier, params: &EffectParameters) -> TierProfile {
    tier.profile().unwrap_or_else(|| {
        TierProfile::custom(
            params.custom_low_hz,
            params.custom_high_hz,
            params.custom_dropout_mult,
            params.custom_garble_mult,
        )
    })
}

/// Applies the tier passband and coloration.
pub fn apply_tier(
    samples: &[f64],
    tier: QualityTier,
    params: &EffectParameters,
    sample_rate: u32,
    seed: u32,
) -> TierRender {
    let profile = resolve_profile(tier, params);
    let nyquist = sample_rate as f64 / 2.0;
    let low = profile.passband_low_hz;
    let high = profile.high_cut_or(nyquist);

    let mut y = hpf_lpf(samples, low, high, sample_rate, profile.zero_phase);
    let mut mu_law_amount = 0.0;

    if let Some(color) = profile.landline_color {
        let band = hpf_lpf(&y, color.band_low_hz, color.band_high_hz, sample_rate, true);
        let colored = mu_law_color(&band, color.amount, color.drive);
        // Keep quantization products inside the voice band
        let colored = hpf_lpf(&colored, color.band_low_hz, color.band_high_hz, sample_rate, true);
        for ((s, b), c) in y.iter_mut().zip(&band).zip(&colored) {
            *s = (*s - b) + c;
        }
        mu_law_amount = color.amount;
    } else if tier == QualityTier::Custom {
        mu_law_grit(&mut y, params.custom_compression);
        mu_law_amount = params.custom_compression.clamp(0.0, 1.0);

        if params.custom_noise > 0.0 {
            let sigma = params.custom_noise * peak(&y);
            let mut rng = create_stage_rng("tier_noise", seed, 0);
            let noise = gaussian_noise(&mut rng, y.len(), sigma);
            for (s, n) in y.iter_mut().zip(noise) {
                *s += n;
            }
        }
    }

    debug!(tier = %tier, low, high, mu_law_amount, "tier applied");
    TierRender {
        samples: y,
        profile,
        passband_hz: (low, high),
        mu_law_amount,
    }
}

/// Legacy bandwidth override.
///
/// Returns the override corners when one was applied.
pub fn apply_bandwidth_override(
    samples: &mut Vec<f64>,
    mode: BandwidthMode,
    sample_rate: u32,
) -> Option<(f64, f64)> {
    let corners = mode.corners();
    if let Some((low, high)) = corners {
        *samples = hpf_lpf(samples, low, high, sample_rate, false);
    }
    corners
}
