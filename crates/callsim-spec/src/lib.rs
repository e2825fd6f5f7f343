//! callsim parameter and reporting types
//!
//! This crate holds everything a phone-call render is described by, without
//! any signal processing:
//!
//! - **Parameters**: the flat [`EffectParameters`] record, its canonical
//!   default table, and [`EffectParameters::resolve`] which clamps every knob
//!   into range and reports what it had to change.
//! - **Tiers**: the closed [`QualityTier`] set and the [`TierProfile`] each
//!   tier resolves to.
//! - **Status**: [`RenderStatus`], the structured record of which optional
//!   branches of a render fired.
//! - **Seeds**: [`hash::substream_seed`], the single function every stochastic
//!   stage derives its random stream from.
//!
//! # Example
//!
//! ```
//! use callsim_spec::{EffectParameters, QualityTier};
//!
//! let params: EffectParameters =
//!     serde_json::from_str(r#"{ "quality_tier": "bad_landline", "leveler_amount": 4.0 }"#).unwrap();
//! let resolved = params.resolve();
//!
//! assert_eq!(resolved.tier, QualityTier::BadLandline);
//! assert_eq!(resolved.params.leveler_amount, 1.0);
//! assert_eq!(resolved.fallbacks.len(), 1);
//! ```

pub mod error;
pub mod hash;
pub mod params;
pub mod status;
pub mod tier;

pub use error::{BackendError, ParamsError};
pub use params::{
    BandwidthMode, CodecProfile, ConfigFallback, EffectParameters, EventLayer, MicType,
    NormalizeMode, ResolvedParameters,
};
pub use status::{HandsetOutcome, IrOutcome, NetworkBranch, RenderStatus};
pub use tier::{LandlineColor, QualityTier, TierProfile};

/// Canonical sample rate every buffer is converted to before processing.
pub const CANONICAL_SAMPLE_RATE: u32 = 48_000;
