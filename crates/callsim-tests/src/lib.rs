//! callsim End-to-End Test Infrastructure
//!
//! This crate holds the property tests that exercise whole renders:
//!
//! - **Determinism**: same input, parameters and seed give the same PCM hash
//! - **IR guard**: a file used as both room and bed IR is applied once
//! - **Tier bandwidth**: every fixed tier stays inside its passband
//! - **Scene**: background decoding, event occupancy and no-op stages
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p callsim-tests
//! ```
//!
//! Tests that need an Ogg fixture transcode one with ffmpeg and are skipped
//! when it is not on `PATH`.

pub mod analysis;
pub mod fixtures;

pub use fixtures::MediaFixture;

use callsim_spec::EffectParameters;

/// Parameters with every network impairment, the Opus round trip and the
/// leveler turned off.
pub fn quiet_params(tier: &str) -> EffectParameters {
    EffectParameters {
        quality_tier: tier.to_string(),
        leveler_amount: 0.0,
        dropout_prob: 0.0,
        garble_prob: 0.0,
        stutter_amount: 0.0,
        jitter_intensity: 0.0,
        buffer_prob: 0.0,
        reorder_prob: 0.0,
        codec_intensity: 0.0,
        sizzle_amount: 0.0,
        rf_amount: 0.0,
        mic_proximity: 0.0,
        opus_bitrate_kbps: 0.0,
        ..Default::default()
    }
}
