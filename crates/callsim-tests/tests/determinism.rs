//! Identical input, parameters and seed give byte-identical PCM.

use callsim_backend_audio::{process_file, WavResult};
use callsim_spec::{EffectParameters, EventLayer};
use callsim_tests::MediaFixture;
use pretty_assertions::assert_eq;

fn full_scene(fx: &MediaFixture) -> EffectParameters {
    let room = fx.impulse_response("room.wav", 0.2, 11);
    let bed_ir = fx.impulse_response("bed_ir.wav", 0.3, 12);
    let bed = fx.noise("bed.wav", 3.0, 44_100, 0.1, 13);
    let horn = fx.tone("horn.wav", 440.0, 0.6, 48_000, 0.5);
    let bark = fx.noise("bark.wav", 0.4, 48_000, 0.3, 14);

    EffectParameters {
        quality_tier: "low".to_string(),
        dereverb_amount: 0.5,
        room_ir: Some(room),
        room_ir_mix: 40.0,
        background_files: vec![bed],
        background_ir: Some(bed_ir),
        background_ir_mix: 60.0,
        dropout_prob: 0.2,
        garble_prob: 0.2,
        stutter_amount: 0.02,
        jitter_intensity: 0.2,
        buffer_prob: 0.1,
        reorder_prob: 0.1,
        codec_intensity: 0.5,
        sizzle_amount: 0.2,
        rf_amount: 0.2,
        traffic: EventLayer::new(vec![horn], 30.0, -6.0),
        dog: EventLayer::new(vec![bark], 30.0, -8.0),
        ..Default::default()
    }
}

fn render_hash(voice: &std::path::Path, params: &EffectParameters, seed: u32) -> String {
    let (out, _) = process_file(voice, params, seed, None).unwrap();
    WavResult::from_mono(&out.samples, out.sample_rate).pcm_hash
}

#[test]
fn test_same_seed_same_hash() {
    let fx = MediaFixture::new();
    let voice = fx.noise("voice.wav", 2.0, 48_000, 0.2, 1);
    let params = full_scene(&fx);

    let a = render_hash(&voice, &params, 1234);
    let b = render_hash(&voice, &params, 1234);
    assert_eq!(a, b);
    assert_eq!(a.len(), 64);
}

#[test]
fn test_different_seed_different_hash() {
    let fx = MediaFixture::new();
    let voice = fx.noise("voice.wav", 2.0, 48_000, 0.2, 1);
    let params = full_scene(&fx);

    let a = render_hash(&voice, &params, 1);
    let b = render_hash(&voice, &params, 2);
    assert_ne!(a, b);
}

#[test]
fn test_every_tier_is_reproducible() {
    let fx = MediaFixture::new();
    let voice = fx.noise("voice.wav", 0.5, 16_000, 0.2, 3);
    for tier in callsim_spec::QualityTier::ALL {
        let params = EffectParameters {
            quality_tier: tier.as_str().to_string(),
            dropout_prob: 0.1,
            garble_prob: 0.1,
            ..Default::default()
        };
        assert_eq!(
            render_hash(&voice, &params, 77),
            render_hash(&voice, &params, 77),
            "tier {} is not reproducible",
            tier
        );
    }
}
