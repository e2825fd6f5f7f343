//! A file configured as both room and bed IR is applied to the bed only.

use callsim_backend_audio::process_file;
use callsim_spec::{EffectParameters, IrOutcome};
use callsim_tests::analysis::max_abs_difference;
use callsim_tests::{quiet_params, MediaFixture};

fn bed_scene(fx: &MediaFixture, bed_ir: &std::path::Path) -> EffectParameters {
    let bed = fx.noise("bed.wav", 2.0, 48_000, 0.1, 21);
    EffectParameters {
        background_files: vec![bed],
        background_ir: Some(bed_ir.to_path_buf()),
        background_ir_mix: 80.0,
        room_ir_mix: 80.0,
        ..quiet_params("standard")
    }
}

#[test]
fn test_shared_ir_matches_bed_only_render() {
    let fx = MediaFixture::new();
    let voice = fx.noise("voice.wav", 1.0, 48_000, 0.2, 20);
    let ir = fx.impulse_response("hall.wav", 0.4, 22);

    let bed_only = bed_scene(&fx, &ir);
    let shared = EffectParameters {
        room_ir: Some(ir.clone()),
        ..bed_only.clone()
    };

    let (a, a_status) = process_file(&voice, &bed_only, 9, None).unwrap();
    let (b, b_status) = process_file(&voice, &shared, 9, None).unwrap();

    assert_eq!(a.len(), b.len());
    assert!(max_abs_difference(&a.samples, &b.samples) < 1e-6);
    assert!(!a_status.ir_guard);
    assert!(b_status.ir_guard);
    assert_eq!(b_status.room_ir, IrOutcome::Guarded);
    assert!(b_status.background_ir.is_applied());
    assert!(b_status.to_string().contains("IR:BG only (guard)"));
}

#[test]
fn test_copied_ir_is_still_guarded() {
    let fx = MediaFixture::new();
    let voice = fx.noise("voice.wav", 0.5, 48_000, 0.2, 30);
    let ir = fx.impulse_response("hall.wav", 0.3, 31);
    let copy = fx.path().join("hall_copy.wav");
    std::fs::copy(&ir, &copy).unwrap();

    let params = EffectParameters {
        room_ir: Some(copy),
        ..bed_scene(&fx, &ir)
    };
    let (_, status) = process_file(&voice, &params, 4, None).unwrap();
    assert!(status.ir_guard);
    assert_eq!(status.room_ir, IrOutcome::Guarded);
}

#[test]
fn test_distinct_irs_are_both_applied() {
    let fx = MediaFixture::new();
    let voice = fx.noise("voice.wav", 0.5, 48_000, 0.2, 40);
    let bed_ir = fx.impulse_response("hall.wav", 0.3, 41);
    let room_ir = fx.impulse_response("room.wav", 0.3, 42);

    let params = EffectParameters {
        room_ir: Some(room_ir),
        ..bed_scene(&fx, &bed_ir)
    };
    let (_, status) = process_file(&voice, &params, 4, None).unwrap();
    assert!(!status.ir_guard);
    assert!(status.room_ir.is_applied());
    assert!(status.background_ir.is_applied());
}
