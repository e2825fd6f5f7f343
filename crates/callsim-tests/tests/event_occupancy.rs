//! Foreground events never stack more than three deep.

use callsim_backend_audio::events::{render_events, EventKind, MAX_OCCUPANCY, MAX_OVERLAP};
use callsim_spec::{EffectParameters, EventLayer};
use callsim_tests::MediaFixture;

const SR: u32 = 48_000;

fn busy_scene(fx: &MediaFixture) -> EffectParameters {
    let horn = fx.tone("horn.wav", 500.0, 0.7, SR, 0.5);
    let street = fx.noise("street.wav", 6.0, SR, 0.1, 61);
    let cry = fx.tone("cry.wav", 900.0, 1.2, SR, 0.4);
    let bark = fx.noise("bark.wav", 0.5, SR, 0.3, 62);
    EffectParameters {
        traffic: EventLayer::new(vec![horn, street], 120.0, -6.0),
        baby: EventLayer::new(vec![cry], 120.0, -8.0),
        dog: EventLayer::new(vec![bark], 120.0, -8.0),
        ..Default::default()
    }
}

#[test]
fn test_occupancy_is_bounded() {
    let fx = MediaFixture::new();
    let params = busy_scene(&fx);
    let len = SR as usize * 10;

    for seed in [1, 2, 3] {
        let overlay = render_events(len, &params, SR, seed, None);
        assert!(!overlay.events.is_empty());
        assert!(overlay.max_occupancy() <= MAX_OCCUPANCY);
        for event in &overlay.events {
            assert!(event.start_sample + event.length <= len);
        }
    }
}

#[test]
fn test_every_placement_stays_under_overlap_limit() {
    let fx = MediaFixture::new();
    let params = busy_scene(&fx);
    let len = SR as usize * 10;

    for seed in [4, 5, 6] {
        let overlay = render_events(len, &params, SR, seed, None);
        for event in &overlay.events {
            assert!(
                event.overlap <= MAX_OVERLAP,
                "{} at {} placed over {:.2} occupancy",
                event.category,
                event.start_sample,
                event.overlap
            );
        }
    }
}

#[test]
fn test_at_most_one_ambient_per_category() {
    let fx = MediaFixture::new();
    let params = busy_scene(&fx);
    let overlay = render_events(SR as usize * 10, &params, SR, 9, None);
    let ambient = overlay
        .events
        .iter()
        .filter(|e| e.category == "traffic" && e.kind == EventKind::Ambient)
        .count();
    assert!(ambient <= 1);
}

#[test]
fn test_events_are_seeded() {
    let fx = MediaFixture::new();
    let params = busy_scene(&fx);
    let a = render_events(SR as usize * 5, &params, SR, 4, None);
    let b = render_events(SR as usize * 5, &params, SR, 4, None);
    assert_eq!(a.samples, b.samples);
    assert_eq!(a.events.len(), b.events.len());
}
