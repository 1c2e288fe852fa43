//! Property-based tests for sensoria_core.
//!
//! Verifies ingress-clamping invariants over arbitrary inputs rather than
//! hand-picked examples.

use proptest::prelude::*;
use sensoria_core::{
    clamp01, lexicon, ArOverlay, EmotionLabel, EmotionReading, EmotionSource, HapticPattern,
    ProsodyPreset, Repeat, ScentRecipe,
};

proptest! {
    /// Every reading built from arbitrary floats lands in documented ranges.
    #[test]
    fn reading_fields_always_clamped(intensity in -10.0f32..10.0, confidence in -10.0f32..10.0) {
        let r = EmotionReading::new(
            EmotionLabel::Happy,
            intensity,
            vec![],
            "",
            EmotionSource::Text,
            confidence,
        );
        prop_assert!((0.0..=1.0).contains(&r.intensity));
        prop_assert!((0.0..=1.0).contains(&r.confidence));
    }

    /// Prosody construction clamps into its per-field ranges.
    #[test]
    fn prosody_always_in_range(rate in -5.0f32..5.0, pitch in -5.0f32..5.0, volume in -5.0f32..5.0) {
        let p = ProsodyPreset::new("v", rate, pitch, volume);
        prop_assert!((0.5..=2.0).contains(&p.rate));
        prop_assert!((0.5..=1.5).contains(&p.pitch));
        prop_assert!((0.0..=1.2).contains(&p.volume));
    }

    /// Scaling any modality payload by any factor stays in [0, 1].
    #[test]
    fn scaled_payloads_stay_in_unit_interval(base in 0.0f32..=1.0, factor in -3.0f32..3.0) {
        let h = HapticPattern {
            name: "p".into(),
            intensity: base,
            frequency_hz: 100.0,
            duration_ms: 100,
            regions: vec![],
            repeat: Repeat::once(),
        };
        let s = ScentRecipe {
            name: "s".into(),
            notes: vec![],
            intensity: base,
            duration_seconds: 1,
        };
        let a = ArOverlay {
            kind: "k".into(),
            color_rgb: [0, 0, 0],
            opacity: base,
            animation: "none".into(),
            particles: 0,
        };
        prop_assert!((0.0..=1.0).contains(&h.scaled(factor).intensity));
        prop_assert!((0.0..=1.0).contains(&s.scaled(factor).intensity));
        prop_assert!((0.0..=1.0).contains(&a.scaled(factor).opacity));
    }

    /// The lexicon never panics and always yields clamped outputs, for any
    /// unicode input.
    #[test]
    fn lexicon_total_and_clamped(text in "\\PC*") {
        let r = lexicon::analyze(&text);
        prop_assert!((0.0..=1.0).contains(&r.intensity));
        prop_assert!((0.0..=1.0).contains(&r.confidence));
        prop_assert!(r.secondary.len() <= 3);
    }

    #[test]
    fn clamp01_is_idempotent(v in -100.0f32..100.0) {
        prop_assert_eq!(clamp01(clamp01(v)), clamp01(v));
    }
}
