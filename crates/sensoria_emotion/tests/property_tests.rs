//! Property-based tests for the mapping tables.

use proptest::prelude::*;
use sensoria_core::{EmotionLabel, EmotionReading, EmotionSource};
use sensoria_emotion::{MappingTables, MIN_INTENSITY_FACTOR};

fn arb_label() -> impl Strategy<Value = EmotionLabel> {
    prop_oneof![
        Just(EmotionLabel::Happy),
        Just(EmotionLabel::Sad),
        Just(EmotionLabel::Angry),
        Just(EmotionLabel::Fear),
        Just(EmotionLabel::Surprise),
        Just(EmotionLabel::Disgust),
        Just(EmotionLabel::Neutral),
    ]
}

proptest! {
    /// Scaled payloads stay in range for every label and intensity.
    #[test]
    fn bundle_always_in_range(label in arb_label(), intensity in -2.0f32..2.0) {
        let reading = EmotionReading::new(label, intensity, vec![], "", EmotionSource::Text, 0.5);
        let bundle = MappingTables::v1().bundle(&reading);
        prop_assert!((0.0..=1.0).contains(&bundle.haptic.intensity));
        prop_assert!((0.0..=1.0).contains(&bundle.scent.intensity));
        prop_assert!((0.0..=1.0).contains(&bundle.ar.opacity));
        prop_assert!((0.5..=2.0).contains(&bundle.prosody.rate));
        prop_assert!((0.5..=1.5).contains(&bundle.prosody.pitch));
        prop_assert!((0.0..=1.2).contains(&bundle.prosody.volume));
    }

    /// The intensity factor never drops below the floor, so weak readings
    /// still produce perceivable output.
    #[test]
    fn intensity_factor_floored(label in arb_label(), intensity in 0.0f32..=1.0) {
        let reading = EmotionReading::new(label, intensity, vec![], "", EmotionSource::Text, 0.5);
        let factor = MappingTables::intensity_factor(&reading);
        prop_assert!(factor >= MIN_INTENSITY_FACTOR);
        prop_assert!(factor <= 1.0);
    }

    /// Scaling is monotone: a stronger reading never produces a weaker
    /// haptic payload.
    #[test]
    fn scaling_is_monotone(label in arb_label(), a in 0.0f32..=1.0, b in 0.0f32..=1.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let t = MappingTables::v1();
        let weak = t.bundle(&EmotionReading::new(label, lo, vec![], "", EmotionSource::Text, 0.5));
        let strong = t.bundle(&EmotionReading::new(label, hi, vec![], "", EmotionSource::Text, 0.5));
        prop_assert!(weak.haptic.intensity <= strong.haptic.intensity + 1e-6);
        prop_assert!(weak.scent.intensity <= strong.scent.intensity + 1e-6);
    }
}
