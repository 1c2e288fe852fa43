//! Emotion → modality mapping tables (v1 baseline).
//!
//! Each label maps to exactly one prosody preset, haptic pattern, scent
//! recipe, and AR overlay. The values here are the locked v1 baseline;
//! tests pin them. Payload intensities scale with the reading's intensity,
//! floored at 0.2 so even weak readings produce perceivable output.

use sensoria_core::{
    ArOverlay, BodyRegion, EmotionLabel, EmotionReading, HapticPattern, ProsodyPreset, Repeat,
    ScentRecipe,
};

/// Minimum intensity factor applied when scaling payloads.
pub const MIN_INTENSITY_FACTOR: f32 = 0.2;

/// The full modality bundle for one emotion at one intensity.
#[derive(Debug, Clone)]
pub struct ModalityBundle {
    pub prosody: ProsodyPreset,
    pub haptic: HapticPattern,
    pub scent: ScentRecipe,
    pub ar: ArOverlay,
}

/// Static, versioned mapping tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct MappingTables {
    _version: (),
}

impl MappingTables {
    /// The v1 baseline tables.
    pub fn v1() -> Self {
        Self { _version: () }
    }

    pub fn version(&self) -> &'static str {
        "v1"
    }

    pub fn prosody(&self, label: EmotionLabel) -> ProsodyPreset {
        match label {
            EmotionLabel::Happy => ProsodyPreset::new("cheerful", 1.10, 1.10, 1.00),
            EmotionLabel::Sad => ProsodyPreset::new("melancholic", 0.90, 0.90, 0.80),
            EmotionLabel::Angry => ProsodyPreset::new("intense", 1.20, 1.00, 1.10),
            EmotionLabel::Fear => ProsodyPreset::new("tense", 1.05, 1.05, 1.00),
            EmotionLabel::Surprise => ProsodyPreset::new("energetic", 1.15, 1.05, 1.00),
            EmotionLabel::Disgust => ProsodyPreset::new("normal", 1.00, 0.95, 0.95),
            EmotionLabel::Neutral => ProsodyPreset::new("normal", 1.00, 1.00, 1.00),
        }
    }

    pub fn haptic(&self, label: EmotionLabel) -> HapticPattern {
        use BodyRegion::*;
        let (name, intensity, frequency_hz, duration_ms, regions): (
            &str,
            f32,
            f32,
            u64,
            Vec<BodyRegion>,
        ) = match label {
            EmotionLabel::Happy => ("gentle_pulse", 0.70, 180.0, 1500, vec![Chest, Shoulders]),
            EmotionLabel::Sad => ("slow_wave", 0.50, 60.0, 3000, vec![Chest, Back]),
            EmotionLabel::Angry => ("sharp_burst", 0.90, 200.0, 500, vec![Arms, Chest, Back]),
            EmotionLabel::Fear => ("tremor", 0.80, 150.0, 2000, vec![Spine, Shoulders]),
            EmotionLabel::Surprise => ("sudden_spike", 1.00, 220.0, 800, vec![Chest, Arms]),
            EmotionLabel::Disgust => ("recoil_wave", 0.60, 90.0, 1200, vec![Stomach, Chest]),
            EmotionLabel::Neutral => ("subtle_tap", 0.30, 80.0, 2000, vec![Chest]),
        };
        HapticPattern {
            name: name.to_string(),
            intensity,
            frequency_hz,
            duration_ms,
            regions,
            repeat: Repeat::once(),
        }
    }

    pub fn scent(&self, label: EmotionLabel) -> ScentRecipe {
        let (name, notes, intensity, duration_seconds): (&str, &[&str], f32, u64) = match label {
            EmotionLabel::Happy => ("citrus_bloom", &["orange", "bergamot", "jasmine"], 0.80, 180),
            EmotionLabel::Sad => ("rain_woods", &["petrichor", "cedar"], 0.60, 300),
            EmotionLabel::Angry => ("ember", &["smoke", "black pepper"], 0.50, 120),
            EmotionLabel::Fear => ("cold_pine", &["pine", "camphor"], 0.70, 240),
            EmotionLabel::Surprise => ("spark_mint", &["peppermint", "ginger"], 0.90, 90),
            EmotionLabel::Disgust => ("green_bitter", &["galbanum", "vetiver"], 0.40, 150),
            EmotionLabel::Neutral => ("linen", &["clean cotton"], 0.30, 200),
        };
        ScentRecipe {
            name: name.to_string(),
            notes: notes.iter().map(|n| n.to_string()).collect(),
            intensity,
            duration_seconds,
        }
    }

    pub fn ar(&self, label: EmotionLabel) -> ArOverlay {
        let (kind, color_rgb, opacity, animation, particles): (&str, [u8; 3], f32, &str, u32) =
            match label {
                EmotionLabel::Happy => ("sparkles", [255, 215, 0], 0.70, "drift", 50),
                EmotionLabel::Sad => ("rain", [70, 130, 180], 0.50, "fall", 30),
                EmotionLabel::Angry => ("flames", [226, 88, 34], 0.80, "flicker", 60),
                EmotionLabel::Fear => ("fog", [105, 105, 105], 0.60, "swirl", 40),
                EmotionLabel::Surprise => ("burst", [255, 235, 59], 0.90, "pop", 80),
                EmotionLabel::Disgust => ("ripple", [107, 142, 35], 0.40, "pulse", 25),
                EmotionLabel::Neutral => ("ambient", [200, 200, 200], 0.30, "float", 20),
            };
        ArOverlay {
            kind: kind.to_string(),
            color_rgb,
            opacity,
            animation: animation.to_string(),
            particles,
        }
    }

    /// The intensity factor for a reading: `max(0.2, intensity)`.
    pub fn intensity_factor(reading: &EmotionReading) -> f32 {
        reading.intensity.max(MIN_INTENSITY_FACTOR)
    }

    /// Resolve the full bundle for a reading, with haptic intensity, scent
    /// intensity, and AR opacity scaled by the reading's intensity and
    /// clamped back into range. Prosody is a voice selection, not an
    /// intensity, and is passed through unscaled.
    pub fn bundle(&self, reading: &EmotionReading) -> ModalityBundle {
        let factor = Self::intensity_factor(reading);
        ModalityBundle {
            prosody: self.prosody(reading.primary),
            haptic: self.haptic(reading.primary).scaled(factor),
            scent: self.scent(reading.primary).scaled(factor),
            ar: self.ar(reading.primary).scaled(factor),
        }
    }

    /// All predefined haptic pattern names, in label order.
    pub fn haptic_pattern_names(&self) -> Vec<String> {
        EmotionLabel::ALL
            .iter()
            .map(|l| self.haptic(*l).name)
            .collect()
    }

    /// Look up a haptic pattern by its name.
    pub fn haptic_by_name(&self, name: &str) -> Option<HapticPattern> {
        EmotionLabel::ALL
            .iter()
            .map(|l| self.haptic(*l))
            .find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensoria_core::EmotionSource;

    #[test]
    fn test_v1_prosody_values() {
        let t = MappingTables::v1();
        let happy = t.prosody(EmotionLabel::Happy);
        assert_eq!(happy.voice_id, "cheerful");
        assert!((happy.rate - 1.10).abs() < 1e-6);
        assert!((happy.pitch - 1.10).abs() < 1e-6);
        assert!((happy.volume - 1.00).abs() < 1e-6);

        let sad = t.prosody(EmotionLabel::Sad);
        assert_eq!(sad.voice_id, "melancholic");
        assert!((sad.rate - 0.90).abs() < 1e-6);

        let angry = t.prosody(EmotionLabel::Angry);
        assert!((angry.rate - 1.20).abs() < 1e-6);
        assert!((angry.volume - 1.10).abs() < 1e-6);
    }

    #[test]
    fn test_v1_haptic_values() {
        let t = MappingTables::v1();
        let cases = [
            (EmotionLabel::Happy, "gentle_pulse", 0.70, 180.0, 1500),
            (EmotionLabel::Sad, "slow_wave", 0.50, 60.0, 3000),
            (EmotionLabel::Angry, "sharp_burst", 0.90, 200.0, 500),
            (EmotionLabel::Fear, "tremor", 0.80, 150.0, 2000),
            (EmotionLabel::Surprise, "sudden_spike", 1.00, 220.0, 800),
            (EmotionLabel::Disgust, "recoil_wave", 0.60, 90.0, 1200),
            (EmotionLabel::Neutral, "subtle_tap", 0.30, 80.0, 2000),
        ];
        for (label, name, intensity, freq, dur) in cases {
            let h = t.haptic(label);
            assert_eq!(h.name, name);
            assert!((h.intensity - intensity).abs() < 1e-6, "{name}");
            assert!((h.frequency_hz - freq).abs() < 1e-6, "{name}");
            assert_eq!(h.duration_ms, dur, "{name}");
            assert!(!h.regions.is_empty());
        }
    }

    #[test]
    fn test_v1_scent_and_ar_values() {
        let t = MappingTables::v1();
        assert!((t.scent(EmotionLabel::Surprise).intensity - 0.90).abs() < 1e-6);
        assert_eq!(t.scent(EmotionLabel::Surprise).duration_seconds, 90);
        assert_eq!(t.scent(EmotionLabel::Sad).duration_seconds, 300);

        assert_eq!(t.ar(EmotionLabel::Happy).kind, "sparkles");
        assert_eq!(t.ar(EmotionLabel::Happy).particles, 50);
        assert!((t.ar(EmotionLabel::Neutral).opacity - 0.30).abs() < 1e-6);
        assert_eq!(t.ar(EmotionLabel::Surprise).particles, 80);
    }

    #[test]
    fn test_bundle_scales_with_intensity() {
        let t = MappingTables::v1();
        let reading = EmotionReading::new(
            EmotionLabel::Happy,
            0.9,
            vec![],
            "",
            EmotionSource::Text,
            0.8,
        );
        let b = t.bundle(&reading);
        assert!((b.haptic.intensity - 0.70 * 0.9).abs() < 1e-6);
        assert!((b.scent.intensity - 0.80 * 0.9).abs() < 1e-6);
        assert!((b.ar.opacity - 0.70 * 0.9).abs() < 1e-6);
        assert!(b.haptic.intensity <= 1.0);
    }

    #[test]
    fn test_weak_reading_floors_at_min_factor() {
        let t = MappingTables::v1();
        let reading = EmotionReading::new(
            EmotionLabel::Angry,
            0.05,
            vec![],
            "",
            EmotionSource::Text,
            0.5,
        );
        let b = t.bundle(&reading);
        assert!((b.haptic.intensity - 0.90 * 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_full_intensity_never_exceeds_range() {
        let t = MappingTables::v1();
        for label in EmotionLabel::ALL {
            let reading =
                EmotionReading::new(label, 1.0, vec![], "", EmotionSource::Text, 1.0);
            let b = t.bundle(&reading);
            assert!(b.haptic.intensity <= 1.0);
            assert!(b.scent.intensity <= 1.0);
            assert!(b.ar.opacity <= 1.0);
        }
    }

    #[test]
    fn test_pattern_names_and_lookup() {
        let t = MappingTables::v1();
        let names = t.haptic_pattern_names();
        assert_eq!(names.len(), 7);
        assert!(names.contains(&"gentle_pulse".to_string()));
        assert_eq!(t.haptic_by_name("tremor").unwrap().duration_ms, 2000);
        assert!(t.haptic_by_name("nonexistent").is_none());
    }
}
