//! Output-modality payloads: prosody, haptics, scent, AR.
//!
//! These are the shapes the mapping tables produce and the device adapters
//! translate into vendor formats. Ranges are clamped on scaling, never
//! checked with assertions.

use crate::{clamp01, clamp_range};
use serde::{Deserialize, Serialize};

/// TTS prosody parameters for one emotion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProsodyPreset {
    pub voice_id: String,
    /// Speaking rate multiplier in `[0.5, 2.0]`.
    pub rate: f32,
    /// Pitch multiplier in `[0.5, 1.5]`.
    pub pitch: f32,
    /// Volume gain in `[0.0, 1.2]`.
    pub volume: f32,
}

impl ProsodyPreset {
    pub fn new(voice_id: &str, rate: f32, pitch: f32, volume: f32) -> Self {
        Self {
            voice_id: voice_id.to_string(),
            rate: clamp_range(rate, 0.5, 2.0),
            pitch: clamp_range(pitch, 0.5, 1.5),
            volume: clamp_range(volume, 0.0, 1.2),
        }
    }
}

/// Body regions a haptic pattern can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyRegion {
    Chest,
    Shoulders,
    Back,
    Arms,
    Spine,
    Stomach,
}

/// Repetition schedule. `count: None` repeats until cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repeat {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    pub period_ms: u64,
}

impl Repeat {
    pub fn once() -> Self {
        Self {
            count: Some(1),
            period_ms: 0,
        }
    }

    pub fn times(count: u32, period_ms: u64) -> Self {
        Self {
            count: Some(count),
            period_ms,
        }
    }
}

impl Default for Repeat {
    fn default() -> Self {
        Self::once()
    }
}

/// A named vibrotactile pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HapticPattern {
    pub name: String,
    /// Strength in `[0, 1]`.
    pub intensity: f32,
    pub frequency_hz: f32,
    pub duration_ms: u64,
    pub regions: Vec<BodyRegion>,
    #[serde(default)]
    pub repeat: Repeat,
}

impl HapticPattern {
    /// Return a copy with intensity scaled by `factor` and re-clamped.
    pub fn scaled(&self, factor: f32) -> Self {
        let mut out = self.clone();
        out.intensity = clamp01(self.intensity * factor);
        out
    }
}

/// A diffuser recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScentRecipe {
    pub name: String,
    pub notes: Vec<String>,
    /// Release strength in `[0, 1]`.
    pub intensity: f32,
    pub duration_seconds: u64,
}

impl ScentRecipe {
    pub fn scaled(&self, factor: f32) -> Self {
        let mut out = self.clone();
        out.intensity = clamp01(self.intensity * factor);
        out
    }
}

/// An AR overlay descriptor. Rendering is out of scope; this is the trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArOverlay {
    pub kind: String,
    pub color_rgb: [u8; 3],
    /// Blend opacity in `[0, 1]`.
    pub opacity: f32,
    pub animation: String,
    pub particles: u32,
}

impl ArOverlay {
    pub fn scaled(&self, factor: f32) -> Self {
        let mut out = self.clone();
        out.opacity = clamp01(self.opacity * factor);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prosody_clamps_ranges() {
        let p = ProsodyPreset::new("v", 3.0, 0.1, 2.0);
        assert_eq!(p.rate, 2.0);
        assert_eq!(p.pitch, 0.5);
        assert_eq!(p.volume, 1.2);
    }

    #[test]
    fn test_haptic_scaling_clamps() {
        let h = HapticPattern {
            name: "sudden_spike".into(),
            intensity: 1.0,
            frequency_hz: 220.0,
            duration_ms: 800,
            regions: vec![BodyRegion::Chest, BodyRegion::Arms],
            repeat: Repeat::once(),
        };
        assert_eq!(h.scaled(1.5).intensity, 1.0);
        assert!((h.scaled(0.5).intensity - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_body_region_wire_names() {
        assert_eq!(
            serde_json::to_string(&BodyRegion::Shoulders).unwrap(),
            "\"shoulders\""
        );
    }

    #[test]
    fn test_repeat_default_is_once() {
        assert_eq!(Repeat::default(), Repeat::once());
    }
}
