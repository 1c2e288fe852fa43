//! Emotion labels and readings.
//!
//! The seven-label set is closed and authoritative. Anything a classifier
//! returns outside it collapses to `Neutral` at intensity 0.5.

use crate::clamp01;
use serde::{Deserialize, Serialize};

/// The closed emotion label set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionLabel {
    Happy,
    Sad,
    Angry,
    Fear,
    Surprise,
    Disgust,
    #[default]
    Neutral,
}

impl EmotionLabel {
    pub const ALL: [EmotionLabel; 7] = [
        Self::Happy,
        Self::Sad,
        Self::Angry,
        Self::Fear,
        Self::Surprise,
        Self::Disgust,
        Self::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Fear => "fear",
            Self::Surprise => "surprise",
            Self::Disgust => "disgust",
            Self::Neutral => "neutral",
        }
    }

    /// Parse a label name, mapping common near-synonyms into the closed set.
    /// Unknown labels return `None`; callers collapse those to `Neutral`
    /// rather than inventing new categories.
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "happy" | "joy" | "excited" | "excitement" => Some(Self::Happy),
            "sad" | "sadness" | "melancholy" => Some(Self::Sad),
            "angry" | "anger" | "rage" => Some(Self::Angry),
            "fear" | "afraid" | "anxious" | "scared" => Some(Self::Fear),
            "surprise" | "surprised" => Some(Self::Surprise),
            "disgust" | "disgusted" => Some(Self::Disgust),
            "neutral" | "calm" => Some(Self::Neutral),
            _ => None,
        }
    }
}

impl std::fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which modality produced a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionSource {
    Text,
    Image,
    Audio,
}

/// Input to the emotion engine: exactly one modality per prediction.
#[derive(Debug, Clone)]
pub enum EmotionPayload {
    Text(String),
    Image(Vec<u8>),
    Audio(Vec<u8>),
}

impl EmotionPayload {
    pub fn source(&self) -> EmotionSource {
        match self {
            Self::Text(_) => EmotionSource::Text,
            Self::Image(_) => EmotionSource::Image,
            Self::Audio(_) => EmotionSource::Audio,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(t) => t.as_bytes(),
            Self::Image(b) | Self::Audio(b) => b,
        }
    }
}

/// One emotion prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionReading {
    pub primary: EmotionLabel,
    pub intensity: f32,
    /// Up to three runner-up labels, strongest first.
    #[serde(default)]
    pub secondary: Vec<EmotionLabel>,
    /// Free-form evidence (matched keywords, classifier tags).
    #[serde(default)]
    pub features: String,
    pub source: EmotionSource,
    pub confidence: f32,
    pub ts_unix: i64,
}

impl EmotionReading {
    /// Build a reading with unit-interval fields clamped and the secondary
    /// list truncated to three entries.
    pub fn new(
        primary: EmotionLabel,
        intensity: f32,
        secondary: Vec<EmotionLabel>,
        features: impl Into<String>,
        source: EmotionSource,
        confidence: f32,
    ) -> Self {
        let mut secondary = secondary;
        secondary.truncate(3);
        Self {
            primary,
            intensity: clamp01(intensity),
            secondary,
            features: features.into(),
            source,
            confidence: clamp01(confidence),
            ts_unix: chrono::Utc::now().timestamp(),
        }
    }

    /// The clearly-marked degraded reading for a missing or failed backend.
    pub fn unavailable(source: EmotionSource) -> Self {
        Self::new(
            EmotionLabel::Neutral,
            0.5,
            Vec::new(),
            "unavailable",
            source,
            0.0,
        )
    }

    /// Neutral fallback for inputs that match nothing.
    pub fn neutral(source: EmotionSource) -> Self {
        Self::new(EmotionLabel::Neutral, 0.5, Vec::new(), "", source, 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_roundtrip() {
        for label in EmotionLabel::ALL {
            assert_eq!(EmotionLabel::parse_str(label.as_str()), Some(label));
        }
    }

    #[test]
    fn test_near_synonyms_collapse() {
        assert_eq!(EmotionLabel::parse_str("excited"), Some(EmotionLabel::Happy));
        assert_eq!(EmotionLabel::parse_str("anxious"), Some(EmotionLabel::Fear));
        assert_eq!(EmotionLabel::parse_str("bored"), None);
    }

    #[test]
    fn test_reading_clamps_on_ingress() {
        let r = EmotionReading::new(
            EmotionLabel::Happy,
            1.8,
            vec![],
            "",
            EmotionSource::Text,
            -0.3,
        );
        assert_eq!(r.intensity, 1.0);
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn test_secondary_truncated_to_three() {
        let r = EmotionReading::new(
            EmotionLabel::Happy,
            0.5,
            vec![
                EmotionLabel::Sad,
                EmotionLabel::Angry,
                EmotionLabel::Fear,
                EmotionLabel::Surprise,
            ],
            "",
            EmotionSource::Text,
            0.5,
        );
        assert_eq!(r.secondary.len(), 3);
    }

    #[test]
    fn test_unavailable_reading_shape() {
        let r = EmotionReading::unavailable(EmotionSource::Image);
        assert_eq!(r.primary, EmotionLabel::Neutral);
        assert_eq!(r.intensity, 0.5);
        assert_eq!(r.confidence, 0.0);
        assert_eq!(r.features, "unavailable");
        assert_eq!(r.source, EmotionSource::Image);
    }
}
