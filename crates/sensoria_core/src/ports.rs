//! Port traits for remote model services.
//!
//! The orchestrator depends on these traits only; concrete providers are
//! selected by configuration and injected at wiring time. Every port is
//! optional at runtime: a missing backend degrades, it never aborts a plan.

use crate::emotion::EmotionReading;
use crate::modality::ProsodyPreset;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Synthesized speech, either hosted (`audio_url`) or inline base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_base64: Option<String>,
    pub duration_seconds: f64,
    pub format: String,
    pub provider: String,
    pub voice: String,
}

/// Text-to-speech adapter contract.
#[async_trait]
pub trait TtsPort: Send + Sync {
    /// Synthesize `text` with the given prosody.
    async fn synthesize(&self, text: &str, prosody: &ProsodyPreset) -> Result<TtsOutput>;

    /// An opaque URL a client can stream the rendered session audio from.
    async fn playback_url(&self, session_id: &str, text: &str, prosody: &ProsodyPreset)
        -> Result<String>;

    fn provider_name(&self) -> &'static str;

    fn supports_emotion(&self) -> bool {
        false
    }
}

/// A transcription result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttOutput {
    pub text: String,
    pub confidence: f32,
    pub language: String,
    pub duration_seconds: f64,
    pub provider: String,
}

/// Speech-to-text adapter contract.
#[async_trait]
pub trait SttPort: Send + Sync {
    async fn transcribe(&self, audio: &[u8], language: Option<&str>) -> Result<SttOutput>;

    fn provider_name(&self) -> &'static str;
}

/// Remote text emotion classifier. Same input and output as the lexicon
/// path, so the engine can substitute one for the other.
#[async_trait]
pub trait TextClassifierPort: Send + Sync {
    async fn classify_text(&self, text: &str) -> Result<EmotionReading>;
}

/// Image emotion classifier.
#[async_trait]
pub trait VisionClassifierPort: Send + Sync {
    async fn classify_image(&self, image: &[u8]) -> Result<EmotionReading>;
}

/// Audio emotion classifier.
#[async_trait]
pub trait AudioClassifierPort: Send + Sync {
    async fn classify_audio(&self, audio: &[u8]) -> Result<EmotionReading>;
}
