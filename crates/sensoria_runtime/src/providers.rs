//! Concrete port providers: mock implementations for offline runs and
//! HTTP-backed ones for configured remote services.
//!
//! The mock providers keep the whole system runnable with no network and
//! no keys; wiring picks between them from config.

use crate::connector::{ConnectorConfig, HttpConnector};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::Engine;
use sensoria_core::ports::{SttOutput, SttPort, TextClassifierPort, TtsOutput, TtsPort};
use sensoria_core::{EmotionLabel, EmotionReading, EmotionSource, ProsodyPreset};
use serde_json::json;

// ============================================================================
// TTS
// ============================================================================

/// Deterministic offline TTS. Produces a data-free mock payload whose
/// duration estimate follows the prosody rate, so playback plans stay
/// meaningful without a real synthesizer.
pub struct MockTts {
    voice_fallback: String,
}

impl MockTts {
    pub fn new(voice_fallback: &str) -> Self {
        Self {
            voice_fallback: voice_fallback.to_string(),
        }
    }

    fn estimate_duration(text: &str, rate: f32) -> f64 {
        // ~2.5 words per second at rate 1.0.
        let words = text.split_whitespace().count().max(1) as f64;
        words / (2.5 * rate as f64)
    }
}

#[async_trait]
impl TtsPort for MockTts {
    async fn synthesize(&self, text: &str, prosody: &ProsodyPreset) -> Result<TtsOutput> {
        let voice = if prosody.voice_id.is_empty() {
            self.voice_fallback.clone()
        } else {
            prosody.voice_id.clone()
        };
        let payload = format!("mock-audio:{}:{}", voice, text);
        Ok(TtsOutput {
            audio_url: None,
            audio_base64: Some(base64::engine::general_purpose::STANDARD.encode(payload)),
            duration_seconds: Self::estimate_duration(text, prosody.rate),
            format: "mp3".to_string(),
            provider: "mock".to_string(),
            voice,
        })
    }

    async fn playback_url(
        &self,
        session_id: &str,
        _text: &str,
        prosody: &ProsodyPreset,
    ) -> Result<String> {
        Ok(format!(
            "mock://tts/{}?voice={}",
            session_id, prosody.voice_id
        ))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn supports_emotion(&self) -> bool {
        true
    }
}

/// HTTP TTS provider. The remote contract mirrors `TtsOutput`.
pub struct HttpTts {
    connector: HttpConnector,
}

impl HttpTts {
    pub fn new(base_url: &str, config: ConnectorConfig) -> Result<Self> {
        Ok(Self {
            connector: HttpConnector::new(base_url, config)?,
        })
    }
}

#[async_trait]
impl TtsPort for HttpTts {
    async fn synthesize(&self, text: &str, prosody: &ProsodyPreset) -> Result<TtsOutput> {
        let body = json!({
            "text": text,
            "voice": prosody.voice_id,
            "rate": prosody.rate,
            "pitch": prosody.pitch,
            "volume": prosody.volume,
        });
        let value = self.connector.post_json("/synthesize", &body).await?;
        serde_json::from_value(value).context("Malformed TTS response")
    }

    async fn playback_url(
        &self,
        session_id: &str,
        _text: &str,
        _prosody: &ProsodyPreset,
    ) -> Result<String> {
        // The remote service streams by session; the URL itself is opaque
        // to us and to clients.
        Ok(format!("{}/stream/{}", self.connector.base_url(), session_id))
    }

    fn provider_name(&self) -> &'static str {
        "http"
    }

    fn supports_emotion(&self) -> bool {
        true
    }
}

// ============================================================================
// STT
// ============================================================================

/// Offline STT stand-in.
pub struct MockStt;

#[async_trait]
impl SttPort for MockStt {
    async fn transcribe(&self, audio: &[u8], language: Option<&str>) -> Result<SttOutput> {
        if audio.is_empty() {
            return Err(anyhow!("empty audio payload"));
        }
        Ok(SttOutput {
            text: "(mock transcription)".to_string(),
            confidence: 0.9,
            language: language.unwrap_or("zh-TW").to_string(),
            // 16 kHz mono 16-bit is 32 kB per second.
            duration_seconds: audio.len() as f64 / 32_000.0,
            provider: "mock".to_string(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

// ============================================================================
// Remote emotion classifier
// ============================================================================

/// HTTP text emotion classifier speaking `{text} -> {label, intensity,
/// secondary, confidence, features}`. Labels outside the closed set
/// collapse to neutral.
pub struct HttpTextClassifier {
    connector: HttpConnector,
}

impl HttpTextClassifier {
    pub fn new(base_url: &str, config: ConnectorConfig) -> Result<Self> {
        Ok(Self {
            connector: HttpConnector::new(base_url, config)?,
        })
    }
}

#[async_trait]
impl TextClassifierPort for HttpTextClassifier {
    async fn classify_text(&self, text: &str) -> Result<EmotionReading> {
        let value = self
            .connector
            .post_json("/classify", &json!({ "text": text }))
            .await?;

        let label = value
            .get("label")
            .and_then(|v| v.as_str())
            .and_then(EmotionLabel::parse_str)
            .unwrap_or(EmotionLabel::Neutral);
        let intensity = value
            .get("intensity")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.5) as f32;
        let confidence = value
            .get("confidence")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.5) as f32;
        let secondary = value
            .get("secondary")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str())
                    .filter_map(EmotionLabel::parse_str)
                    .collect()
            })
            .unwrap_or_default();
        let features = value
            .get("features")
            .and_then(|v| v.as_str())
            .unwrap_or("remote")
            .to_string();

        Ok(EmotionReading::new(
            label,
            intensity,
            secondary,
            features,
            EmotionSource::Text,
            confidence,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_tts_synthesize() {
        let tts = MockTts::new("normal");
        let prosody = ProsodyPreset::new("cheerful", 1.1, 1.1, 1.0);
        let out = tts.synthesize("hello there friend", &prosody).await.unwrap();
        assert_eq!(out.provider, "mock");
        assert_eq!(out.voice, "cheerful");
        assert!(out.audio_base64.is_some());
        assert!(out.duration_seconds > 0.0);
    }

    #[tokio::test]
    async fn test_mock_tts_rate_shortens_duration() {
        let tts = MockTts::new("normal");
        let slow = tts
            .synthesize("one two three four", &ProsodyPreset::new("v", 0.9, 1.0, 1.0))
            .await
            .unwrap();
        let fast = tts
            .synthesize("one two three four", &ProsodyPreset::new("v", 1.2, 1.0, 1.0))
            .await
            .unwrap();
        assert!(fast.duration_seconds < slow.duration_seconds);
    }

    #[tokio::test]
    async fn test_mock_playback_url_is_per_session() {
        let tts = MockTts::new("normal");
        let prosody = ProsodyPreset::new("v", 1.0, 1.0, 1.0);
        let a = tts.playback_url("s1", "x", &prosody).await.unwrap();
        let b = tts.playback_url("s2", "x", &prosody).await.unwrap();
        assert_ne!(a, b);
        assert!(a.contains("s1"));
    }

    #[tokio::test]
    async fn test_mock_stt_rejects_empty_audio() {
        assert!(MockStt.transcribe(&[], None).await.is_err());
        let out = MockStt.transcribe(&[0u8; 64_000], Some("en")).await.unwrap();
        assert_eq!(out.language, "en");
        assert!((out.duration_seconds - 2.0).abs() < 1e-9);
    }
}
