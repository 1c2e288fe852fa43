//! The emotion engine: one `predict` entry point over three modalities.
//!
//! Total by construction: a missing or failing backend degrades to a
//! clearly-marked neutral reading instead of erroring. Outputs are
//! memoized per engine instance so identical inputs within a session get
//! identical readings (including timestamps).

use sensoria_core::lexicon;
use sensoria_core::ports::{AudioClassifierPort, TextClassifierPort, VisionClassifierPort};
use sensoria_core::{EmotionLabel, EmotionPayload, EmotionReading, EmotionSource};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Ceiling on memoized entries; the map is cleared when it fills up.
const MEMO_CAPACITY: usize = 1024;

/// Confidence ceiling for the lexicon fallback after a remote failure.
const FALLBACK_CONFIDENCE_CAP: f32 = 0.5;

pub struct EmotionEngine {
    text_classifier: Option<Arc<dyn TextClassifierPort>>,
    vision_classifier: Option<Arc<dyn VisionClassifierPort>>,
    audio_classifier: Option<Arc<dyn AudioClassifierPort>>,
    memo: Mutex<HashMap<[u8; 32], EmotionReading>>,
}

impl EmotionEngine {
    /// Lexicon-only engine with no remote backends.
    pub fn local() -> Self {
        Self {
            text_classifier: None,
            vision_classifier: None,
            audio_classifier: None,
            memo: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_text_classifier(mut self, port: Arc<dyn TextClassifierPort>) -> Self {
        self.text_classifier = Some(port);
        self
    }

    pub fn with_vision_classifier(mut self, port: Arc<dyn VisionClassifierPort>) -> Self {
        self.vision_classifier = Some(port);
        self
    }

    pub fn with_audio_classifier(mut self, port: Arc<dyn AudioClassifierPort>) -> Self {
        self.audio_classifier = Some(port);
        self
    }

    /// Predict an emotion reading for one payload. Never fails.
    pub async fn predict(&self, payload: &EmotionPayload) -> EmotionReading {
        let key = memo_key(payload);
        {
            let memo = self.memo.lock().await;
            if let Some(hit) = memo.get(&key) {
                return hit.clone();
            }
        }

        let reading = match payload {
            EmotionPayload::Text(text) => self.predict_text(text).await,
            EmotionPayload::Image(bytes) => self.predict_image(bytes).await,
            EmotionPayload::Audio(bytes) => self.predict_audio(bytes).await,
        };

        let mut memo = self.memo.lock().await;
        if memo.len() >= MEMO_CAPACITY {
            memo.clear();
        }
        memo.insert(key, reading.clone());
        reading
    }

    async fn predict_text(&self, text: &str) -> EmotionReading {
        if let Some(ref remote) = self.text_classifier {
            match remote.classify_text(text).await {
                Ok(reading) => return sanitize(reading, EmotionSource::Text),
                Err(e) => {
                    tracing::warn!("remote text classifier failed, using lexicon: {}", e);
                    let mut fallback = lexicon::analyze(text);
                    fallback.confidence = fallback.confidence.min(FALLBACK_CONFIDENCE_CAP);
                    return fallback;
                }
            }
        }
        lexicon::analyze(text)
    }

    async fn predict_image(&self, bytes: &[u8]) -> EmotionReading {
        match self.vision_classifier {
            Some(ref port) => match port.classify_image(bytes).await {
                Ok(reading) => sanitize(reading, EmotionSource::Image),
                Err(e) => {
                    tracing::warn!("vision classifier failed: {}", e);
                    EmotionReading::unavailable(EmotionSource::Image)
                }
            },
            None => EmotionReading::unavailable(EmotionSource::Image),
        }
    }

    async fn predict_audio(&self, bytes: &[u8]) -> EmotionReading {
        match self.audio_classifier {
            Some(ref port) => match port.classify_audio(bytes).await {
                Ok(reading) => sanitize(reading, EmotionSource::Audio),
                Err(e) => {
                    tracing::warn!("audio classifier failed: {}", e);
                    EmotionReading::unavailable(EmotionSource::Audio)
                }
            },
            None => EmotionReading::unavailable(EmotionSource::Audio),
        }
    }
}

/// Re-clamp a backend reading and pin its source. Backends are not trusted
/// to stay inside the closed label set's ranges.
fn sanitize(reading: EmotionReading, source: EmotionSource) -> EmotionReading {
    EmotionReading::new(
        reading.primary,
        reading.intensity,
        reading.secondary,
        reading.features,
        source,
        reading.confidence,
    )
}

fn memo_key(payload: &EmotionPayload) -> [u8; 32] {
    let mut hasher = Sha256::new();
    let tag: &[u8] = match payload.source() {
        EmotionSource::Text => b"t:",
        EmotionSource::Image => b"i:",
        EmotionSource::Audio => b"a:",
    };
    hasher.update(tag);
    hasher.update(payload.as_bytes());
    hasher.finalize().into()
}

/// Collapse a client-supplied label string into the closed set. Unknown
/// labels become `Neutral`, never a new category.
pub fn collapse_label(raw: &str) -> EmotionLabel {
    EmotionLabel::parse_str(raw).unwrap_or(EmotionLabel::Neutral)
}
