//! Media routes: segmentation, haptics, emotion detection, TTS, STT.

use crate::auth::Subject;
use crate::error::ApiResult;
use crate::quota::QuotaKind;
use crate::state::AppState;
use axum::extract::State;
use axum::{Extension, Json};
use base64::Engine;
use sensoria_core::{clamp01, EmotionPayload, Error, SegmentStrategy};
use sensoria_emotion::{collapse_label, MIN_INTENSITY_FACTOR};
use serde::Deserialize;
use serde_json::{json, Value};

fn decode_base64(field: &str, data: &str) -> Result<Vec<u8>, Error> {
    base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|_| Error::invalid_argument(format!("{field} is not valid base64")))
}

// ============================================================================
// Segmentation
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SegmentRequest {
    pub text: String,
    #[serde(default)]
    pub strategy: Option<String>,
}

pub async fn segment_text(
    State(state): State<AppState>,
    Json(req): Json<SegmentRequest>,
) -> ApiResult<Json<Value>> {
    let strategy = match req.strategy.as_deref() {
        Some(raw) => SegmentStrategy::parse_str(raw).ok_or_else(|| {
            Error::invalid_argument(format!("unknown strategy '{raw}'"))
                .with_hint("one of: sentence, paragraph, adaptive")
        })?,
        None => SegmentStrategy::default(),
    };

    let segments = sensoria_segment::segment(&req.text, strategy, &state.segment_opts);
    let total_duration: f64 = segments.iter().map(|s| s.est_duration_seconds).sum();
    let total_words: usize = segments.iter().map(|s| s.word_count).sum();

    Ok(Json(json!({
        "segments": segments,
        "total_segments": segments.len(),
        "total_length": req.text.chars().count(),
        "strategy_used": strategy.as_str(),
        "metadata": {
            "total_words": total_words,
            "total_duration": total_duration,
        }
    })))
}

// ============================================================================
// Haptics
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct HapticsRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub intensity: Option<f32>,
    #[serde(default)]
    pub pattern_name: Option<String>,
}

pub async fn generate_haptics(
    State(state): State<AppState>,
    Json(req): Json<HapticsRequest>,
) -> ApiResult<Json<Value>> {
    // Resolution order: explicit pattern, then emotion label, then text.
    let (label, base_pattern) = if let Some(ref name) = req.pattern_name {
        let pattern = state
            .tables
            .haptic_by_name(name)
            .ok_or_else(|| Error::not_found(format!("no haptic pattern named '{name}'")))?;
        (None, pattern)
    } else if let Some(ref raw) = req.emotion {
        let label = collapse_label(raw);
        (Some(label), state.tables.haptic(label))
    } else if let Some(ref text) = req.text {
        let reading = state
            .emotion
            .predict(&EmotionPayload::Text(text.clone()))
            .await;
        (Some(reading.primary), state.tables.haptic(reading.primary))
    } else {
        return Err(Error::invalid_argument(
            "one of text, emotion, or pattern_name is required",
        )
        .into());
    };

    let factor = clamp01(req.intensity.unwrap_or(1.0)).max(MIN_INTENSITY_FACTOR);
    let pattern = base_pattern.scaled(factor);

    Ok(Json(json!({
        "emotion": label.map(|l| l.as_str()),
        "intensity": factor,
        "pattern": pattern,
        "events": [{ "at_seconds": 0.0, "pattern": pattern }],
    })))
}

pub async fn haptic_patterns(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "patterns": state.tables.haptic_pattern_names() }))
}

// ============================================================================
// Emotion detection
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DetectEmotionRequest {
    pub image_base64: String,
}

pub async fn detect_emotion(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Json(req): Json<DetectEmotionRequest>,
) -> ApiResult<Json<Value>> {
    state.quota.consume(&subject.0, QuotaKind::Image).await?;
    let bytes = decode_base64("image_base64", &req.image_base64)?;
    if bytes.is_empty() {
        return Err(Error::invalid_argument("image payload is empty").into());
    }
    let reading = state.emotion.predict(&EmotionPayload::Image(bytes)).await;
    Ok(Json(serde_json::to_value(reading).unwrap_or(Value::Null)))
}

// ============================================================================
// TTS / STT
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    pub text: String,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub speed: Option<f32>,
}

pub async fn tts(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Json(req): Json<TtsRequest>,
) -> ApiResult<Json<Value>> {
    state.quota.consume(&subject.0, QuotaKind::Tts).await?;
    if req.text.trim().is_empty() {
        return Err(Error::invalid_argument("text must not be empty").into());
    }

    let label = collapse_label(req.emotion.as_deref().unwrap_or("neutral"));
    let mut prosody = state.tables.prosody(label);
    if let Some(ref voice) = req.voice {
        prosody.voice_id = voice.clone();
    }
    if let Some(speed) = req.speed {
        prosody.rate = sensoria_core::clamp_range(prosody.rate * speed, 0.5, 2.0);
    }

    let output = state
        .tts
        .synthesize(&req.text, &prosody)
        .await
        .map_err(|e| Error::upstream(format!("TTS synthesis failed: {e}")))?;

    Ok(Json(json!({
        "audio_url": output.audio_url,
        "audio_base64": output.audio_base64,
        "duration": output.duration_seconds,
        "format": output.format,
        "provider": output.provider,
        "voice": output.voice,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SttRequest {
    pub audio_base64: String,
    #[serde(default)]
    pub language: Option<String>,
}

pub async fn stt(
    State(state): State<AppState>,
    Json(req): Json<SttRequest>,
) -> ApiResult<Json<Value>> {
    let audio = decode_base64("audio_base64", &req.audio_base64)?;
    let output = state
        .stt
        .transcribe(&audio, req.language.as_deref())
        .await
        .map_err(|e| Error::upstream(format!("STT transcription failed: {e}")))?;

    Ok(Json(json!({
        "text": output.text,
        "confidence": output.confidence,
        "language": output.language,
        "duration": output.duration_seconds,
        "provider": output.provider,
    })))
}
