//! Orchestrator lifecycle routes: play, pause, seek, summary.

use crate::auth::Subject;
use crate::error::ApiResult;
use crate::quota::QuotaKind;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::{Extension, Json};
use sensoria_core::{Error, SegmentStrategy};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    pub text: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub strategy: Option<String>,
}

pub async fn play(
    State(state): State<AppState>,
    Extension(subject): Extension<Subject>,
    Json(req): Json<PlayRequest>,
) -> ApiResult<Json<Value>> {
    state.quota.consume(&subject.0, QuotaKind::Play).await?;

    let strategy = match req.strategy.as_deref() {
        Some(raw) => Some(SegmentStrategy::parse_str(raw).ok_or_else(|| {
            Error::invalid_argument(format!("unknown strategy '{raw}'"))
                .with_hint("one of: sentence, paragraph, adaptive")
        })?),
        None => None,
    };

    let plan = state
        .orchestrator
        .play(&req.text, req.user_id.as_deref(), strategy)
        .await?;

    Ok(Json(json!({
        "session_id": plan.session_id,
        "playback_url": plan.playback_url,
        "metadata": {
            "segments": plan.segments,
            "total_segments": plan.segments.len(),
            "emotion": plan.emotion,
            "prosody": plan.prosody,
            "haptic_events": plan.haptic_events,
            "scent_events": plan.scent_events,
            "ar_events": plan.ar_events,
            "total_duration": plan.duration_total,
            "plan_generation": plan.plan_generation,
        }
    })))
}

#[derive(Debug, Deserialize)]
pub struct PauseRequest {
    pub session_id: String,
}

pub async fn pause(
    State(state): State<AppState>,
    Json(req): Json<PauseRequest>,
) -> ApiResult<Json<Value>> {
    let outcome = state.orchestrator.pause(&req.session_id).await?;
    Ok(Json(json!({
        "status": "paused",
        "current_index": outcome.current_index,
        "playing": outcome.playing,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    pub session_id: String,
    pub segment_index: usize,
}

pub async fn seek(
    State(state): State<AppState>,
    Json(req): Json<SeekRequest>,
) -> ApiResult<Json<Value>> {
    let outcome = state
        .orchestrator
        .seek(&req.session_id, req.segment_index)
        .await?;
    Ok(Json(json!({
        "status": "seeked",
        "current_index": outcome.current_index,
        "segment_text": outcome.segment_text,
        "segment_duration": outcome.segment_duration,
    })))
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub session_id: String,
}

pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<Json<Value>> {
    let summary = state.orchestrator.summary(&query.session_id).await?;
    Ok(Json(json!({
        "summary": summary.summary,
        "total_segments": summary.total_segments,
        "total_highlights": summary.total_highlights,
        "current_position": summary.current_index,
        "playing": summary.playing,
        "emotion": summary.emotion,
    })))
}
