//! Liveness and model selection.

use crate::state::AppState;
use axum::extract::{Query, State};
use axum::Json;
use sensoria_runtime::select_model;
use serde::Deserialize;
use serde_json::{json, Value};

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let uptime = chrono::Utc::now().timestamp() - state.started_at;
    Json(json!({
        "status": "ok",
        "uptime_seconds": uptime,
        "sessions": state.orchestrator.sessions().count().await,
        "devices": state.registry.count().await,
        "sync_subscribers": state.sync.hub().subscriber_count().await,
        "mapping_tables": state.tables.version(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ModelSelectQuery {
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub memory_mb: Option<u32>,
    #[serde(default)]
    pub prefer_quality: Option<bool>,
}

pub async fn model_select(Query(query): Query<ModelSelectQuery>) -> Json<Value> {
    let choice = select_model(
        query.device.as_deref().unwrap_or("desktop"),
        query.memory_mb.unwrap_or(2048),
        query.prefer_quality.unwrap_or(false),
    );
    Json(json!({
        "chosen": choice.chosen,
        "fallback": choice.fallback,
        "reasons": choice.reasons,
    }))
}
