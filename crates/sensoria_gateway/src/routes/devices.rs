//! Device routes: registration, heartbeat, listing, ad-hoc broadcast.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use sensoria_core::{
    clamp01, DeviceClass, DeviceDescriptor, Error, EmotionReading, EmotionSource,
};
use sensoria_devices::{BroadcastContent, SimulatedDevice};
use sensoria_emotion::collapse_label;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub id: String,
    pub class: String,
    #[serde(default)]
    pub addr: Option<String>,
}

/// Register a device. Registered devices are backed by the in-tree
/// simulated adapter; real vendor adapters plug in behind the same port.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Json<Value>> {
    if req.id.trim().is_empty() {
        return Err(Error::invalid_argument("device id must not be empty").into());
    }
    let class: DeviceClass = serde_json::from_value(Value::String(req.class.clone()))
        .map_err(|_| Error::invalid_argument(format!("unknown device class '{}'", req.class)))?;

    let addr = req.addr.unwrap_or_else(|| format!("sim://{}", req.id));
    let descriptor = DeviceDescriptor::new(&req.id, class, &addr);
    state
        .registry
        .register(descriptor.clone(), Arc::new(SimulatedDevice::new(&req.id)))
        .await;
    Ok(Json(json!({ "status": "registered", "device": descriptor })))
}

#[derive(Debug, Deserialize)]
pub struct HeartbeatRequest {
    pub id: String,
}

pub async fn heartbeat(
    State(state): State<AppState>,
    Json(req): Json<HeartbeatRequest>,
) -> ApiResult<Json<Value>> {
    if !state.registry.heartbeat(&req.id).await {
        return Err(Error::not_found(format!("device {} not registered", req.id)).into());
    }
    Ok(Json(json!({ "status": "ok" })))
}

pub async fn list(State(state): State<AppState>) -> Json<Value> {
    let devices = state.registry.snapshot().await;
    Json(json!({ "count": devices.len(), "devices": devices }))
}

#[derive(Debug, Deserialize)]
pub struct BroadcastRequest {
    pub emotion: String,
    #[serde(default)]
    pub intensity: Option<f32>,
    #[serde(default)]
    pub devices: Option<Vec<String>>,
    #[serde(default)]
    pub content: Value,
}

/// One-shot fan-out of an emotion to devices, outside any session.
pub async fn broadcast(
    State(state): State<AppState>,
    Json(req): Json<BroadcastRequest>,
) -> ApiResult<Json<Value>> {
    let label = collapse_label(&req.emotion);
    let intensity = clamp01(req.intensity.unwrap_or(0.7));
    let reading = EmotionReading::new(
        label,
        intensity,
        Vec::new(),
        "client-broadcast",
        EmotionSource::Text,
        1.0,
    );
    let content = BroadcastContent {
        text: req
            .content
            .get("text")
            .and_then(Value::as_str)
            .map(str::to_string),
    };

    let session_key = format!("broadcast-{}", Uuid::new_v4());
    let results = state
        .fanout
        .broadcast(
            &session_key,
            0,
            &reading,
            &content,
            req.devices.as_deref(),
        )
        .await;

    Ok(Json(json!({
        "devices": results,
        "emotion": label.as_str(),
        "intensity": intensity,
        "timestamp": chrono::Utc::now().timestamp(),
    })))
}
