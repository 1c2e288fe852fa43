//! Sync routes: conditional manifest fetch and whitelisted file bodies.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use sensoria_sync::ManifestResponse;
use serde::Deserialize;

pub async fn manifest(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let if_none_match = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_matches('"').to_string());

    match state.sync.manifest(if_none_match.as_deref()).await? {
        ManifestResponse::NotModified => {
            let etag = if_none_match.unwrap_or_default();
            Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response())
        }
        ManifestResponse::Full(manifest) => {
            let etag = manifest.etag.clone();
            Ok((StatusCode::OK, [(header::ETAG, etag)], Json(manifest)).into_response())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    pub path: String,
}

pub async fn file(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
) -> ApiResult<Json<sensoria_sync::FileBody>> {
    let body = state.sync.file(&query.path).await?;
    Ok(Json(body))
}
