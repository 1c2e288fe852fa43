//! Memory routes: RAG corpus, preferences, bookmarks.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::Json;
use sensoria_core::Error;
use serde::Deserialize;
use serde_json::{json, Map, Value};

// ============================================================================
// RAG
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RagQuery {
    pub q: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

pub async fn rag_query(
    State(state): State<AppState>,
    Query(query): Query<RagQuery>,
) -> ApiResult<Json<Value>> {
    let hits = state
        .memory
        .rag_query(&query.q, query.top_k.unwrap_or(5))
        .await
        .map_err(|e| Error::internal(format!("rag query failed: {e}")))?;

    let results: Vec<Value> = hits
        .iter()
        .map(|(doc, score)| {
            json!({
                "doc_id": doc.doc_id,
                "text": doc.text,
                "meta": doc.meta,
                "score": score,
            })
        })
        .collect();
    Ok(Json(json!({ "query": query.q, "count": results.len(), "results": results })))
}

#[derive(Debug, Deserialize)]
pub struct RagUpsertRequest {
    pub text: String,
    #[serde(default)]
    pub doc_id: Option<String>,
    #[serde(default)]
    pub meta: Value,
}

pub async fn rag_upsert(
    State(state): State<AppState>,
    Json(req): Json<RagUpsertRequest>,
) -> ApiResult<Json<Value>> {
    if req.text.trim().is_empty() {
        return Err(Error::invalid_argument("text must not be empty").into());
    }
    let doc = state
        .memory
        .rag_upsert(&req.text, req.doc_id.as_deref(), req.meta)
        .await
        .map_err(|e| Error::internal(format!("rag upsert failed: {e}")))?;
    Ok(Json(json!({ "status": "stored", "doc": doc })))
}

pub async fn rag_list(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let docs = state
        .memory
        .rag_list()
        .await
        .map_err(|e| Error::internal(format!("rag list failed: {e}")))?;
    Ok(Json(json!({ "count": docs.len(), "docs": docs })))
}

#[derive(Debug, Deserialize)]
pub struct RagDeleteQuery {
    pub doc_id: String,
}

pub async fn rag_delete(
    State(state): State<AppState>,
    Query(query): Query<RagDeleteQuery>,
) -> ApiResult<Json<Value>> {
    let deleted = state
        .memory
        .rag_delete(&query.doc_id)
        .await
        .map_err(|e| Error::internal(format!("rag delete failed: {e}")))?;
    Ok(Json(json!({ "doc_id": query.doc_id, "deleted": deleted })))
}

// ============================================================================
// Preferences & bookmarks
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

pub async fn get_preferences(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Value>> {
    let prefs = state
        .memory
        .get_preferences(&query.user_id)
        .await
        .map_err(|e| Error::internal(format!("preference read failed: {e}")))?;
    Ok(Json(json!({ "user_id": query.user_id, "preferences": prefs })))
}

#[derive(Debug, Deserialize)]
pub struct SetPreferencesRequest {
    pub user_id: String,
    pub patch: Map<String, Value>,
}

pub async fn set_preferences(
    State(state): State<AppState>,
    Json(req): Json<SetPreferencesRequest>,
) -> ApiResult<Json<Value>> {
    let merged = state
        .memory
        .set_preferences(&req.user_id, &req.patch)
        .await
        .map_err(|e| Error::internal(format!("preference write failed: {e}")))?;
    Ok(Json(json!({ "user_id": req.user_id, "preferences": merged })))
}

#[derive(Debug, Deserialize)]
pub struct AddBookmarkRequest {
    pub user_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    pub segment_index: i64,
    #[serde(default)]
    pub note: String,
}

pub async fn add_bookmark(
    State(state): State<AppState>,
    Json(req): Json<AddBookmarkRequest>,
) -> ApiResult<Json<Value>> {
    let bookmark = state
        .memory
        .add_bookmark(
            &req.user_id,
            req.session_id.as_deref(),
            req.segment_index,
            &req.note,
        )
        .await
        .map_err(|e| Error::internal(format!("bookmark write failed: {e}")))?;
    Ok(Json(json!({ "status": "stored", "bookmark": bookmark })))
}

pub async fn list_bookmarks(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<Value>> {
    let bookmarks = state
        .memory
        .list_bookmarks(&query.user_id)
        .await
        .map_err(|e| Error::internal(format!("bookmark read failed: {e}")))?;
    Ok(Json(json!({ "count": bookmarks.len(), "bookmarks": bookmarks })))
}
