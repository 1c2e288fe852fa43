//! The HTTP + WebSocket gateway.
//!
//! Transport translation only: handlers parse JSON, call into the internal
//! contracts, and serialize results. Auth, rate limiting, and quota checks
//! run before any business logic.

pub mod auth;
pub mod error;
pub mod quota;
pub mod routes;
pub mod state;
pub mod ws;

pub use auth::{AuthKeys, RateLimiter};
pub use quota::{QuotaGuard, QuotaKind};
pub use state::AppState;

use axum::routing::{delete, get, post};
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;

/// Build the full route tree over the given state.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/orchestrator/play", post(routes::orchestrator::play))
        .route("/orchestrator/pause", post(routes::orchestrator::pause))
        .route("/orchestrator/seek", post(routes::orchestrator::seek))
        .route("/orchestrator/summary", get(routes::orchestrator::summary))
        .route("/segment_text", post(routes::media::segment_text))
        .route("/generate_haptics", post(routes::media::generate_haptics))
        .route("/haptic_patterns", get(routes::media::haptic_patterns))
        .route("/api/detect-emotion", post(routes::media::detect_emotion))
        .route("/api/tts", post(routes::media::tts))
        .route("/api/stt", post(routes::media::stt))
        .route("/api/broadcast-to-devices", post(routes::devices::broadcast))
        .route("/devices", get(routes::devices::list))
        .route("/devices/register", post(routes::devices::register))
        .route("/devices/heartbeat", post(routes::devices::heartbeat))
        .route("/sync/manifest", get(routes::sync::manifest))
        .route("/sync/file", get(routes::sync::file))
        .route("/rag/query", get(routes::memory::rag_query))
        .route("/rag/upsert", post(routes::memory::rag_upsert))
        .route("/rag/list", get(routes::memory::rag_list))
        .route("/rag/delete", delete(routes::memory::rag_delete))
        .route(
            "/memory/preferences",
            get(routes::memory::get_preferences).post(routes::memory::set_preferences),
        )
        .route(
            "/memory/bookmarks",
            get(routes::memory::list_bookmarks).post(routes::memory::add_bookmark),
        )
        .route("/ai/model-select", get(routes::system::model_select))
        .route("/ws/sync", get(ws::ws_upgrade))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The gateway server: binds and serves the router in a background task.
pub struct GatewayServer {
    state: AppState,
    host: String,
    port: u16,
}

impl GatewayServer {
    pub fn new(state: AppState, host: &str, port: u16) -> Self {
        Self {
            state,
            host: host.to_string(),
            port,
        }
    }

    /// Start serving. Returns the join handle of the server task.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        let app = router(self.state);
        let addr = format!("{}:{}", self.host, self.port);
        tokio::spawn(async move {
            let listener = match tokio::net::TcpListener::bind(&addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!("Gateway failed to bind {}: {}", addr, e);
                    return;
                }
            };
            tracing::info!("Gateway listening on {}", addr);
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Gateway server error: {}", e);
            }
        })
    }
}
