//! End-to-end tests over the HTTP surface, driven through the router.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use sensoria_core::config::{DeviceConfig, QuotaConfig, SessionConfig};
use sensoria_devices::{DeviceRegistry, FanOut, FanOutConfig, SimulatedDevice};
use sensoria_emotion::{EmotionEngine, MappingTables};
use sensoria_gateway::{router, AppState, AuthKeys, QuotaGuard, RateLimiter};
use sensoria_memory::MemoryStore;
use sensoria_orchestrator::{Orchestrator, SessionTable};
use sensoria_runtime::{MockStt, MockTts, WorkPool};
use sensoria_segment::SegmentOptions;
use sensoria_sync::{SyncHub, SyncService};
use sensoria_core::{DeviceClass, DeviceDescriptor};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

struct Fixture {
    app: Router,
    content_dir: tempfile::TempDir,
}

async fn fixture_with(keys: &[String], quota: QuotaConfig) -> Fixture {
    let content_dir = tempfile::tempdir().unwrap();
    tokio::fs::write(content_dir.path().join("story.md"), "# chapter one")
        .await
        .unwrap();

    let memory = Arc::new(MemoryStore::in_memory().await.unwrap());
    let registry = DeviceRegistry::new(Duration::from_secs(
        DeviceConfig::default().heartbeat_period_secs,
    ));
    for (id, class) in [
        ("apple_watch", DeviceClass::Watch),
        ("aromajoin", DeviceClass::Scent),
        ("bhaptics_vest", DeviceClass::HapticVest),
    ] {
        registry
            .register(
                DeviceDescriptor::new(id, class, &format!("sim://{id}")),
                Arc::new(SimulatedDevice::new(id)),
            )
            .await;
    }

    let pool = WorkPool::new(32);
    let fanout = Arc::new(FanOut::new(
        registry.clone(),
        MappingTables::v1(),
        pool.clone(),
        FanOutConfig::default(),
    ));
    let emotion = Arc::new(EmotionEngine::local());
    let tts: Arc<sensoria_runtime::MockTts> = Arc::new(MockTts::new("normal"));
    let orchestrator = Arc::new(
        Orchestrator::new(
            SessionTable::new(Duration::from_secs(1800)),
            emotion.clone(),
            MappingTables::v1(),
            memory.clone(),
            fanout.clone(),
            tts.clone(),
            SessionConfig::default(),
        )
        .unwrap(),
    );
    let sync = Arc::new(SyncService::new(
        content_dir.path().to_path_buf(),
        vec!["story.md".to_string()],
        Duration::from_secs(5),
        SyncHub::new(32),
    ));

    let state = AppState {
        orchestrator,
        memory,
        registry,
        fanout,
        emotion,
        tables: MappingTables::v1(),
        sync,
        tts,
        stt: Arc::new(MockStt),
        auth: Arc::new(AuthKeys::new(keys)),
        quota: Arc::new(QuotaGuard::new(quota)),
        limiter: Arc::new(RateLimiter::new(1000, 1000)),
        segment_opts: SegmentOptions::default(),
        started_at: chrono::Utc::now().timestamp(),
    };

    Fixture {
        app: router(state),
        content_dir,
    }
}

async fn fixture() -> Fixture {
    fixture_with(&[], QuotaConfig::default()).await
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

#[tokio::test]
async fn test_play_seek_summary_flow() {
    let fx = fixture().await;

    let response = fx
        .app
        .clone()
        .oneshot(post_json(
            "/orchestrator/play",
            json!({"text": "今天天氣真好！我很開心。", "user_id": "u1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["metadata"]["total_segments"], 2);
    assert_eq!(body["metadata"]["emotion"]["primary"], "happy");
    let haptics = body["metadata"]["haptic_events"].as_array().unwrap();
    assert!(haptics
        .iter()
        .any(|e| e["pattern"]["name"] == "gentle_pulse"));
    assert!(body["metadata"]["total_duration"].as_f64().unwrap() > 0.0);
    let session_id = body["session_id"].as_str().unwrap().to_string();

    let response = fx
        .app
        .clone()
        .oneshot(post_json(
            "/orchestrator/seek",
            json!({"session_id": session_id, "segment_index": 1}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "seeked");
    assert_eq!(body["current_index"], 1);

    let response = fx
        .app
        .clone()
        .oneshot(get(&format!(
            "/orchestrator/summary?session_id={session_id}"
        )))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["current_position"], 1);
    assert_eq!(body["total_segments"], 2);
    assert_eq!(body["playing"], true);
}

#[tokio::test]
async fn test_play_rejects_empty_text() {
    let fx = fixture().await;
    let response = fx
        .app
        .clone()
        .oneshot(post_json("/orchestrator/play", json!({"text": "  "})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["kind"], "invalid_argument");
    assert!(body["trace_id"].is_string());
}

#[tokio::test]
async fn test_seek_out_of_range() {
    let fx = fixture().await;
    let body = body_json(
        fx.app
            .clone()
            .oneshot(post_json(
                "/orchestrator/play",
                json!({"text": "One. Two."}),
            ))
            .await
            .unwrap(),
    )
    .await;
    let session_id = body["session_id"].as_str().unwrap();

    let response = fx
        .app
        .clone()
        .oneshot(post_json(
            "/orchestrator/seek",
            json!({"session_id": session_id, "segment_index": 2}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("invalid_segment"));
}

#[tokio::test]
async fn test_segment_text_paragraphs() {
    let fx = fixture().await;
    let response = fx
        .app
        .clone()
        .oneshot(post_json(
            "/segment_text",
            json!({"text": "Para 1.\n\nPara 2.\n\nPara 3.", "strategy": "paragraphs"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total_segments"], 3);
    assert_eq!(body["strategy_used"], "paragraph");
    for seg in body["segments"].as_array().unwrap() {
        assert!(seg["word_count"].as_u64().unwrap() >= 1);
    }
}

#[tokio::test]
async fn test_generate_haptics_excited_maps_to_happy_family() {
    let fx = fixture().await;
    let response = fx
        .app
        .clone()
        .oneshot(post_json(
            "/generate_haptics",
            json!({"emotion": "excited", "intensity": 0.9}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["emotion"], "happy");
    assert_eq!(body["pattern"]["name"], "gentle_pulse");
    let intensity = body["pattern"]["intensity"].as_f64().unwrap();
    assert!(intensity <= 1.0);
    assert!((intensity - 0.7 * 0.9).abs() < 1e-5);
}

#[tokio::test]
async fn test_haptic_patterns_lists_v1_names() {
    let fx = fixture().await;
    let body = body_json(
        fx.app.clone().oneshot(get("/haptic_patterns")).await.unwrap(),
    )
    .await;
    let names: Vec<&str> = body["patterns"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(names.contains(&"gentle_pulse"));
    assert!(names.contains(&"subtle_tap"));
    assert_eq!(names.len(), 7);
}

#[tokio::test]
async fn test_broadcast_to_devices_scenario() {
    let fx = fixture().await;
    let response = fx
        .app
        .clone()
        .oneshot(post_json(
            "/api/broadcast-to-devices",
            json!({
                "emotion": "sad",
                "intensity": 0.7,
                "devices": ["apple_watch", "aromajoin", "unknown_dev"],
                "content": {}
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["devices"]["apple_watch"]["status"], "success");
    assert_eq!(body["devices"]["aromajoin"]["status"], "success");
    assert_eq!(body["devices"]["unknown_dev"]["status"], "failed");
    assert_eq!(body["emotion"], "sad");
}

#[tokio::test]
async fn test_sync_manifest_conditional_fetch() {
    let fx = fixture().await;

    let response = fx.app.clone().oneshot(get("/sync/manifest")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let etag = response
        .headers()
        .get(header::ETAG)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let request = Request::builder()
        .uri("/sync/manifest")
        .header(header::IF_NONE_MATCH, etag.clone())
        .body(Body::empty())
        .unwrap();
    let response = fx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_sync_file_fetch_and_whitelist() {
    let fx = fixture().await;

    let response = fx
        .app
        .clone()
        .oneshot(get("/sync/file?path=story.md"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["path"], "story.md");
    assert_eq!(body["content"], "# chapter one");

    // Exists on disk but is not whitelisted: 404 either way.
    tokio::fs::write(fx.content_dir.path().join("secret.md"), "hidden")
        .await
        .unwrap();
    let response = fx
        .app
        .clone()
        .oneshot(get("/sync/file?path=secret.md"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rag_roundtrip_over_http() {
    let fx = fixture().await;

    let response = fx
        .app
        .clone()
        .oneshot(post_json(
            "/rag/upsert",
            json!({"text": "the moon hung low over the harbor", "doc_id": "d1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(
        fx.app
            .clone()
            .oneshot(get(
                "/rag/query?q=the%20moon%20hung%20low%20over%20the%20harbor&top_k=1",
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["doc_id"], "d1");

    let response = fx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/rag/delete?doc_id=d1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["deleted"], true);
}

#[tokio::test]
async fn test_auth_rejects_unknown_key() {
    let fx = fixture_with(&["secret-key".to_string()], QuotaConfig::default()).await;

    let response = fx.app.clone().oneshot(get("/rag/list")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/rag/list")
        .header("x-api-key", "wrong")
        .body(Body::empty())
        .unwrap();
    let response = fx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/rag/list")
        .header("x-api-key", "secret-key")
        .body(Body::empty())
        .unwrap();
    let response = fx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Bearer substitution works too.
    let request = Request::builder()
        .uri("/rag/list")
        .header(header::AUTHORIZATION, "Bearer secret-key")
        .body(Body::empty())
        .unwrap();
    let response = fx.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Health stays open.
    let response = fx.app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_play_quota_exhausts() {
    let quota = QuotaConfig {
        play_per_day: 1,
        ..Default::default()
    };
    let fx = fixture_with(&[], quota).await;

    let ok = fx
        .app
        .clone()
        .oneshot(post_json("/orchestrator/play", json!({"text": "Hi there."})))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);

    let over = fx
        .app
        .clone()
        .oneshot(post_json("/orchestrator/play", json!({"text": "Hi again."})))
        .await
        .unwrap();
    assert_eq!(over.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_json(over).await;
    assert_eq!(body["kind"], "quota_exceeded");
}

#[tokio::test]
async fn test_tts_and_stt_mock_providers() {
    let fx = fixture().await;

    let response = fx
        .app
        .clone()
        .oneshot(post_json(
            "/api/tts",
            json!({"text": "你好世界", "emotion": "happy", "speed": 1.0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["provider"], "mock");
    assert_eq!(body["voice"], "cheerful");
    assert!(body["audio_base64"].is_string());

    use base64::Engine;
    let audio = base64::engine::general_purpose::STANDARD.encode(vec![0u8; 32_000]);
    let response = fx
        .app
        .clone()
        .oneshot(post_json("/api/stt", json!({"audio_base64": audio})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["language"], "zh-TW");
    assert!((body["duration"].as_f64().unwrap() - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_detect_emotion_degrades_without_backend() {
    let fx = fixture().await;
    use base64::Engine;
    let image = base64::engine::general_purpose::STANDARD.encode(b"fake-image");
    let response = fx
        .app
        .clone()
        .oneshot(post_json(
            "/api/detect-emotion",
            json!({"image_base64": image}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["primary"], "neutral");
    assert_eq!(body["confidence"], 0.0);
    assert_eq!(body["source"], "image");
}

#[tokio::test]
async fn test_model_select() {
    let fx = fixture().await;
    let body = body_json(
        fx.app
            .clone()
            .oneshot(get(
                "/ai/model-select?device=desktop&memory_mb=4096&prefer_quality=true",
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["chosen"], "sensoria-affect-large");
    assert!(body["reasons"].as_array().unwrap().len() == 1);
}

#[tokio::test]
async fn test_device_register_and_heartbeat() {
    let fx = fixture().await;
    let response = fx
        .app
        .clone()
        .oneshot(post_json(
            "/devices/register",
            json!({"id": "new_vest", "class": "haptic_vest"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = fx
        .app
        .clone()
        .oneshot(post_json("/devices/heartbeat", json!({"id": "new_vest"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = fx
        .app
        .clone()
        .oneshot(post_json("/devices/heartbeat", json!({"id": "ghost"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(fx.app.clone().oneshot(get("/devices")).await.unwrap()).await;
    assert_eq!(body["count"], 4);
}

#[tokio::test]
async fn test_health_reports_counters() {
    let fx = fixture().await;
    let body = body_json(fx.app.clone().oneshot(get("/health")).await.unwrap()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["devices"], 3);
    assert_eq!(body["mapping_tables"], "v1");
}
