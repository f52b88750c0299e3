//! Integration tests for the narration player API
//!
//! Covers the HTTP surface (health, narration control, status) against
//! an in-process router, and the synthesis client against a stub
//! synthesis service.

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use base64::Engine as _;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

use lectio_np::api::{create_router, AppState};
use lectio_np::audio::NarrationBuffer;
use lectio_np::engine::NarrationEngine;
use lectio_np::playback::{NarrationSink, SessionId};
use lectio_np::synthesis::{HttpSynthesizer, SynthesizedAudio, VoiceSynthesizer};
use lectio_np::{Error, Result, SharedState};

/// Sink that accepts everything without touching an audio device.
struct NullSink;

impl NarrationSink for NullSink {
    fn play(&mut self, _buffer: Arc<NarrationBuffer>, _session_id: SessionId) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) {}
}

/// Test helper to create a router backed by a real engine.
///
/// The synthesizer points at `endpoint`; tests that never reach
/// synthesis can pass an unroutable address.
fn setup_test_server(endpoint: &str) -> (Router, Arc<SharedState>) {
    let state = Arc::new(SharedState::new());
    let synthesizer = Arc::new(HttpSynthesizer::new(
        endpoint.to_string(),
        "test-key".to_string(),
        "Kore".to_string(),
    ));
    let (_completion_tx, completion_rx) = mpsc::unbounded_channel();

    let engine = Arc::new(NarrationEngine::new(
        Arc::clone(&state),
        synthesizer,
        Box::new(NullSink),
        completion_rx,
        "fr".to_string(),
    ));
    engine.start().expect("engine start");

    let app_state = AppState {
        engine,
        state: Arc::clone(&state),
        port: 5750,
    };

    (create_router(app_state), state)
}

/// Make a request against the in-process router.
async fn make_request(
    app: &Router,
    method: &str,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Option<Value>) {
    use axum::body::Body;
    use http::{Method, Request};
    use tower::ServiceExt;

    let method = match method {
        "GET" => Method::GET,
        "POST" => Method::POST,
        "DELETE" => Method::DELETE,
        _ => panic!("Unsupported method"),
    };

    let builder = Request::builder().method(method).uri(path);

    let request = if let Some(json_body) = body {
        builder
            .header("content-type", "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap()
    } else {
        builder.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json_body = if !bytes.is_empty() {
        Some(serde_json::from_slice(&bytes).unwrap())
    } else {
        None
    };

    (status, json_body)
}

// ============================================================================
// Router tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = setup_test_server("http://127.0.0.1:1/synthesize");

    let (status, body) = make_request(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    let body = body.expect("Expected response body");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "lectio-np");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_status_starts_idle() {
    let (app, _) = setup_test_server("http://127.0.0.1:1/synthesize");

    let (status, body) = make_request(&app, "GET", "/api/v1/narration/status", None).await;

    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["state"], "idle");
    assert!(body.get("request_id").is_none());
}

#[tokio::test]
async fn test_narrate_rejects_empty_text() {
    let (app, _) = setup_test_server("http://127.0.0.1:1/synthesize");

    let (status, body) =
        make_request(&app, "POST", "/api/v1/narration", Some(json!({"text": "   "}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.unwrap()["status"]
        .as_str()
        .unwrap()
        .starts_with("error"));
}

#[tokio::test]
async fn test_narrate_accepts_and_reports_request_id() {
    // Unroutable endpoint: the attempt fails fast with a network error
    // after acceptance, which is all this test needs
    let (app, state) = setup_test_server("http://127.0.0.1:1/synthesize");

    let (status, body) = make_request(
        &app,
        "POST",
        "/api/v1/narration",
        Some(json!({"text": "Bonjour", "language": "fr"})),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    let body = body.unwrap();
    assert_eq!(body["status"], "accepted");
    let request_id: Uuid = body["request_id"]
        .as_str()
        .unwrap()
        .parse()
        .expect("request_id is a UUID");
    assert_ne!(request_id, Uuid::nil());

    // The failed attempt folds back to idle
    for _ in 0..50 {
        if state.narration_state().await == lectio_common::events::NarrationState::Idle {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("narration never returned to idle after network failure");
}

#[tokio::test]
async fn test_stop_is_ok_when_idle() {
    let (app, _) = setup_test_server("http://127.0.0.1:1/synthesize");

    let (status, body) = make_request(&app, "DELETE", "/api/v1/narration", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["status"], "ok");

    let (status, body) = make_request(&app, "GET", "/api/v1/narration/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap()["state"], "idle");
}

// ============================================================================
// Synthesis client against a stub service
// ============================================================================

/// Spawn a one-route stub synthesis service, returning its base URL.
async fn spawn_stub(response_status: StatusCode, response_body: Value) -> String {
    let app = Router::new().route(
        "/synthesize",
        post(move || async move { (response_status, Json(response_body.clone())) }),
    );

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    format!("http://{}/synthesize", addr)
}

#[tokio::test]
async fn test_synthesizer_decodes_valid_response() {
    let pcm = vec![0u8, 0, 255, 127];
    let encoded = base64::engine::general_purpose::STANDARD.encode(&pcm);
    let endpoint = spawn_stub(
        StatusCode::OK,
        json!({
            "audio_data": encoded,
            "sample_rate": 24000,
            "channel_count": 1,
        }),
    )
    .await;

    let synth = HttpSynthesizer::new(endpoint, "key".to_string(), "Kore".to_string());
    let audio: SynthesizedAudio = synth.synthesize("Bonjour", "fr").await.unwrap();

    assert_eq!(audio.pcm, pcm);
    assert_eq!(audio.sample_rate, 24000);
    assert_eq!(audio.channel_count, 1);
}

#[tokio::test]
async fn test_synthesizer_maps_unauthorized_to_auth_error() {
    let endpoint = spawn_stub(StatusCode::UNAUTHORIZED, json!({"error": "bad key"})).await;

    let synth = HttpSynthesizer::new(endpoint, "bad-key".to_string(), "Kore".to_string());
    let err = synth.synthesize("Bonjour", "fr").await.unwrap_err();

    assert!(matches!(err, Error::Auth(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_synthesizer_maps_missing_audio_to_empty_payload() {
    let endpoint = spawn_stub(StatusCode::OK, json!({})).await;

    let synth = HttpSynthesizer::new(endpoint, "key".to_string(), "Kore".to_string());
    let err = synth.synthesize("Bonjour", "fr").await.unwrap_err();

    assert!(matches!(err, Error::EmptyPayload(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_synthesizer_maps_server_error_to_network() {
    let endpoint = spawn_stub(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": "overloaded"}),
    )
    .await;

    let synth = HttpSynthesizer::new(endpoint, "key".to_string(), "Kore".to_string());
    let err = synth.synthesize("Bonjour", "fr").await.unwrap_err();

    assert!(matches!(err, Error::Network(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_synthesizer_maps_refused_connection_to_network() {
    let synth = HttpSynthesizer::new(
        "http://127.0.0.1:1/synthesize".to_string(),
        "key".to_string(),
        "Kore".to_string(),
    );
    let err = synth.synthesize("Bonjour", "fr").await.unwrap_err();

    assert!(matches!(err, Error::Network(_)), "got {:?}", err);
}
