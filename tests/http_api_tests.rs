// Integration tests for the HTTP control API

mod support;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sula_assistant::audio::UnavailableMicrophone;
use sula_assistant::{create_router, AppState, AssistantSession};
use support::{eventually, last_content, session_with, test_config, StubAnswers, StubTranscriber};
use tower::ServiceExt;

fn app() -> (Router, AssistantSession) {
    let session = session_with(
        StubAnswers::answering(json!({"BK9": "Refer friends."})),
        StubTranscriber::returning(json!({})),
        None,
        Arc::new(UnavailableMicrophone),
    );
    (create_router(AppState::new(session.clone())), session)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_timeline_starts_with_greeting() {
    let (app, _) = app();

    let (status, body) = call(&app, "GET", "/chat/timeline", None).await;

    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), test_config().messages.greeting.len());
    assert_eq!(entries[0]["origin"], "assistant");
}

#[tokio::test]
async fn test_send_dispatches_in_background() {
    let (app, session) = app();

    let (status, body) = call(&app, "POST", "/chat/send", Some(json!({"text": "How to earn coins?"}))).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "accepted");
    assert!(eventually(|| last_content(&session.timeline()) == "Refer friends.").await);

    let (_, history) = call(&app, "GET", "/chat/history", None).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["origin"], "user");
    assert_eq!(history[0]["content"], "How to earn coins?");
}

#[tokio::test]
async fn test_send_blank_rejected() {
    let (app, session) = app();
    let before = session.timeline().len();

    let (status, body) = call(&app, "POST", "/chat/send", Some(json!({"text": "   "}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(session.timeline().len(), before);
}

#[tokio::test]
async fn test_presets() {
    let (app, session) = app();

    let (status, body) = call(&app, "GET", "/chat/presets", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), session.presets().len());

    let (status, _) = call(&app, "POST", "/chat/presets/3", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(eventually(|| last_content(&session.timeline()) == "Refer friends.").await);

    let (status, _) = call(&app, "POST", "/chat/presets/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clear() {
    let (app, _) = app();

    let (status, body) = call(&app, "POST", "/chat/clear", None).await;

    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["content"], test_config().messages.cleared);
}

#[tokio::test]
async fn test_mode_endpoints() {
    let (app, session) = app();

    let (_, body) = call(&app, "GET", "/mode", None).await;
    assert_eq!(body["mode"], "assistant");

    let (_, body) = call(&app, "POST", "/mode/cycle", None).await;
    assert_eq!(body["mode"], "creative");

    let (status, body) = call(&app, "PUT", "/mode", Some(json!({"mode": "precise"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "precise");
    assert_eq!(session.mode(), sula_assistant::Mode::Precise);

    let (status, _) = call(&app, "PUT", "/mode", Some(json!({"mode": "loud"}))).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_status() {
    let (app, _) = app();

    let (status, body) = call(&app, "GET", "/chat/status", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "assistant");
    assert_eq!(body["dispatch_in_flight"], false);
    assert_eq!(body["recognition_supported"], false);
}

#[tokio::test]
async fn test_voice_toggles_on_headless_host() {
    let (app, session) = app();

    let (status, body) = call(&app, "POST", "/voice/listen/toggle", None).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body["status"], "unsupported");

    let (status, body) = call(&app, "POST", "/voice/record/toggle", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], test_config().messages.microphone_unavailable);
    assert_eq!(
        last_content(&session.timeline()),
        test_config().messages.microphone_unavailable
    );
}

#[tokio::test]
async fn test_open_widget() {
    let (app, _) = app();

    let (status, _) = call(&app, "POST", "/widget/open", None).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_preset_rejected_while_query_in_flight() {
    let gate = Arc::new(tokio::sync::Notify::new());
    let answers = StubAnswers::gated(Arc::clone(&gate));
    let session = session_with(
        answers.clone(),
        StubTranscriber::returning(json!({})),
        None,
        Arc::new(UnavailableMicrophone),
    );
    let app = create_router(AppState::new(session.clone()));

    let (status, _) = call(&app, "POST", "/chat/send", Some(json!({"text": "first"}))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(eventually(|| session.stats().dispatch_in_flight).await);

    let (status, _) = call(&app, "POST", "/chat/presets/0", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(answers.prompts().len(), 1);

    gate.notify_one();
    assert!(eventually(|| !session.stats().dispatch_in_flight).await);
}
