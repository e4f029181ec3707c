//! Endpoint tests for the one-shot join and quiz-content routes.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use axum_test::TestServer;
use serde_json::{Value, json};

use quiz_viewer::AppState;
use quiz_viewer::config::{AppConfig, ServerConfig, UpstreamConfig};
use quiz_viewer::protocol::scripted::{FailingConnector, ScriptedConnector};
use quiz_viewer::protocol::{GameConnector, ProtocolEvent};
use quiz_viewer::quiz::QuizFetcher;
use quiz_viewer::server::build_router;
use quiz_viewer::session::SessionRegistry;

fn test_config(join_timeout_secs: u64) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        upstream: UpstreamConfig {
            content_api_base: "http://127.0.0.1:1/rest/kahoots".to_string(),
            gateway_url: "ws://127.0.0.1:1/session".to_string(),
            join_timeout_secs,
            joined_fallback_ms: 2000,
        },
    }
}

fn app(
    connector: Arc<dyn GameConnector>,
    content_api_base: &str,
    join_timeout_secs: u64,
) -> Router {
    let mut config = test_config(join_timeout_secs);
    config.upstream.content_api_base = content_api_base.to_string();

    build_router(AppState {
        connector,
        quiz: Arc::new(QuizFetcher::new(content_api_base)),
        sessions: SessionRegistry::new(),
        config: Arc::new(config),
    })
}

fn responsive_connector() -> Arc<dyn GameConnector> {
    Arc::new(ScriptedConnector::new(vec![(
        Duration::from_millis(200),
        ProtocolEvent::Joined,
    )]))
}

#[tokio::test]
async fn test_connect_success() {
    let server = TestServer::new(app(
        responsive_connector(),
        "http://127.0.0.1:1/rest/kahoots",
        15,
    ))
    .unwrap();

    let response = server
        .post("/api/game/connect")
        .json(&json!({"pin": "123456", "name": "Alice"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["pin"], "123456");
    assert!(body["message"].as_str().unwrap().contains("connected"));
}

#[tokio::test]
async fn test_connect_missing_pin() {
    let server = TestServer::new(app(
        responsive_connector(),
        "http://127.0.0.1:1/rest/kahoots",
        15,
    ))
    .unwrap();

    let response = server.post("/api/game/connect").json(&json!({})).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "PIN is required");
}

#[tokio::test]
async fn test_connect_missing_name() {
    let server = TestServer::new(app(
        responsive_connector(),
        "http://127.0.0.1:1/rest/kahoots",
        15,
    ))
    .unwrap();

    let response = server
        .post("/api/game/connect")
        .json(&json!({"pin": "123456"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Name is required");
}

#[tokio::test]
async fn test_connect_timeout_when_game_never_confirms() {
    let server = TestServer::new(app(
        Arc::new(ScriptedConnector::silent()),
        "http://127.0.0.1:1/rest/kahoots",
        1,
    ))
    .unwrap();

    let response = server
        .post("/api/game/connect")
        .json(&json!({"pin": "999999", "name": "Alice"}))
        .await;

    response.assert_status(StatusCode::REQUEST_TIMEOUT);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("timeout"));
}

#[tokio::test]
async fn test_connect_failure_is_500() {
    let server = TestServer::new(app(
        Arc::new(FailingConnector),
        "http://127.0.0.1:1/rest/kahoots",
        15,
    ))
    .unwrap();

    let response = server
        .post("/api/game/connect")
        .json(&json!({"pin": "123456", "name": "Alice"}))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_quiz_missing_id() {
    let server = TestServer::new(app(
        responsive_connector(),
        "http://127.0.0.1:1/rest/kahoots",
        15,
    ))
    .unwrap();

    let response = server.get("/api/game/quiz").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Quiz ID is required");
}

/// Stand up a local stub content API on an ephemeral port.
async fn spawn_stub_content_api() -> String {
    async fn stub_quiz(Path(_id): Path<String>) -> Json<Value> {
        Json(json!({
            "questions": [
                {
                    "question": "Capital of France?",
                    "choices": [
                        {"answer": "Paris", "correct": true},
                        {"answer": "Lyon", "correct": false}
                    ],
                    "time": 20000
                },
                {
                    "question": "2 + 2?",
                    "choices": [{"answer": "4", "correct": true}]
                }
            ]
        }))
    }

    let stub = Router::new().route("/rest/kahoots/{id}", get(stub_quiz));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, stub).await.unwrap();
    });
    format!("http://{address}/rest/kahoots")
}

#[tokio::test]
async fn test_quiz_fetch_success() {
    let base = spawn_stub_content_api().await;
    let server = TestServer::new(app(responsive_connector(), &base, 15)).unwrap();

    let response = server
        .get("/api/game/quiz")
        .add_query_param("quizId", "abc-123")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0]["questionIndex"], 0);
    assert_eq!(questions[0]["answers"][0]["correct"], true);
    assert_eq!(questions[1]["question"], "2 + 2?");
}

#[tokio::test]
async fn test_quiz_fetch_upstream_error_is_500() {
    let base = spawn_stub_content_api().await;
    // Wrong path prefix: the stub answers 404 and the endpoint maps it.
    let bad_base = base.replace("/rest/kahoots", "/rest/nothing");
    let server = TestServer::new(app(responsive_connector(), &bad_base, 15)).unwrap();

    let response = server
        .get("/api/game/quiz")
        .add_query_param("quizId", "abc-123")
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "Failed to fetch quiz data");
}
