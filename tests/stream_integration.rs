//! Streaming relay scenarios, at the session level and over HTTP.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};

use quiz_viewer::AppState;
use quiz_viewer::config::{AppConfig, ServerConfig, UpstreamConfig};
use quiz_viewer::protocol::scripted::ScriptedConnector;
use quiz_viewer::protocol::{GameConnector, ProtocolEvent};
use quiz_viewer::quiz::QuizFetcher;
use quiz_viewer::relay::{EventSink, RelayOptions, run_session};
use quiz_viewer::server::build_router;
use quiz_viewer::session::SessionRegistry;

fn quiz_start_with_first_block() -> ProtocolEvent {
    ProtocolEvent::QuizStart {
        quiz: json!({
            "name": "Geography",
            "firstGameBlockData": {
                "gameBlockIndex": 0,
                "title": "Capital of France?",
                "choices": [
                    {"answer": "Paris"},
                    {"answer": "Lyon"},
                    {"answer": "Lille"},
                    {"answer": "Nice"}
                ]
            }
        }),
    }
}

/// Split a raw SSE body into (event name, data JSON) pairs.
fn parse_frames(body: &str) -> Vec<(String, Value)> {
    body.split("\n\n")
        .filter(|frame| !frame.trim().is_empty())
        .map(|frame| {
            let mut name = String::new();
            let mut data = Value::Null;
            for line in frame.lines() {
                if let Some(rest) = line.strip_prefix("event: ") {
                    name = rest.to_string();
                } else if let Some(rest) = line.strip_prefix("data: ") {
                    data = serde_json::from_str(rest).unwrap_or(Value::Null);
                }
            }
            (name, data)
        })
        .collect()
}

async fn run_scripted_session(
    script: Vec<(Duration, ProtocolEvent)>,
) -> (EventSink, Vec<(String, Value)>) {
    let connector = ScriptedConnector::new(script);
    let handle = connector.connect("123456", "Alice").await.unwrap();
    let session = SessionRegistry::new().create("123456", "Alice");
    let (sink, mut rx) = EventSink::channel();

    run_session(
        session,
        handle,
        sink.clone(),
        Arc::new(QuizFetcher::new("http://127.0.0.1:1/rest/kahoots")),
        RelayOptions {
            joined_fallback: Duration::from_secs(60),
            ..RelayOptions::default()
        },
    )
    .await;

    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.extend(parse_frames(&frame));
    }
    (sink, frames)
}

#[tokio::test]
async fn test_first_question_comes_from_quiz_start_block() {
    let (_sink, frames) = run_scripted_session(vec![
        (Duration::from_millis(1), quiz_start_with_first_block()),
        (
            Duration::from_millis(10),
            ProtocolEvent::Disconnect {
                reason: json!("done"),
            },
        ),
    ])
    .await;

    let question = frames
        .iter()
        .find(|(name, _)| name == "question")
        .map(|(_, data)| data)
        .expect("no question event emitted");

    assert_eq!(question["questionIndex"], 0);
    assert_eq!(question["answers"].as_array().unwrap().len(), 4);
    assert_eq!(question["answers"][0]["text"], "Paris");
}

#[tokio::test]
async fn test_question_event_always_yields_nonempty_answers() {
    let (_sink, frames) = run_scripted_session(vec![
        (
            Duration::from_millis(1),
            ProtocolEvent::QuestionStart {
                payload: json!({"gameBlockIndex": 2}),
            },
        ),
        (Duration::from_millis(10), ProtocolEvent::QuizEnd),
    ])
    .await;

    let questions: Vec<_> = frames
        .iter()
        .filter(|(name, _)| name == "question")
        .collect();
    assert_eq!(questions.len(), 1);

    let data = &questions[0].1;
    assert!(!data["answers"].as_array().unwrap().is_empty());
    assert_eq!(data["question"], "Question 3 - data not available");
}

#[tokio::test]
async fn test_disconnect_closes_stream_and_later_emits_are_noops() {
    let (sink, frames) = run_scripted_session(vec![(
        Duration::from_millis(1),
        ProtocolEvent::Disconnect {
            reason: json!("host ended the game"),
        },
    )])
    .await;

    let disconnect = frames
        .iter()
        .find(|(name, _)| name == "disconnect")
        .map(|(_, data)| data)
        .expect("no disconnect event emitted");
    assert_eq!(disconnect["reason"], "host ended the game");

    assert!(sink.is_closed());
    assert!(!sink.emit(&quiz_viewer::events::RelayEvent::joined()));
}

#[tokio::test]
async fn test_stored_records_win_over_later_question_events() {
    let (_sink, frames) = run_scripted_session(vec![
        (Duration::from_millis(1), quiz_start_with_first_block()),
        (
            Duration::from_millis(10),
            ProtocolEvent::QuestionReady {
                payload: json!({"gameBlockIndex": 0}),
            },
        ),
        (Duration::from_millis(20), ProtocolEvent::QuizEnd),
    ])
    .await;

    let questions: Vec<_> = frames
        .iter()
        .filter(|(name, _)| name == "question")
        .collect();
    // One from quiz start, one from the question event, both with the
    // stored block data rather than a placeholder.
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[1].1["answers"].as_array().unwrap().len(), 4);
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP level
// ─────────────────────────────────────────────────────────────────────────────

fn streaming_app(connector: Arc<dyn GameConnector>, sessions: SessionRegistry) -> Router {
    let config = AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        upstream: UpstreamConfig {
            content_api_base: "http://127.0.0.1:1/rest/kahoots".to_string(),
            gateway_url: "ws://127.0.0.1:1/session".to_string(),
            join_timeout_secs: 15,
            joined_fallback_ms: 50,
        },
    };

    build_router(AppState {
        connector,
        quiz: Arc::new(QuizFetcher::new("http://127.0.0.1:1/rest/kahoots")),
        sessions,
        config: Arc::new(config),
    })
}

#[tokio::test]
async fn test_stream_requires_pin_and_name() {
    let server = TestServer::new(streaming_app(
        Arc::new(ScriptedConnector::silent()),
        SessionRegistry::new(),
    ))
    .unwrap();

    let response = server.get("/api/game/stream").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_text("PIN and name are required");
}

#[tokio::test]
async fn test_stream_full_session_over_http() {
    let connector = Arc::new(ScriptedConnector::new(vec![
        (Duration::from_millis(5), ProtocolEvent::Joined),
        (Duration::from_millis(10), quiz_start_with_first_block()),
        (
            Duration::from_millis(20),
            ProtocolEvent::Disconnect {
                reason: json!("host ended the game"),
            },
        ),
    ]));
    let sessions = SessionRegistry::new();
    let server =
        TestServer::new(streaming_app(connector, sessions.clone())).unwrap();

    let response = server
        .get("/api/game/stream")
        .add_query_param("pin", "123456")
        .add_query_param("name", "Alice")
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.header("content-type"),
        "text/event-stream".parse::<axum::http::HeaderValue>().unwrap()
    );

    let frames = parse_frames(&response.text());
    let names: Vec<_> = frames.iter().map(|(name, _)| name.as_str()).collect();

    assert_eq!(names[0], "connected");
    assert!(names.contains(&"joined"));
    assert!(names.contains(&"quizStart"));
    assert!(names.contains(&"question"));
    assert_eq!(*names.last().unwrap(), "disconnect");

    // The registry entry goes away once the session tears down.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(sessions.is_empty());
}
