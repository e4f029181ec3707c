//! HTTP surface: router, handlers, and the SSE response plumbing.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::{Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::config::AppConfig;
use crate::events::RelayEvent;
use crate::pages::index_handler;
use crate::protocol::gateway::GatewayConnector;
use crate::protocol::{GameConnector, ProtocolError, ProtocolEvent};
use crate::quiz::QuizFetcher;
use crate::relay::{EventSink, RelayOptions, run_session};
use crate::session::SessionRegistry;

/// Start the server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let connector: Arc<dyn GameConnector> =
        Arc::new(GatewayConnector::new(config.upstream.gateway_url.clone()));

    let state = AppState {
        connector,
        quiz: Arc::new(QuizFetcher::new(config.upstream.content_api_base.clone())),
        sessions: SessionRegistry::new(),
        config: Arc::clone(&config),
    };

    let app = build_router(state);

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        name: "server.started",
        address = %address,
        "Server started"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the application router over the given state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // API routes
        .route("/api/game/connect", post(api_connect))
        .route("/api/game/quiz", get(api_quiz))
        .route("/api/game/stream", get(api_stream))
        // HTML pages
        .route("/", get(index_handler))
        // Static assets
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// One-shot join
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for the one-shot join.
#[derive(Debug, Deserialize)]
struct ConnectRequest {
    #[serde(default)]
    pin: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// Success response for the one-shot join.
#[derive(Debug, Serialize)]
struct ConnectResponse {
    message: String,
    pin: String,
}

/// Short user-facing error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_body(message: &str) -> Json<ErrorBody> {
    Json(ErrorBody {
        error: message.to_string(),
    })
}

/// POST /api/game/connect - probe that a game accepts this pin/name.
async fn api_connect(
    State(state): State<AppState>,
    Json(req): Json<ConnectRequest>,
) -> Result<Json<ConnectResponse>, (StatusCode, Json<ErrorBody>)> {
    let Some(pin) = req.pin.filter(|p| !p.is_empty()) else {
        return Err((StatusCode::BAD_REQUEST, error_body("PIN is required")));
    };
    let Some(name) = req.name.filter(|n| !n.is_empty()) else {
        return Err((StatusCode::BAD_REQUEST, error_body("Name is required")));
    };

    info!(
        name: "game.connect.requested",
        pin = %pin,
        player = %name,
        "One-shot join requested"
    );

    let bound = Duration::from_secs(state.config.upstream.join_timeout_secs);
    match tokio::time::timeout(bound, join_once(&*state.connector, &pin, &name)).await {
        Ok(Ok(())) => Ok(Json(ConnectResponse {
            message: "Successfully connected to the game!".to_string(),
            pin,
        })),
        Ok(Err(error)) => {
            tracing::error!(
                name: "game.connect.failed",
                pin = %pin,
                error = %error,
                "One-shot join failed"
            );
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("Failed to connect"),
            ))
        }
        Err(_) => Err((
            StatusCode::REQUEST_TIMEOUT,
            error_body("Connection timeout - invalid PIN or game not found"),
        )),
    }
}

/// Join and wait for a joined-class confirmation, then leave again.
async fn join_once(
    connector: &dyn GameConnector,
    pin: &str,
    name: &str,
) -> Result<(), ProtocolError> {
    let mut handle = connector.connect(pin, name).await?;
    loop {
        match handle.next_event().await {
            Some(ProtocolEvent::Joined) => {
                handle.leave();
                return Ok(());
            }
            Some(ProtocolEvent::Disconnect { reason }) => {
                handle.leave();
                return Err(ProtocolError::Rejected(
                    reason.as_str().unwrap_or("disconnected").to_string(),
                ));
            }
            // Quiz traffic before the join confirmation: keep waiting.
            Some(_) => {}
            None => return Err(ProtocolError::Closed),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Quiz content
// ─────────────────────────────────────────────────────────────────────────────

/// Query parameters for the quiz-content endpoint.
#[derive(Debug, Deserialize)]
struct QuizQuery {
    #[serde(rename = "quizId", default)]
    quiz_id: Option<String>,
}

/// GET /api/game/quiz - fetch and normalize a quiz's question list.
async fn api_quiz(
    State(state): State<AppState>,
    Query(query): Query<QuizQuery>,
) -> Result<Json<crate::quiz::QuizContent>, (StatusCode, Json<ErrorBody>)> {
    let Some(quiz_id) = query.quiz_id.filter(|id| !id.is_empty()) else {
        return Err((StatusCode::BAD_REQUEST, error_body("Quiz ID is required")));
    };

    match state.quiz.fetch(&quiz_id).await {
        Ok(content) => Ok(Json(content)),
        Err(error) => {
            tracing::error!(
                name: "quiz.fetch.failed",
                quiz_id = %quiz_id,
                error = %error,
                "Quiz fetch failed"
            );
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body("Failed to fetch quiz data"),
            ))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Streaming join
// ─────────────────────────────────────────────────────────────────────────────

/// Query parameters for the streaming endpoint.
#[derive(Debug, Deserialize)]
struct StreamQuery {
    #[serde(default)]
    pin: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

/// GET /api/game/stream - SSE stream of one relay session.
async fn api_stream(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Response {
    let (Some(pin), Some(name)) = (
        query.pin.filter(|p| !p.is_empty()),
        query.name.filter(|n| !n.is_empty()),
    ) else {
        return (StatusCode::BAD_REQUEST, "PIN and name are required").into_response();
    };

    let session = state.sessions.create(&pin, &name);
    let session_id = session.id().to_string();

    info!(
        name: "game.stream.opened",
        session = %session_id,
        pin = %pin,
        player = %name,
        "Streaming session opened"
    );

    let (sink, mut rx) = EventSink::channel();

    let connector = Arc::clone(&state.connector);
    let fetcher = Arc::clone(&state.quiz);
    let sessions = state.sessions.clone();
    let options = RelayOptions {
        joined_fallback: Duration::from_millis(state.config.upstream.joined_fallback_ms),
        ..RelayOptions::default()
    };

    tokio::spawn(async move {
        sink.emit(&RelayEvent::connected());

        match connector.connect(&pin, &name).await {
            Ok(handle) => {
                run_session(session, handle, sink, fetcher, options).await;
            }
            Err(error) => {
                tracing::warn!(
                    name: "game.stream.join_failed",
                    session = %session.id(),
                    error = %error,
                    "Streaming join failed"
                );
                sink.emit(&RelayEvent::join_failed());
                sink.close();
            }
        }

        sessions.remove(&session_id);
    });

    let stream = async_stream::stream! {
        while let Some(frame) = rx.recv().await {
            yield Ok::<String, Infallible>(frame);
        }
    };

    sse_response(Body::from_stream(stream))
}

/// Wrap a body in the SSE response headers.
fn sse_response(body: Body) -> Response {
    let mut resp = Response::new(body);
    let headers = resp.headers_mut();
    headers.insert("Content-Type", HeaderValue::from_static("text/event-stream"));
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));
    headers.insert("X-Accel-Buffering", HeaderValue::from_static("no"));
    resp
}
