//! Game protocol seam.
//!
//! The real-time game protocol itself is an external collaborator: this
//! crate never implements its handshake or wire mechanics. What lives here
//! is the boundary the relay consumes: a fixed set of named events, a
//! connector trait, and a cancellable handle around one live connection.
//!
//! The upstream event and field names are a pinned compatibility surface.
//! Payloads are carried as raw [`serde_json::Value`] and probed defensively
//! downstream, because the exact upstream contract is not documented from
//! this repository alone.
//!
//! # Implementations
//!
//! - [`gateway::GatewayConnector`]: WebSocket connection to the external
//!   protocol bridge.
//! - [`scripted::ScriptedConnector`]: replays a timed event script, for
//!   tests and local demos.

pub mod gateway;
pub mod scripted;

use std::fmt;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Events fired by the game protocol, by their pinned upstream names.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolEvent {
    /// The game accepted the player. Covers both the `Joined` and `ready`
    /// classes of upstream confirmation.
    Joined,
    /// The quiz started; carries the upstream quiz metadata.
    QuizStart {
        /// Quiz metadata as sent by the protocol.
        quiz: Value,
    },
    /// Early question data, fired before the question opens.
    QuestionReady {
        /// Raw question payload.
        payload: Value,
    },
    /// The question opened for answers.
    QuestionStart {
        /// Raw question payload.
        payload: Value,
    },
    /// The question closed.
    QuestionEnd {
        /// Raw result payload.
        payload: Value,
    },
    /// The quiz ended.
    QuizEnd,
    /// The connection ended, with an upstream reason.
    Disconnect {
        /// Raw reason payload.
        reason: Value,
    },
}

impl ProtocolEvent {
    /// Short event name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Joined => "Joined",
            Self::QuizStart { .. } => "QuizStart",
            Self::QuestionReady { .. } => "QuestionReady",
            Self::QuestionStart { .. } => "QuestionStart",
            Self::QuestionEnd { .. } => "QuestionEnd",
            Self::QuizEnd => "QuizEnd",
            Self::Disconnect { .. } => "Disconnect",
        }
    }
}

/// Decode one JSON frame from the protocol bridge into a [`ProtocolEvent`].
///
/// Frames carry the event name under `event` (or `type`) and the payload
/// under `data`. The name match is case-insensitive and unknown events
/// decode to `None` rather than an error.
#[must_use]
pub fn decode_frame(text: &str) -> Option<ProtocolEvent> {
    let frame: Value = serde_json::from_str(text).ok()?;
    let name = frame
        .get("event")
        .or_else(|| frame.get("type"))
        .and_then(Value::as_str)?;
    let data = frame.get("data").cloned().unwrap_or(Value::Null);

    match name.to_ascii_lowercase().as_str() {
        "joined" | "ready" => Some(ProtocolEvent::Joined),
        "quizstart" => Some(ProtocolEvent::QuizStart { quiz: data }),
        "questionready" => Some(ProtocolEvent::QuestionReady { payload: data }),
        "questionstart" => Some(ProtocolEvent::QuestionStart { payload: data }),
        "questionend" => Some(ProtocolEvent::QuestionEnd { payload: data }),
        "quizend" => Some(ProtocolEvent::QuizEnd),
        "disconnect" => {
            let reason = data.get("reason").cloned().unwrap_or(data);
            Some(ProtocolEvent::Disconnect { reason })
        }
        _ => None,
    }
}

/// Errors from establishing or holding a protocol connection.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The gateway could not be reached or the join could not be sent.
    #[error("failed to reach game gateway: {0}")]
    Connect(String),

    /// The game refused the join.
    #[error("game rejected the join: {0}")]
    Rejected(String),

    /// No join confirmation arrived within the configured bound.
    #[error("no join confirmation within the connect timeout")]
    ConnectTimeout,

    /// The connection closed before a join confirmation.
    #[error("connection closed")]
    Closed,
}

/// Handle on one live protocol connection.
///
/// Owns the event receiver and the cancellation token tearing the
/// connection down. Teardown is idempotent: [`GameHandle::leave`] may be
/// called any number of times, and dropping the handle leaves as well.
#[derive(Debug)]
pub struct GameHandle {
    events: mpsc::Receiver<ProtocolEvent>,
    cancel: CancellationToken,
}

impl GameHandle {
    /// Wrap a connection's event channel and cancellation token.
    #[must_use]
    pub fn new(events: mpsc::Receiver<ProtocolEvent>, cancel: CancellationToken) -> Self {
        Self { events, cancel }
    }

    /// Receive the next protocol event, or `None` once the connection's
    /// event channel has closed.
    pub async fn next_event(&mut self) -> Option<ProtocolEvent> {
        self.events.recv().await
    }

    /// Tear the connection down. Safe to call repeatedly.
    pub fn leave(&self) {
        self.cancel.cancel();
    }
}

impl Drop for GameHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Connection factory for the game protocol.
///
/// The seam between the relay and the external protocol: production wires
/// in [`gateway::GatewayConnector`], tests inject scripted fakes.
#[async_trait::async_trait]
pub trait GameConnector: Send + Sync + fmt::Debug {
    /// Join the game `pin` as `name` and return a handle on the live
    /// connection.
    async fn connect(&self, pin: &str, name: &str) -> Result<GameHandle, ProtocolError>;
}

/// Observer hook wrapping protocol event delivery.
///
/// Instrumentation is decoupled from event registration: the relay invokes
/// the observer once per received event before handling it.
pub trait EventObserver: Send + Sync + fmt::Debug {
    /// Called for every protocol event received on `session`.
    fn on_event(&self, session: &str, event: &ProtocolEvent);
}

/// Default observer logging each event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl EventObserver for TracingObserver {
    fn on_event(&self, session: &str, event: &ProtocolEvent) {
        tracing::debug!(
            name: "protocol.event",
            session = %session,
            event = %event.name(),
            "Protocol event received"
        );
    }
}
