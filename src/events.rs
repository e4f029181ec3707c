//! Normalized outbound events for the game-session relay.
//!
//! This module defines the fixed set of events the relay republishes to the
//! browser over Server-Sent Events, together with the SSE frame formatting.
//! Event names and payload shapes are part of the client contract: the page
//! script registers one `EventSource` listener per name.
//!
//! # Example
//!
//! ```rust
//! use quiz_viewer::events::{RelayEvent, sse_event};
//!
//! let event = RelayEvent::connected();
//! let sse = sse_event(&event);
//! assert!(sse.starts_with("event: connected\n"));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::quiz::QuestionRecord;

/// Events emitted by the relay toward the browser.
///
/// The wire payload is the bare `data` of each variant; the variant name
/// becomes the SSE `event:` line (see [`sse_event`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum RelayEvent {
    /// Session start acknowledgement, sent before the protocol join settles.
    #[serde(rename = "connected")]
    Connected {
        /// Static status message.
        message: String,
    },

    /// The game accepted the player (or the fallback notice fired).
    #[serde(rename = "joined")]
    Joined {
        /// Static status message.
        message: String,
    },

    /// The quiz started; echoes the upstream quiz metadata.
    #[serde(rename = "quizStart")]
    QuizStart {
        /// Upstream quiz metadata, passed through untouched.
        quiz: Value,
    },

    /// A normalized question record. A new record fully replaces the
    /// previous one client-side.
    #[serde(rename = "question")]
    Question(QuestionRecord),

    /// The current question ended; upstream result passthrough.
    #[serde(rename = "questionEnd")]
    QuestionEnd(Value),

    /// The quiz ended; the stream closes after this event.
    #[serde(rename = "finish")]
    Finish {
        /// Static status message.
        message: String,
    },

    /// The protocol connection ended; the stream closes after this event.
    #[serde(rename = "disconnect")]
    Disconnect {
        /// Upstream disconnect reason, passed through.
        reason: Value,
    },

    /// Joining the game failed.
    #[serde(rename = "error")]
    Error {
        /// Static status message.
        message: String,
    },
}

impl RelayEvent {
    /// Initial acknowledgement for a freshly opened stream.
    #[must_use]
    pub fn connected() -> Self {
        Self::Connected {
            message: "Connecting to game...".to_string(),
        }
    }

    /// Join confirmation driven by a protocol joined-class event.
    #[must_use]
    pub fn joined() -> Self {
        Self::Joined {
            message: "Successfully joined the game!".to_string(),
        }
    }

    /// Join notice from the fallback timer, when no joined-class event has
    /// fired yet.
    #[must_use]
    pub fn joined_fallback() -> Self {
        Self::Joined {
            message: "Connected! Waiting for questions...".to_string(),
        }
    }

    /// Quiz-end notice.
    #[must_use]
    pub fn finish() -> Self {
        Self::Finish {
            message: "Quiz has ended!".to_string(),
        }
    }

    /// Disconnect with an upstream reason payload.
    #[must_use]
    pub fn disconnect(reason: Value) -> Self {
        Self::Disconnect { reason }
    }

    /// Join failure notice.
    #[must_use]
    pub fn join_failed() -> Self {
        Self::Error {
            message: "Failed to join game".to_string(),
        }
    }

    /// The bare `data` payload for the SSE frame.
    #[must_use]
    pub fn payload(&self) -> Value {
        match self {
            Self::Connected { message }
            | Self::Joined { message }
            | Self::Finish { message }
            | Self::Error { message } => serde_json::json!({ "message": message }),
            Self::QuizStart { quiz } => serde_json::json!({ "quiz": quiz }),
            Self::Question(record) => {
                serde_json::to_value(record).unwrap_or_else(|_| Value::Null)
            }
            Self::QuestionEnd(result) => result.clone(),
            Self::Disconnect { reason } => serde_json::json!({ "reason": reason }),
        }
    }
}

/// Get the SSE event name for a [`RelayEvent`].
#[must_use]
pub fn event_name(evt: &RelayEvent) -> &'static str {
    match evt {
        RelayEvent::Connected { .. } => "connected",
        RelayEvent::Joined { .. } => "joined",
        RelayEvent::QuizStart { .. } => "quizStart",
        RelayEvent::Question(_) => "question",
        RelayEvent::QuestionEnd(_) => "questionEnd",
        RelayEvent::Finish { .. } => "finish",
        RelayEvent::Disconnect { .. } => "disconnect",
        RelayEvent::Error { .. } => "error",
    }
}

/// Convert a [`RelayEvent`] to an SSE-formatted frame.
///
/// The output follows the Server-Sent Events specification with an `event:`
/// line (for `EventSource` listeners) and a `data:` line containing the
/// JSON payload.
#[must_use]
pub fn sse_event(evt: &RelayEvent) -> String {
    let json = serde_json::to_string(&evt.payload()).unwrap_or_else(|e| {
        serde_json::json!({ "message": e.to_string() }).to_string()
    });

    format!("event: {}\ndata: {json}\n\n", event_name(evt))
}
