//! Per-session relay loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use crate::events::RelayEvent;
use crate::protocol::{EventObserver, GameHandle, ProtocolEvent, TracingObserver};
use crate::quiz::{QuestionRecord, QuizFetcher};
use crate::session::Session;

use super::derive::{derive_question, has_choices};
use super::sink::EventSink;

/// Tunables for one relay session.
#[derive(Debug, Clone)]
pub struct RelayOptions {
    /// How long to wait for a joined-class event before sending the
    /// fallback notice.
    pub joined_fallback: Duration,
    /// Observer invoked for every received protocol event.
    pub observer: Arc<dyn EventObserver>,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            joined_fallback: Duration::from_secs(2),
            observer: Arc::new(TracingObserver),
        }
    }
}

/// Drive one game session until a terminal event or browser abort.
///
/// Consumes protocol events from `handle`, normalizes them, and emits SSE
/// frames through `sink`. On return the sink is closed and the protocol
/// connection torn down; both operations are idempotent, so racing with a
/// browser abort is harmless.
pub async fn run_session(
    session: Session,
    mut handle: GameHandle,
    sink: EventSink,
    fetcher: Arc<QuizFetcher>,
    options: RelayOptions,
) {
    let session_id = session.id().to_string();
    let mut joined_sent = false;
    let mut stored: HashMap<u32, QuestionRecord> = HashMap::new();

    let fallback = tokio::time::sleep(options.joined_fallback);
    tokio::pin!(fallback);

    loop {
        tokio::select! {
            () = &mut fallback, if !joined_sent => {
                joined_sent = true;
                sink.emit(&RelayEvent::joined_fallback());
            }
            () = sink.receiver_gone() => {
                tracing::debug!(
                    name: "relay.client.aborted",
                    session = %session_id,
                    "Browser went away, tearing session down"
                );
                break;
            }
            event = handle.next_event() => {
                let Some(event) = event else {
                    // Upstream channel closed without a disconnect frame.
                    sink.emit(&RelayEvent::disconnect(json!("connection closed")));
                    break;
                };

                options.observer.on_event(&session_id, &event);

                match event {
                    ProtocolEvent::Joined => {
                        if !joined_sent {
                            joined_sent = true;
                            sink.emit(&RelayEvent::joined());
                        }
                    }
                    ProtocolEvent::QuizStart { quiz } => {
                        sink.emit(&RelayEvent::QuizStart { quiz: quiz.clone() });
                        handle_quiz_start(&quiz, &mut stored, &sink, &fetcher, &session_id)
                            .await;
                    }
                    ProtocolEvent::QuestionReady { payload }
                    | ProtocolEvent::QuestionStart { payload } => {
                        sink.emit(&RelayEvent::Question(derive_question(&stored, &payload)));
                    }
                    ProtocolEvent::QuestionEnd { payload } => {
                        sink.emit(&RelayEvent::QuestionEnd(payload));
                    }
                    ProtocolEvent::QuizEnd => {
                        sink.emit(&RelayEvent::finish());
                        break;
                    }
                    ProtocolEvent::Disconnect { reason } => {
                        sink.emit(&RelayEvent::disconnect(reason));
                        break;
                    }
                }
            }
        }

        if sink.is_closed() {
            break;
        }
    }

    sink.close();
    if session.close() {
        handle.leave();
    }
    tracing::info!(
        name: "relay.session.closed",
        session = %session_id,
        "Relay session closed"
    );
}

/// React to quiz-start metadata: surface an early question from the first
/// game block when usable, and prefetch the full question list when the
/// metadata embeds a quiz id.
async fn handle_quiz_start(
    quiz: &Value,
    stored: &mut HashMap<u32, QuestionRecord>,
    sink: &EventSink,
    fetcher: &QuizFetcher,
    session_id: &str,
) {
    if let Some(block) = quiz.get("firstGameBlockData") {
        if has_choices(block) {
            let record = derive_question(stored, block);
            stored.insert(record.question_index, record.clone());
            sink.emit(&RelayEvent::Question(record));
        }
    }

    let quiz_id = quiz
        .get("quizId")
        .or_else(|| quiz.get("id"))
        .and_then(Value::as_str);
    let Some(quiz_id) = quiz_id else { return };

    match fetcher.fetch(quiz_id).await {
        Ok(content) => {
            tracing::debug!(
                name: "relay.prefetch.completed",
                session = %session_id,
                question_count = content.questions.len(),
                "Question list prefetched"
            );
            for record in content.questions {
                stored.insert(record.question_index, record);
            }
        }
        Err(error) => {
            // Prefetch is opportunistic: the session keeps running on
            // event-derived data.
            tracing::warn!(
                name: "relay.prefetch.failed",
                session = %session_id,
                error = %error,
                "Quiz prefetch failed"
            );
        }
    }
}
