//! Outbound event sink with idempotent closure.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use crate::events::{RelayEvent, sse_event};

/// Emit guard around one session's outbound SSE channel.
///
/// Once closed (explicitly, or because the receiving side went away),
/// further emits are silently dropped and further closes are no-ops.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
}

impl EventSink {
    /// Create a sink and the receiver feeding the SSE response body.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                closed: Arc::new(AtomicBool::new(false)),
            },
            rx,
        )
    }

    /// Emit one event as an SSE frame.
    ///
    /// Returns `false` when the frame was dropped because the sink is
    /// closed or the browser went away (which also closes the sink).
    pub fn emit(&self, event: &RelayEvent) -> bool {
        if self.closed.load(Ordering::SeqCst) {
            return false;
        }
        if self.tx.send(sse_event(event)).is_err() {
            self.closed.store(true, Ordering::SeqCst);
            return false;
        }
        true
    }

    /// Close the sink. Safe to call repeatedly.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Whether the sink has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Resolves once the receiving side has gone away (browser abort).
    pub async fn receiver_gone(&self) {
        self.tx.closed().await;
    }
}
