//! Scripted protocol connectors for tests and local demos.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{GameConnector, GameHandle, ProtocolError, ProtocolEvent};

/// Connector replaying a fixed, timed event script on every connection.
///
/// The event channel stays open after the script is exhausted until the
/// handle is cancelled, so a relay session sees the same lifetime as a
/// live connection.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnector {
    script: Vec<(Duration, ProtocolEvent)>,
}

impl ScriptedConnector {
    /// Replay `script` on each connection, waiting each entry's delay
    /// before emitting it.
    #[must_use]
    pub fn new(script: Vec<(Duration, ProtocolEvent)>) -> Self {
        Self { script }
    }

    /// Connector that connects fine but never emits any event.
    #[must_use]
    pub fn silent() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl GameConnector for ScriptedConnector {
    async fn connect(&self, _pin: &str, _name: &str) -> Result<GameHandle, ProtocolError> {
        let (tx, rx) = mpsc::channel(32);
        let cancel = CancellationToken::new();
        let guard = cancel.clone();
        let script = self.script.clone();

        tokio::spawn(async move {
            for (delay, event) in script {
                tokio::select! {
                    () = guard.cancelled() => return,
                    () = tokio::time::sleep(delay) => {
                        if tx.send(event).await.is_err() {
                            return;
                        }
                    }
                }
            }
            // Hold the channel open until the session tears down.
            guard.cancelled().await;
        });

        Ok(GameHandle::new(rx, cancel))
    }
}

/// Connector whose connection attempt always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingConnector;

#[async_trait::async_trait]
impl GameConnector for FailingConnector {
    async fn connect(&self, _pin: &str, _name: &str) -> Result<GameHandle, ProtocolError> {
        Err(ProtocolError::Connect("scripted failure".to_string()))
    }
}
