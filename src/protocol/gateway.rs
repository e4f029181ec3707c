//! WebSocket connector to the external protocol bridge.
//!
//! The bridge process owns the actual game protocol; this connector only
//! opens a WebSocket to it, sends one join frame, and translates incoming
//! JSON frames into [`ProtocolEvent`]s via [`decode_frame`].

use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

use super::{GameConnector, GameHandle, ProtocolError, ProtocolEvent, decode_frame};

/// Buffered events per connection before backpressure on the read loop.
const EVENT_BUFFER: usize = 32;

/// Connector speaking JSON frames to the protocol bridge over WebSocket.
#[derive(Debug, Clone)]
pub struct GatewayConnector {
    gateway_url: String,
}

impl GatewayConnector {
    /// Create a connector against the given `ws://`/`wss://` gateway URL.
    #[must_use]
    pub fn new(gateway_url: impl Into<String>) -> Self {
        Self {
            gateway_url: gateway_url.into(),
        }
    }
}

#[async_trait::async_trait]
impl GameConnector for GatewayConnector {
    async fn connect(&self, pin: &str, name: &str) -> Result<GameHandle, ProtocolError> {
        let url =
            Url::parse(&self.gateway_url).map_err(|e| ProtocolError::Connect(e.to_string()))?;

        let (socket, response) = connect_async(url.as_str())
            .await
            .map_err(|e| ProtocolError::Connect(e.to_string()))?;

        tracing::debug!(
            name: "gateway.connected",
            status = %response.status(),
            pin = %pin,
            "Gateway WebSocket connected"
        );

        let (mut write, mut read) = socket.split();

        let join = json!({
            "event": "join",
            "pin": pin,
            "name": name,
            "requestId": Uuid::new_v4(),
        });
        write
            .send(Message::Text(join.to_string()))
            .await
            .map_err(|e| ProtocolError::Connect(e.to_string()))?;

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let cancel = CancellationToken::new();
        let guard = cancel.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = guard.cancelled() => {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                    frame = read.next() => match frame {
                        Some(Ok(Message::Text(text))) => {
                            if let Some(event) = decode_frame(&text) {
                                if tx.send(event).await.is_err() {
                                    break;
                                }
                            } else {
                                tracing::trace!(frame = %text, "Ignoring unknown gateway frame");
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            let _ = tx
                                .send(ProtocolEvent::Disconnect {
                                    reason: json!("gateway closed the connection"),
                                })
                                .await;
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "Gateway read failed");
                            let _ = tx
                                .send(ProtocolEvent::Disconnect {
                                    reason: json!(e.to_string()),
                                })
                                .await;
                            break;
                        }
                    }
                }
            }
        });

        Ok(GameHandle::new(rx, cancel))
    }
}
