//! Signaling channel client
//!
//! A thin typed wrapper over the WebSocket connection to the relay: one
//! spawned task drains the outgoing channel into the sink, another parses
//! incoming frames into [`ServerMessage`]s.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use crate::error::Result;
use crate::protocol::{ClientMessage, ServerMessage};

/// Client end of the signaling channel
pub struct SignalingClient {
    outgoing: mpsc::Sender<ClientMessage>,
    incoming: mpsc::Receiver<ServerMessage>,
}

impl SignalingClient {
    /// Connect to a relay, e.g. `ws://127.0.0.1:5000`
    pub async fn connect(url: &str) -> Result<Self> {
        let (ws, _) = connect_async(url).await?;
        let (mut sink, mut stream) = ws.split();

        let (outgoing, mut outgoing_rx) = mpsc::channel::<ClientMessage>(64);
        let (incoming_tx, incoming) = mpsc::channel::<ServerMessage>(64);

        tokio::spawn(async move {
            while let Some(msg) = outgoing_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to encode signaling message");
                        continue;
                    }
                };
                if sink.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<ServerMessage>(&text) {
                            Ok(msg) => {
                                if incoming_tx.send(msg).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::debug!(error = %e, "Unrecognized frame from relay");
                            }
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        tracing::debug!(error = %e, "Signaling read failed");
                        break;
                    }
                }
            }
        });

        Ok(Self { outgoing, incoming })
    }

    /// A clonable handle for sending, usable while `recv` is pending
    pub fn sender(&self) -> mpsc::Sender<ClientMessage> {
        self.outgoing.clone()
    }

    /// Send one message to the relay
    pub async fn send(&self, msg: ClientMessage) -> Result<()> {
        self.outgoing
            .send(msg)
            .await
            .map_err(|_| WsError::ConnectionClosed.into())
    }

    /// Ask to join a room
    pub async fn join(&self, code: &str, display_name: &str) -> Result<()> {
        self.send(ClientMessage::Join {
            code: code.to_string(),
            display_name: display_name.to_string(),
        })
        .await
    }

    /// Announce departure before closing the connection
    pub async fn leave(&self) -> Result<()> {
        self.send(ClientMessage::Leave).await
    }

    /// Next message from the relay; `None` once the channel is gone
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        self.incoming.recv().await
    }
}
