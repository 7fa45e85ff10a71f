//! Per-connection message pump
//!
//! Each accepted WebSocket gets a writer task draining its outgoing channel
//! and a read loop feeding parsed messages to the router. When the stream
//! ends for any reason, the connection is unregistered and the disconnect is
//! routed exactly like an explicit leave.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::protocol::{ClientMessage, ConnectionId, ServerMessage};
use crate::server::router::Relay;

/// Drive one client connection until it closes
pub async fn run_connection(
    ws: WebSocketStream<TcpStream>,
    id: ConnectionId,
    relay: Arc<Relay>,
    outgoing_buffer: usize,
) {
    let (mut sink, mut stream) = ws.split();
    let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<ServerMessage>(outgoing_buffer);

    relay.switchboard().register(id, outgoing_tx).await;

    let writer = tokio::spawn(async move {
        while let Some(msg) = outgoing_rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!(connection = %id, error = %e, "Failed to encode message");
                    continue;
                }
            };
            if sink.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => relay.handle(id, msg).await,
                Err(e) => {
                    tracing::debug!(connection = %id, error = %e, "Malformed frame");
                    relay.reject_malformed(id, &e.to_string()).await;
                }
            },
            Ok(Message::Close(_)) => break,
            // Pings are answered by the protocol layer; binary frames have
            // no meaning on this channel
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(connection = %id, error = %e, "Read failed");
                break;
            }
        }
    }

    // Dropping the registered sender ends the writer task
    relay.switchboard().unregister(id).await;
    relay.handle_disconnect(id).await;
    let _ = writer.await;
}
