//! Relay server listener
//!
//! Handles the TCP accept loop, the WebSocket upgrade (with the
//! allowed-origin check) and connection id assignment.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{
    ErrorResponse, Request, Response,
};

use crate::error::Result;
use crate::protocol::ConnectionId;
use crate::registry::RoomRegistry;
use crate::server::config::RelayConfig;
use crate::server::connection::run_connection;
use crate::server::router::Relay;
use crate::server::switchboard::Switchboard;

/// Signaling relay server
pub struct RelayServer {
    config: RelayConfig,
    relay: Arc<Relay>,
    next_connection_id: AtomicU64,
}

impl RelayServer {
    /// Create a new relay over the given registry
    pub fn new(config: RelayConfig, registry: Arc<RoomRegistry>) -> Self {
        let switchboard = Arc::new(Switchboard::new());
        Self {
            config,
            relay: Arc::new(Relay::new(registry, switchboard)),
            next_connection_id: AtomicU64::new(1),
        }
    }

    /// Get a reference to the router
    pub fn relay(&self) -> &Arc<Relay> {
        &self.relay
    }

    /// Run the server
    ///
    /// Binds the configured address and blocks until shut down.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Signaling relay listening");
        self.accept_loop(&listener).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Signaling relay listening");

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        }
    }

    /// Run the accept loop on an already-bound listener
    ///
    /// Useful when the caller needs the actual bound address, e.g. with an
    /// ephemeral port.
    pub async fn run_on(&self, listener: TcpListener) -> Result<()> {
        self.accept_loop(&listener).await
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    let id = ConnectionId(self.next_connection_id.fetch_add(1, Ordering::Relaxed));
                    tracing::debug!(connection = %id, peer = %peer_addr, "Accepted connection");
                    self.spawn_connection(socket, id);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn spawn_connection(&self, socket: TcpStream, id: ConnectionId) {
        let relay = self.relay.clone();
        let config = self.config.clone();

        tokio::spawn(async move {
            let check = |request: &Request, response: Response| {
                let origin = request
                    .headers()
                    .get("origin")
                    .and_then(|v| v.to_str().ok());
                if config.origin_allowed(origin) {
                    Ok(response)
                } else {
                    tracing::info!(
                        connection = %id,
                        origin = origin.unwrap_or("<none>"),
                        "Origin rejected"
                    );
                    let mut forbidden = ErrorResponse::new(Some("origin not allowed".to_string()));
                    *forbidden.status_mut() = tokio_tungstenite::tungstenite::http::StatusCode::FORBIDDEN;
                    Err(forbidden)
                }
            };

            match accept_hdr_async(socket, check).await {
                Ok(ws) => run_connection(ws, id, relay, config.outgoing_buffer).await,
                Err(e) => {
                    tracing::debug!(connection = %id, error = %e, "Handshake failed");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::api::RoomService;
    use crate::client::SignalingClient;
    use crate::protocol::{ClientMessage, ErrorKind, ServerMessage, SessionDescription};
    use crate::store::MemoryStore;

    async fn start_relay(capacity: usize) -> (String, String) {
        let store = Arc::new(MemoryStore::new());
        let registry = Arc::new(RoomRegistry::new(store.clone()));
        let rooms = RoomService::new(store, registry.clone()).capacity(capacity);
        let code = rooms.create().await.unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = RelayServer::new(RelayConfig::default(), registry);
        tokio::spawn(async move {
            let _ = server.run_on(listener).await;
        });

        (format!("ws://{}/", addr), code)
    }

    async fn recv(client: &mut SignalingClient) -> ServerMessage {
        tokio::time::timeout(Duration::from_secs(5), client.recv())
            .await
            .expect("timed out waiting for relay message")
            .expect("relay closed the connection")
    }

    #[tokio::test]
    async fn test_join_handshake_and_offer_routing() {
        let (url, code) = start_relay(8).await;

        let mut alice = SignalingClient::connect(&url).await.unwrap();
        alice.join(&code, "alice").await.unwrap();
        match recv(&mut alice).await {
            ServerMessage::ExistingMembers { members } => assert!(members.is_empty()),
            other => panic!("expected existing-members, got {:?}", other),
        }

        let mut bob = SignalingClient::connect(&url).await.unwrap();
        bob.join(&code, "bob").await.unwrap();
        let alice_id = match recv(&mut bob).await {
            ServerMessage::ExistingMembers { members } => {
                assert_eq!(members.len(), 1);
                assert_eq!(members[0].display_name, "alice");
                members[0].connection_id
            }
            other => panic!("expected existing-members, got {:?}", other),
        };
        let bob_id = match recv(&mut alice).await {
            ServerMessage::MemberJoined {
                connection_id,
                display_name,
            } => {
                assert_eq!(display_name, "bob");
                connection_id
            }
            other => panic!("expected member-joined, got {:?}", other),
        };

        // Bob (the newcomer) offers; the relay tags it with his id
        bob.send(ClientMessage::Offer {
            to: alice_id,
            sdp: SessionDescription::offer("v=0 bob"),
        })
        .await
        .unwrap();
        match recv(&mut alice).await {
            ServerMessage::Offer { from, sdp } => {
                assert_eq!(from, bob_id);
                assert_eq!(sdp.sdp, "v=0 bob");
            }
            other => panic!("expected offer, got {:?}", other),
        }

        alice
            .send(ClientMessage::Answer {
                to: bob_id,
                sdp: SessionDescription::answer("v=0 alice"),
            })
            .await
            .unwrap();
        match recv(&mut bob).await {
            ServerMessage::Answer { from, sdp } => {
                assert_eq!(from, alice_id);
                assert_eq!(sdp.sdp, "v=0 alice");
            }
            other => panic!("expected answer, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_join_over_capacity_is_rejected() {
        let (url, code) = start_relay(2).await;

        let mut alice = SignalingClient::connect(&url).await.unwrap();
        alice.join(&code, "alice").await.unwrap();
        let _ = recv(&mut alice).await;
        let mut bob = SignalingClient::connect(&url).await.unwrap();
        bob.join(&code, "bob").await.unwrap();
        let _ = recv(&mut bob).await;

        let mut carol = SignalingClient::connect(&url).await.unwrap();
        carol.join(&code, "carol").await.unwrap();
        match recv(&mut carol).await {
            ServerMessage::Error { kind, .. } => assert_eq!(kind, ErrorKind::Capacity),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_code_is_rejected() {
        let (url, _code) = start_relay(8).await;

        let mut client = SignalingClient::connect(&url).await.unwrap();
        client.join("00000000", "alice").await.unwrap();
        match recv(&mut client).await {
            ServerMessage::Error { kind, .. } => assert_eq!(kind, ErrorKind::NotFound),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_abrupt_disconnect_broadcasts_member_left() {
        let (url, code) = start_relay(8).await;

        let mut alice = SignalingClient::connect(&url).await.unwrap();
        alice.join(&code, "alice").await.unwrap();
        let _ = recv(&mut alice).await;

        let mut bob = SignalingClient::connect(&url).await.unwrap();
        bob.join(&code, "bob").await.unwrap();
        let _ = recv(&mut bob).await;
        let bob_id = match recv(&mut alice).await {
            ServerMessage::MemberJoined { connection_id, .. } => connection_id,
            other => panic!("expected member-joined, got {:?}", other),
        };

        // No leave message: the socket just goes away
        drop(bob);

        match recv(&mut alice).await {
            ServerMessage::MemberLeft { connection_id } => assert_eq!(connection_id, bob_id),
            other => panic!("expected member-left, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_chat_and_track_state_fan_out() {
        let (url, code) = start_relay(8).await;

        let mut alice = SignalingClient::connect(&url).await.unwrap();
        alice.join(&code, "alice").await.unwrap();
        let _ = recv(&mut alice).await;
        let mut bob = SignalingClient::connect(&url).await.unwrap();
        bob.join(&code, "bob").await.unwrap();
        let _ = recv(&mut bob).await;
        let bob_id = match recv(&mut alice).await {
            ServerMessage::MemberJoined { connection_id, .. } => connection_id,
            other => panic!("expected member-joined, got {:?}", other),
        };

        // Chat echoes to the whole room, sender included
        bob.send(ClientMessage::Chat {
            message: "hi".to_string(),
        })
        .await
        .unwrap();
        for client in [&mut alice, &mut bob] {
            match recv(client).await {
                ServerMessage::Chat {
                    from,
                    display_name,
                    message,
                    ..
                } => {
                    assert_eq!(from, bob_id);
                    assert_eq!(display_name, "bob");
                    assert_eq!(message, "hi");
                }
                other => panic!("expected chat, got {:?}", other),
            }
        }

        // Track state goes to everyone but the sender
        bob.send(ClientMessage::TrackStateChange { is_sharing: true })
            .await
            .unwrap();
        match recv(&mut alice).await {
            ServerMessage::TrackStateChange { from, is_sharing } => {
                assert_eq!(from, bob_id);
                assert!(is_sharing);
            }
            other => panic!("expected track-state-change, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_disallowed_origin_is_refused() {
        use tokio_tungstenite::tungstenite::client::IntoClientRequest;

        let store = Arc::new(MemoryStore::new());
        let registry = Arc::new(RoomRegistry::new(store));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let config =
            RelayConfig::default().allowed_origins(vec!["https://app.example".to_string()]);
        let server = RelayServer::new(config, registry);
        tokio::spawn(async move {
            let _ = server.run_on(listener).await;
        });
        let url = format!("ws://{}/", addr);

        let mut request = url.as_str().into_client_request().unwrap();
        request
            .headers_mut()
            .insert("Origin", "https://evil.example".parse().unwrap());
        assert!(tokio_tungstenite::connect_async(request).await.is_err());

        // A listed origin is accepted
        let mut request = url.as_str().into_client_request().unwrap();
        request
            .headers_mut()
            .insert("Origin", "https://app.example".parse().unwrap());
        assert!(tokio_tungstenite::connect_async(request).await.is_ok());
    }

    #[tokio::test]
    async fn test_malformed_payload_gets_transport_error() {
        use futures_util::{SinkExt, StreamExt};
        use tokio_tungstenite::tungstenite::Message;

        let (url, _code) = start_relay(8).await;
        let (mut ws, _) = tokio_tungstenite::connect_async(&url).await.unwrap();

        ws.send(Message::Text("{\"event\":\"nonsense\"}".to_string()))
            .await
            .unwrap();
        let reply = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let msg: ServerMessage = serde_json::from_str(reply.to_text().unwrap()).unwrap();
        match msg {
            ServerMessage::Error { kind, .. } => assert_eq!(kind, ErrorKind::Transport),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_ids_are_unique_across_connections() {
        let (url, code) = start_relay(8).await;

        let mut ids = Vec::new();
        let mut clients = Vec::new();
        for n in 0..4 {
            let mut client = SignalingClient::connect(&url).await.unwrap();
            client.join(&code, &format!("p{}", n)).await.unwrap();
            let _ = recv(&mut client).await;
            clients.push(client);
        }
        // Each earlier participant announces every later joiner; collect the
        // ids the first participant saw
        for _ in 0..3 {
            match recv(&mut clients[0]).await {
                ServerMessage::MemberJoined { connection_id, .. } => ids.push(connection_id),
                other => panic!("expected member-joined, got {:?}", other),
            }
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }
}
