//! Signaling message router
//!
//! Stateless per message. Join and leave mutate the registry and drive the
//! membership events; offer/answer/candidate are opaque payloads forwarded
//! verbatim to the target connection, tagged with the sender's id. The relay
//! never inspects negotiation bodies, which keeps it decoupled from how the
//! peers negotiate.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::protocol::{ClientMessage, ConnectionId, ErrorKind, ServerMessage};
use crate::registry::RoomRegistry;
use crate::server::switchboard::Switchboard;

/// The relay's routing logic
pub struct Relay {
    registry: Arc<RoomRegistry>,
    switchboard: Arc<Switchboard>,
}

impl Relay {
    pub fn new(registry: Arc<RoomRegistry>, switchboard: Arc<Switchboard>) -> Self {
        Self {
            registry,
            switchboard,
        }
    }

    pub fn switchboard(&self) -> &Arc<Switchboard> {
        &self.switchboard
    }

    /// Route one message from a connected client
    pub async fn handle(&self, from: ConnectionId, msg: ClientMessage) {
        match msg {
            ClientMessage::Join { code, display_name } => {
                self.handle_join(from, &code, &display_name).await;
            }
            ClientMessage::Leave => {
                self.handle_leave(from).await;
            }
            ClientMessage::Offer { to, sdp } => {
                self.forward(from, to, ServerMessage::Offer { from, sdp })
                    .await;
            }
            ClientMessage::Answer { to, sdp } => {
                self.forward(from, to, ServerMessage::Answer { from, sdp })
                    .await;
            }
            ClientMessage::Candidate { to, candidate } => {
                self.forward(from, to, ServerMessage::Candidate { from, candidate })
                    .await;
            }
            ClientMessage::TrackStateChange { is_sharing } => {
                self.handle_track_state(from, is_sharing).await;
            }
            ClientMessage::Chat { message } => {
                self.handle_chat(from, message).await;
            }
        }
    }

    /// A dropped transport connection is treated identically to an explicit
    /// leave message
    pub async fn handle_disconnect(&self, from: ConnectionId) {
        tracing::debug!(connection = %from, "Connection dropped");
        self.handle_leave(from).await;
    }

    async fn handle_join(&self, from: ConnectionId, code: &str, display_name: &str) {
        match self.registry.join(code, from, display_name).await {
            Ok(outcome) => {
                // Joining while still in another room departs it; the old
                // room is told exactly as for an explicit leave.
                if let Some(previous) = &outcome.previous {
                    let remaining = self.registry.members(&previous.code).await;
                    self.switchboard
                        .multicast(
                            &remaining,
                            None,
                            ServerMessage::MemberLeft {
                                connection_id: from,
                            },
                        )
                        .await;
                }
                // The joiner learns who was already present; everyone else
                // learns about the joiner. Exactly one side of each pair
                // sees the other as "existing" - that asymmetry decides who
                // makes the offer.
                self.switchboard
                    .send_to(
                        from,
                        ServerMessage::ExistingMembers {
                            members: outcome.existing.clone(),
                        },
                    )
                    .await;
                self.switchboard
                    .multicast(
                        &outcome.existing,
                        None,
                        ServerMessage::MemberJoined {
                            connection_id: from,
                            display_name: display_name.to_string(),
                        },
                    )
                    .await;
            }
            Err(e) => {
                tracing::info!(room = %code, connection = %from, error = %e, "Join rejected");
                self.switchboard
                    .send_to(
                        from,
                        ServerMessage::Error {
                            kind: e.kind(),
                            message: e.to_string(),
                        },
                    )
                    .await;
            }
        }
    }

    async fn handle_leave(&self, from: ConnectionId) {
        // Idempotent: a connection that never joined simply has no departure
        if let Some(departure) = self.registry.leave(from).await {
            let remaining = self.registry.members(&departure.code).await;
            self.switchboard
                .multicast(
                    &remaining,
                    None,
                    ServerMessage::MemberLeft {
                        connection_id: from,
                    },
                )
                .await;
        }
    }

    async fn forward(&self, from: ConnectionId, to: ConnectionId, msg: ServerMessage) {
        if !self.switchboard.send_to(to, msg).await {
            tracing::debug!(
                from = %from,
                to = %to,
                "Negotiation target gone, message dropped"
            );
        }
    }

    async fn handle_track_state(&self, from: ConnectionId, is_sharing: bool) {
        let Some(membership) = self.registry.membership(from).await else {
            tracing::debug!(connection = %from, "Track state from non-member ignored");
            return;
        };
        let members = self.registry.members(&membership.code).await;
        self.switchboard
            .multicast(
                &members,
                Some(from),
                ServerMessage::TrackStateChange { from, is_sharing },
            )
            .await;
    }

    async fn handle_chat(&self, from: ConnectionId, message: String) {
        let Some(membership) = self.registry.membership(from).await else {
            tracing::debug!(connection = %from, "Chat from non-member ignored");
            return;
        };
        let members = self.registry.members(&membership.code).await;
        // Chat goes to the whole room, sender included
        self.switchboard
            .multicast(
                &members,
                None,
                ServerMessage::Chat {
                    from,
                    display_name: membership.display_name,
                    message,
                    sent_at: unix_millis(),
                },
            )
            .await;
    }

    /// Reply sent when a frame cannot be parsed as a protocol message
    pub async fn reject_malformed(&self, from: ConnectionId, detail: &str) {
        self.switchboard
            .send_to(
                from,
                ServerMessage::Error {
                    kind: ErrorKind::Transport,
                    message: format!("Malformed message: {}", detail),
                },
            )
            .await;
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
