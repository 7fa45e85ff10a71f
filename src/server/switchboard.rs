//! Connection switchboard
//!
//! Maps connection ids to their outgoing message channels. This is the
//! delivery half of the transport channel: point-to-point sends routed by
//! connection id, and room multicast that skips the sender.

use std::collections::HashMap;

use tokio::sync::{mpsc, RwLock};

use crate::protocol::{ConnectionId, MemberInfo, ServerMessage};

/// Routes outgoing messages to connected clients
#[derive(Default)]
pub struct Switchboard {
    senders: RwLock<HashMap<ConnectionId, mpsc::Sender<ServerMessage>>>,
}

impl Switchboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the outgoing channel for a new connection
    pub async fn register(&self, id: ConnectionId, tx: mpsc::Sender<ServerMessage>) {
        self.senders.write().await.insert(id, tx);
    }

    /// Detach a connection; future sends to it are dropped
    pub async fn unregister(&self, id: ConnectionId) {
        self.senders.write().await.remove(&id);
    }

    /// Deliver to one connection
    ///
    /// Returns false if the connection is gone. A full outgoing buffer
    /// back-pressures the caller, not the whole relay.
    pub async fn send_to(&self, id: ConnectionId, msg: ServerMessage) -> bool {
        let tx = {
            let senders = self.senders.read().await;
            match senders.get(&id) {
                Some(tx) => tx.clone(),
                None => return false,
            }
        };
        tx.send(msg).await.is_ok()
    }

    /// Deliver to every listed member except `except`
    ///
    /// Fan-out never waits on one member: a member whose outgoing buffer is
    /// full has the message dropped instead of stalling delivery to the rest
    /// of the room.
    pub async fn multicast(
        &self,
        members: &[MemberInfo],
        except: Option<ConnectionId>,
        msg: ServerMessage,
    ) {
        let senders = self.senders.read().await;
        for member in members {
            if Some(member.connection_id) == except {
                continue;
            }
            let Some(tx) = senders.get(&member.connection_id) else {
                tracing::debug!(
                    connection = %member.connection_id,
                    "Multicast target already gone"
                );
                continue;
            };
            match tx.try_send(msg.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        connection = %member.connection_id,
                        "Outgoing buffer full, multicast message dropped"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!(
                        connection = %member.connection_id,
                        "Multicast target already gone"
                    );
                }
            }
        }
    }

    /// Number of currently attached connections
    pub async fn len(&self) -> usize {
        self.senders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.senders.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: u64) -> MemberInfo {
        MemberInfo {
            connection_id: ConnectionId(id),
            display_name: format!("user{}", id),
        }
    }

    #[tokio::test]
    async fn test_send_to_unknown_connection() {
        let switchboard = Switchboard::new();
        assert!(
            !switchboard
                .send_to(ConnectionId(1), ServerMessage::MemberLeft {
                    connection_id: ConnectionId(2)
                })
                .await
        );
    }

    #[tokio::test]
    async fn test_multicast_skips_sender() {
        let switchboard = Switchboard::new();
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);
        switchboard.register(ConnectionId(1), tx1).await;
        switchboard.register(ConnectionId(2), tx2).await;

        let msg = ServerMessage::TrackStateChange {
            from: ConnectionId(1),
            is_sharing: true,
        };
        switchboard
            .multicast(&[member(1), member(2)], Some(ConnectionId(1)), msg.clone())
            .await;

        assert_eq!(rx2.recv().await.unwrap(), msg);
        assert!(rx1.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_multicast_drops_for_a_full_buffer_instead_of_waiting() {
        let switchboard = Switchboard::new();
        let (tx_slow, mut rx_slow) = mpsc::channel(1);
        let (tx_ok, mut rx_ok) = mpsc::channel(4);
        switchboard.register(ConnectionId(1), tx_slow).await;
        switchboard.register(ConnectionId(2), tx_ok).await;

        // Fill the slow member's one-slot buffer
        let filler = ServerMessage::MemberLeft {
            connection_id: ConnectionId(9),
        };
        assert!(switchboard.send_to(ConnectionId(1), filler.clone()).await);

        let msg = ServerMessage::MemberJoined {
            connection_id: ConnectionId(3),
            display_name: "carol".to_string(),
        };
        tokio::time::timeout(
            std::time::Duration::from_millis(100),
            switchboard.multicast(&[member(1), member(2)], None, msg.clone()),
        )
        .await
        .expect("fan-out must not wait on a full buffer");

        // The healthy member got it; the stalled one only ever sees the
        // filler
        assert_eq!(rx_ok.recv().await.unwrap(), msg);
        assert_eq!(rx_slow.recv().await.unwrap(), filler);
        assert!(rx_slow.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unregister_stops_delivery() {
        let switchboard = Switchboard::new();
        let (tx, _rx) = mpsc::channel(4);
        switchboard.register(ConnectionId(1), tx).await;
        assert_eq!(switchboard.len().await, 1);

        switchboard.unregister(ConnectionId(1)).await;
        assert!(switchboard.is_empty().await);
        assert!(
            !switchboard
                .send_to(ConnectionId(1), ServerMessage::MemberLeft {
                    connection_id: ConnectionId(1)
                })
                .await
        );
    }
}
