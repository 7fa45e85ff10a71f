//! Peer connection orchestrator
//!
//! One negotiation state machine per remote participant:
//!
//! ```text
//!   Idle ──► Negotiating(Offerer | Answerer) ──► Connected ──► Closed
//! ```
//!
//! Who offers is decided by which membership event a participant observes.
//! The bulk member list delivered at join time means "you are the newcomer,
//! offer to each of them"; a member-joined notification means "a newcomer
//! will offer to you, wait". Exactly one side of every pair initiates.
//!
//! Candidates that arrive before the remote description are queued in
//! receipt order and replayed once the description is set. A negotiation
//! failure is confined to its remote participant: the state is closed, an
//! event is surfaced, and everyone else keeps negotiating.

use std::collections::HashMap;

use tokio::sync::mpsc;

use super::peer::{
    LinkEvent, LinkEventKind, LinkState, NegotiationError, PeerConnector, PeerLink, TrackKind,
};
use super::signaling::SignalingClient;
use crate::protocol::{
    CandidateInit, ClientMessage, ConnectionId, ErrorKind, MemberInfo, ServerMessage,
    SessionDescription,
};

/// Which side of a pair initiated negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Offerer,
    Answerer,
}

/// Lifecycle of one remote participant's negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Known but not yet negotiating (waiting for their offer)
    Idle,
    /// Description exchange in progress
    Negotiating(Role),
    /// The underlying layer reported a usable connection
    Connected,
    /// Torn down; kept only until the member-left cleanup
    Closed,
}

/// Events surfaced to the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    /// A remote participant is known (existing member or new joiner)
    PeerJoined {
        remote: ConnectionId,
        display_name: String,
    },
    /// Direct connection established
    PeerConnected { remote: ConnectionId },
    /// Negotiation or connectivity failed for this participant only
    PeerFailed { remote: ConnectionId },
    /// Participant left; any derived media should be dropped
    PeerLeft { remote: ConnectionId },
    /// Remote media state changed (e.g. screen-share toggled)
    TrackState {
        remote: ConnectionId,
        is_sharing: bool,
    },
    /// Chat line from the room
    Chat {
        from: ConnectionId,
        display_name: String,
        message: String,
        sent_at: u64,
    },
    /// The relay rejected a request
    ServerError { kind: ErrorKind, message: String },
}

struct NegotiationState<L> {
    remote: ConnectionId,
    display_name: String,
    link: L,
    phase: Phase,
    /// Candidates received before the remote description, FIFO
    pending_candidates: Vec<CandidateInit>,
    have_remote_description: bool,
}

impl<L> NegotiationState<L> {
    fn new(remote: ConnectionId, display_name: &str, link: L, phase: Phase) -> Self {
        Self {
            remote,
            display_name: display_name.to_string(),
            link,
            phase,
            pending_candidates: Vec::new(),
            have_remote_description: false,
        }
    }
}

/// Per-participant negotiation driver
///
/// Single-threaded-cooperative: all handlers take `&mut self`, so messages
/// are processed in arrival order and no negotiation state is ever touched
/// concurrently. Link callbacks land on an internal channel and are folded
/// in by [`Orchestrator::run`] or [`Orchestrator::poll_link_events`].
pub struct Orchestrator<C: PeerConnector> {
    connector: C,
    outgoing: mpsc::Sender<ClientMessage>,
    events: mpsc::UnboundedSender<RoomEvent>,
    link_tx: mpsc::Sender<LinkEvent>,
    link_rx: mpsc::Receiver<LinkEvent>,
    peers: HashMap<ConnectionId, NegotiationState<C::Link>>,
}

impl<C: PeerConnector> Orchestrator<C> {
    /// Create an orchestrator sending through `outgoing`
    ///
    /// Returns the receiver for [`RoomEvent`]s alongside.
    pub fn new(
        connector: C,
        outgoing: mpsc::Sender<ClientMessage>,
    ) -> (Self, mpsc::UnboundedReceiver<RoomEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (link_tx, link_rx) = mpsc::channel(256);
        (
            Self {
                connector,
                outgoing,
                events,
                link_tx,
                link_rx,
                peers: HashMap::new(),
            },
            events_rx,
        )
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Current phase for a remote participant
    pub fn phase(&self, remote: ConnectionId) -> Option<Phase> {
        self.peers.get(&remote).map(|s| s.phase)
    }

    /// Number of tracked remote participants
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Drive the orchestrator until the signaling channel closes
    pub async fn run(&mut self, signaling: &mut SignalingClient) {
        enum Step {
            Signal(Option<ServerMessage>),
            Link(Option<LinkEvent>),
        }

        loop {
            let step = tokio::select! {
                msg = signaling.recv() => Step::Signal(msg),
                ev = self.link_rx.recv() => Step::Link(ev),
            };
            match step {
                Step::Signal(Some(msg)) => self.handle_signal(msg).await,
                Step::Signal(None) => {
                    tracing::info!("Signaling channel closed, tearing down");
                    self.teardown_all().await;
                    break;
                }
                Step::Link(Some(ev)) => self.handle_link_event(ev).await,
                // The orchestrator holds a sender, so this cannot happen
                Step::Link(None) => break,
            }
        }
    }

    /// Fold in any link events that are already queued
    pub async fn poll_link_events(&mut self) {
        while let Ok(ev) = self.link_rx.try_recv() {
            self.handle_link_event(ev).await;
        }
    }

    /// Process one message from the relay
    pub async fn handle_signal(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::ExistingMembers { members } => {
                // We are the newcomer: offer to everyone already present.
                // One member failing must not stop the others.
                for member in members {
                    if let Err(e) = self.offer_to(&member).await {
                        tracing::warn!(
                            remote = %member.connection_id,
                            error = %e,
                            "Negotiation with existing member failed"
                        );
                        self.emit(RoomEvent::PeerFailed {
                            remote: member.connection_id,
                        });
                    }
                }
            }
            ServerMessage::MemberJoined {
                connection_id,
                display_name,
            } => {
                self.expect_offer_from(connection_id, &display_name).await;
            }
            ServerMessage::Offer { from, sdp } => {
                if let Err(e) = self.handle_offer(from, &sdp).await {
                    tracing::warn!(remote = %from, error = %e, "Inbound offer failed");
                    self.close_peer(from).await;
                }
            }
            ServerMessage::Answer { from, sdp } => {
                if let Err(e) = self.handle_answer(from, &sdp).await {
                    tracing::warn!(remote = %from, error = %e, "Inbound answer failed");
                    self.close_peer(from).await;
                }
            }
            ServerMessage::Candidate { from, candidate } => {
                self.handle_candidate(from, candidate).await;
            }
            ServerMessage::MemberLeft { connection_id } => {
                self.handle_member_left(connection_id).await;
            }
            ServerMessage::TrackStateChange { from, is_sharing } => {
                self.emit(RoomEvent::TrackState {
                    remote: from,
                    is_sharing,
                });
            }
            ServerMessage::Chat {
                from,
                display_name,
                message,
                sent_at,
            } => {
                self.emit(RoomEvent::Chat {
                    from,
                    display_name,
                    message,
                    sent_at,
                });
            }
            ServerMessage::Error { kind, message } => {
                tracing::warn!(kind = %kind, message = %message, "Relay reported an error");
                self.emit(RoomEvent::ServerError { kind, message });
            }
        }
    }

    /// Process one event from an underlying peer link
    ///
    /// Events for a remote that has already been torn down are no-ops: an
    /// async step completing after its state was discarded must not act.
    pub async fn handle_link_event(&mut self, ev: LinkEvent) {
        let phase = match self.peers.get(&ev.remote) {
            Some(state) => state.phase,
            None => {
                tracing::debug!(remote = %ev.remote, "Event for departed peer ignored");
                return;
            }
        };
        if phase == Phase::Closed {
            return;
        }

        match ev.kind {
            LinkEventKind::LocalCandidate(candidate) => {
                self.send(ClientMessage::Candidate {
                    to: ev.remote,
                    candidate,
                })
                .await;
            }
            LinkEventKind::StateChanged(state) => match state {
                LinkState::Connected => {
                    if phase != Phase::Connected {
                        if let Some(s) = self.peers.get_mut(&ev.remote) {
                            s.phase = Phase::Connected;
                        }
                        tracing::info!(remote = %ev.remote, "Peer connected");
                        self.emit(RoomEvent::PeerConnected { remote: ev.remote });
                    }
                }
                LinkState::Failed | LinkState::Disconnected => {
                    // Surfaced as a degraded condition; renegotiation is the
                    // caller's decision, not an automatic retry
                    tracing::warn!(remote = %ev.remote, state = %state, "Peer link degraded");
                    self.emit(RoomEvent::PeerFailed { remote: ev.remote });
                }
                LinkState::New | LinkState::Connecting | LinkState::Closed => {
                    tracing::debug!(remote = %ev.remote, state = %state, "Link state");
                }
            },
        }
    }

    /// Swap the outgoing track of the given kind on every live connection
    ///
    /// Nothing is torn down or renegotiated: remote participants keep the
    /// same connection and simply start receiving the new track.
    pub async fn replace_outgoing_track(
        &mut self,
        kind: TrackKind,
        track: <C::Link as PeerLink>::Track,
    ) {
        for state in self.peers.values() {
            if state.phase == Phase::Closed {
                continue;
            }
            if let Err(e) = state.link.replace_track(kind, track.clone()).await {
                tracing::warn!(remote = %state.remote, error = %e, "Track swap failed");
            }
        }
    }

    /// Tell the room about a local media change (e.g. screen-share toggle)
    pub async fn announce_track_state(&self, is_sharing: bool) {
        self.send(ClientMessage::TrackStateChange { is_sharing })
            .await;
    }

    /// Close every negotiation state; safe to call repeatedly
    pub async fn teardown_all(&mut self) {
        for (_, state) in self.peers.drain() {
            state.link.close().await;
        }
    }

    async fn offer_to(&mut self, member: &MemberInfo) -> Result<(), NegotiationError> {
        // Exactly one negotiation state per pair; re-contact reuses it
        if self.peers.contains_key(&member.connection_id) {
            return Ok(());
        }

        let link = self
            .connector
            .connect(member.connection_id, self.link_tx.clone())
            .await?;
        let offer = match link.create_offer().await {
            Ok(offer) => offer,
            Err(e) => {
                link.close().await;
                return Err(e);
            }
        };

        self.peers.insert(
            member.connection_id,
            NegotiationState::new(
                member.connection_id,
                &member.display_name,
                link,
                Phase::Negotiating(Role::Offerer),
            ),
        );
        self.emit(RoomEvent::PeerJoined {
            remote: member.connection_id,
            display_name: member.display_name.clone(),
        });
        self.send(ClientMessage::Offer {
            to: member.connection_id,
            sdp: offer,
        })
        .await;
        Ok(())
    }

    async fn expect_offer_from(&mut self, remote: ConnectionId, display_name: &str) {
        if self.peers.contains_key(&remote) {
            return;
        }

        // The newcomer offers to everyone already present, so our side only
        // pre-creates the state and waits for their offer.
        match self.connector.connect(remote, self.link_tx.clone()).await {
            Ok(link) => {
                self.peers.insert(
                    remote,
                    NegotiationState::new(remote, display_name, link, Phase::Idle),
                );
                self.emit(RoomEvent::PeerJoined {
                    remote,
                    display_name: display_name.to_string(),
                });
            }
            Err(e) => {
                tracing::warn!(remote = %remote, error = %e, "Pre-creating peer link failed");
                self.emit(RoomEvent::PeerFailed { remote });
            }
        }
    }

    async fn handle_offer(
        &mut self,
        from: ConnectionId,
        sdp: &SessionDescription,
    ) -> Result<(), NegotiationError> {
        if !self.peers.contains_key(&from) {
            // Offer raced ahead of the member-joined notification
            let link = self.connector.connect(from, self.link_tx.clone()).await?;
            self.peers.insert(
                from,
                NegotiationState::new(from, "unknown", link, Phase::Idle),
            );
        }

        let answer = {
            let Some(state) = self.peers.get_mut(&from) else {
                return Ok(());
            };
            let answer = state.link.accept_offer(sdp).await?;
            state.have_remote_description = true;
            state.phase = Phase::Negotiating(Role::Answerer);
            answer
        };

        self.send(ClientMessage::Answer {
            to: from,
            sdp: answer,
        })
        .await;
        self.drain_candidates(from).await;
        Ok(())
    }

    async fn handle_answer(
        &mut self,
        from: ConnectionId,
        sdp: &SessionDescription,
    ) -> Result<(), NegotiationError> {
        {
            let Some(state) = self.peers.get_mut(&from) else {
                tracing::debug!(remote = %from, "Answer from unknown peer ignored");
                return Ok(());
            };
            if state.phase == Phase::Closed {
                return Ok(());
            }
            state.link.accept_answer(sdp).await?;
            state.have_remote_description = true;
        }
        self.drain_candidates(from).await;
        Ok(())
    }

    async fn handle_candidate(&mut self, from: ConnectionId, candidate: CandidateInit) {
        let Some(state) = self.peers.get_mut(&from) else {
            tracing::debug!(remote = %from, "Candidate for unknown peer dropped");
            return;
        };
        if state.phase == Phase::Closed {
            return;
        }

        if state.have_remote_description {
            if let Err(e) = state.link.add_candidate(candidate).await {
                tracing::warn!(remote = %from, error = %e, "Candidate rejected");
            }
        } else {
            state.pending_candidates.push(candidate);
        }
    }

    async fn handle_member_left(&mut self, remote: ConnectionId) {
        if let Some(state) = self.peers.remove(&remote) {
            state.link.close().await;
            tracing::info!(remote = %remote, name = %state.display_name, "Peer left, state discarded");
            self.emit(RoomEvent::PeerLeft { remote });
        }
    }

    /// Replay queued candidates in receipt order
    async fn drain_candidates(&mut self, remote: ConnectionId) {
        let Some(state) = self.peers.get_mut(&remote) else {
            return;
        };
        for candidate in std::mem::take(&mut state.pending_candidates) {
            if let Err(e) = state.link.add_candidate(candidate).await {
                tracing::warn!(remote = %remote, error = %e, "Queued candidate rejected");
            }
        }
    }

    async fn close_peer(&mut self, remote: ConnectionId) {
        if let Some(state) = self.peers.get_mut(&remote) {
            state.phase = Phase::Closed;
            state.pending_candidates.clear();
            state.link.close().await;
        }
        self.emit(RoomEvent::PeerFailed { remote });
    }

    async fn send(&self, msg: ClientMessage) {
        if self.outgoing.send(msg).await.is_err() {
            tracing::warn!("Signaling channel closed, message dropped");
        }
    }

    fn emit(&self, event: RoomEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockConnector;

    fn member(id: u64, name: &str) -> MemberInfo {
        MemberInfo {
            connection_id: ConnectionId(id),
            display_name: name.to_string(),
        }
    }

    fn candidate(n: u32) -> CandidateInit {
        CandidateInit {
            candidate: format!("candidate:{} 1 UDP 1 192.0.2.1 {} typ host", n, 50000 + n),
            sdp_mid: Some("0".to_string()),
            sdp_mline_index: Some(0),
            username_fragment: None,
        }
    }

    struct Harness {
        orchestrator: Orchestrator<MockConnector>,
        outgoing_rx: mpsc::Receiver<ClientMessage>,
        events_rx: mpsc::UnboundedReceiver<RoomEvent>,
    }

    fn harness() -> Harness {
        let (outgoing, outgoing_rx) = mpsc::channel(64);
        let (orchestrator, events_rx) = Orchestrator::new(MockConnector::new(), outgoing);
        Harness {
            orchestrator,
            outgoing_rx,
            events_rx,
        }
    }

    #[tokio::test]
    async fn test_offers_to_each_existing_member() {
        let mut h = harness();

        h.orchestrator
            .handle_signal(ServerMessage::ExistingMembers {
                members: vec![member(2, "bob"), member(3, "carol")],
            })
            .await;

        for expected in [ConnectionId(2), ConnectionId(3)] {
            match h.outgoing_rx.try_recv().unwrap() {
                ClientMessage::Offer { to, sdp } => {
                    assert_eq!(to, expected);
                    assert_eq!(sdp.kind, crate::protocol::SdpKind::Offer);
                }
                other => panic!("expected offer, got {:?}", other),
            }
            assert_eq!(
                h.orchestrator.phase(expected),
                Some(Phase::Negotiating(Role::Offerer))
            );
        }
        assert_eq!(h.orchestrator.peer_count(), 2);
    }

    #[tokio::test]
    async fn test_new_member_waits_for_their_offer() {
        let mut h = harness();

        h.orchestrator
            .handle_signal(ServerMessage::MemberJoined {
                connection_id: ConnectionId(2),
                display_name: "bob".to_string(),
            })
            .await;

        // No offer from our side: the newcomer initiates
        assert!(h.outgoing_rx.try_recv().is_err());
        assert_eq!(h.orchestrator.phase(ConnectionId(2)), Some(Phase::Idle));
        assert_eq!(
            h.events_rx.try_recv().unwrap(),
            RoomEvent::PeerJoined {
                remote: ConnectionId(2),
                display_name: "bob".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_exactly_one_side_offers_per_pair() {
        let mut h = harness();

        // We saw them join, then they offered: still a single state
        h.orchestrator
            .handle_signal(ServerMessage::MemberJoined {
                connection_id: ConnectionId(2),
                display_name: "bob".to_string(),
            })
            .await;
        h.orchestrator
            .handle_signal(ServerMessage::Offer {
                from: ConnectionId(2),
                sdp: SessionDescription::offer("their-offer"),
            })
            .await;

        assert_eq!(h.orchestrator.connector().link_count(), 1);
        // An existing-members list mentioning them again must reuse, not
        // re-offer
        h.orchestrator
            .handle_signal(ServerMessage::ExistingMembers {
                members: vec![member(2, "bob")],
            })
            .await;
        assert_eq!(h.orchestrator.connector().link_count(), 1);
        match h.outgoing_rx.try_recv().unwrap() {
            ClientMessage::Answer { to, .. } => assert_eq!(to, ConnectionId(2)),
            other => panic!("expected answer, got {:?}", other),
        }
        assert!(h.outgoing_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_candidates_queue_until_remote_description_then_replay_in_order() {
        let mut h = harness();

        h.orchestrator
            .handle_signal(ServerMessage::MemberJoined {
                connection_id: ConnectionId(2),
                display_name: "bob".to_string(),
            })
            .await;

        // Candidates outrun the offer
        for n in 0..3 {
            h.orchestrator
                .handle_signal(ServerMessage::Candidate {
                    from: ConnectionId(2),
                    candidate: candidate(n),
                })
                .await;
        }
        let link = h.orchestrator.connector().link(ConnectionId(2)).unwrap();
        assert!(link.applied_candidates().is_empty());

        h.orchestrator
            .handle_signal(ServerMessage::Offer {
                from: ConnectionId(2),
                sdp: SessionDescription::offer("their-offer"),
            })
            .await;

        // All three replayed, in receipt order, none dropped
        let applied = link.applied_candidates();
        assert_eq!(applied.len(), 3);
        assert_eq!(applied, vec![candidate(0), candidate(1), candidate(2)]);

        // Later candidates apply immediately
        h.orchestrator
            .handle_signal(ServerMessage::Candidate {
                from: ConnectionId(2),
                candidate: candidate(3),
            })
            .await;
        assert_eq!(link.applied_candidates().len(), 4);
    }

    #[tokio::test]
    async fn test_offerer_reaches_connected_after_answer() {
        let mut h = harness();

        h.orchestrator
            .handle_signal(ServerMessage::ExistingMembers {
                members: vec![member(2, "bob")],
            })
            .await;
        h.orchestrator
            .handle_signal(ServerMessage::Answer {
                from: ConnectionId(2),
                sdp: SessionDescription::answer("their-answer"),
            })
            .await;
        h.orchestrator.poll_link_events().await;

        assert_eq!(h.orchestrator.phase(ConnectionId(2)), Some(Phase::Connected));
        let events: Vec<_> = std::iter::from_fn(|| h.events_rx.try_recv().ok()).collect();
        assert!(events.contains(&RoomEvent::PeerConnected {
            remote: ConnectionId(2)
        }));
    }

    #[tokio::test]
    async fn test_replace_track_reaches_all_live_links_without_closing() {
        let mut h = harness();

        h.orchestrator
            .handle_signal(ServerMessage::ExistingMembers {
                members: vec![member(2, "bob"), member(3, "carol")],
            })
            .await;
        h.orchestrator
            .replace_outgoing_track(TrackKind::Video, "screen-capture".to_string())
            .await;

        for id in [ConnectionId(2), ConnectionId(3)] {
            let link = h.orchestrator.connector().link(id).unwrap();
            assert_eq!(link.track(TrackKind::Video).unwrap(), "screen-capture");
            assert!(!link.is_closed());
        }
    }

    #[tokio::test]
    async fn test_member_left_discards_state_and_closes_link() {
        let mut h = harness();

        h.orchestrator
            .handle_signal(ServerMessage::MemberJoined {
                connection_id: ConnectionId(2),
                display_name: "bob".to_string(),
            })
            .await;
        let link = h.orchestrator.connector().link(ConnectionId(2)).unwrap();

        h.orchestrator
            .handle_signal(ServerMessage::MemberLeft {
                connection_id: ConnectionId(2),
            })
            .await;

        assert!(link.is_closed());
        assert_eq!(h.orchestrator.phase(ConnectionId(2)), None);
        assert_eq!(h.orchestrator.peer_count(), 0);

        // Candidates for the departed peer are dropped, not queued
        h.orchestrator
            .handle_signal(ServerMessage::Candidate {
                from: ConnectionId(2),
                candidate: candidate(0),
            })
            .await;
        assert!(link.applied_candidates().is_empty());
    }

    #[tokio::test]
    async fn test_stale_link_event_is_a_noop() {
        let mut h = harness();

        h.orchestrator
            .handle_signal(ServerMessage::MemberJoined {
                connection_id: ConnectionId(2),
                display_name: "bob".to_string(),
            })
            .await;
        let link = h.orchestrator.connector().link(ConnectionId(2)).unwrap();
        h.orchestrator
            .handle_signal(ServerMessage::MemberLeft {
                connection_id: ConnectionId(2),
            })
            .await;
        while h.events_rx.try_recv().is_ok() {}

        // The underlying layer completes an async step after teardown
        link.report_state(LinkState::Connected);
        h.orchestrator.poll_link_events().await;

        assert_eq!(h.orchestrator.phase(ConnectionId(2)), None);
        assert!(h.events_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failed_member_does_not_abort_the_others() {
        let mut h = harness();
        h.orchestrator.connector().fail_next_connect();

        h.orchestrator
            .handle_signal(ServerMessage::ExistingMembers {
                members: vec![member(2, "bob"), member(3, "carol")],
            })
            .await;

        // Bob failed, carol still got her offer
        let events: Vec<_> = std::iter::from_fn(|| h.events_rx.try_recv().ok()).collect();
        assert!(events.contains(&RoomEvent::PeerFailed {
            remote: ConnectionId(2)
        }));
        assert_eq!(
            h.orchestrator.phase(ConnectionId(3)),
            Some(Phase::Negotiating(Role::Offerer))
        );
        match h.outgoing_rx.try_recv().unwrap() {
            ClientMessage::Offer { to, .. } => assert_eq!(to, ConnectionId(3)),
            other => panic!("expected offer, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_teardown_all_is_idempotent() {
        let mut h = harness();

        h.orchestrator
            .handle_signal(ServerMessage::ExistingMembers {
                members: vec![member(2, "bob")],
            })
            .await;
        let link = h.orchestrator.connector().link(ConnectionId(2)).unwrap();

        h.orchestrator.teardown_all().await;
        assert!(link.is_closed());
        assert_eq!(h.orchestrator.peer_count(), 0);

        h.orchestrator.teardown_all().await;
        assert_eq!(h.orchestrator.peer_count(), 0);
    }

    #[tokio::test]
    async fn test_local_candidates_are_sent_to_the_remote() {
        let mut h = harness();

        h.orchestrator
            .handle_signal(ServerMessage::ExistingMembers {
                members: vec![member(2, "bob")],
            })
            .await;
        let link = h.orchestrator.connector().link(ConnectionId(2)).unwrap();
        link.report_local_candidate(candidate(9));
        h.orchestrator.poll_link_events().await;

        let _offer = h.outgoing_rx.try_recv().unwrap();
        match h.outgoing_rx.try_recv().unwrap() {
            ClientMessage::Candidate { to, candidate: c } => {
                assert_eq!(to, ConnectionId(2));
                assert_eq!(c, candidate(9));
            }
            other => panic!("expected candidate, got {:?}", other),
        }
    }
}
