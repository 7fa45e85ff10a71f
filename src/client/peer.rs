//! Peer connection abstraction
//!
//! The orchestrator drives negotiation through these traits and never sees
//! the connectivity-establishment machinery underneath. [`crate::client::rtc`]
//! implements them over the `webrtc` crate; [`crate::client::mock`] is a
//! deterministic in-process implementation for tests and simulations.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::protocol::{CandidateInit, ConnectionId, SessionDescription};

/// Error from one remote participant's negotiation
///
/// Always isolated to that participant: the local session and the other
/// peers are unaffected.
#[derive(Debug, Clone)]
pub enum NegotiationError {
    /// Creating the underlying connection failed
    Connect(String),
    /// Constructing or applying an offer/answer failed
    Describe(String),
    /// Applying a network-path candidate failed
    Candidate(String),
    /// Swapping an outgoing track failed
    Track(String),
}

impl std::fmt::Display for NegotiationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NegotiationError::Connect(e) => write!(f, "Connection setup failed: {}", e),
            NegotiationError::Describe(e) => write!(f, "Description exchange failed: {}", e),
            NegotiationError::Candidate(e) => write!(f, "Candidate rejected: {}", e),
            NegotiationError::Track(e) => write!(f, "Track replacement failed: {}", e),
        }
    }
}

impl std::error::Error for NegotiationError {}

/// Kind of a media track attached to a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

/// Connectivity state of one peer link, as reported by the underlying layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkState::New => write!(f, "new"),
            LinkState::Connecting => write!(f, "connecting"),
            LinkState::Connected => write!(f, "connected"),
            LinkState::Disconnected => write!(f, "disconnected"),
            LinkState::Failed => write!(f, "failed"),
            LinkState::Closed => write!(f, "closed"),
        }
    }
}

/// Asynchronous notification from a peer link
#[derive(Debug, Clone)]
pub struct LinkEvent {
    pub remote: ConnectionId,
    pub kind: LinkEventKind,
}

#[derive(Debug, Clone)]
pub enum LinkEventKind {
    /// Connectivity state changed
    StateChanged(LinkState),
    /// The local side discovered a network-path candidate to trickle to the
    /// remote peer
    LocalCandidate(CandidateInit),
}

/// One point-to-point connection to a remote participant
#[async_trait]
pub trait PeerLink: Send + Sync {
    /// Handle to an outgoing media track, cheap to clone
    type Track: Clone + Send + Sync;

    /// Construct a local offer and store it as the local description
    async fn create_offer(&self) -> Result<SessionDescription, NegotiationError>;

    /// Apply a remote offer, construct an answer and store it as the local
    /// description
    async fn accept_offer(
        &self,
        offer: &SessionDescription,
    ) -> Result<SessionDescription, NegotiationError>;

    /// Apply a remote answer
    async fn accept_answer(&self, answer: &SessionDescription) -> Result<(), NegotiationError>;

    /// Apply a remote network-path candidate
    ///
    /// Callers must only do this once a remote description is set; the
    /// orchestrator queues earlier arrivals.
    async fn add_candidate(&self, candidate: CandidateInit) -> Result<(), NegotiationError>;

    /// Substitute the outgoing track of the given kind without renegotiating
    async fn replace_track(
        &self,
        kind: TrackKind,
        track: Self::Track,
    ) -> Result<(), NegotiationError>;

    /// Close the connection; safe to call more than once
    async fn close(&self);
}

/// Factory for peer links
#[async_trait]
pub trait PeerConnector: Send + Sync {
    type Link: PeerLink;

    /// Create a link to one remote participant
    ///
    /// `events` receives the link's state changes and locally discovered
    /// candidates, tagged with `remote`.
    async fn connect(
        &self,
        remote: ConnectionId,
        events: mpsc::Sender<LinkEvent>,
    ) -> Result<Self::Link, NegotiationError>;
}
