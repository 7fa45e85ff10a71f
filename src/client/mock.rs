//! Mock peer connections for testing and simulation
//!
//! Deterministic stand-ins for the `webrtc` layer: descriptions are
//! synthesized strings, candidates and track swaps are recorded, and the
//! link reports `Connected` as soon as the description exchange completes.
//! The connector keeps a handle to every link it creates so tests can
//! inspect negotiation results from the outside.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::peer::{
    LinkEvent, LinkEventKind, LinkState, NegotiationError, PeerConnector, PeerLink, TrackKind,
};
use crate::protocol::{CandidateInit, ConnectionId, SdpKind, SessionDescription};

/// Mock [`PeerConnector`]
#[derive(Default)]
pub struct MockConnector {
    links: Mutex<HashMap<ConnectionId, MockLink>>,
    fail_next: AtomicBool,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `connect` call fail
    pub fn fail_next_connect(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Handle to the link created for `remote`, if any
    pub fn link(&self, remote: ConnectionId) -> Option<MockLink> {
        self.links.lock().unwrap().get(&remote).cloned()
    }

    /// Number of links created so far (including closed ones)
    pub fn link_count(&self) -> usize {
        self.links.lock().unwrap().len()
    }
}

#[async_trait]
impl PeerConnector for MockConnector {
    type Link = MockLink;

    async fn connect(
        &self,
        remote: ConnectionId,
        events: mpsc::Sender<LinkEvent>,
    ) -> Result<Self::Link, NegotiationError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(NegotiationError::Connect("injected fault".to_string()));
        }

        let link = MockLink {
            remote,
            events,
            inner: Arc::new(Mutex::new(MockLinkInner::default())),
        };
        self.links.lock().unwrap().insert(remote, link.clone());
        Ok(link)
    }
}

#[derive(Default)]
struct MockLinkInner {
    local_description: Option<SessionDescription>,
    remote_description: Option<SessionDescription>,
    applied_candidates: Vec<CandidateInit>,
    tracks: HashMap<TrackKind, String>,
    closed: bool,
}

/// Mock [`PeerLink`]; clones share state
#[derive(Clone)]
pub struct MockLink {
    remote: ConnectionId,
    events: mpsc::Sender<LinkEvent>,
    inner: Arc<Mutex<MockLinkInner>>,
}

impl MockLink {
    pub fn local_description(&self) -> Option<SessionDescription> {
        self.inner.lock().unwrap().local_description.clone()
    }

    pub fn remote_description(&self) -> Option<SessionDescription> {
        self.inner.lock().unwrap().remote_description.clone()
    }

    /// Candidates applied so far, in application order
    pub fn applied_candidates(&self) -> Vec<CandidateInit> {
        self.inner.lock().unwrap().applied_candidates.clone()
    }

    /// Current outgoing track of the given kind
    pub fn track(&self, kind: TrackKind) -> Option<String> {
        self.inner.lock().unwrap().tracks.get(&kind).cloned()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().unwrap().closed
    }

    /// Push a state change as the underlying layer would
    pub fn report_state(&self, state: LinkState) {
        let _ = self.events.try_send(LinkEvent {
            remote: self.remote,
            kind: LinkEventKind::StateChanged(state),
        });
    }

    /// Push a locally discovered candidate as the underlying layer would
    pub fn report_local_candidate(&self, candidate: CandidateInit) {
        let _ = self.events.try_send(LinkEvent {
            remote: self.remote,
            kind: LinkEventKind::LocalCandidate(candidate),
        });
    }

    fn guard_open(inner: &MockLinkInner, what: &str) -> Result<(), NegotiationError> {
        if inner.closed {
            return Err(NegotiationError::Describe(format!("{} on closed link", what)));
        }
        Ok(())
    }
}

#[async_trait]
impl PeerLink for MockLink {
    type Track = String;

    async fn create_offer(&self) -> Result<SessionDescription, NegotiationError> {
        let mut inner = self.inner.lock().unwrap();
        Self::guard_open(&inner, "create_offer")?;
        let offer = SessionDescription::offer(format!("mock-offer-for-{}", self.remote));
        inner.local_description = Some(offer.clone());
        Ok(offer)
    }

    async fn accept_offer(
        &self,
        offer: &SessionDescription,
    ) -> Result<SessionDescription, NegotiationError> {
        if offer.kind != SdpKind::Offer {
            return Err(NegotiationError::Describe("not an offer".to_string()));
        }
        let answer = {
            let mut inner = self.inner.lock().unwrap();
            Self::guard_open(&inner, "accept_offer")?;
            inner.remote_description = Some(offer.clone());
            let answer = SessionDescription::answer(format!("mock-answer-for-{}", self.remote));
            inner.local_description = Some(answer.clone());
            answer
        };
        // Answerer side is connected once both descriptions are in place
        self.report_state(LinkState::Connected);
        Ok(answer)
    }

    async fn accept_answer(&self, answer: &SessionDescription) -> Result<(), NegotiationError> {
        if answer.kind != SdpKind::Answer {
            return Err(NegotiationError::Describe("not an answer".to_string()));
        }
        {
            let mut inner = self.inner.lock().unwrap();
            Self::guard_open(&inner, "accept_answer")?;
            inner.remote_description = Some(answer.clone());
        }
        self.report_state(LinkState::Connected);
        Ok(())
    }

    async fn add_candidate(&self, candidate: CandidateInit) -> Result<(), NegotiationError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.closed {
            return Err(NegotiationError::Candidate("link closed".to_string()));
        }
        if inner.remote_description.is_none() {
            return Err(NegotiationError::Candidate(
                "no remote description".to_string(),
            ));
        }
        inner.applied_candidates.push(candidate);
        Ok(())
    }

    async fn replace_track(
        &self,
        kind: TrackKind,
        track: Self::Track,
    ) -> Result<(), NegotiationError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.closed {
            return Err(NegotiationError::Track("link closed".to_string()));
        }
        inner.tracks.insert(kind, track);
        Ok(())
    }

    async fn close(&self) {
        self.inner.lock().unwrap().closed = true;
    }
}
