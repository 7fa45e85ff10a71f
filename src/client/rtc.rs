//! Peer links over the `webrtc` crate
//!
//! One `RTCPeerConnection` per remote participant, configured with the
//! public STUN servers unless told otherwise. The local capture tracks are
//! owned by the [`RtcConnector`] and attached to every link it creates;
//! `replace_track` swaps a sender's track in place, so switching between
//! camera and screen capture never renegotiates.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_local::TrackLocal;

use super::peer::{
    LinkEvent, LinkEventKind, LinkState, NegotiationError, PeerConnector, PeerLink, TrackKind,
};
use crate::protocol::{CandidateInit, ConnectionId, SessionDescription};

/// Shared handle to an outgoing track
pub type LocalTrack = Arc<dyn TrackLocal + Send + Sync>;

/// WebRTC connector configuration
#[derive(Debug, Clone)]
pub struct RtcConfig {
    /// STUN server URLs used for connectivity establishment
    pub stun_servers: Vec<String>,
}

impl Default for RtcConfig {
    fn default() -> Self {
        Self {
            stun_servers: vec![
                "stun:stun.l.google.com:19302".to_string(),
                "stun:stun1.l.google.com:19302".to_string(),
                "stun:stun2.l.google.com:19302".to_string(),
            ],
        }
    }
}

/// [`PeerConnector`] over the `webrtc` crate
pub struct RtcConnector {
    config: RtcConfig,
    /// Local capture tracks, attached to every new link. The connector
    /// reads the capture device's tracks; it does not own the device.
    tracks: Mutex<Vec<LocalTrack>>,
}

impl RtcConnector {
    pub fn new(config: RtcConfig) -> Self {
        Self {
            config,
            tracks: Mutex::new(Vec::new()),
        }
    }

    /// Attach an outgoing track to all future links
    pub fn add_local_track(&self, track: LocalTrack) {
        let mut tracks = self.tracks.lock().unwrap_or_else(|e| e.into_inner());
        tracks.push(track);
    }

    fn local_tracks(&self) -> Vec<LocalTrack> {
        self.tracks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl PeerConnector for RtcConnector {
    type Link = RtcLink;

    async fn connect(
        &self,
        remote: ConnectionId,
        events: mpsc::Sender<LinkEvent>,
    ) -> Result<Self::Link, NegotiationError> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| NegotiationError::Connect(e.to_string()))?;
        let mut registry = Registry::new();
        registry = register_default_interceptors(registry, &mut media_engine)
            .map_err(|e| NegotiationError::Connect(e.to_string()))?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let config = RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: self.config.stun_servers.clone(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let pc = Arc::new(
            api.new_peer_connection(config)
                .await
                .map_err(|e| NegotiationError::Connect(e.to_string()))?,
        );

        for track in self.local_tracks() {
            pc.add_track(track)
                .await
                .map_err(|e| NegotiationError::Connect(e.to_string()))?;
        }

        let tx = events.clone();
        pc.on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
            let tx = tx.clone();
            Box::pin(async move {
                let Some(candidate) = candidate else { return };
                match candidate.to_json() {
                    Ok(init) => {
                        let _ = tx
                            .send(LinkEvent {
                                remote,
                                kind: LinkEventKind::LocalCandidate(CandidateInit {
                                    candidate: init.candidate,
                                    sdp_mid: init.sdp_mid,
                                    sdp_mline_index: init.sdp_mline_index,
                                    username_fragment: init.username_fragment,
                                }),
                            })
                            .await;
                    }
                    Err(e) => {
                        tracing::warn!(remote = %remote, error = %e, "Candidate serialization failed");
                    }
                }
            })
        }));

        let tx = events;
        pc.on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
            let tx = tx.clone();
            Box::pin(async move {
                let _ = tx
                    .send(LinkEvent {
                        remote,
                        kind: LinkEventKind::StateChanged(map_state(state)),
                    })
                    .await;
            })
        }));

        Ok(RtcLink { remote, pc })
    }
}

/// One `RTCPeerConnection` wrapped as a [`PeerLink`]
pub struct RtcLink {
    remote: ConnectionId,
    pc: Arc<RTCPeerConnection>,
}

#[async_trait]
impl PeerLink for RtcLink {
    type Track = LocalTrack;

    async fn create_offer(&self) -> Result<SessionDescription, NegotiationError> {
        let offer = self
            .pc
            .create_offer(None)
            .await
            .map_err(|e| NegotiationError::Describe(e.to_string()))?;
        self.pc
            .set_local_description(offer.clone())
            .await
            .map_err(|e| NegotiationError::Describe(e.to_string()))?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn accept_offer(
        &self,
        offer: &SessionDescription,
    ) -> Result<SessionDescription, NegotiationError> {
        let remote = RTCSessionDescription::offer(offer.sdp.clone())
            .map_err(|e| NegotiationError::Describe(e.to_string()))?;
        self.pc
            .set_remote_description(remote)
            .await
            .map_err(|e| NegotiationError::Describe(e.to_string()))?;

        let answer = self
            .pc
            .create_answer(None)
            .await
            .map_err(|e| NegotiationError::Describe(e.to_string()))?;
        self.pc
            .set_local_description(answer.clone())
            .await
            .map_err(|e| NegotiationError::Describe(e.to_string()))?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn accept_answer(&self, answer: &SessionDescription) -> Result<(), NegotiationError> {
        let remote = RTCSessionDescription::answer(answer.sdp.clone())
            .map_err(|e| NegotiationError::Describe(e.to_string()))?;
        self.pc
            .set_remote_description(remote)
            .await
            .map_err(|e| NegotiationError::Describe(e.to_string()))
    }

    async fn add_candidate(&self, candidate: CandidateInit) -> Result<(), NegotiationError> {
        self.pc
            .add_ice_candidate(RTCIceCandidateInit {
                candidate: candidate.candidate,
                sdp_mid: candidate.sdp_mid,
                sdp_mline_index: candidate.sdp_mline_index,
                username_fragment: candidate.username_fragment,
            })
            .await
            .map_err(|e| NegotiationError::Candidate(e.to_string()))
    }

    async fn replace_track(
        &self,
        kind: TrackKind,
        track: Self::Track,
    ) -> Result<(), NegotiationError> {
        let wanted = match kind {
            TrackKind::Audio => RTPCodecType::Audio,
            TrackKind::Video => RTPCodecType::Video,
        };

        for sender in self.pc.get_senders().await {
            let matches = match sender.track().await {
                Some(current) => current.kind() == wanted,
                None => false,
            };
            if matches {
                sender
                    .replace_track(Some(track.clone()))
                    .await
                    .map_err(|e| NegotiationError::Track(e.to_string()))?;
            }
        }
        Ok(())
    }

    async fn close(&self) {
        if let Err(e) = self.pc.close().await {
            tracing::debug!(remote = %self.remote, error = %e, "Close failed");
        }
    }
}

fn map_state(state: RTCPeerConnectionState) -> LinkState {
    match state {
        RTCPeerConnectionState::New | RTCPeerConnectionState::Unspecified => LinkState::New,
        RTCPeerConnectionState::Connecting => LinkState::Connecting,
        RTCPeerConnectionState::Connected => LinkState::Connected,
        RTCPeerConnectionState::Disconnected => LinkState::Disconnected,
        RTCPeerConnectionState::Failed => LinkState::Failed,
        RTCPeerConnectionState::Closed => LinkState::Closed,
    }
}
