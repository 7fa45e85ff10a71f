//! Client-side room participation
//!
//! A participant wires three pieces together:
//!
//! ```text
//!   SignalingClient ◄──websocket──► relay
//!        │  ▲
//!   recv │  │ sender
//!        ▼  │
//!   Orchestrator ──► PeerConnector ──► one PeerLink per remote
//!        │
//!        ▼
//!   RoomEvent stream (presentation layer)
//! ```
//!
//! [`Orchestrator`] is generic over [`PeerConnector`] so the negotiation
//! logic runs against [`MockConnector`] in tests and [`RtcConnector`] in
//! production.

pub mod mock;
pub mod orchestrator;
pub mod peer;
pub mod rtc;
pub mod signaling;

pub use mock::{MockConnector, MockLink};
pub use orchestrator::{Orchestrator, Phase, Role, RoomEvent};
pub use peer::{
    LinkEvent, LinkEventKind, LinkState, NegotiationError, PeerConnector, PeerLink, TrackKind,
};
pub use rtc::{LocalTrack, RtcConfig, RtcConnector, RtcLink};
pub use signaling::SignalingClient;
