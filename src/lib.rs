//! # huddle-rs
//!
//! WebRTC signaling client/server library. Participants join a room by
//! short code and establish direct media connections with every other
//! participant; a small relay carries the connection-setup messages.
//!
//! The crate has two halves:
//!
//! - **Server**: [`server::RelayServer`] accepts WebSocket connections,
//!   validates joins against the [`registry::RoomRegistry`] (capacity, host
//!   designation, cleanup on disconnect) and routes negotiation messages
//!   point-to-point or as room multicast. Offer/answer/candidate payloads are
//!   opaque to the relay and forwarded verbatim.
//! - **Client**: [`client::Orchestrator`] runs one negotiation state machine
//!   per remote participant: creating and accepting offers, buffering
//!   out-of-order candidates, swapping outgoing tracks without renegotiation
//!   and tearing down on departure. The underlying peer connections sit
//!   behind [`client::peer::PeerConnector`], implemented over the `webrtc`
//!   crate ([`client::rtc`]) and as a deterministic mock ([`client::mock`]).
//!
//! Room creation and lookup is the [`api::RoomService`] collaborator backed
//! by a [`store::RoomStore`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use huddle::api::RoomService;
//! use huddle::registry::RoomRegistry;
//! use huddle::server::{RelayConfig, RelayServer};
//! use huddle::store::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> huddle::Result<()> {
//!     let store = Arc::new(MemoryStore::new());
//!     let registry = Arc::new(RoomRegistry::new(store.clone()));
//!     let rooms = RoomService::new(store, registry.clone());
//!
//!     let code = rooms.create().await?;
//!     println!("room code: {code}");
//!
//!     RelayServer::new(RelayConfig::default(), registry).run().await
//! }
//! ```

pub mod api;
pub mod client;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod store;

pub use error::{Error, Result};
pub use protocol::{ClientMessage, ConnectionId, ErrorKind, MemberInfo, ServerMessage};
pub use registry::RoomRegistry;
pub use server::{RelayConfig, RelayServer};
