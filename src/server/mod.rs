//! Signaling relay server
//!
//! WebSocket listener plus the message router. The relay is stateless per
//! message: joins and leaves are handed to the registry, negotiation
//! payloads are forwarded verbatim to their target connection, media-state
//! and chat messages fan out to the sender's room.
//!
//! ```text
//!   client ──ws──► connection pump ──► Relay::handle ──┬─► registry (join/leave)
//!                        ▲                             └─► Switchboard
//!                        │                                   │ send_to / multicast
//!                        └────────── outgoing mpsc ◄─────────┘
//! ```
//!
//! A transport-level disconnect takes exactly the same path as an explicit
//! leave message.

pub mod config;
pub mod connection;
pub mod listener;
pub mod router;
pub mod switchboard;

pub use config::RelayConfig;
pub use listener::RelayServer;
pub use router::Relay;
pub use switchboard::Switchboard;
