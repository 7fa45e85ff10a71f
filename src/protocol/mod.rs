//! Wire protocol for the signaling channel
//!
//! Every frame on the transport channel is a JSON object of the form
//! `{"event": "...", "data": {...}}`. Event names are kebab-case, payload
//! keys are camelCase, matching what browser clients send.
//!
//! Negotiation payloads (offer / answer / candidate) are opaque to the relay:
//! it forwards them verbatim to the target connection, tagging them with the
//! sender's connection id. Only join and leave mutate server-side state.

pub mod code;
pub mod message;

pub use code::{generate_code, CODE_LEN};
pub use message::{
    CandidateInit, ClientMessage, ConnectionId, ErrorKind, MemberInfo, SdpKind, ServerMessage,
    SessionDescription,
};
