//! Room registry
//!
//! Authoritative membership state, one entry per room code. The registry is
//! mutated only by join and leave (a transport disconnect is a leave);
//! negotiation traffic never touches it.
//!
//! # Concurrency
//!
//! ```text
//!                       RoomRegistry
//!              ┌───────────────────────────────┐
//!              │ rooms: RwLock<HashMap<code,   │
//!              │   Arc<Mutex<Room>>>>          │
//!              │ memberships: RwLock<HashMap<  │
//!              │   ConnectionId, Membership>>  │
//!              └───────────────┬───────────────┘
//!                              │
//!            join("1234…") ────┤──── join("9876…")
//!            (serialized per   │     (independent room,
//!             room mutex)      │      no shared lock)
//! ```
//!
//! Each room has its own mutex, so the capacity check and the membership
//! append are one atomic step for that room while unrelated rooms proceed
//! concurrently. The membership map is the explicit connection-to-room
//! mapping the disconnect handler queries; it is updated by the same join
//! and leave operations that mutate the room.

pub mod error;
pub mod room;
pub mod rooms;

pub use error::RegistryError;
pub use room::{Membership, Participant, Room, RoomSummary};
pub use rooms::{Departure, JoinOutcome, RoomRegistry};
