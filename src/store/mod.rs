//! Persistent room store
//!
//! The registry's storage collaborator, consumed only through the
//! [`RoomStore`] trait: insert a new room, find an active room by code,
//! persist membership updates, close a room. Durability guarantees are the
//! implementation's business; [`MemoryStore`] is the reference
//! implementation and the one the demos and tests run against.

pub mod memory;
pub mod record;

pub use memory::MemoryStore;
pub use record::{ParticipantRecord, RoomRecord};

use async_trait::async_trait;

/// Error type for store operations
#[derive(Debug, Clone)]
pub enum StoreError {
    /// The backing store could not be reached or refused the operation
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unavailable(reason) => write!(f, "Store unavailable: {}", reason),
        }
    }
}

impl std::error::Error for StoreError {}

/// Persistent storage for room records
///
/// A room code is unique among *active* rooms; closed rooms keep their
/// records but no longer claim the code.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Insert a freshly created room
    async fn insert(&self, record: RoomRecord) -> Result<(), StoreError>;

    /// Find the active room with the given code, if any
    async fn find_active(&self, code: &str) -> Result<Option<RoomRecord>, StoreError>;

    /// Persist the current state of a room (membership, host, active flag)
    async fn update(&self, record: &RoomRecord) -> Result<(), StoreError>;

    /// Close the active room with the given code
    ///
    /// Returns false if no active room had that code.
    async fn close(&self, code: &str) -> Result<bool, StoreError>;
}
