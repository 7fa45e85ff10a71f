//! Stored room shape

use std::time::SystemTime;

use crate::protocol::ConnectionId;

/// Default room capacity when none is requested
pub const DEFAULT_CAPACITY: usize = 8;

/// One participant as persisted
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantRecord {
    pub connection_id: ConnectionId,
    pub display_name: String,
    pub joined_at: SystemTime,
}

/// One room as persisted
///
/// `participants` is ordered by join time; the first joiner is recorded as
/// host and the slot is never reassigned afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomRecord {
    pub code: String,
    pub host: Option<ConnectionId>,
    pub participants: Vec<ParticipantRecord>,
    pub capacity: usize,
    pub active: bool,
    pub created_at: SystemTime,
}

impl RoomRecord {
    /// Create a new empty, active room
    pub fn new(code: impl Into<String>, capacity: usize) -> Self {
        Self {
            code: code.into(),
            host: None,
            participants: Vec::new(),
            capacity,
            active: true,
            created_at: SystemTime::now(),
        }
    }
}
