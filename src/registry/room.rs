//! In-memory room state

use std::time::SystemTime;

use crate::protocol::{ConnectionId, MemberInfo};
use crate::store::{ParticipantRecord, RoomRecord};

/// One connected member of a room
///
/// Keyed by connection id, which is unique per transport connection, not per
/// person. Created on join, removed on leave or disconnect, never mutated
/// otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub connection_id: ConnectionId,
    pub display_name: String,
    pub joined_at: SystemTime,
}

impl Participant {
    pub fn info(&self) -> MemberInfo {
        MemberInfo {
            connection_id: self.connection_id,
            display_name: self.display_name.clone(),
        }
    }
}

/// Live state of one room
///
/// `participants` keeps insertion order, so its order is the join order.
/// The host slot is set by the first join and never reassigned, even after
/// the host leaves.
#[derive(Debug)]
pub struct Room {
    pub code: String,
    pub host: Option<ConnectionId>,
    pub participants: Vec<Participant>,
    pub capacity: usize,
    pub active: bool,
    pub created_at: SystemTime,
}

impl Room {
    pub fn from_record(record: RoomRecord) -> Self {
        Self {
            code: record.code,
            host: record.host,
            participants: record
                .participants
                .into_iter()
                .map(|p| Participant {
                    connection_id: p.connection_id,
                    display_name: p.display_name,
                    joined_at: p.joined_at,
                })
                .collect(),
            capacity: record.capacity,
            active: record.active,
            created_at: record.created_at,
        }
    }

    pub fn to_record(&self) -> RoomRecord {
        RoomRecord {
            code: self.code.clone(),
            host: self.host,
            participants: self
                .participants
                .iter()
                .map(|p| ParticipantRecord {
                    connection_id: p.connection_id,
                    display_name: p.display_name.clone(),
                    joined_at: p.joined_at,
                })
                .collect(),
            capacity: self.capacity,
            active: self.active,
            created_at: self.created_at,
        }
    }

    pub fn is_member(&self, connection_id: ConnectionId) -> bool {
        self.participants
            .iter()
            .any(|p| p.connection_id == connection_id)
    }

    /// Everyone currently in the room except `except`
    pub fn members_except(&self, except: ConnectionId) -> Vec<MemberInfo> {
        self.participants
            .iter()
            .filter(|p| p.connection_id != except)
            .map(Participant::info)
            .collect()
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            code: self.code.clone(),
            participant_count: self.participants.len(),
            capacity: self.capacity,
            created_at: self.created_at,
        }
    }
}

/// Read-only view of a room, served by lookups
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSummary {
    pub code: String,
    pub participant_count: usize,
    pub capacity: usize,
    pub created_at: SystemTime,
}

impl RoomSummary {
    pub fn from_record(record: &RoomRecord) -> Self {
        Self {
            code: record.code.clone(),
            participant_count: record.participants.len(),
            capacity: record.capacity,
            created_at: record.created_at,
        }
    }
}

/// Which room a connection currently belongs to
///
/// A connection belongs to at most one room at a time. Kept in the
/// registry's membership map rather than as out-of-band annotations on the
/// transport connection itself.
#[derive(Debug, Clone)]
pub struct Membership {
    pub code: String,
    pub display_name: String,
}
