//! Registry implementation

use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::{Mutex, RwLock};

use super::error::RegistryError;
use super::room::{Membership, Participant, Room, RoomSummary};
use crate::protocol::{ConnectionId, MemberInfo};
use crate::store::{RoomRecord, RoomStore};

/// Result of a successful join
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    /// Everyone who was already in the room, in join order
    pub existing: Vec<MemberInfo>,
    /// Whether this join designated the caller as host
    pub is_host: bool,
    /// Departure from the room this connection was in before, if any
    pub previous: Option<Departure>,
}

/// Result of a leave or disconnect that belonged to a room
#[derive(Debug, Clone)]
pub struct Departure {
    pub code: String,
    /// True if this was the last participant and the room was deactivated
    pub closed: bool,
}

/// Central registry of active rooms
///
/// Rooms are materialized into memory from the store on first join and
/// evicted when they empty out. All membership mutations are persisted
/// through the store before they are visible to other operations.
pub struct RoomRegistry {
    store: Arc<dyn RoomStore>,
    rooms: RwLock<HashMap<String, Arc<Mutex<Room>>>>,
    memberships: RwLock<HashMap<ConnectionId, Membership>>,
}

impl RoomRegistry {
    pub fn new(store: Arc<dyn RoomStore>) -> Self {
        Self {
            store,
            rooms: RwLock::new(HashMap::new()),
            memberships: RwLock::new(HashMap::new()),
        }
    }

    /// Seed a freshly created room into the in-memory map
    pub async fn register(&self, record: RoomRecord) {
        let mut rooms = self.rooms.write().await;
        rooms.insert(
            record.code.clone(),
            Arc::new(Mutex::new(Room::from_record(record))),
        );
    }

    /// Add a participant to a room
    ///
    /// The capacity check and the append happen under the room's mutex, so
    /// two concurrent joins can never both slip past the capacity boundary.
    /// The mutation is persisted before it is reported as successful; if the
    /// store refuses, the in-memory append is rolled back and the join fails
    /// with nothing changed on either side.
    ///
    /// A connection belongs to at most one room. A successful join into a
    /// new room runs the leave path for the old one and reports it in
    /// `JoinOutcome::previous`; a rejected join leaves the old membership
    /// untouched.
    pub async fn join(
        &self,
        code: &str,
        connection_id: ConnectionId,
        display_name: &str,
    ) -> Result<JoinOutcome, RegistryError> {
        let room_arc = self.room_entry(code).await?;
        let mut room = room_arc.lock().await;

        if !room.active {
            return Err(RegistryError::NotFound(code.to_string()));
        }
        if room.is_member(connection_id) {
            // Same connection joining twice; membership is unchanged.
            return Ok(JoinOutcome {
                existing: room.members_except(connection_id),
                is_host: room.host == Some(connection_id),
                previous: None,
            });
        }
        if room.participants.len() >= room.capacity {
            return Err(RegistryError::Full(code.to_string()));
        }

        room.participants.push(Participant {
            connection_id,
            display_name: display_name.to_string(),
            joined_at: SystemTime::now(),
        });
        let became_host = room.host.is_none();
        if became_host {
            room.host = Some(connection_id);
        }

        if let Err(e) = self.store.update(&room.to_record()).await {
            room.participants.pop();
            if became_host {
                room.host = None;
            }
            return Err(RegistryError::Store(e));
        }

        let existing = room.members_except(connection_id);
        let is_host = room.host == Some(connection_id);
        drop(room);

        // The new membership is secured; depart the old room, if any. Both
        // room mutexes are never held at once.
        let prior_code = self
            .memberships
            .read()
            .await
            .get(&connection_id)
            .map(|m| m.code.clone());
        let previous = match prior_code {
            Some(prior) if prior != code => self.leave(connection_id).await,
            _ => None,
        };

        self.memberships.write().await.insert(
            connection_id,
            Membership {
                code: code.to_string(),
                display_name: display_name.to_string(),
            },
        );

        tracing::info!(
            room = %code,
            connection = %connection_id,
            name = %display_name,
            host = is_host,
            "Participant joined"
        );

        Ok(JoinOutcome {
            existing,
            is_host,
            previous,
        })
    }

    /// Remove a connection from whatever room it belongs to
    ///
    /// Idempotent: a connection that is not a member of anything is a no-op,
    /// not an error. Deactivates and evicts the room when the last
    /// participant leaves, which makes the code reusable.
    pub async fn leave(&self, connection_id: ConnectionId) -> Option<Departure> {
        let membership = self.memberships.write().await.remove(&connection_id)?;

        let room_arc = {
            let rooms = self.rooms.read().await;
            rooms.get(&membership.code)?.clone()
        };

        let mut room = room_arc.lock().await;
        room.participants
            .retain(|p| p.connection_id != connection_id);
        let closed = room.participants.is_empty();
        if closed {
            room.active = false;
        }

        if let Err(e) = self.store.update(&room.to_record()).await {
            // The participant is gone either way; the record catches up on
            // the next successful write.
            tracing::error!(room = %room.code, error = %e, "Failed to persist leave");
        }
        drop(room);

        if closed {
            self.rooms.write().await.remove(&membership.code);
            tracing::info!(room = %membership.code, "Room emptied, deactivated");
        }

        tracing::info!(
            room = %membership.code,
            connection = %connection_id,
            "Participant left"
        );

        Some(Departure {
            code: membership.code,
            closed,
        })
    }

    /// Read-only lookup of a room summary; never mutates
    pub async fn lookup(&self, code: &str) -> Option<RoomSummary> {
        if let Some(room_arc) = self.rooms.read().await.get(code) {
            let room = room_arc.lock().await;
            if room.active {
                return Some(room.summary());
            }
            return None;
        }

        match self.store.find_active(code).await {
            Ok(record) => record.map(|r| RoomSummary::from_record(&r)),
            Err(e) => {
                tracing::error!(room = %code, error = %e, "Store lookup failed");
                None
            }
        }
    }

    /// Current members of a room, in join order
    pub async fn members(&self, code: &str) -> Vec<MemberInfo> {
        let room_arc = {
            let rooms = self.rooms.read().await;
            match rooms.get(code) {
                Some(arc) => arc.clone(),
                None => return Vec::new(),
            }
        };
        let room = room_arc.lock().await;
        room.participants.iter().map(Participant::info).collect()
    }

    /// Which room a connection belongs to, if any
    pub async fn membership(&self, connection_id: ConnectionId) -> Option<Membership> {
        self.memberships.read().await.get(&connection_id).cloned()
    }

    /// Evict a room from the in-memory map (used when the resource API
    /// closes a room out from under it)
    pub async fn evict(&self, code: &str) {
        let removed = self.rooms.write().await.remove(code);
        if let Some(room_arc) = removed {
            let room = room_arc.lock().await;
            let mut memberships = self.memberships.write().await;
            for p in &room.participants {
                memberships.remove(&p.connection_id);
            }
        }
    }

    async fn room_entry(&self, code: &str) -> Result<Arc<Mutex<Room>>, RegistryError> {
        if let Some(room) = self.rooms.read().await.get(code) {
            return Ok(room.clone());
        }

        let record = self
            .store
            .find_active(code)
            .await?
            .ok_or_else(|| RegistryError::NotFound(code.to_string()))?;

        // Another join for the same code may have materialized it first.
        let mut rooms = self.rooms.write().await;
        let entry = rooms
            .entry(code.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Room::from_record(record))));
        Ok(entry.clone())
    }
}
