//! In-memory store implementation

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{RoomRecord, RoomStore, StoreError};

/// In-memory [`RoomStore`]
///
/// Keyed by room code. A closed room's record is replaced outright if a new
/// active room is later created with the same code.
#[derive(Default)]
pub struct MemoryStore {
    rooms: RwLock<HashMap<String, RoomRecord>>,
    fail_next: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next write operation fail
    ///
    /// Used by tests to exercise the rollback path: a failed persist must not
    /// leave in-memory registry state ahead of the store.
    pub fn fail_next_write(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn check_fault(&self) -> Result<(), StoreError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected fault".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn insert(&self, record: RoomRecord) -> Result<(), StoreError> {
        self.check_fault()?;
        let mut rooms = self.rooms.write().await;
        rooms.insert(record.code.clone(), record);
        Ok(())
    }

    async fn find_active(&self, code: &str) -> Result<Option<RoomRecord>, StoreError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.get(code).filter(|r| r.active).cloned())
    }

    async fn update(&self, record: &RoomRecord) -> Result<(), StoreError> {
        self.check_fault()?;
        let mut rooms = self.rooms.write().await;
        rooms.insert(record.code.clone(), record.clone());
        Ok(())
    }

    async fn close(&self, code: &str) -> Result<bool, StoreError> {
        self.check_fault()?;
        let mut rooms = self.rooms.write().await;
        match rooms.get_mut(code) {
            Some(record) if record.active => {
                record.active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_active_ignores_closed_rooms() {
        let store = MemoryStore::new();
        store
            .insert(RoomRecord::new("12345678", 8))
            .await
            .unwrap();

        assert!(store.find_active("12345678").await.unwrap().is_some());
        assert!(store.close("12345678").await.unwrap());
        assert!(store.find_active("12345678").await.unwrap().is_none());

        // Closing again reports not-found
        assert!(!store.close("12345678").await.unwrap());
    }

    #[tokio::test]
    async fn test_closed_code_is_reusable() {
        let store = MemoryStore::new();
        store.insert(RoomRecord::new("12345678", 8)).await.unwrap();
        store.close("12345678").await.unwrap();

        store.insert(RoomRecord::new("12345678", 4)).await.unwrap();
        let room = store.find_active("12345678").await.unwrap().unwrap();
        assert_eq!(room.capacity, 4);
    }

    #[tokio::test]
    async fn test_injected_fault_fails_one_write() {
        let store = MemoryStore::new();
        store.fail_next_write();

        assert!(store.insert(RoomRecord::new("12345678", 8)).await.is_err());
        assert!(store.insert(RoomRecord::new("12345678", 8)).await.is_ok());
    }
}
