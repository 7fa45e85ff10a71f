//! Room resource API
//!
//! The create / fetch / close collaborator consumed by whatever request
//! framing sits in front of the system. Transport-agnostic on purpose: an
//! HTTP layer maps these three calls onto routes, this module owns the
//! semantics (unique code generation against active rooms, summaries,
//! closing).

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::protocol::code::generate_code;
use crate::registry::{RegistryError, RoomRegistry, RoomSummary};
use crate::store::{record::DEFAULT_CAPACITY, RoomRecord, RoomStore};

/// Room creation and lookup service
pub struct RoomService {
    store: Arc<dyn RoomStore>,
    registry: Arc<RoomRegistry>,
    capacity: usize,
}

impl RoomService {
    pub fn new(store: Arc<dyn RoomStore>, registry: Arc<RoomRegistry>) -> Self {
        Self {
            store,
            registry,
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Set the capacity newly created rooms get
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Create a new room and return its code
    pub async fn create(&self) -> Result<String> {
        let code = self.unique_code().await?;
        let record = RoomRecord::new(code.clone(), self.capacity);
        self.store.insert(record.clone()).await?;
        self.registry.register(record).await;

        tracing::info!(room = %code, capacity = self.capacity, "Room created");
        Ok(code)
    }

    /// Fetch the summary of an active room
    pub async fn fetch(&self, code: &str) -> Result<RoomSummary> {
        self.registry
            .lookup(code)
            .await
            .ok_or_else(|| Error::Registry(RegistryError::NotFound(code.to_string())))
    }

    /// Close an active room
    pub async fn close(&self, code: &str) -> Result<()> {
        if !self.store.close(code).await? {
            return Err(Error::Registry(RegistryError::NotFound(code.to_string())));
        }
        self.registry.evict(code).await;
        tracing::info!(room = %code, "Room closed");
        Ok(())
    }

    /// Generate a code no active room is using
    ///
    /// Codes of closed rooms are fair game, so the collision check only
    /// consults active records.
    async fn unique_code(&self) -> Result<String> {
        loop {
            let code = {
                let mut rng = rand::thread_rng();
                generate_code(&mut rng)
            };
            if self.store.find_active(&code).await?.is_none() {
                return Ok(code);
            }
            tracing::debug!(room = %code, "Code collision, retrying");
        }
    }
}
