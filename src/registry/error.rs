//! Registry error types

use crate::protocol::ErrorKind;
use crate::store::StoreError;

/// Error type for registry operations
#[derive(Debug, Clone)]
pub enum RegistryError {
    /// Room code unknown or no longer active
    NotFound(String),
    /// Room is at capacity
    Full(String),
    /// The persistent store rejected the mutation; nothing was changed
    Store(StoreError),
}

impl RegistryError {
    /// The machine-checkable kind reported to clients
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::NotFound(_) => ErrorKind::NotFound,
            RegistryError::Full(_) => ErrorKind::Capacity,
            RegistryError::Store(_) => ErrorKind::Transport,
        }
    }
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::NotFound(code) => write!(f, "Room not found: {}", code),
            RegistryError::Full(code) => write!(f, "Room is full: {}", code),
            RegistryError::Store(e) => write!(f, "Failed to persist room: {}", e),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        RegistryError::Store(err)
    }
}
