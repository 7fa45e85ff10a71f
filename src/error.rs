//! Crate-level error type

use crate::client::peer::NegotiationError;
use crate::protocol::ErrorKind;
use crate::registry::RegistryError;
use crate::store::StoreError;

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Any error this crate can surface
#[derive(Debug)]
pub enum Error {
    /// Registry rejected a join or mutation
    Registry(RegistryError),
    /// Persistent store failure
    Store(StoreError),
    /// Peer negotiation failure, isolated to one remote participant
    Negotiation(NegotiationError),
    /// WebSocket transport failure
    Ws(tokio_tungstenite::tungstenite::Error),
    /// Wire (de)serialization failure
    Json(serde_json::Error),
    /// Socket-level I/O failure
    Io(std::io::Error),
}

impl Error {
    /// The machine-checkable kind reported to users
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Registry(e) => e.kind(),
            Error::Store(_) => ErrorKind::Transport,
            Error::Negotiation(_) => ErrorKind::Negotiation,
            Error::Ws(_) | Error::Json(_) | Error::Io(_) => ErrorKind::Transport,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Registry(e) => write!(f, "{}", e),
            Error::Store(e) => write!(f, "{}", e),
            Error::Negotiation(e) => write!(f, "{}", e),
            Error::Ws(e) => write!(f, "WebSocket error: {}", e),
            Error::Json(e) => write!(f, "Serialization error: {}", e),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Registry(e) => Some(e),
            Error::Store(e) => Some(e),
            Error::Negotiation(e) => Some(e),
            Error::Ws(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Io(e) => Some(e),
        }
    }
}

impl From<RegistryError> for Error {
    fn from(err: RegistryError) -> Self {
        Error::Registry(err)
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Error::Store(err)
    }
}

impl From<NegotiationError> for Error {
    fn from(err: NegotiationError) -> Self {
        Error::Negotiation(err)
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::Ws(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
