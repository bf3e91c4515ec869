//! Error types shared across all wharf crates.

/// Errors that can occur across the wharf runtime.
///
/// Each variant corresponds to a different subsystem: session store,
/// serialization, configuration, or the protocol socket.
#[derive(Debug, thiserror::Error)]
pub enum WharfError {
    #[error("session store error: {0}")]
    Store(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("client is not connected")]
    NotConnected,

    #[error("client is already connected")]
    AlreadyConnected,

    #[error("socket error: {0}")]
    Socket(String),

    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl From<serde_json::Error> for WharfError {
    fn from(e: serde_json::Error) -> Self {
        WharfError::Serde(e.to_string())
    }
}
