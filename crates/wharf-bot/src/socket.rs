//! The protocol-socket abstraction.
//!
//! Everything below the [`ProtocolSocket`] trait — transport, encryption,
//! message framing, retry of individual sends — belongs to the external
//! protocol library. Wharf only calls these four operations and consumes the
//! event stream a [`SocketProvider`] hands back on connect.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use wharf_session::SessionAuth;
use wharf_types::{GroupMetadata, MessageInfo, MessageKey, ProtocolEvent, WharfError};

/// Errors from socket operations.
#[derive(Debug, Error)]
pub enum SocketError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("API returned error: {0}")]
    Api(String),

    #[error("socket closed")]
    Closed,
}

impl From<SocketError> for WharfError {
    fn from(e: SocketError) -> Self {
        WharfError::Socket(e.to_string())
    }
}

/// Content for an outbound message.
#[derive(Debug, Clone, Default)]
pub struct OutboundContent {
    /// The message text.
    pub text: String,
    /// JIDs to @-mention.
    pub mentions: Vec<String>,
    /// The message being quoted, for replies.
    pub quoted: Option<MessageKey>,
}

impl OutboundContent {
    /// Create plain text content.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Attach mentioned JIDs.
    pub fn with_mentions(mut self, mentions: Vec<String>) -> Self {
        self.mentions = mentions;
        self
    }

    /// Quote another message.
    pub fn quoting(mut self, key: MessageKey) -> Self {
        self.quoted = Some(key);
        self
    }
}

/// Callback the protocol library uses to read cached group metadata instead
/// of fetching it over the wire.
pub type GroupLookup = Arc<dyn Fn(&str) -> Option<GroupMetadata> + Send + Sync>;

/// One live connection to the protocol servers.
///
/// Implementations wrap the external protocol library; wharf never
/// reimplements any of its wire behavior.
#[async_trait]
pub trait ProtocolSocket: Send + Sync {
    /// Send a message to a chat.
    async fn send_message(
        &self,
        jid: &str,
        content: OutboundContent,
    ) -> Result<MessageInfo, SocketError>;

    /// Fetch group metadata over the wire.
    async fn group_metadata(&self, jid: &str) -> Result<GroupMetadata, SocketError>;

    /// Request a numeric pairing code for phone-number registration.
    async fn request_pairing_code(&self, phone_number: &str) -> Result<String, SocketError>;

    /// Close the connection.
    fn end(&self);
}

/// A freshly connected socket plus its event stream.
pub struct SocketHandle {
    pub socket: Arc<dyn ProtocolSocket>,
    pub events: mpsc::UnboundedReceiver<ProtocolEvent>,
}

/// Builds sockets. Called once on `connect()` and again on every reconnect.
#[async_trait]
pub trait SocketProvider: Send + Sync + 'static {
    /// Establish a connection using the given session auth state.
    ///
    /// `cached_group_metadata`, when present, lets the library serve group
    /// lookups from wharf's cache.
    async fn connect(
        &self,
        auth: Arc<SessionAuth>,
        cached_group_metadata: Option<GroupLookup>,
    ) -> Result<SocketHandle, SocketError>;
}

#[async_trait]
impl<T: SocketProvider> SocketProvider for Arc<T> {
    async fn connect(
        &self,
        auth: Arc<SessionAuth>,
        cached_group_metadata: Option<GroupLookup>,
    ) -> Result<SocketHandle, SocketError> {
        (**self).connect(auth, cached_group_metadata).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbound_content_builders() {
        let key = MessageKey {
            remote_jid: Some("1@s.whatsapp.net".into()),
            from_me: false,
            id: "ID".into(),
        };
        let content = OutboundContent::text("hi")
            .with_mentions(vec!["2@s.whatsapp.net".into()])
            .quoting(key.clone());
        assert_eq!(content.text, "hi");
        assert_eq!(content.mentions.len(), 1);
        assert_eq!(content.quoted, Some(key));
    }

    #[test]
    fn socket_error_maps_to_wharf_error() {
        let err: WharfError = SocketError::Api("boom".into()).into();
        assert!(matches!(err, WharfError::Socket(_)));
        assert!(err.to_string().contains("boom"));
    }
}
