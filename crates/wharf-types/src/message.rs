//! Inbound message model.
//!
//! Mirrors the subset of the protocol library's message structure that the
//! dispatcher needs: the addressing key and the content variants text can be
//! extracted from.

use serde::{Deserialize, Serialize};

/// A contact on the network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contact {
    /// Full JID, e.g. `123456789@s.whatsapp.net`.
    pub id: String,
    /// Display name, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Addressing information for a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageKey {
    /// The chat the message belongs to (user or group JID).
    pub remote_jid: Option<String>,
    /// Whether the message was sent by this account.
    #[serde(default)]
    pub from_me: bool,
    /// Platform-assigned message id.
    pub id: String,
}

/// The content variants this layer understands.
///
/// Anything else the library delivers is carried as [`MessageContent::Other`]
/// so it still flows through event callbacks; only the first three variants
/// can yield command text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageContent {
    /// A plain text message.
    Conversation { text: String },
    /// An extended text message (links, quotes, formatting).
    ExtendedText { text: String },
    /// An image with an optional caption.
    Image { caption: Option<String> },
    /// Any other content kind, untyped.
    Other,
}

/// An inbound message with its key and content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageInfo {
    pub key: MessageKey,
    /// `None` for key-only updates (deletes, protocol messages).
    pub content: Option<MessageContent>,
    /// Sender's push name, if the library delivered one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_name: Option<String>,
}

impl MessageInfo {
    /// Build a plain text message addressed to `remote_jid`.
    pub fn text(remote_jid: impl Into<String>, id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: MessageKey {
                remote_jid: Some(remote_jid.into()),
                from_me: false,
                id: id.into(),
            },
            content: Some(MessageContent::Conversation { text: text.into() }),
            push_name: None,
        }
    }

    /// Extract dispatchable text: the first non-empty of plain text,
    /// extended text, or image caption.
    pub fn text_content(&self) -> Option<&str> {
        let content = self.content.as_ref()?;
        let text = match content {
            MessageContent::Conversation { text } => text.as_str(),
            MessageContent::ExtendedText { text } => text.as_str(),
            MessageContent::Image { caption } => caption.as_deref().unwrap_or(""),
            MessageContent::Other => "",
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
