//! Group metadata as delivered by the protocol library.
//!
//! Opaque to wharf beyond the `id` key the cache is keyed on.

use serde::{Deserialize, Serialize};

/// One member of a group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupParticipant {
    /// Member JID.
    pub id: String,
    /// `"admin"` / `"superadmin"` when the member has a role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<String>,
}

/// Metadata for one group chat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupMetadata {
    /// Group JID, e.g. `1234-5678@g.us`.
    pub id: String,
    /// Group subject line.
    pub subject: String,
    /// Owner JID, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub participants: Vec<GroupParticipant>,
}

impl GroupMetadata {
    /// Minimal metadata with just an id and subject.
    pub fn new(id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            owner: None,
            participants: Vec::new(),
        }
    }
}
