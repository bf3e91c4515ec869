//! Signal-key category names.
//!
//! The protocol library addresses key material by wire names like
//! `"pre-key"`; the stored document uses camel-case bucket names like
//! `"preKeys"`. Keeping the mapping as a fieldless enum makes an unmapped
//! category an explicit `None` at the lookup site instead of a silent miss
//! in a string table.

use serde::{Deserialize, Serialize};

/// The six key categories the protocol library stores.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum KeyCategory {
    PreKey,
    Session,
    SenderKey,
    AppStateSyncKey,
    AppStateSyncVersion,
    SenderKeyMemory,
}

impl KeyCategory {
    /// All categories, for exhaustive iteration.
    pub const ALL: [KeyCategory; 6] = [
        KeyCategory::PreKey,
        KeyCategory::Session,
        KeyCategory::SenderKey,
        KeyCategory::AppStateSyncKey,
        KeyCategory::AppStateSyncVersion,
        KeyCategory::SenderKeyMemory,
    ];

    /// The name the protocol library uses on its key-store interface.
    pub fn wire_name(&self) -> &'static str {
        match self {
            KeyCategory::PreKey => "pre-key",
            KeyCategory::Session => "session",
            KeyCategory::SenderKey => "sender-key",
            KeyCategory::AppStateSyncKey => "app-state-sync-key",
            KeyCategory::AppStateSyncVersion => "app-state-sync-version",
            KeyCategory::SenderKeyMemory => "sender-key-memory",
        }
    }

    /// The bucket name used in the persisted document.
    pub fn storage_name(&self) -> &'static str {
        match self {
            KeyCategory::PreKey => "preKeys",
            KeyCategory::Session => "sessions",
            KeyCategory::SenderKey => "senderKeys",
            KeyCategory::AppStateSyncKey => "appStateSyncKeys",
            KeyCategory::AppStateSyncVersion => "appStateVersions",
            KeyCategory::SenderKeyMemory => "senderKeyMemory",
        }
    }

    /// Look a category up by its wire name.
    pub fn from_wire(name: &str) -> Option<KeyCategory> {
        KeyCategory::ALL
            .into_iter()
            .find(|c| c.wire_name() == name)
    }

    /// Look a category up by its storage bucket name.
    pub fn from_storage(name: &str) -> Option<KeyCategory> {
        KeyCategory::ALL
            .into_iter()
            .find(|c| c.storage_name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_map_exhaustively() {
        let expected = [
            (KeyCategory::PreKey, "pre-key", "preKeys"),
            (KeyCategory::Session, "session", "sessions"),
            (KeyCategory::SenderKey, "sender-key", "senderKeys"),
            (
                KeyCategory::AppStateSyncKey,
                "app-state-sync-key",
                "appStateSyncKeys",
            ),
            (
                KeyCategory::AppStateSyncVersion,
                "app-state-sync-version",
                "appStateVersions",
            ),
            (
                KeyCategory::SenderKeyMemory,
                "sender-key-memory",
                "senderKeyMemory",
            ),
        ];
        assert_eq!(expected.len(), KeyCategory::ALL.len());
        for (cat, wire, storage) in expected {
            assert_eq!(cat.wire_name(), wire);
            assert_eq!(cat.storage_name(), storage);
            assert_eq!(KeyCategory::from_wire(wire), Some(cat));
            assert_eq!(KeyCategory::from_storage(storage), Some(cat));
        }
    }

    #[test]
    fn unmapped_names_are_none() {
        assert_eq!(KeyCategory::from_wire("sender-key-memoryy"), None);
        assert_eq!(KeyCategory::from_wire("preKeys"), None);
        assert_eq!(KeyCategory::from_storage("pre-key"), None);
        assert_eq!(KeyCategory::from_wire(""), None);
    }
}
