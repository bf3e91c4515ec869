//! Configuration for the client connection and the bot command surface.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::WharfError;

/// Default TTL for cached group metadata, in seconds.
const DEFAULT_GROUP_CACHE_TTL_SECS: u64 = 300;

/// How the account is paired with the protocol servers on first login.
///
/// The two modes are mutually exclusive by construction: scanning a QR code
/// printed by the underlying library, or requesting a numeric pairing code
/// for a phone number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PairingMode {
    /// Pair by scanning a QR code.
    Qr,
    /// Pair by requesting a pairing code for the given phone number
    /// (E.164 digits, no leading `+`).
    PhoneNumber { number: String },
}

impl PairingMode {
    /// Whether this mode uses the QR flow.
    pub fn uses_qr(&self) -> bool {
        matches!(self, PairingMode::Qr)
    }
}

/// Group metadata cache settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupCacheConfig {
    /// How long a cached group metadata entry stays valid.
    #[serde(with = "duration_secs")]
    pub ttl: Duration,
}

impl Default for GroupCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_GROUP_CACHE_TTL_SECS),
        }
    }
}

/// Options for establishing a client connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionOptions {
    /// Identifier of the persisted session document. Multiple sessions may
    /// share one store; each is scoped by this id.
    pub session_id: String,
    /// Path to the SQLite session store.
    pub store_path: PathBuf,
    /// QR or phone-number pairing.
    pub pairing: PairingMode,
    /// Group metadata caching; `None` disables the cache entirely.
    pub group_cache: Option<GroupCacheConfig>,
}

impl ConnectionOptions {
    /// Create options for a QR-paired session with the default session id.
    pub fn qr(store_path: impl Into<PathBuf>) -> Self {
        Self {
            session_id: "default_session".to_string(),
            store_path: store_path.into(),
            pairing: PairingMode::Qr,
            group_cache: None,
        }
    }

    /// Set the session id.
    pub fn session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = id.into();
        self
    }

    /// Enable the group metadata cache with the given TTL.
    pub fn group_cache_ttl(mut self, ttl: Duration) -> Self {
        self.group_cache = Some(GroupCacheConfig { ttl });
        self
    }

    /// Validate the options. An empty session id cannot key a store row.
    pub fn validate(&self) -> Result<(), WharfError> {
        if self.session_id.trim().is_empty() {
            return Err(WharfError::Config("session id must not be empty".into()));
        }
        if let PairingMode::PhoneNumber { number } = &self.pairing {
            if number.trim().is_empty() {
                return Err(WharfError::Config(
                    "phone number must not be empty in phone pairing mode".into(),
                ));
            }
        }
        Ok(())
    }
}

/// What to do when an inbound message carries the prefix but resolves to no
/// registered command or alias.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum UnresolvedCommandPolicy {
    /// Ignore the message entirely. This matches the historical behavior.
    #[default]
    Silent,
    /// Reply to the sender with a templated message. `{command}` in the
    /// template is replaced with the unresolved command token.
    Reply { template: String },
}

/// Options for the bot command surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotOptions {
    /// Prefix that marks a message as a command invocation.
    pub prefix: String,
    /// Behavior for prefixed messages that match no command.
    #[serde(default)]
    pub unresolved: UnresolvedCommandPolicy,
}

impl Default for BotOptions {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
            unresolved: UnresolvedCommandPolicy::Silent,
        }
    }
}

/// Serialize a `Duration` as whole seconds.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
