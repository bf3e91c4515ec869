//! Credential persistence for wharf sessions.
//!
//! The protocol library hands this crate two kinds of state: the core
//! identity credentials and incremental signal-key material. Both live in a
//! single JSON document per session, stored in SQLite, with binary fields
//! encoded as tagged base64 so they survive the text round-trip.
//!
//! # Architecture
//!
//! - [`buffer_json`]: tagged base64 encoding for binary fields
//! - [`creds`]: the credential bundle and fresh-credential generation
//! - [`key_category`]: the wire-name / storage-name category mapping
//! - [`keys`]: the in-memory signal-key store with merge semantics
//! - [`store`]: the SQLite single-document-per-session store
//! - [`auth`]: session-scoped auth state with single-flight flushing

pub mod auth;
pub mod buffer_json;
pub mod creds;
pub mod key_category;
pub mod keys;
pub mod store;

pub use auth::SessionAuth;
pub use creds::{AuthCreds, KeyPair, SignedKeyPair};
pub use key_category::KeyCategory;
pub use keys::SignalKeyStore;
pub use store::SessionStore;
