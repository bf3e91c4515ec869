//! The credential bundle persisted per session.
//!
//! The key material here is opaque to wharf; it is generated once, handed to
//! the protocol library, mutated by it, and persisted whenever the library
//! reports a change. Wharf never interprets it.

use rand::rngs::OsRng;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use wharf_types::Contact;

use crate::buffer_json;

/// A raw public/private key pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyPair {
    #[serde(with = "buffer_json")]
    pub public: Vec<u8>,
    #[serde(with = "buffer_json")]
    pub private: Vec<u8>,
}

impl KeyPair {
    /// Generate a fresh random 32-byte pair.
    fn generate() -> Self {
        Self {
            public: random_bytes(32),
            private: random_bytes(32),
        }
    }
}

/// A key pair with its signature and rotating id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignedKeyPair {
    pub key_pair: KeyPair,
    #[serde(with = "buffer_json")]
    pub signature: Vec<u8>,
    pub key_id: u32,
}

/// Account-level settings the library stores alongside the identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AccountSettings {
    #[serde(default)]
    pub unarchive_chats: bool,
}

/// Core identity credentials for one session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthCreds {
    pub noise_key: KeyPair,
    pub signed_identity_key: KeyPair,
    pub signed_pre_key: SignedKeyPair,
    pub registration_id: u32,
    #[serde(with = "buffer_json")]
    pub adv_secret_key: Vec<u8>,
    pub next_pre_key_id: u32,
    pub first_unupload_pre_key_id: u32,
    /// The paired account, once registration completes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub me: Option<Contact>,
    /// Whether the account has completed pairing.
    #[serde(default)]
    pub registered: bool,
    #[serde(default)]
    pub account_settings: AccountSettings,
}

impl AuthCreds {
    /// Generate fresh credentials for a session that has never paired.
    pub fn generate() -> Self {
        let mut rng = OsRng;
        let identity = KeyPair::generate();
        Self {
            noise_key: KeyPair::generate(),
            signed_pre_key: SignedKeyPair {
                key_pair: KeyPair::generate(),
                // The real signature is produced by the library during
                // pairing; a fresh bundle starts with random filler.
                signature: random_bytes(64),
                key_id: 1,
            },
            signed_identity_key: identity,
            // Registration ids are 14-bit values on the wire.
            registration_id: rng.gen_range(1..16_384),
            adv_secret_key: random_bytes(32),
            next_pre_key_id: 1,
            first_unupload_pre_key_id: 1,
            me: None,
            registered: false,
            account_settings: AccountSettings::default(),
        }
    }
}

fn random_bytes(n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    OsRng.fill_bytes(&mut buf);
    buf
}
