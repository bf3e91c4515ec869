//! Tagged base64 encoding for binary fields in JSON documents.
//!
//! Credential bundles carry raw key material that must round-trip through a
//! text-based store. Fields annotated with `#[serde(with = "buffer_json")]`
//! serialize as `{"type":"Buffer","data":"<base64>"}`. Deserialization also
//! accepts the legacy numeric-array form `{"type":"Buffer","data":[1,2,3]}`
//! written by older sessions.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::{self, Deserializer};
use serde::ser::{SerializeStruct, Serializer};
use serde::Deserialize;

/// Serialize bytes as a tagged base64 object.
pub fn serialize<S: Serializer>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error> {
    let mut s = serializer.serialize_struct("Buffer", 2)?;
    s.serialize_field("type", "Buffer")?;
    s.serialize_field("data", &STANDARD.encode(bytes))?;
    s.end()
}

/// The `data` field: base64 string or legacy byte array.
#[derive(Deserialize)]
#[serde(untagged)]
enum BufferData {
    Base64(String),
    Bytes(Vec<u8>),
}

#[derive(Deserialize)]
struct TaggedBuffer {
    #[serde(rename = "type")]
    tag: String,
    data: BufferData,
}

/// Deserialize bytes from a tagged base64 object or legacy byte array.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let tagged = TaggedBuffer::deserialize(deserializer)?;
    if tagged.tag != "Buffer" {
        return Err(de::Error::custom(format!(
            "expected type \"Buffer\", got \"{}\"",
            tagged.tag
        )));
    }
    match tagged.data {
        BufferData::Base64(s) => STANDARD
            .decode(s.as_bytes())
            .map_err(|e| de::Error::custom(format!("invalid base64 buffer data: {e}"))),
        BufferData::Bytes(b) => Ok(b),
    }
}
