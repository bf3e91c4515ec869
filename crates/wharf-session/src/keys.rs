//! In-memory signal-key store with merge semantics.
//!
//! Payloads are opaque JSON values: binary material inside them is already
//! buffer-tagged by the time it reaches this layer, so it survives the text
//! round-trip untouched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::key_category::KeyCategory;

/// Keyed signal material for one session.
///
/// Persists as `{ "preKeys": { "<id>": <payload>, ... }, ... }` with storage
/// bucket names; the in-memory index is by [`KeyCategory`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "HashMap<String, HashMap<String, Value>>",
    into = "HashMap<String, HashMap<String, Value>>"
)]
pub struct SignalKeyStore {
    buckets: HashMap<KeyCategory, HashMap<String, Value>>,
}

impl SignalKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch stored payloads for the requested ids in one category.
    ///
    /// Only ids present in the store appear in the result; absent ids are
    /// omitted, never null-valued.
    pub fn get(&self, category: KeyCategory, ids: &[String]) -> HashMap<String, Value> {
        let mut out = HashMap::new();
        if let Some(bucket) = self.buckets.get(&category) {
            for id in ids {
                if let Some(value) = bucket.get(id) {
                    out.insert(id.clone(), value.clone());
                }
            }
        }
        out
    }

    /// Merge wire-named partial updates into the store.
    ///
    /// Each entry maps a wire category name to `id -> payload` pairs that
    /// are inserted (or overwritten) in the corresponding bucket. Unmapped
    /// category names are skipped with a warning.
    pub fn merge(&mut self, data: HashMap<String, HashMap<String, Value>>) {
        for (wire_name, entries) in data {
            let Some(category) = KeyCategory::from_wire(&wire_name) else {
                warn!(category = %wire_name, "skipping unmapped key category");
                continue;
            };
            self.buckets.entry(category).or_default().extend(entries);
        }
    }

    /// Whether no key material is stored.
    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(HashMap::is_empty)
    }
}

impl From<SignalKeyStore> for HashMap<String, HashMap<String, Value>> {
    fn from(store: SignalKeyStore) -> Self {
        store
            .buckets
            .into_iter()
            .map(|(cat, bucket)| (cat.storage_name().to_string(), bucket))
            .collect()
    }
}

impl From<HashMap<String, HashMap<String, Value>>> for SignalKeyStore {
    fn from(raw: HashMap<String, HashMap<String, Value>>) -> Self {
        let mut buckets = HashMap::new();
        for (name, bucket) in raw {
            match KeyCategory::from_storage(&name) {
                Some(cat) => {
                    buckets.insert(cat, bucket);
                }
                None => warn!(bucket = %name, "dropping unknown key bucket from stored session"),
            }
        }
        Self { buckets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(
        category: &str,
        entries: &[(&str, Value)],
    ) -> HashMap<String, HashMap<String, Value>> {
        let mut bucket = HashMap::new();
        for (id, v) in entries {
            bucket.insert(id.to_string(), v.clone());
        }
        let mut data = HashMap::new();
        data.insert(category.to_string(), bucket);
        data
    }

    #[test]
    fn set_then_get_returns_payload() {
        let mut store = SignalKeyStore::new();
        store.merge(update("pre-key", &[("5", json!({"n": 5}))]));

        let got = store.get(KeyCategory::PreKey, &["5".to_string()]);
        assert_eq!(got.len(), 1);
        assert_eq!(got["5"], json!({"n": 5}));
    }

    #[test]
    fn get_omits_absent_ids() {
        let mut store = SignalKeyStore::new();
        store.merge(update("pre-key", &[("5", json!(1))]));

        let got = store.get(KeyCategory::PreKey, &["6".to_string()]);
        assert!(got.is_empty());

        let got = store.get(KeyCategory::PreKey, &["5".to_string(), "6".to_string()]);
        assert_eq!(got.len(), 1);
        assert!(got.contains_key("5"));
    }

    #[test]
    fn merge_overwrites_existing_ids() {
        let mut store = SignalKeyStore::new();
        store.merge(update("session", &[("a", json!("old"))]));
        store.merge(update("session", &[("a", json!("new")), ("b", json!("x"))]));

        let got = store.get(
            KeyCategory::Session,
            &["a".to_string(), "b".to_string()],
        );
        assert_eq!(got["a"], json!("new"));
        assert_eq!(got["b"], json!("x"));
    }

    #[test]
    fn merge_skips_unmapped_category() {
        let mut store = SignalKeyStore::new();
        store.merge(update("no-such-category", &[("1", json!(1))]));
        assert!(store.is_empty());
    }

    #[test]
    fn categories_do_not_bleed() {
        let mut store = SignalKeyStore::new();
        store.merge(update("pre-key", &[("1", json!(1))]));
        assert!(store.get(KeyCategory::SenderKey, &["1".to_string()]).is_empty());
    }

    #[test]
    fn serializes_with_storage_names() {
        let mut store = SignalKeyStore::new();
        store.merge(update("pre-key", &[("5", json!({"k": true}))]));
        store.merge(update("app-state-sync-version", &[("critical_block", json!(7))]));

        let json = serde_json::to_value(&store).unwrap();
        assert!(json.get("preKeys").is_some());
        assert!(json.get("appStateVersions").is_some());
        assert!(json.get("pre-key").is_none());

        let back: SignalKeyStore = serde_json::from_value(json).unwrap();
        assert_eq!(back, store);
    }

    #[test]
    fn unknown_stored_bucket_is_dropped() {
        let raw = json!({"mystery": {"1": 1}, "preKeys": {"2": 2}});
        let store: SignalKeyStore = serde_json::from_value(raw).unwrap();
        assert_eq!(
            store.get(KeyCategory::PreKey, &["2".to_string()])["2"],
            json!(2)
        );
        assert_eq!(store.buckets.len(), 1);
    }
}
