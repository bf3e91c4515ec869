//! Time-expiring cache for group metadata.
//!
//! Entries are written whole on refresh and expire after the configured TTL;
//! there is no other eviction and capacity is unbounded. The clock is
//! injectable so expiry is testable without sleeping.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

use wharf_types::GroupMetadata;

use crate::socket::GroupLookup;

/// Time source for cache expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The real clock.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A manually advanced clock for tests.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.offset.lock().expect("clock lock") += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().expect("clock lock")
    }
}

struct Entry {
    metadata: GroupMetadata,
    expires_at: Instant,
}

/// TTL cache keyed by group JID.
pub struct GroupCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, Entry>>,
}

impl GroupCache {
    /// A cache with the given TTL on the system clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// A cache on an injected clock.
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// An unexpired entry, if present. Expired entries are dropped here.
    pub fn get(&self, jid: &str) -> Option<GroupMetadata> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("cache lock");
        match entries.get(jid) {
            Some(entry) if entry.expires_at > now => Some(entry.metadata.clone()),
            Some(_) => {
                entries.remove(jid);
                None
            }
            None => None,
        }
    }

    /// Store metadata, stamping a fresh TTL. Entries are replaced whole,
    /// never partially updated.
    pub fn insert(&self, metadata: GroupMetadata) {
        let expires_at = self.clock.now() + self.ttl;
        debug!(group = %metadata.id, "group metadata cached");
        self.entries.lock().expect("cache lock").insert(
            metadata.id.clone(),
            Entry {
                metadata,
                expires_at,
            },
        );
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        let now = self.clock.now();
        self.entries
            .lock()
            .expect("cache lock")
            .retain(|_, e| e.expires_at > now);
    }

    /// Number of entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A lookup closure suitable for handing to the protocol library.
    pub fn lookup_fn(self: &Arc<Self>) -> GroupLookup {
        let cache = Arc::clone(self);
        Arc::new(move |jid| cache.get(jid))
    }
}
