//! Session-scoped authentication state with single-flight flushing.
//!
//! [`SessionAuth`] is the explicit context object for one session id: it
//! holds the credential bundle and signal-key store in memory, and persists
//! the complete document on every mutation.
//!
//! # Flush discipline
//!
//! `save()` serializes the current state and publishes it to a dedicated
//! writer task, then returns. The writer applies the *latest* published
//! snapshot; intermediate snapshots coalesce, and because a single task owns
//! the store there is at most one write in flight per session — a delayed
//! earlier write can never clobber a later one. A completed `save()` call
//! therefore does not imply the snapshot is durable yet; use
//! [`SessionAuth::flushed`] as a barrier where durability matters.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use wharf_types::WharfError;

use crate::creds::AuthCreds;
use crate::key_category::KeyCategory;
use crate::keys::SignalKeyStore;
use crate::store::SessionStore;

/// The persisted document: core credentials plus the key mapping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthState {
    pub creds: AuthCreds,
    pub keys: SignalKeyStore,
}

/// A flush request published to the writer task.
#[derive(Debug, Clone)]
struct FlushRequest {
    seq: u64,
    op: FlushOp,
}

#[derive(Debug, Clone)]
enum FlushOp {
    None,
    Write(String),
    Delete,
}

/// Authentication state for one session, backed by a [`SessionStore`].
#[derive(Debug)]
pub struct SessionAuth {
    session_id: String,
    state: Arc<Mutex<AuthState>>,
    next_seq: Mutex<u64>,
    flush_tx: watch::Sender<FlushRequest>,
    applied_rx: watch::Receiver<u64>,
}

impl SessionAuth {
    /// Load (or initialize) the auth state for `session_id`.
    ///
    /// A missing row is created with an empty payload; a missing or empty
    /// payload yields freshly generated credentials. The store is handed to
    /// the writer task this call spawns, so the caller must be inside a
    /// tokio runtime.
    pub async fn load(store: SessionStore, session_id: &str) -> Result<Self, WharfError> {
        if session_id.trim().is_empty() {
            return Err(WharfError::Config("session id must not be empty".into()));
        }

        let state = match store.fetch(session_id)? {
            Some(payload) if !payload.is_empty() => serde_json::from_str::<AuthState>(&payload)?,
            existing => {
                if existing.is_none() {
                    store.create(session_id)?;
                }
                debug!(session_id, "no stored credentials, generating fresh");
                AuthState {
                    creds: AuthCreds::generate(),
                    keys: SignalKeyStore::new(),
                }
            }
        };

        let (flush_tx, flush_rx) = watch::channel(FlushRequest {
            seq: 0,
            op: FlushOp::None,
        });
        let (applied_tx, applied_rx) = watch::channel(0u64);

        tokio::spawn(run_writer(
            store,
            session_id.to_string(),
            flush_rx,
            applied_tx,
        ));

        Ok(Self {
            session_id: session_id.to_string(),
            state: Arc::new(Mutex::new(state)),
            next_seq: Mutex::new(0),
            flush_tx,
            applied_rx,
        })
    }

    /// The session id this state is scoped to.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// A clone of the current credentials.
    pub fn creds(&self) -> AuthCreds {
        self.state.lock().expect("auth state lock").creds.clone()
    }

    /// Mutate the credentials and persist the full document.
    pub fn update_creds(&self, f: impl FnOnce(&mut AuthCreds)) {
        let snapshot = {
            let mut state = self.state.lock().expect("auth state lock");
            f(&mut state.creds);
            serialize_state(&state)
        };
        self.request(FlushOp::Write(snapshot));
    }

    /// Fetch key payloads by wire category and id. Absent ids are omitted.
    pub fn get_keys(&self, category: KeyCategory, ids: &[String]) -> HashMap<String, Value> {
        self.state
            .lock()
            .expect("auth state lock")
            .keys
            .get(category, ids)
    }

    /// Merge wire-named key updates and persist the full document.
    ///
    /// The flushed snapshot always contains the complete current key
    /// mapping, never a stale partial view.
    pub fn set_keys(&self, data: HashMap<String, HashMap<String, Value>>) {
        let snapshot = {
            let mut state = self.state.lock().expect("auth state lock");
            state.keys.merge(data);
            serialize_state(&state)
        };
        self.request(FlushOp::Write(snapshot));
    }

    /// Persist the current state (fire-and-forget).
    pub fn save(&self) {
        let snapshot = {
            let state = self.state.lock().expect("auth state lock");
            serialize_state(&state)
        };
        self.request(FlushOp::Write(snapshot));
    }

    /// Delete the persisted session document.
    pub fn clear(&self) {
        self.request(FlushOp::Delete);
    }

    /// Wait until every flush requested so far has been applied.
    pub async fn flushed(&self) {
        let target = *self.next_seq.lock().expect("seq lock");
        let mut rx = self.applied_rx.clone();
        while *rx.borrow_and_update() < target {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    fn request(&self, op: FlushOp) {
        // Seq assignment and publication stay under one lock so the watch
        // channel always holds the highest seq issued.
        let mut next = self.next_seq.lock().expect("seq lock");
        *next += 1;
        // Receiver only drops if the writer task died; nothing to do then.
        let _ = self.flush_tx.send(FlushRequest { seq: *next, op });
    }
}

fn serialize_state(state: &AuthState) -> String {
    // AuthState has no non-string map keys, so serialization cannot fail.
    serde_json::to_string(state).expect("auth state serializes")
}

/// The writer task: applies the latest published flush request.
async fn run_writer(
    store: SessionStore,
    session_id: String,
    mut rx: watch::Receiver<FlushRequest>,
    applied_tx: watch::Sender<u64>,
) {
    while rx.changed().await.is_ok() {
        let req = rx.borrow_and_update().clone();
        let result = match &req.op {
            FlushOp::None => Ok(()),
            FlushOp::Write(payload) => store.update(&session_id, payload),
            FlushOp::Delete => store.delete(&session_id).map(|_| ()),
        };
        if let Err(e) = result {
            warn!(session_id = %session_id, error = %e, "session flush failed");
        }
        let _ = applied_tx.send(req.seq);
    }
    debug!(session_id = %session_id, "session writer stopped");
}
