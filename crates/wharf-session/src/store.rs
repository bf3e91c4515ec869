//! SQLite-backed single-document-per-session store.
//!
//! Each session id maps to one row holding the serialized credential
//! document. The store knows nothing about the document's shape; it is a
//! fetch/create/update/delete accessor.

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use wharf_types::WharfError;

/// Accessor for the per-session credential documents.
pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    /// Open (or create) the store at the given path.
    ///
    /// Enables WAL mode and creates the `sessions` table if it does not
    /// exist.
    pub fn open(path: &Path) -> Result<Self, WharfError> {
        let conn = Connection::open(path)
            .map_err(|e| WharfError::Store(format!("failed to open database: {e}")))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| WharfError::Store(format!("failed to set WAL mode: {e}")))?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL UNIQUE,
                payload TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_session_id ON sessions(session_id);",
        )
        .map_err(|e| WharfError::Store(format!("failed to create schema: {e}")))?;

        info!(path = %path.display(), "session store opened");

        Ok(Self { conn })
    }

    /// An in-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, WharfError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| WharfError::Store(format!("failed to open in-memory database: {e}")))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL UNIQUE,
                payload TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )
        .map_err(|e| WharfError::Store(format!("failed to create schema: {e}")))?;
        Ok(Self { conn })
    }

    /// Fetch the stored payload for a session, if the row exists.
    pub fn fetch(&self, session_id: &str) -> Result<Option<String>, WharfError> {
        self.conn
            .query_row(
                "SELECT payload FROM sessions WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| WharfError::Store(format!("failed to fetch session: {e}")))
    }

    /// Create a session row with an empty payload.
    pub fn create(&self, session_id: &str) -> Result<(), WharfError> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO sessions (session_id, payload, created_at, updated_at)
                 VALUES (?1, '', ?2, ?2)",
                params![session_id, now],
            )
            .map_err(|e| WharfError::Store(format!("failed to create session: {e}")))?;
        Ok(())
    }

    /// Replace the payload for a session.
    pub fn update(&self, session_id: &str, payload: &str) -> Result<(), WharfError> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "UPDATE sessions SET payload = ?2, updated_at = ?3 WHERE session_id = ?1",
                params![session_id, payload, now],
            )
            .map_err(|e| WharfError::Store(format!("failed to update session: {e}")))?;
        Ok(())
    }

    /// Delete a session row. Returns whether a row was removed.
    pub fn delete(&self, session_id: &str) -> Result<bool, WharfError> {
        let n = self
            .conn
            .execute(
                "DELETE FROM sessions WHERE session_id = ?1",
                params![session_id],
            )
            .map_err(|e| WharfError::Store(format!("failed to delete session: {e}")))?;
        Ok(n > 0)
    }
}
