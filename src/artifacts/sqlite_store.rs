use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use super::store::{ArtifactRecord, ArtifactStore};
use crate::error::AppError;

pub struct SqliteArtifactStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteArtifactStore {
    /// Open (or create) the database at `db_path`
    pub fn open(db_path: &Path) -> Result<Self, AppError> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::FileIO(format!("Failed to create database directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Storage(format!("Failed to open database: {}", e)))?;

        Self::with_conn(Arc::new(Mutex::new(conn)))
    }

    /// Initialize in-memory store for testing
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            AppError::Storage(format!("Failed to open in-memory database: {}", e))
        })?;
        Self::with_conn(Arc::new(Mutex::new(conn)))
    }

    /// Build the store over an existing connection, creating the schema if needed
    pub fn with_conn(conn: Arc<Mutex<Connection>>) -> Result<Self, AppError> {
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Get a clone of the database connection for sharing with other stores
    pub fn get_conn(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.conn
            .lock()
            .map_err(|e| AppError::Storage(format!("Failed to acquire lock: {}", e)))
    }

    fn initialize_schema(&self) -> Result<(), AppError> {
        let conn = self.lock()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS artifacts (
                recording_id TEXT PRIMARY KEY,
                transcript TEXT,
                summary TEXT,
                todos TEXT
            )",
            [],
        )?;
        Ok(())
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<ArtifactRecord> {
        Ok(ArtifactRecord {
            transcript: row.get(0)?,
            summary: row.get(1)?,
            todos: row.get(2)?,
        })
    }
}

#[async_trait]
impl ArtifactStore for SqliteArtifactStore {
    async fn get(&self, id: &str) -> Result<ArtifactRecord, AppError> {
        let conn = self.lock()?;
        let record = conn
            .query_row(
                "SELECT transcript, summary, todos FROM artifacts WHERE recording_id = ?1",
                params![id],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record.unwrap_or_default())
    }

    async fn set_transcript(&self, id: &str, text: &str) -> Result<(), AppError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO artifacts (recording_id, transcript, summary, todos)
            VALUES (?1, ?2, NULL, NULL)
            ON CONFLICT(recording_id) DO UPDATE SET
                transcript = excluded.transcript,
                summary = NULL,
                todos = NULL",
            params![id, text],
        )?;
        tracing::debug!("ArtifactStore: Transcript stored for {}", id);
        Ok(())
    }

    async fn set_summary(&self, id: &str, text: &str) -> Result<(), AppError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO artifacts (recording_id, summary) VALUES (?1, ?2)
            ON CONFLICT(recording_id) DO UPDATE SET summary = excluded.summary",
            params![id, text],
        )?;
        tracing::debug!("ArtifactStore: Summary stored for {}", id);
        Ok(())
    }

    async fn set_todos(&self, id: &str, text: &str) -> Result<(), AppError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO artifacts (recording_id, todos) VALUES (?1, ?2)
            ON CONFLICT(recording_id) DO UPDATE SET todos = excluded.todos",
            params![id, text],
        )?;
        tracing::debug!("ArtifactStore: Todos stored for {}", id);
        Ok(())
    }

    async fn rename(&self, old_id: &str, new_id: &str) -> Result<(), AppError> {
        if old_id == new_id {
            return Ok(());
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        // Whatever sat under the new key is replaced, even when the old key has no record
        tx.execute(
            "DELETE FROM artifacts WHERE recording_id = ?1",
            params![new_id],
        )?;
        let moved = tx.execute(
            "INSERT INTO artifacts (recording_id, transcript, summary, todos)
            SELECT ?2, transcript, summary, todos FROM artifacts WHERE recording_id = ?1",
            params![old_id, new_id],
        )?;
        tx.execute(
            "DELETE FROM artifacts WHERE recording_id = ?1",
            params![old_id],
        )?;
        tx.commit()?;

        tracing::info!(
            "ArtifactStore: Renamed {} -> {} ({} record moved)",
            old_id,
            new_id,
            moved
        );
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), AppError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM artifacts WHERE recording_id = ?1",
            params![id],
        )?;
        Ok(())
    }
}
