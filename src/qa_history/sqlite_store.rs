use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

use super::store::{QaHistoryEntry, QaHistoryStore, QA_HISTORY_CAPACITY};
use crate::error::AppError;

pub struct SqliteQaHistory {
    conn: Arc<Mutex<Connection>>,
    capacity: usize,
}

impl SqliteQaHistory {
    /// Build the log over a shared connection, creating the schema if needed
    pub fn with_conn(conn: Arc<Mutex<Connection>>, capacity: usize) -> Result<Self, AppError> {
        let store = Self { conn, capacity };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize in-memory log for testing
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            AppError::Storage(format!("Failed to open in-memory database: {}", e))
        })?;
        Self::with_conn(Arc::new(Mutex::new(conn)), QA_HISTORY_CAPACITY)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.conn
            .lock()
            .map_err(|e| AppError::Storage(format!("Failed to acquire lock: {}", e)))
    }

    fn initialize_schema(&self) -> Result<(), AppError> {
        let conn = self.lock()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS qa_history (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                image_ref TEXT NOT NULL,
                first_question TEXT NOT NULL,
                first_answer TEXT NOT NULL,
                date TEXT NOT NULL,
                turn_count INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<QaHistoryEntry> {
        Ok(QaHistoryEntry {
            id: row.get(0)?,
            image_ref: row.get(1)?,
            first_question: row.get(2)?,
            first_answer: row.get(3)?,
            date: row.get(4)?,
            turn_count: row.get(5)?,
        })
    }
}

#[async_trait]
impl QaHistoryStore for SqliteQaHistory {
    async fn append(&self, entry: QaHistoryEntry) -> Result<(), AppError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO qa_history (id, image_ref, first_question, first_answer, date, turn_count)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.id,
                entry.image_ref,
                entry.first_question,
                entry.first_answer,
                entry.date,
                entry.turn_count,
            ],
        )?;
        let evicted = tx.execute(
            "DELETE FROM qa_history WHERE seq NOT IN (
                SELECT seq FROM qa_history ORDER BY seq DESC LIMIT ?1
            )",
            params![self.capacity as i64],
        )?;
        tx.commit()?;

        if evicted > 0 {
            tracing::debug!("QaHistory: Evicted {} oldest entries", evicted);
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<QaHistoryEntry>, AppError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, image_ref, first_question, first_answer, date, turn_count
            FROM qa_history ORDER BY seq DESC",
        )?;
        let entries = stmt
            .query_map([], Self::row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let conn = self.lock()?;
        let rows_affected = conn.execute("DELETE FROM qa_history WHERE id = ?1", params![id])?;

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "History entry with id '{}' not found",
                id
            )));
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), AppError> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM qa_history", [])?;
        tracing::info!("QaHistory: Cleared {} entries", removed);
        Ok(())
    }

    async fn len(&self) -> Result<usize, AppError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM qa_history", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: usize) -> QaHistoryEntry {
        QaHistoryEntry {
            id: format!("entry-{}", n),
            image_ref: format!("/photos/{}.jpg", n),
            first_question: format!("question {}", n),
            first_answer: format!("answer {}", n),
            date: "2024-03-15 14:30".to_string(),
            turn_count: 2,
        }
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let log = SqliteQaHistory::new_in_memory().unwrap();
        for n in 1..=3 {
            log.append(entry(n)).await.unwrap();
        }

        let ids: Vec<String> = log.list().await.unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["entry-3", "entry-2", "entry-1"]);
    }

    #[tokio::test]
    async fn test_fifty_first_entry_evicts_oldest() {
        let log = SqliteQaHistory::new_in_memory().unwrap();
        for n in 1..=QA_HISTORY_CAPACITY + 1 {
            log.append(entry(n)).await.unwrap();
        }

        assert_eq!(log.len().await.unwrap(), QA_HISTORY_CAPACITY);
        let entries = log.list().await.unwrap();
        assert_eq!(entries.first().unwrap().id, "entry-51");
        assert_eq!(entries.last().unwrap().id, "entry-2");
        assert!(!entries.iter().any(|e| e.id == "entry-1"));
    }

    #[tokio::test]
    async fn test_round_trip_fields() {
        let log = SqliteQaHistory::new_in_memory().unwrap();
        log.append(entry(7)).await.unwrap();
        assert_eq!(log.list().await.unwrap(), vec![entry(7)]);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let log = SqliteQaHistory::new_in_memory().unwrap();
        log.append(entry(1)).await.unwrap();
        log.append(entry(2)).await.unwrap();

        log.delete("entry-1").await.unwrap();
        assert_eq!(log.len().await.unwrap(), 1);

        let missing = log.delete("entry-1").await.unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));

        log.clear().await.unwrap();
        assert_eq!(log.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_small_capacity() {
        let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let log = SqliteQaHistory::with_conn(conn, 2).unwrap();
        for n in 1..=5 {
            log.append(entry(n)).await.unwrap();
            assert!(log.len().await.unwrap() <= 2);
        }
    }
}
