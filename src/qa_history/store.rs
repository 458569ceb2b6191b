use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Maximum number of entries kept in the image QA history log
pub const QA_HISTORY_CAPACITY: usize = 50;

/// Snapshot of an image QA session after its first successful round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaHistoryEntry {
    /// Unique identifier (UUID v4)
    pub id: String,

    /// Where the image came from (path or picker URI)
    pub image_ref: String,

    pub first_question: String,
    pub first_answer: String,

    /// Local time, "YYYY-MM-DD HH:MM"
    pub date: String,

    /// Conversation turns at the time the snapshot was taken
    pub turn_count: u32,
}

/// Capacity-bounded, insertion-ordered log of image QA sessions
#[async_trait]
pub trait QaHistoryStore: Send + Sync {
    /// Append an entry, evicting the oldest ones beyond capacity
    async fn append(&self, entry: QaHistoryEntry) -> Result<(), AppError>;

    /// All entries, newest first
    async fn list(&self) -> Result<Vec<QaHistoryEntry>, AppError>;

    /// Delete one entry by id
    async fn delete(&self, id: &str) -> Result<(), AppError>;

    async fn clear(&self) -> Result<(), AppError>;

    async fn len(&self) -> Result<usize, AppError>;
}
