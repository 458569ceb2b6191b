use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Derived text artifacts of one recording
///
/// Every field is absent until the matching remote call has fully succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub todos: Option<String>,
}

impl ArtifactRecord {
    pub fn is_empty(&self) -> bool {
        self.transcript.is_none() && self.summary.is_none() && self.todos.is_none()
    }
}

/// Storage interface for recording artifacts - implementations are swappable
///
/// Keys are recording identities compared by exact string equality.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Get the record for `id`; a missing key yields an empty record
    async fn get(&self, id: &str) -> Result<ArtifactRecord, AppError>;

    /// Store a transcript, clearing any summary and todos derived from the old one
    async fn set_transcript(&self, id: &str, text: &str) -> Result<(), AppError>;

    async fn set_summary(&self, id: &str, text: &str) -> Result<(), AppError>;

    async fn set_todos(&self, id: &str, text: &str) -> Result<(), AppError>;

    /// Move the whole record from `old_id` to `new_id` as one unit.
    ///
    /// Only call this after the recording itself has been renamed.
    async fn rename(&self, old_id: &str, new_id: &str) -> Result<(), AppError>;

    /// Drop the record for `id`, if any
    async fn remove(&self, id: &str) -> Result<(), AppError>;
}
