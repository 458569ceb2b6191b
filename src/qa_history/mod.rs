mod sqlite_store;
mod store;

pub use sqlite_store::SqliteQaHistory;
pub use store::{QaHistoryEntry, QaHistoryStore, QA_HISTORY_CAPACITY};
