mod sqlite_store;
mod store;

pub use sqlite_store::SqliteArtifactStore;
pub use store::{ArtifactRecord, ArtifactStore};
