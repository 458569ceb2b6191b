use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Extension of every recording managed by the app
pub const RECORDING_EXTENSION: &str = "m4a";

/// Metadata for a single recording file
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RecordingFile {
    /// Filename of the recording, also its identity (e.g., "Recording_20240315_143022.m4a")
    pub id: String,

    /// Full path on disk
    pub path: PathBuf,

    /// Size of the recording file in bytes
    pub size_bytes: u64,

    /// Unix timestamp (seconds since epoch) when the recording was last written
    pub created_at: u64,
}

/// Manages recording file storage and operations
pub struct FileManager {
    recordings_dir: PathBuf,
}

impl FileManager {
    /// Create a FileManager over a custom recordings directory, creating it if needed
    pub fn new_with_dir(recordings_dir: PathBuf) -> Result<Self, AppError> {
        std::fs::create_dir_all(&recordings_dir).map_err(|e| {
            AppError::FileIO(format!("Failed to create recordings directory: {}", e))
        })?;

        Ok(Self { recordings_dir })
    }

    /// Get the path to the recordings directory
    pub fn get_recordings_dir(&self) -> &Path {
        &self.recordings_dir
    }

    /// Full path for a recording id, after validating the id
    pub fn recording_path(&self, id: &str) -> Result<PathBuf, AppError> {
        validate_filename(id)?;
        Ok(self.recordings_dir.join(id))
    }

    /// List all recordings in the recordings directory
    ///
    /// Reads all .m4a files, extracts their metadata and returns them newest
    /// first. Files with equal timestamps are ordered by name, descending, so
    /// timestamped names keep their natural order.
    pub fn list_recordings(&self) -> Result<Vec<RecordingFile>, AppError> {
        let mut recordings = Vec::new();

        let entries = std::fs::read_dir(&self.recordings_dir).map_err(|e| {
            AppError::FileIO(format!("Failed to read recordings directory: {}", e))
        })?;

        for entry in entries {
            let entry = entry
                .map_err(|e| AppError::FileIO(format!("Failed to read directory entry: {}", e)))?;
            let path = entry.path();

            // Only process .m4a files
            if path.extension().and_then(|s| s.to_str()) != Some(RECORDING_EXTENSION) {
                continue;
            }

            let metadata = std::fs::metadata(&path).map_err(|e| {
                AppError::FileIO(format!("Failed to read metadata for {:?}: {}", path, e))
            })?;
            if !metadata.is_file() {
                continue;
            }

            let Some(id) = path.file_name().and_then(|s| s.to_str()).map(str::to_string) else {
                tracing::warn!("FileManager: Skipping non-UTF-8 filename {:?}", path);
                continue;
            };

            // Not every filesystem records creation time
            let created_at = metadata
                .modified()
                .or_else(|_| metadata.created())
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs())
                .unwrap_or(0);

            recordings.push(RecordingFile {
                id,
                path,
                size_bytes: metadata.len(),
                created_at,
            });
        }

        recordings.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(recordings)
    }

    /// Move `old_id` to `new_id` exactly as given.
    ///
    /// Moving onto the current id is a no-op. An existing target is never
    /// overwritten.
    ///
    /// # Errors
    ///
    /// - `Validation` for path separators or an existing target
    /// - `NotFound` if `old_id` does not exist
    /// - `FileIO` if the filesystem rename fails
    pub fn move_recording(&self, old_id: &str, new_id: &str) -> Result<(), AppError> {
        let old_path = self.recording_path(old_id)?;
        let new_path = self.recording_path(new_id)?;

        if old_id == new_id {
            return Ok(());
        }

        if !old_path.is_file() {
            return Err(AppError::NotFound(format!(
                "Recording '{}' not found in recordings directory",
                old_id
            )));
        }

        if new_path.exists() {
            return Err(AppError::Validation(format!(
                "A recording named '{}' already exists",
                new_id
            )));
        }

        std::fs::rename(&old_path, &new_path).map_err(|e| {
            AppError::FileIO(format!(
                "Failed to rename recording '{}' to '{}': {}",
                old_id, new_id, e
            ))
        })?;

        tracing::info!("FileManager: Renamed {} -> {}", old_id, new_id);
        Ok(())
    }

    /// Delete a recording by filename
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The filename contains path traversal characters (e.g., "..", "/")
    /// - The filename is empty
    /// - The file does not exist
    /// - The file cannot be deleted (permission denied, etc.)
    pub fn delete_recording(&self, filename: &str) -> Result<(), AppError> {
        let file_path = self.recording_path(filename)?;

        if !file_path.exists() {
            return Err(AppError::NotFound(format!(
                "Recording '{}' not found in recordings directory",
                filename
            )));
        }

        if !file_path.is_file() {
            return Err(AppError::Validation(format!("Path '{}' is not a file", filename)));
        }

        std::fs::remove_file(&file_path).map_err(|e| {
            AppError::FileIO(format!(
                "Failed to delete recording '{}' at {:?}: {}",
                filename, file_path, e
            ))
        })?;

        tracing::info!("FileManager: Deleted {}", filename);
        Ok(())
    }
}

/// Recording id a user-facing name maps to: trimmed, with `.m4a` appended
/// unless already present
pub fn recording_id_for(new_name: &str) -> Result<String, AppError> {
    let new_name = new_name.trim();
    let new_id = if new_name.ends_with(&format!(".{}", RECORDING_EXTENSION)) {
        new_name.to_string()
    } else {
        format!("{}.{}", new_name, RECORDING_EXTENSION)
    };

    if new_name.is_empty() || new_id == format!(".{}", RECORDING_EXTENSION) {
        return Err(AppError::Validation("New name cannot be empty".to_string()));
    }

    validate_filename(&new_id)?;
    Ok(new_id)
}

/// Reject names that could escape the recordings directory
fn validate_filename(filename: &str) -> Result<(), AppError> {
    if filename.is_empty() {
        return Err(AppError::Validation("Filename cannot be empty".to_string()));
    }

    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(AppError::Validation(format!(
            "Invalid filename '{}': path traversal not allowed",
            filename
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn manager() -> (tempfile::TempDir, FileManager) {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_manager = FileManager::new_with_dir(temp_dir.path().to_path_buf()).unwrap();
        (temp_dir, file_manager)
    }

    fn write_file(dir: &Path, name: &str, size: usize) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, vec![0u8; size]).unwrap();
        path
    }

    #[test]
    fn test_list_recordings_empty_directory() {
        let (_dir, file_manager) = manager();
        assert!(file_manager.list_recordings().unwrap().is_empty());
    }

    #[test]
    fn test_list_recordings_newest_first() {
        let (dir, file_manager) = manager();
        let older = write_file(dir.path(), "Recording_20240315_143022.m4a", 100);
        write_file(dir.path(), "Recording_20240316_090000.m4a", 200);

        // Push the first file's mtime into the past
        let past = SystemTime::now() - Duration::from_secs(3600);
        std::fs::File::options()
            .write(true)
            .open(&older)
            .unwrap()
            .set_modified(past)
            .unwrap();

        let recordings = file_manager.list_recordings().unwrap();
        assert_eq!(recordings.len(), 2);
        assert_eq!(recordings[0].id, "Recording_20240316_090000.m4a");
        assert_eq!(recordings[0].size_bytes, 200);
        assert_eq!(recordings[1].id, "Recording_20240315_143022.m4a");
    }

    #[test]
    fn test_list_recordings_ignores_other_files() {
        let (dir, file_manager) = manager();
        write_file(dir.path(), "recording.m4a", 10);
        write_file(dir.path(), "notes.txt", 10);
        write_file(dir.path(), "old.pcm", 10);
        std::fs::create_dir(dir.path().join("folder.m4a")).unwrap();

        let recordings = file_manager.list_recordings().unwrap();
        assert_eq!(recordings.len(), 1);
        assert_eq!(recordings[0].id, "recording.m4a");
    }

    #[test]
    fn test_rename_appends_extension() {
        let (dir, file_manager) = manager();
        write_file(dir.path(), "Recording_1.m4a", 10);

        let new_id = recording_id_for("Budget review").unwrap();
        file_manager.move_recording("Recording_1.m4a", &new_id).unwrap();
        assert_eq!(new_id, "Budget review.m4a");
        assert!(dir.path().join("Budget review.m4a").exists());
        assert!(!dir.path().join("Recording_1.m4a").exists());
    }

    #[test]
    fn test_rename_refuses_existing_target() {
        let (dir, file_manager) = manager();
        write_file(dir.path(), "a.m4a", 10);
        write_file(dir.path(), "b.m4a", 20);

        let err = file_manager.move_recording("a.m4a", "b.m4a").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(std::fs::metadata(dir.path().join("b.m4a")).unwrap().len(), 20);
    }

    #[test]
    fn test_rename_missing_source() {
        let (_dir, file_manager) = manager();
        let err = file_manager.move_recording("ghost.m4a", "new.m4a").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_rename_rejects_bad_names() {
        let (dir, file_manager) = manager();
        write_file(dir.path(), "a.m4a", 10);

        assert!(file_manager.move_recording("a.m4a", "../escape.m4a").is_err());
        assert!(file_manager.move_recording("a.m4a", "sub/dir.m4a").is_err());
        assert!(file_manager.move_recording("a.m4a", "").is_err());
        assert!(dir.path().join("a.m4a").exists());
    }

    #[test]
    fn test_recording_id_for() {
        assert_eq!(recording_id_for(" Budget ").unwrap(), "Budget.m4a");
        assert_eq!(recording_id_for("Budget.m4a").unwrap(), "Budget.m4a");
        assert!(recording_id_for(".m4a").is_err());
        assert!(recording_id_for("   ").is_err());
        assert!(recording_id_for("../escape").is_err());
        assert!(recording_id_for("a/b").is_err());
    }

    #[test]
    fn test_rename_to_same_name_is_noop() {
        let (dir, file_manager) = manager();
        write_file(dir.path(), "a.m4a", 10);
        file_manager.move_recording("a.m4a", "a.m4a").unwrap();
        assert!(dir.path().join("a.m4a").exists());
    }

    #[test]
    fn test_delete_recording_success() {
        let (dir, file_manager) = manager();
        let path = write_file(dir.path(), "test_recording.m4a", 32000);

        file_manager.delete_recording("test_recording.m4a").unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_delete_recording_file_not_found() {
        let (_dir, file_manager) = manager();
        let err = file_manager.delete_recording("nonexistent.m4a").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_delete_recording_path_traversal() {
        let (_dir, file_manager) = manager();
        for name in ["../../../etc/passwd", "..\\..\\windows", "..", "a/b.m4a"] {
            let err = file_manager.delete_recording(name).unwrap_err();
            assert!(err.to_string().contains("path traversal"), "{}", name);
        }
    }

    #[test]
    fn test_delete_recording_empty_filename() {
        let (_dir, file_manager) = manager();
        let err = file_manager.delete_recording("").unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_delete_recording_directory_not_file() {
        let (dir, file_manager) = manager();
        std::fs::create_dir(dir.path().join("subdir")).unwrap();

        let err = file_manager.delete_recording("subdir").unwrap_err();
        assert!(err.to_string().contains("not a file"));
    }
}
