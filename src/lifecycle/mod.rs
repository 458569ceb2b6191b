// Recording lifecycle - capture, listing and the per-recording artifact pipeline
//
// Every remote-backed action follows the same order: claim the recording's
// gate, validate, make the call, and only then write to the artifact store.

pub mod gate;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::artifacts::{ArtifactRecord, ArtifactStore};
use crate::cancel::cancellable;
use crate::error::AppError;
use crate::files::{recording_id_for, FileManager, RecordingFile};
use crate::intelligence::Assistant;
use crate::recording::{AudioCapture, CaptureState, MediaProbe, RecordingManager};
use crate::transcription::TranscriptionProvider;

pub use gate::{Action, ActionGate, GateGuard};

/// A recording on disk together with its derived artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// File name, also the artifact store key
    pub id: String,
    /// File name without the extension, as shown to the user
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub duration_secs: Option<f64>,
    /// Unix timestamp (seconds)
    pub created_at: u64,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub todos: Option<String>,
}

impl Recording {
    fn from_parts(file: RecordingFile, duration_secs: Option<f64>, record: ArtifactRecord) -> Self {
        let name = file
            .id
            .strip_suffix(".m4a")
            .unwrap_or(&file.id)
            .to_string();
        Self {
            id: file.id,
            name,
            path: file.path,
            size_bytes: file.size_bytes,
            duration_secs,
            created_at: file.created_at,
            transcript: record.transcript,
            summary: record.summary,
            todos: record.todos,
        }
    }
}

/// Progress of one artifact of a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactPhase {
    Missing,
    InFlight,
    Ready,
}

/// Snapshot of a recording's artifact pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingStatus {
    pub busy: Option<Action>,
    pub transcript: ArtifactPhase,
    pub summary: ArtifactPhase,
    pub todos: ArtifactPhase,
}

fn phase(present: bool, in_flight: bool) -> ArtifactPhase {
    if in_flight {
        ArtifactPhase::InFlight
    } else if present {
        ArtifactPhase::Ready
    } else {
        ArtifactPhase::Missing
    }
}

/// Owns the recordings list and drives every per-recording action
pub struct RecordingLifecycle {
    files: FileManager,
    store: Arc<dyn ArtifactStore>,
    transcriber: Arc<dyn TranscriptionProvider>,
    assistant: Arc<Assistant>,
    probe: Arc<dyn MediaProbe>,
    capture: Mutex<RecordingManager>,
    gate: ActionGate,
    recordings: Mutex<Vec<Recording>>,
}

impl RecordingLifecycle {
    pub fn new(
        files: FileManager,
        store: Arc<dyn ArtifactStore>,
        transcriber: Arc<dyn TranscriptionProvider>,
        assistant: Arc<Assistant>,
        capture: Arc<dyn AudioCapture>,
        probe: Arc<dyn MediaProbe>,
    ) -> Self {
        Self {
            files,
            store,
            transcriber,
            assistant,
            probe,
            capture: Mutex::new(RecordingManager::new(capture)),
            gate: ActionGate::new(),
            recordings: Mutex::new(Vec::new()),
        }
    }

    fn lock_recordings(&self) -> Result<MutexGuard<'_, Vec<Recording>>, AppError> {
        self.recordings
            .lock()
            .map_err(|e| AppError::Storage(format!("Failed to acquire lock: {}", e)))
    }

    fn lock_capture(&self) -> Result<MutexGuard<'_, RecordingManager>, AppError> {
        self.capture
            .lock()
            .map_err(|e| AppError::CaptureFailed(format!("Failed to acquire lock: {}", e)))
    }

    // MARK: - Listing

    /// Re-read the recordings directory and the artifact store, newest first
    pub async fn refresh(&self) -> Result<Vec<Recording>, AppError> {
        let files = self.files.list_recordings()?;

        let mut recordings = Vec::with_capacity(files.len());
        for file in files {
            let record = self.store.get(&file.id).await?;
            let duration = self.probe.duration_secs(&file.path);
            recordings.push(Recording::from_parts(file, duration, record));
        }

        tracing::debug!("Lifecycle: Listed {} recordings", recordings.len());
        *self.lock_recordings()? = recordings.clone();
        Ok(recordings)
    }

    /// Recordings as of the last refresh
    pub fn recordings(&self) -> Result<Vec<Recording>, AppError> {
        Ok(self.lock_recordings()?.clone())
    }

    /// Load one recording straight from disk and the store
    pub async fn get(&self, id: &str) -> Result<Recording, AppError> {
        let file = self
            .files
            .list_recordings()?
            .into_iter()
            .find(|f| f.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Recording '{}' not found", id)))?;

        let record = self.store.get(id).await?;
        let duration = self.probe.duration_secs(&file.path);
        Ok(Recording::from_parts(file, duration, record))
    }

    pub async fn status(&self, id: &str) -> Result<RecordingStatus, AppError> {
        let busy = self.gate.current(id);
        let record = self.store.get(id).await?;

        Ok(RecordingStatus {
            busy,
            transcript: phase(
                record.transcript.is_some(),
                matches!(busy, Some(Action::Transcribe | Action::ManualTranscript)),
            ),
            summary: phase(record.summary.is_some(), busy == Some(Action::Summarize)),
            todos: phase(record.todos.is_some(), busy == Some(Action::ExtractTodos)),
        })
    }

    // MARK: - Capture

    pub fn capture_state(&self) -> Result<CaptureState, AppError> {
        Ok(self.lock_capture()?.state())
    }

    /// Start recording into a new timestamped file
    pub fn start_capture(&self) -> Result<PathBuf, AppError> {
        self.lock_capture()?
            .start_recording(self.files.get_recordings_dir())
    }

    /// Stop recording; `None` when nothing usable was written
    pub async fn stop_capture(&self) -> Result<Option<Recording>, AppError> {
        let stopped = self.lock_capture()?.stop_recording()?;
        let Some(path) = stopped else {
            return Ok(None);
        };

        let id = path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| AppError::FileIO(format!("Invalid recording path: {:?}", path)))?
            .to_string();

        self.refresh().await?;
        Ok(Some(self.get(&id).await?))
    }

    // MARK: - Artifacts

    fn update_cached(&self, id: &str, apply: impl FnOnce(&mut Recording)) {
        match self.recordings.lock() {
            Ok(mut recordings) => {
                if let Some(recording) = recordings.iter_mut().find(|r| r.id == id) {
                    apply(recording);
                }
            }
            Err(e) => tracing::warn!("Lifecycle: Recording cache unavailable: {}", e),
        }
    }

    async fn require_transcript(&self, id: &str) -> Result<String, AppError> {
        self.store
            .get(id)
            .await?
            .transcript
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                AppError::Validation(format!("Recording '{}' has no transcript yet", id))
            })
    }

    /// Upload the recording for transcription and store the result.
    ///
    /// A new transcript clears any summary and todos derived from the old one.
    pub async fn transcribe(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AppError> {
        let _guard = self.gate.try_acquire(id, Action::Transcribe)?;

        let path = self.files.recording_path(id)?;
        let audio = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                AppError::NotFound(format!("Recording '{}' not found", id))
            }
            _ => AppError::FileIO(format!("Failed to read recording '{}': {}", id, e)),
        })?;

        tracing::info!("Lifecycle: Transcribing {} ({} bytes)", id, audio.len());
        let text = cancellable(cancel, self.transcriber.transcribe(audio, id)).await?;

        self.store.set_transcript(id, &text).await?;
        self.update_cached(id, |r| {
            r.transcript = Some(text.clone());
            r.summary = None;
            r.todos = None;
        });
        Ok(text)
    }

    /// Store a typed-in transcript as if transcription had succeeded
    pub async fn set_manual_transcript(&self, id: &str, text: &str) -> Result<(), AppError> {
        let _guard = self.gate.try_acquire(id, Action::ManualTranscript)?;

        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("transcript is empty".to_string()));
        }
        if !self.files.recording_path(id)?.is_file() {
            return Err(AppError::NotFound(format!("Recording '{}' not found", id)));
        }

        self.store.set_transcript(id, text).await?;
        self.update_cached(id, |r| {
            r.transcript = Some(text.to_string());
            r.summary = None;
            r.todos = None;
        });
        tracing::info!("Lifecycle: Manual transcript stored for {}", id);
        Ok(())
    }

    pub async fn summarize(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AppError> {
        let _guard = self.gate.try_acquire(id, Action::Summarize)?;
        let transcript = self.require_transcript(id).await?;

        let summary = cancellable(cancel, self.assistant.summarize_transcript(&transcript)).await?;

        self.store.set_summary(id, &summary).await?;
        self.update_cached(id, |r| r.summary = Some(summary.clone()));
        Ok(summary)
    }

    pub async fn extract_todos(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AppError> {
        let _guard = self.gate.try_acquire(id, Action::ExtractTodos)?;
        let transcript = self.require_transcript(id).await?;

        let todos = cancellable(cancel, self.assistant.extract_todos(&transcript)).await?;

        self.store.set_todos(id, &todos).await?;
        self.update_cached(id, |r| r.todos = Some(todos.clone()));
        Ok(todos)
    }

    // MARK: - Rename and delete

    /// Generate a name from the transcript without renaming anything
    pub async fn suggest_name(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AppError> {
        let _guard = self.gate.try_acquire(id, Action::Rename)?;
        let transcript = self.require_transcript(id).await?;
        cancellable(cancel, self.assistant.generate_smart_name(&transcript)).await
    }

    /// Rename a recording to `new_name`, carrying its artifacts along
    pub async fn apply_rename(&self, id: &str, new_name: &str) -> Result<String, AppError> {
        let _guard = self.gate.try_acquire(id, Action::Rename)?;
        self.rename_locked(id, new_name).await
    }

    /// Generate a name from the transcript and apply it.
    ///
    /// Nothing is renamed if name generation fails or is cancelled.
    pub async fn smart_rename(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AppError> {
        let _guard = self.gate.try_acquire(id, Action::Rename)?;
        let transcript = self.require_transcript(id).await?;

        let name = cancellable(cancel, self.assistant.generate_smart_name(&transcript)).await?;
        tracing::info!("Lifecycle: Suggested name '{}' for {}", name, id);

        self.rename_locked(id, &name).await
    }

    /// File first, then artifacts. A failed artifact migration puts the file back.
    ///
    /// The caller holds the gate for `old_id`; the target id is claimed here and
    /// held until the list is refreshed, so nothing can touch the new id while
    /// its artifacts are still being moved.
    async fn rename_locked(&self, old_id: &str, new_name: &str) -> Result<String, AppError> {
        let new_id = recording_id_for(new_name)?;
        if new_id == old_id {
            return Ok(new_id);
        }

        let _target_guard = self.gate.try_acquire(&new_id, Action::Rename)?;
        self.files.move_recording(old_id, &new_id)?;

        if let Err(e) = self.store.rename(old_id, &new_id).await {
            tracing::error!(
                "Lifecycle: Artifact migration {} -> {} failed: {}",
                old_id,
                new_id,
                e
            );
            if let Err(revert) = self.files.move_recording(&new_id, old_id) {
                tracing::error!("Lifecycle: Failed to restore {}: {}", old_id, revert);
            }
            return Err(e);
        }

        self.refresh().await?;
        Ok(new_id)
    }

    /// Delete the file, then its artifacts
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let _guard = self.gate.try_acquire(id, Action::Delete)?;

        self.files.delete_recording(id)?;
        self.store.remove(id).await?;

        self.lock_recordings()?.retain(|r| r.id != id);
        Ok(())
    }
}
