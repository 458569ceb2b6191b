use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;

use crate::error::AppError;

/// Platform audio recorder writing an encoded file
///
/// The app never touches audio samples itself: the recorder is told where to
/// write, and later told to finish the file.
pub trait AudioCapture: Send + Sync {
    /// Begin recording into `output_path`
    fn start(&self, output_path: &Path) -> Result<(), AppError>;

    /// Finish the current recording and flush it to disk
    fn stop(&self) -> Result<(), AppError>;
}

/// Reads the playback duration of an audio file
pub trait MediaProbe: Send + Sync {
    /// Duration in seconds, or `None` if the file cannot be probed
    fn duration_secs(&self, path: &Path) -> Option<f64>;
}

/// Probe used when no media backend is available; durations stay unknown
pub struct NoMediaProbe;

impl MediaProbe for NoMediaProbe {
    fn duration_secs(&self, _path: &Path) -> Option<f64> {
        None
    }
}

/// Capture state of the recorder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Recording { path: PathBuf },
}

/// Tracks the single active capture and drives the platform recorder
pub struct RecordingManager {
    capture: Arc<dyn AudioCapture>,

    /// The filepath where the current recording is being written, if any
    current_filepath: Option<PathBuf>,
}

impl RecordingManager {
    pub fn new(capture: Arc<dyn AudioCapture>) -> Self {
        Self {
            capture,
            current_filepath: None,
        }
    }

    /// Check if a recording is currently active
    pub fn is_recording(&self) -> bool {
        self.current_filepath.is_some()
    }

    pub fn state(&self) -> CaptureState {
        match &self.current_filepath {
            Some(path) => CaptureState::Recording { path: path.clone() },
            None => CaptureState::Idle,
        }
    }

    /// Generate a timestamped filepath for a new recording
    ///
    /// Creates a filename in the format `Recording_YYYYMMDD_HHMMSS.m4a` using the
    /// current local time. If that name is already taken (two captures within
    /// one second), a numeric suffix is appended.
    pub fn generate_timestamped_path(&self, recordings_dir: &Path) -> PathBuf {
        let stem = Local::now().format("Recording_%Y%m%d_%H%M%S").to_string();

        let mut path = recordings_dir.join(format!("{}.m4a", stem));
        let mut suffix = 1;
        while path.exists() {
            path = recordings_dir.join(format!("{}_{}.m4a", stem, suffix));
            suffix += 1;
        }
        path
    }

    /// Start a new recording in `recordings_dir`, returning its path.
    ///
    /// # Errors
    ///
    /// - `ConcurrentRecording` if a recording is already in progress
    /// - `CaptureFailed` if the platform recorder refuses to start
    pub fn start_recording(&mut self, recordings_dir: &Path) -> Result<PathBuf, AppError> {
        if self.is_recording() {
            return Err(AppError::ConcurrentRecording);
        }

        let output_path = self.generate_timestamped_path(recordings_dir);

        self.capture.start(&output_path).map_err(|e| match e {
            AppError::CaptureFailed(_) => e,
            other => AppError::CaptureFailed(other.to_string()),
        })?;

        tracing::info!("Recording: Started {}", output_path.display());
        self.current_filepath = Some(output_path.clone());
        Ok(output_path)
    }

    /// Stop the current recording.
    ///
    /// Returns `Some(path)` only when the recorder left a non-empty file behind.
    /// An empty file is removed and `None` is returned. The manager is idle
    /// afterwards even if the recorder reports an error.
    ///
    /// # Errors
    ///
    /// - `Validation` if no recording is in progress
    /// - `CaptureFailed` if the platform recorder fails to stop
    pub fn stop_recording(&mut self) -> Result<Option<PathBuf>, AppError> {
        let filepath = self
            .current_filepath
            .take()
            .ok_or_else(|| AppError::Validation("No recording in progress".to_string()))?;

        self.capture.stop().map_err(|e| match e {
            AppError::CaptureFailed(_) => e,
            other => AppError::CaptureFailed(other.to_string()),
        })?;

        let size = std::fs::metadata(&filepath).map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            tracing::warn!(
                "Recording: File is missing or empty, discarding: {}",
                filepath.display()
            );
            if filepath.exists() {
                if let Err(e) = std::fs::remove_file(&filepath) {
                    tracing::warn!("Recording: Failed to remove empty file: {}", e);
                }
            }
            return Ok(None);
        }

        tracing::info!(
            "Recording: Stopped {} ({} bytes)",
            filepath.display(),
            size
        );
        Ok(Some(filepath))
    }
}
