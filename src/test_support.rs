// Test doubles shared by the unit tests

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::AppError;
use crate::intelligence::provider::{ChatMessage, CompletionProvider};
use crate::recording::{AudioCapture, MediaProbe};
use crate::transcription::TranscriptionProvider;

/// One call seen by [`MockCompletionProvider`]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub max_tokens: u32,
}

/// Completion provider answering from a queue of canned results
pub struct MockCompletionProvider {
    responses: Mutex<VecDeque<Result<String, AppError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockCompletionProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push_ok(&self, text: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(text.into()));
    }

    pub fn push_err(&self, err: AppError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        max_tokens: u32,
    ) -> Result<String, AppError> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            model: model.to_string(),
            max_tokens,
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::Network("no mock response queued".to_string())))
    }
}

/// Transcription provider answering from a queue of canned results
pub struct MockTranscriptionProvider {
    responses: Mutex<VecDeque<Result<String, AppError>>>,
    uploads: Mutex<Vec<(String, usize)>>,
}

impl MockTranscriptionProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn push_ok(&self, text: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(text.into()));
    }

    pub fn push_err(&self, err: AppError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    /// (filename, byte count) of every upload
    pub fn uploads(&self) -> Vec<(String, usize)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl TranscriptionProvider for MockTranscriptionProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> Result<String, AppError> {
        self.uploads
            .lock()
            .unwrap()
            .push((filename.to_string(), audio.len()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::Network("no mock response queued".to_string())))
    }
}

/// Transcription provider that blocks until released, to hold a gate open
pub struct GatedTranscriptionProvider {
    pub started: Notify,
    pub release: Notify,
    text: String,
}

impl GatedTranscriptionProvider {
    pub fn new(text: &str) -> Self {
        Self {
            started: Notify::new(),
            release: Notify::new(),
            text: text.to_string(),
        }
    }
}

#[async_trait]
impl TranscriptionProvider for GatedTranscriptionProvider {
    fn name(&self) -> &str {
        "gated"
    }

    async fn transcribe(&self, _audio: Vec<u8>, _filename: &str) -> Result<String, AppError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(self.text.clone())
    }
}

/// Recorder that writes fixed bytes to the output path when stopped
pub struct FakeCapture {
    bytes: Vec<u8>,
    fail_start: bool,
    current: Mutex<Option<PathBuf>>,
}

impl FakeCapture {
    pub fn with_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            fail_start: false,
            current: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            bytes: Vec::new(),
            fail_start: true,
            current: Mutex::new(None),
        }
    }
}

impl AudioCapture for FakeCapture {
    fn start(&self, output_path: &Path) -> Result<(), AppError> {
        if self.fail_start {
            return Err(AppError::CaptureFailed("microphone unavailable".to_string()));
        }
        *self.current.lock().unwrap() = Some(output_path.to_path_buf());
        Ok(())
    }

    fn stop(&self) -> Result<(), AppError> {
        let path = self
            .current
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| AppError::CaptureFailed("not recording".to_string()))?;
        std::fs::write(&path, &self.bytes).map_err(|e| AppError::FileIO(e.to_string()))
    }
}

/// Probe reporting the same duration for every file
pub struct FixedProbe(pub f64);

impl MediaProbe for FixedProbe {
    fn duration_secs(&self, _path: &Path) -> Option<f64> {
        Some(self.0)
    }
}
