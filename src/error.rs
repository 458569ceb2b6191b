use thiserror::Error;

/// Application error types for the recorder core
#[derive(Debug, Error)]
pub enum AppError {
    /// Could not reach the remote service (connect/read timeout, transport failure)
    #[error("Network error: {0}")]
    Network(String),

    /// The remote service answered with a non-success status
    #[error("Request failed ({status}): {body}")]
    Remote { status: u16, body: String },

    /// A response body could not be interpreted
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Input rejected before any remote call was made
    #[error("Invalid input: {0}")]
    Validation(String),

    /// File I/O operation failed (read, write, rename, delete)
    #[error("File operation failed: {0}")]
    FileIO(String),

    /// Local database operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Settings could not be loaded, validated or saved
    #[error("Configuration error: {0}")]
    Config(String),

    /// Recording, session or history entry does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Another call is already running for this recording
    #[error("'{id}' is busy: {action} already in progress")]
    Busy { id: String, action: String },

    /// The caller revoked the operation before it completed
    #[error("Operation cancelled")]
    Cancelled,

    /// The platform recorder failed to start or stop
    #[error("Audio capture failed: {0}")]
    CaptureFailed(String),

    /// Attempted to start recording while already recording
    #[error("A recording is already in progress")]
    ConcurrentRecording,
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AppError::Network(format!("request timed out: {}", e))
        } else if e.is_connect() {
            AppError::Network(format!("connection failed: {}", e))
        } else if e.is_decode() {
            AppError::Parse(e.to_string())
        } else {
            AppError::Network(e.to_string())
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Parse(e.to_string())
    }
}
