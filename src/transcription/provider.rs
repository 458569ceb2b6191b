use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppError;

/// Returned when the endpoint answered 2xx but recognized no speech.
pub const TRANSCRIPT_EMPTY_PLACEHOLDER: &str = "(no speech recognized)";

/// Content type sent with every uploaded recording
pub const AUDIO_MIME: &str = "audio/m4a";

// MARK: - Wire format

/// Success body of the transcription endpoint
#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: Option<String>,
}

/// Parse a 2xx transcription body into text.
///
/// A missing, null or blank `text` maps to [`TRANSCRIPT_EMPTY_PLACEHOLDER`], never
/// to an empty string. A body that is not JSON is a parse error.
pub fn parse_transcription_body(body: &str) -> Result<String, AppError> {
    let response: TranscriptionResponse = serde_json::from_str(body)
        .map_err(|e| AppError::Parse(format!("transcription response is not JSON: {}", e)))?;

    match response.text {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        _ => Ok(TRANSCRIPT_EMPTY_PLACEHOLDER.to_string()),
    }
}

// MARK: - TranscriptionProvider Trait

/// Trait-based abstraction for speech-to-text engines.
///
/// This trait enables provider swapping (remote endpoint, mocks in tests)
/// without changing the recording lifecycle.
///
/// # Thread Safety
/// Implementations must be Send + Sync for use across async tasks.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Returns the name of this provider (e.g., "remote")
    fn name(&self) -> &str;

    /// Transcribes a whole recording.
    ///
    /// # Arguments
    /// * `audio` - Encoded audio file contents
    /// * `filename` - File name reported to the endpoint
    ///
    /// # Errors
    /// Network, remote-status or parse failure. No retry is attempted.
    async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> Result<String, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text() {
        let text = parse_transcription_body(r#"{"text":"hello there"}"#).unwrap();
        assert_eq!(text, "hello there");
    }

    #[test]
    fn test_parse_empty_text_is_placeholder() {
        assert_eq!(
            parse_transcription_body(r#"{"text":""}"#).unwrap(),
            TRANSCRIPT_EMPTY_PLACEHOLDER
        );
        assert_eq!(
            parse_transcription_body(r#"{"text":"   "}"#).unwrap(),
            TRANSCRIPT_EMPTY_PLACEHOLDER
        );
    }

    #[test]
    fn test_parse_missing_text_is_placeholder() {
        assert_eq!(
            parse_transcription_body(r#"{"duration":3.2}"#).unwrap(),
            TRANSCRIPT_EMPTY_PLACEHOLDER
        );
        assert_eq!(
            parse_transcription_body(r#"{"text":null}"#).unwrap(),
            TRANSCRIPT_EMPTY_PLACEHOLDER
        );
    }

    #[test]
    fn test_parse_non_json_is_error() {
        let err = parse_transcription_body("Bad Gateway").unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }
}
