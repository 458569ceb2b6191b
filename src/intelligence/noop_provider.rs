// NoOpProvider - fallback provider when the completion endpoint is not configured

use async_trait::async_trait;

use super::provider::{ChatMessage, CompletionProvider};
use crate::error::AppError;

/// Provider that fails every request with a configuration error
///
/// Used when no API key is configured or the HTTP client cannot be built.
/// Recording, playback and file management keep working without it.
pub struct NoOpProvider {
    reason: String,
}

impl NoOpProvider {
    /// Create a new NoOpProvider with the given unavailability reason
    pub fn new(reason: String) -> Self {
        Self { reason }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

#[async_trait]
impl CompletionProvider for NoOpProvider {
    fn name(&self) -> &str {
        "noop"
    }

    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _model: &str,
        _max_tokens: u32,
    ) -> Result<String, AppError> {
        Err(AppError::Config(format!(
            "Completion unavailable: {}",
            self.reason
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_reports_reason() {
        let provider = NoOpProvider::new("no API key configured".to_string());
        let err = provider
            .complete(&[ChatMessage::user("hi")], "m", 10)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("no API key configured"));
    }
}
