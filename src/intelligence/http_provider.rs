// HttpCompletionProvider - chat completions over an OpenAI-compatible HTTP API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::provider::{extract_completion_text, ChatMessage, CompletionProvider, CompletionRequest};
use crate::error::AppError;
use crate::settings::ApiSettings;

/// Completion provider backed by `POST {base_url}/chat/completions`.
pub struct HttpCompletionProvider {
    api_key: String,
    endpoint: String,
    client: Client,
}

impl HttpCompletionProvider {
    /// Build a provider from API settings.
    ///
    /// The connect timeout bounds connection setup; the read timeout bounds the
    /// whole request.
    pub fn new(api: &ApiSettings) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(api.completion_connect_timeout_secs))
            .timeout(Duration::from_secs(api.completion_read_timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let endpoint = format!("{}/chat/completions", api.base_url.trim_end_matches('/'));

        tracing::info!(
            "Completion: Initialized endpoint {} with API key ({}...)",
            endpoint,
            api.api_key.chars().take(8).collect::<String>()
        );

        Ok(Self {
            api_key: api.api_key.clone(),
            endpoint,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionProvider for HttpCompletionProvider {
    fn name(&self) -> &str {
        "http"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        max_tokens: u32,
    ) -> Result<String, AppError> {
        tracing::debug!(
            "Completion: model={} max_tokens={} messages={}",
            model,
            max_tokens,
            messages.len()
        );

        let request = CompletionRequest {
            model,
            max_tokens,
            messages,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!("Completion: API error {}: {}", status, body);
            return Err(AppError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        let text = extract_completion_text(&body)?;
        tracing::debug!("Completion: received {} chars", text.chars().count());
        Ok(text)
    }
}
