// RemoteTranscriptionProvider - uploads whole recordings to an OpenAI-compatible endpoint

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;

use super::provider::{parse_transcription_body, TranscriptionProvider, AUDIO_MIME};
use crate::error::AppError;
use crate::settings::ApiSettings;

/// Transcription provider backed by `POST {base_url}/audio/transcriptions`.
pub struct RemoteTranscriptionProvider {
    api_key: String,
    endpoint: String,
    model: String,
    client: Client,
}

impl RemoteTranscriptionProvider {
    pub fn new(api: &ApiSettings) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(api.transcription_connect_timeout_secs))
            .timeout(Duration::from_secs(api.transcription_read_timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let endpoint = format!("{}/audio/transcriptions", api.base_url.trim_end_matches('/'));

        tracing::info!(
            "Transcription: Initialized endpoint {} (model: {})",
            endpoint,
            api.transcription_model
        );

        Ok(Self {
            api_key: api.api_key.clone(),
            endpoint,
            model: api.transcription_model.clone(),
            client,
        })
    }
}

#[async_trait]
impl TranscriptionProvider for RemoteTranscriptionProvider {
    fn name(&self) -> &str {
        "remote"
    }

    async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> Result<String, AppError> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::Config(
                "Transcription unavailable: no API key configured".to_string(),
            ));
        }

        tracing::info!(
            "Transcription: Uploading {} ({} bytes)",
            filename,
            audio.len()
        );

        // Endpoint requires the "model" field alongside the file part
        let form = Form::new().text("model", self.model.clone()).part(
            "file",
            Part::bytes(audio)
                .file_name(filename.to_string())
                .mime_str(AUDIO_MIME)?,
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!("Transcription: API error {}: {}", status, body);
            return Err(AppError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        let text = parse_transcription_body(&body)?;
        tracing::info!("Transcription: Received {} chars", text.chars().count());
        Ok(text)
    }
}
