// CompletionProvider trait and the chat-completion wire types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Returned when the endpoint answered 2xx but the message content was empty.
pub const COMPLETION_EMPTY_PLACEHOLDER: &str = "(the assistant returned no content)";

/// Returned when the endpoint answered 2xx with JSON that has no `choices[0].message`.
pub const COMPLETION_UNPARSED_PLACEHOLDER: &str = "(the response could not be interpreted)";

/// Speaker of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Image reference carried inside a content part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

impl ImageUrl {
    /// Build a `data:<mime>;base64,<payload>` URL
    pub fn data_url(mime_type: &str, base64_payload: &str) -> Self {
        Self {
            url: format!("data:{};base64,{}", mime_type, base64_payload),
        }
    }
}

/// One typed part of a multimodal message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

/// Message content: a plain string, or a list of typed parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// A single message sent to the completion endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }

    /// User message with the image part first, then the text part
    pub fn user_with_image(text: impl Into<String>, image_url: ImageUrl) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(vec![
                ContentPart::ImageUrl { image_url },
                ContentPart::Text { text: text.into() },
            ]),
        }
    }

    /// Whether any part of this message is an image
    pub fn has_image(&self) -> bool {
        match &self.content {
            MessageContent::Text(_) => false,
            MessageContent::Parts(parts) => parts
                .iter()
                .any(|p| matches!(p, ContentPart::ImageUrl { .. })),
        }
    }

    /// Concatenated text of this message, ignoring image parts
    pub fn text(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::ImageUrl { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Request body for the completion endpoint
#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub messages: &'a [ChatMessage],
}

/// Whether `text` is one of the documented "succeeded with nothing" placeholders
pub fn is_placeholder(text: &str) -> bool {
    text == COMPLETION_EMPTY_PLACEHOLDER || text == COMPLETION_UNPARSED_PLACEHOLDER
}

/// Extract `choices[0].message.content` from a 2xx response body.
///
/// Empty content maps to [`COMPLETION_EMPTY_PLACEHOLDER`], a missing
/// `choices[0].message` to [`COMPLETION_UNPARSED_PLACEHOLDER`]. A body that is
/// not JSON at all is a parse error.
pub fn extract_completion_text(body: &str) -> Result<String, AppError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| AppError::Parse(format!("completion response is not JSON: {}", e)))?;

    let message = value
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"));

    let Some(message) = message else {
        return Ok(COMPLETION_UNPARSED_PLACEHOLDER.to_string());
    };

    let content = message
        .get("content")
        .and_then(|c| c.as_str())
        .unwrap_or_default();

    if content.trim().is_empty() {
        Ok(COMPLETION_EMPTY_PLACEHOLDER.to_string())
    } else {
        Ok(content.to_string())
    }
}

/// Backend-agnostic completion interface
///
/// One transport serves every surface (summaries, naming, todos, chat, image
/// chat); callers differ only in messages, model and token budget.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the name of this provider (e.g., "http")
    fn name(&self) -> &str;

    /// Send `messages` and return the first choice's text.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The assistant's text, or a documented placeholder
    /// * `Err(AppError)` - Network, remote-status or parse failure
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        max_tokens: u32,
    ) -> Result<String, AppError>;
}
