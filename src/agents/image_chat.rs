// ImageChat - multi-turn questions about a single picture
//
// The image rides along only on the first user turn; every later question is
// plain text and relies on the conversation for context.

use std::path::Path;
use std::sync::Arc;

use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use tokio_util::sync::CancellationToken;

use super::history::Turn;
use crate::cancel::cancellable;
use crate::error::AppError;
use crate::intelligence::prompts;
use crate::intelligence::provider::{ChatMessage, CompletionProvider, ImageUrl, Role};
use crate::qa_history::{QaHistoryEntry, QaHistoryStore};

/// Widest image sent to the vision model, in pixels
pub const MAX_IMAGE_WIDTH: u32 = 1024;

/// JPEG quality used when re-encoding attachments
pub const IMAGE_JPEG_QUALITY: u8 = 80;

/// MIME type of every normalized attachment
pub const IMAGE_MIME: &str = "image/jpeg";

/// Picture attached to an image QA session, normalized and base64-encoded
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttachment {
    pub payload_b64: String,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    /// Where the image came from (path or picker URI), kept for the history log
    pub source_ref: String,
}

impl ImageAttachment {
    /// Decode any supported image, scale it down to at most
    /// [`MAX_IMAGE_WIDTH`] pixels wide and re-encode it as JPEG.
    ///
    /// # Errors
    ///
    /// - `Validation` if the bytes are empty or not a decodable image
    /// - `Parse` if re-encoding fails
    pub fn from_bytes(bytes: &[u8], source_ref: &str) -> Result<Self, AppError> {
        if bytes.is_empty() {
            return Err(AppError::Validation("image is empty".to_string()));
        }

        let decoded = image::load_from_memory(bytes).map_err(|e| {
            AppError::Validation(format!("'{}' is not a supported image: {}", source_ref, e))
        })?;

        let (width, height) = (decoded.width(), decoded.height());
        let scaled = if width > MAX_IMAGE_WIDTH {
            let new_height = ((height as u64 * MAX_IMAGE_WIDTH as u64) / width as u64).max(1);
            decoded.resize_exact(MAX_IMAGE_WIDTH, new_height as u32, FilterType::Triangle)
        } else {
            decoded
        };

        // JPEG has no alpha channel
        let rgb = scaled.to_rgb8();
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, IMAGE_JPEG_QUALITY)
            .encode_image(&rgb)
            .map_err(|e| AppError::Parse(format!("Failed to encode image: {}", e)))?;

        tracing::debug!(
            "ImageChat: Normalized {} from {}x{} to {}x{} ({} bytes)",
            source_ref,
            width,
            height,
            rgb.width(),
            rgb.height(),
            jpeg.len()
        );

        Ok(Self {
            payload_b64: base64::engine::general_purpose::STANDARD.encode(&jpeg),
            mime_type: IMAGE_MIME.to_string(),
            width: rgb.width(),
            height: rgb.height(),
            source_ref: source_ref.to_string(),
        })
    }

    /// Read and normalize an image file
    pub async fn from_file(path: &Path) -> Result<Self, AppError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            AppError::FileIO(format!("Failed to read image {}: {}", path.display(), e))
        })?;
        let source_ref = path.to_string_lossy().to_string();

        tokio::task::spawn_blocking(move || Self::from_bytes(&bytes, &source_ref))
            .await
            .map_err(|e| AppError::FileIO(format!("Image decoding task failed: {}", e)))?
    }

    pub fn data_url(&self) -> ImageUrl {
        ImageUrl::data_url(&self.mime_type, &self.payload_b64)
    }
}

/// A conversation grounded in one image
///
/// Dropping the session discards the conversation; choosing a new image means
/// creating a new session. Only the first-round snapshot outlives it, in the
/// QA history log.
pub struct ImageChatSession {
    provider: Arc<dyn CompletionProvider>,
    history_log: Arc<dyn QaHistoryStore>,
    model: String,
    max_tokens: u32,
    image: ImageAttachment,
    turns: Vec<Turn>,
    snapshot_saved: bool,
}

impl ImageChatSession {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        history_log: Arc<dyn QaHistoryStore>,
        model: String,
        max_tokens: u32,
        image: ImageAttachment,
    ) -> Self {
        Self {
            provider,
            history_log,
            model,
            max_tokens,
            image,
            turns: Vec::new(),
            snapshot_saved: false,
        }
    }

    pub fn image(&self) -> &ImageAttachment {
        &self.image
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Conversation part of the next request, excluding the system preamble.
    ///
    /// Prior turns in order with the image only on the first user turn, then
    /// `question`. With no prior turns the question itself carries the image.
    pub fn conversation_messages(&self, question: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.turns.len() + 1);
        let mut image_sent = false;

        for turn in &self.turns {
            if turn.role == Role::User && !image_sent {
                messages.push(ChatMessage::user_with_image(
                    turn.content.clone(),
                    self.image.data_url(),
                ));
                image_sent = true;
            } else {
                messages.push(turn.to_message());
            }
        }

        if image_sent {
            messages.push(ChatMessage::user(question));
        } else {
            messages.push(ChatMessage::user_with_image(question, self.image.data_url()));
        }
        messages
    }

    fn request_messages(&self, question: &str) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(prompts::IMAGE_SYSTEM)];
        messages.extend(self.conversation_messages(question));
        messages
    }

    /// Ask a question about the image.
    ///
    /// The exchange is recorded only on success. After the first successful
    /// round a snapshot is appended to the QA history log; a failure to write it
    /// is logged and does not fail the turn.
    pub async fn ask(
        &mut self,
        question: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AppError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Validation("question is empty".to_string()));
        }

        let messages = self.request_messages(question);
        tracing::debug!(
            "ImageChat: Sending {} messages (image {}, {} prior turns)",
            messages.len(),
            self.image.mime_type,
            self.turns.len()
        );

        let answer = cancellable(
            cancel,
            self.provider
                .complete(&messages, &self.model, self.max_tokens),
        )
        .await?;

        self.turns.push(Turn::user(question));
        self.turns.push(Turn::assistant(answer.clone()));

        if !self.snapshot_saved {
            self.snapshot_saved = true;
            self.save_snapshot(question, &answer).await;
        }

        Ok(answer)
    }

    async fn save_snapshot(&self, question: &str, answer: &str) {
        let entry = QaHistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            image_ref: self.image.source_ref.clone(),
            first_question: question.to_string(),
            first_answer: answer.to_string(),
            date: chrono::Local::now().format("%Y-%m-%d %H:%M").to_string(),
            turn_count: self.turns.len() as u32,
        };

        if let Err(e) = self.history_log.append(entry).await {
            tracing::warn!("ImageChat: Failed to save history entry: {}", e);
        }
    }
}
