// Assistant - single-turn completion tasks (summary, smart name, todos, document summary)

use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::prompts;
use super::provider::{is_placeholder, ChatMessage, CompletionProvider};
use crate::error::AppError;
use crate::settings::{ModelSettings, Settings, TokenBudgets};

/// Maximum characters in a generated recording name
pub const MAX_NAME_CHARS: usize = 20;

/// Minimum characters accepted by document summarization
pub const MIN_DOCUMENT_CHARS: usize = 50;

/// Punctuation, brackets and path separators stripped from generated names
static NAME_STRIP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[「」《》【】\[\]“”‘’"'。，！？、.,!?;:()<>/\\*|]"#).unwrap()
});

static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Runs the one-shot completion tasks with their own prompt, model and budget.
pub struct Assistant {
    provider: Arc<dyn CompletionProvider>,
    models: ModelSettings,
    budgets: TokenBudgets,
}

impl Assistant {
    pub fn new(provider: Arc<dyn CompletionProvider>, settings: &Settings) -> Self {
        Self {
            provider,
            models: settings.models.clone(),
            budgets: settings.budgets.clone(),
        }
    }

    pub fn provider(&self) -> Arc<dyn CompletionProvider> {
        self.provider.clone()
    }

    /// Summarize a recording transcript: core content, key points, conclusions.
    pub async fn summarize_transcript(&self, transcript: &str) -> Result<String, AppError> {
        let transcript = require_text(transcript, "transcript")?;
        self.complete_simple(
            prompts::SUMMARY_SYSTEM,
            &prompts::summary_user(transcript),
            self.budgets.summary,
        )
        .await
    }

    /// Ask for a short title and sanitize it into a usable file name stem.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the model returned a placeholder or nothing that
    /// survives sanitization.
    pub async fn generate_smart_name(&self, transcript: &str) -> Result<String, AppError> {
        let transcript = require_text(transcript, "transcript")?;
        let raw = self
            .complete_simple(
                prompts::SMART_NAME_SYSTEM,
                &prompts::smart_name_user(transcript),
                self.budgets.smart_name,
            )
            .await?;

        if is_placeholder(&raw) {
            return Err(AppError::Validation(
                "the assistant did not suggest a name".to_string(),
            ));
        }

        let name = sanitize_name(&raw);
        if name.is_empty() {
            return Err(AppError::Validation(format!(
                "suggested name '{}' is empty after cleanup",
                raw.trim()
            )));
        }
        Ok(name)
    }

    /// Extract action items, one "• " bullet per line.
    pub async fn extract_todos(&self, transcript: &str) -> Result<String, AppError> {
        let transcript = require_text(transcript, "transcript")?;
        self.complete_simple(
            prompts::TODOS_SYSTEM,
            &prompts::todos_user(transcript),
            self.budgets.todos,
        )
        .await
    }

    /// Summarize pasted text. Rejects empty input and input shorter than
    /// [`MIN_DOCUMENT_CHARS`] characters before any remote call.
    pub async fn summarize_document(&self, text: &str) -> Result<String, AppError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("nothing to summarize".to_string()));
        }
        let chars = text.chars().count();
        if chars < MIN_DOCUMENT_CHARS {
            return Err(AppError::Validation(format!(
                "text too short to summarize ({} characters, need at least {})",
                chars, MIN_DOCUMENT_CHARS
            )));
        }
        self.complete_simple(
            prompts::DOCUMENT_SYSTEM,
            &prompts::document_user(text),
            self.budgets.document,
        )
        .await
    }

    async fn complete_simple(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<String, AppError> {
        let messages = [ChatMessage::system(system), ChatMessage::user(user)];
        self.provider
            .complete(&messages, &self.models.text_model, max_tokens)
            .await
    }
}

fn require_text<'a>(text: &'a str, what: &str) -> Result<&'a str, AppError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(AppError::Validation(format!("{} is empty", what)))
    } else {
        Ok(trimmed)
    }
}

/// Strip punctuation and brackets, collapse whitespace, and truncate to
/// [`MAX_NAME_CHARS`] characters.
pub fn sanitize_name(raw: &str) -> String {
    let stripped = NAME_STRIP_REGEX.replace_all(raw.trim(), "");
    let collapsed = WHITESPACE_REGEX.replace_all(stripped.trim(), " ");
    let truncated: String = collapsed.chars().take(MAX_NAME_CHARS).collect();
    truncated.trim_end().to_string()
}
