// Chatbot - free-form chat over the completion endpoint
//
// Each ChatSession owns its BoundedHistory. A turn borrows the session mutably,
// so a session can never have two requests in flight.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::history::{BoundedHistory, Turn};
use crate::cancel::cancellable;
use crate::error::AppError;
use crate::intelligence::prompts;
use crate::intelligence::provider::{ChatMessage, CompletionProvider};

/// A plain-text chat session with round-capped memory
pub struct ChatSession {
    provider: Arc<dyn CompletionProvider>,
    model: String,
    max_tokens: u32,
    history: BoundedHistory,
}

impl ChatSession {
    pub fn new(provider: Arc<dyn CompletionProvider>, model: String, max_tokens: u32) -> Self {
        Self {
            provider,
            model,
            max_tokens,
            history: BoundedHistory::default(),
        }
    }

    /// Send one question and record the exchange.
    ///
    /// The request is the system preamble, then the retained history, then the
    /// new question. History is only updated when the call succeeds; a failed or
    /// cancelled turn leaves it exactly as it was.
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
            "Chatbot: Sending {} messages ({} history entries)",
            messages.len(),
            self.history.len()
        );

        let answer = cancellable(
            cancel,
            self.provider
                .complete(&messages, &self.model, self.max_tokens),
        )
        .await?;

        self.history.push_round(question, answer.clone());
        Ok(answer)
    }

    fn request_messages(&self, question: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(ChatMessage::system(prompts::CHAT_SYSTEM));
        messages.extend(self.history.to_messages());
        messages.push(ChatMessage::user(question));
        messages
    }

    /// Retained turns, oldest first
    pub fn history(&self) -> Vec<Turn> {
        self.history.entries().cloned().collect()
    }

    pub fn clear(&mut self) {
        tracing::info!("Chatbot: History cleared ({} entries)", self.history.len());
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intelligence::provider::Role;
    use crate::test_support::MockCompletionProvider;

    fn session(mock: &Arc<MockCompletionProvider>) -> ChatSession {
        ChatSession::new(mock.clone(), "Qwen/Qwen3-8B".to_string(), 1500)
    }

    #[tokio::test]
    async fn test_request_carries_history() {
        let mock = Arc::new(MockCompletionProvider::new());
        mock.push_ok("Hi!");
        mock.push_ok("Paris.");
        let mut chat = session(&mock);
        let token = CancellationToken::new();

        chat.ask("hello", &token).await.unwrap();
        let answer = chat.ask("capital of France?", &token).await.unwrap();
        assert_eq!(answer, "Paris.");

        let calls = mock.calls();
        assert_eq!(calls[0].messages.len(), 2);
        let second = &calls[1].messages;
        assert_eq!(second.len(), 4);
        assert_eq!(second[0].role, Role::System);
        assert_eq!(second[1].text(), "hello");
        assert_eq!(second[2].role, Role::Assistant);
        assert_eq!(second[2].text(), "Hi!");
        assert_eq!(second[3].text(), "capital of France?");
        assert_eq!(calls[1].model, "Qwen/Qwen3-8B");
        assert_eq!(calls[1].max_tokens, 1500);
    }

    #[tokio::test]
    async fn test_failed_turn_leaves_history_untouched() {
        let mock = Arc::new(MockCompletionProvider::new());
        mock.push_ok("first");
        mock.push_err(AppError::Remote {
            status: 503,
            body: "overloaded".to_string(),
        });
        let mut chat = session(&mock);
        let token = CancellationToken::new();

        chat.ask("one", &token).await.unwrap();
        let err = chat.ask("two", &token).await.unwrap_err();
        assert!(err.to_string().contains("overloaded"));
        assert_eq!(chat.history().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_turn_is_not_recorded() {
        let mock = Arc::new(MockCompletionProvider::new());
        mock.push_ok("never seen");
        let mut chat = session(&mock);
        let token = CancellationToken::new();
        token.cancel();

        let err = chat.ask("hello", &token).await.unwrap_err();
        assert!(matches!(err, AppError::Cancelled));
        assert!(chat.history().is_empty());
    }

    #[tokio::test]
    async fn test_history_capped_at_forty_entries() {
        let mock = Arc::new(MockCompletionProvider::new());
        let mut chat = session(&mock);
        let token = CancellationToken::new();

        for i in 1..=21 {
            mock.push_ok(format!("a{}", i));
            chat.ask(&format!("q{}", i), &token).await.unwrap();
        }

        let history = chat.history();
        assert_eq!(history.len(), 40);
        assert_eq!(history[0].content, "q2");
        assert_eq!(history[39].content, "a21");
    }

    #[tokio::test]
    async fn test_clear_and_empty_question() {
        let mock = Arc::new(MockCompletionProvider::new());
        mock.push_ok("ok");
        let mut chat = session(&mock);
        let token = CancellationToken::new();

        assert!(matches!(
            chat.ask("   ", &token).await,
            Err(AppError::Validation(_))
        ));
        chat.ask("hi", &token).await.unwrap();
        chat.clear();
        assert!(chat.history().is_empty());
    }
}
