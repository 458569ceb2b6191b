// BoundedHistory - round-capped conversation memory for plain chat

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::intelligence::provider::{ChatMessage, Role};

/// Maximum user/assistant rounds kept by plain chat (40 entries)
pub const CHAT_MAX_ROUNDS: usize = 20;

/// One side of an exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn to_message(&self) -> ChatMessage {
        match self.role {
            Role::System => ChatMessage::system(self.content.clone()),
            Role::User => ChatMessage::user(self.content.clone()),
            Role::Assistant => ChatMessage::assistant(self.content.clone()),
        }
    }
}

/// Ordered (user, assistant) pairs capped at `max_rounds`.
///
/// Entries are only ever added as a complete round, and eviction removes the
/// oldest round as a unit, so the length is always even and never exceeds
/// `2 * max_rounds`.
#[derive(Debug, Clone)]
pub struct BoundedHistory {
    max_rounds: usize,
    entries: VecDeque<Turn>,
}

impl BoundedHistory {
    pub fn new(max_rounds: usize) -> Self {
        Self {
            max_rounds,
            entries: VecDeque::with_capacity(max_rounds * 2),
        }
    }

    /// Append one completed exchange, evicting the oldest round when full.
    pub fn push_round(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.entries.push_back(Turn::user(question));
        self.entries.push_back(Turn::assistant(answer));

        while self.entries.len() > self.max_rounds * 2 {
            self.entries.pop_front();
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rounds(&self) -> usize {
        self.entries.len() / 2
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> impl Iterator<Item = &Turn> {
        self.entries.iter()
    }

    /// History as request messages, oldest first
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        self.entries.iter().map(Turn::to_message).collect()
    }
}

impl Default for BoundedHistory {
    fn default() -> Self {
        Self::new(CHAT_MAX_ROUNDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_twenty_one_rounds_evict_the_first() {
        let mut history = BoundedHistory::default();
        for i in 1..=21 {
            history.push_round(format!("q{}", i), format!("a{}", i));
        }

        assert_eq!(history.len(), 40);
        let contents: Vec<&str> = history.entries().map(|t| t.content.as_str()).collect();
        assert!(!contents.contains(&"q1"));
        assert!(!contents.contains(&"a1"));
        assert_eq!(contents[0], "q2");
        assert_eq!(contents[38], "q21");
        assert_eq!(contents[39], "a21");
    }

    #[test]
    fn test_roles_alternate() {
        let mut history = BoundedHistory::new(2);
        history.push_round("q", "a");
        history.push_round("q", "a");
        history.push_round("q", "a");

        let roles: Vec<Role> = history.entries().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
    }

    #[test]
    fn test_clear() {
        let mut history = BoundedHistory::default();
        history.push_round("q", "a");
        history.clear();
        assert!(history.is_empty());
        assert!(history.to_messages().is_empty());
    }

    proptest! {
        #[test]
        fn prop_length_even_and_bounded(rounds in 0usize..100) {
            let mut history = BoundedHistory::default();
            for i in 0..rounds {
                history.push_round(format!("q{}", i), format!("a{}", i));
                prop_assert!(history.len() <= CHAT_MAX_ROUNDS * 2);
                prop_assert_eq!(history.len() % 2, 0);
            }
            prop_assert_eq!(history.rounds(), rounds.min(CHAT_MAX_ROUNDS));
        }
    }
}
