//! Token-bounded conversation memory.
//!
//! Keeps a rolling window of recent turns for the chat engine. The budget is
//! enforced with the same rough chars-per-token estimate used elsewhere; the
//! newest turn always survives, even when it alone exceeds the budget.

use super::ChatRole;
use crate::chunking::estimate_tokens;
use std::collections::VecDeque;

/// Rolling window of conversation turns with a token budget.
#[derive(Debug, Clone)]
pub struct ChatMemoryBuffer {
    token_limit: usize,
    turns: VecDeque<(ChatRole, String)>,
}

impl ChatMemoryBuffer {
    /// Create a buffer with the given token budget.
    pub fn new(token_limit: usize) -> Self {
        Self {
            token_limit,
            turns: VecDeque::new(),
        }
    }

    /// Append a turn, evicting the oldest turns if over budget.
    pub fn push(&mut self, role: ChatRole, content: impl Into<String>) {
        self.turns.push_back((role, content.into()));
        self.trim();
    }

    /// Iterate the remembered turns, oldest first.
    pub fn window(&self) -> impl Iterator<Item = (ChatRole, &str)> {
        self.turns.iter().map(|(role, content)| (*role, content.as_str()))
    }

    /// Estimated token footprint of the buffer.
    pub fn token_estimate(&self) -> usize {
        self.turns
            .iter()
            .map(|(_, content)| estimate_tokens(content))
            .sum()
    }

    /// Forget all turns.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    fn trim(&mut self) {
        while self.token_estimate() > self.token_limit && self.turns.len() > 1 {
            self.turns.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_turns_within_budget() {
        let mut buffer = ChatMemoryBuffer::new(100);
        buffer.push(ChatRole::User, "q".repeat(80));
        buffer.push(ChatRole::Assistant, "a".repeat(80));

        assert_eq!(buffer.len(), 2);
        assert!(buffer.token_estimate() <= 100);
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut buffer = ChatMemoryBuffer::new(50);
        buffer.push(ChatRole::User, "first ".repeat(20));
        buffer.push(ChatRole::Assistant, "second ".repeat(20));
        buffer.push(ChatRole::User, "third".to_string());

        let contents: Vec<_> = buffer.window().map(|(_, c)| c.to_string()).collect();
        assert!(!contents.iter().any(|c| c.starts_with("first")));
        assert_eq!(contents.last().unwrap(), "third");
    }

    #[test]
    fn test_newest_turn_survives_oversized() {
        let mut buffer = ChatMemoryBuffer::new(10);
        buffer.push(ChatRole::User, "x".repeat(500));

        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_window_preserves_order_and_roles() {
        let mut buffer = ChatMemoryBuffer::new(1000);
        buffer.push(ChatRole::User, "question");
        buffer.push(ChatRole::Assistant, "answer");

        let turns: Vec<_> = buffer.window().collect();
        assert_eq!(turns[0], (ChatRole::User, "question"));
        assert_eq!(turns[1], (ChatRole::Assistant, "answer"));
    }

    #[test]
    fn test_clear() {
        let mut buffer = ChatMemoryBuffer::new(1000);
        buffer.push(ChatRole::User, "question");
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
