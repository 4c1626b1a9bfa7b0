use serde::Serialize;

use crate::config::DEFAULT_SYSTEM_PROMPT;
use crate::types::{Role, Turn};

/// Append-only sequence of turns, seeded with one system turn.
///
/// Only the conversation loop appends; callers get read access to turns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::system(system_prompt)],
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Text of the most recent assistant turn.
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == Role::Assistant)
            .map(Turn::text)
    }

    /// Drop everything after the seed system turn.
    pub fn reset(&mut self) {
        self.turns.truncate(1);
    }

    pub(crate) fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Roll back to `len` turns; never removes the seed turn.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.turns.truncate(len.max(1));
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}
