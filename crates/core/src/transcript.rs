//! Conversation transcript types.

use serde::{Deserialize, Serialize};

/// The speaker of a [`Turn`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human side of the conversation.
    User,
    /// The model side of the conversation.
    Model,
}

/// One message in a conversation, immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Turn {
    /// The speaker role.
    pub role: Role,
    /// The text content.
    pub content: String,
}

impl Turn {
    /// Creates a user turn.
    #[inline]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates a model turn.
    #[inline]
    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
        }
    }
}

/// The ordered sequence of turns exchanged so far in one session.
///
/// The transcript lives only in the owning client's memory. It is
/// append-only, unbounded, and carries no session identity.
#[derive(Clone, Default, Debug)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Returns the turns in dialogue order.
    #[inline]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Returns the number of turns.
    #[inline]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns whether the transcript has no turns.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Appends a completed exchange: the user prompt, then the model
    /// answer, in that order.
    pub fn commit_exchange(&mut self, prompt: &str, answer: &str) {
        self.turns.push(Turn::user(prompt));
        self.turns.push(Turn::model(answer));
    }

    /// Removes every turn.
    #[inline]
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
