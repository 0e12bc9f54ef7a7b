//! Defines the [`Transcript`] structure.

use std::slice;

use serde::{Deserialize, Serialize};

use crate::turn::Turn;

/// The ordered sequence of turns that make up one conversation.
///
/// Turns are only ever appended as a complete exchange: one user turn directly
/// followed by the model turn that answered it. A failed exchange leaves the
/// transcript untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    #[must_use]
    pub const fn new() -> Self {
        Self { turns: vec![] }
    }

    /// Append a user turn and the model turn answering it.
    pub fn push_exchange(&mut self, user: Turn, model: Turn) {
        debug_assert!(user.is_user(), "exchange must start with a user turn");
        debug_assert!(!model.is_user(), "exchange must end with a model turn");

        self.turns.reserve(2);
        self.turns.push(user);
        self.turns.push(model);
    }

    /// The history to replay upstream for a new user turn.
    ///
    /// Returns all existing turns followed by `next`.
    #[must_use]
    pub fn history_with(&self, next: &Turn) -> Vec<Turn> {
        let mut history = Vec::with_capacity(self.turns.len() + 1);
        history.extend_from_slice(&self.turns);
        history.push(next.clone());
        history
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// The most recent model turn.
    #[must_use]
    pub fn last_reply(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|turn| !turn.is_user())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Turn> {
        self.turns.iter()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Turn;
    type IntoIter = slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[path = "transcript_tests.rs"]
mod tests;
