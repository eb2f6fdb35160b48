//! Card model and content identity
//!
//! A card is the atomic unit under review: a question, an answer, and an
//! optional bit of context. Cards have no database id of their own; their
//! identity is a digest of their normalized content, so the same card text
//! found in two files (or after a whitespace-only edit) is the same card.

mod identity;

pub use identity::{content_hash, normalize};

use serde::{Deserialize, Serialize};

/// One question/answer/context unit extracted from a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// The prompt shown to the learner
    pub question: String,
    /// The expected recall
    pub answer: String,
    /// Optional framing shown alongside the question
    pub context: String,
}

impl Card {
    /// Create a card with empty context.
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            context: String::new(),
        }
    }

    /// Content-derived identity: the SHA-256 hex digest of the normalized
    /// card text.
    pub fn hash(&self) -> String {
        content_hash(self)
    }
}
