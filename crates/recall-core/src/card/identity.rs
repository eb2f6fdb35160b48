//! Normalize-then-digest content identity

use sha2::{Digest, Sha256};

use super::Card;

/// Normalize a card's content into the canonical digest input.
///
/// Each field is lowercased, trimmed, and has its line endings collapsed to
/// `\n`; the three fields are then joined with `\n` so that field contents
/// can never run together ("question" + "answer" is not "questionanswer").
pub fn normalize(card: &Card) -> String {
    fn part(text: &str) -> String {
        text.to_lowercase().trim().replace("\r\n", "\n")
    }

    [part(&card.question), part(&card.answer), part(&card.context)].join("\n")
}

/// SHA-256 hex digest of the normalized card content.
///
/// Always 64 lowercase hex characters; this string is the card's primary
/// key everywhere (storage, API paths, reconciliation).
pub fn content_hash(card: &Card) -> String {
    let digest = Sha256::digest(normalize(card).as_bytes());
    hex::encode(digest)
}
