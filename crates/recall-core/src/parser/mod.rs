//! Document parser
//!
//! Line-oriented scanner for the card markup: a line beginning with `Q:`
//! starts a new card, `A:` and `C:` switch the current block to the answer
//! or context field, and any other line continues the open block. Blocks
//! may span multiple lines; a card is kept only if it ends up with a
//! non-empty question.

use std::fs;
use std::path::Path;

use crate::card::Card;

const QUESTION_PREFIX: &str = "Q:";
const ANSWER_PREFIX: &str = "A:";
const CONTEXT_PREFIX: &str = "C:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Seeking,
    Question,
    Answer,
    Context,
}

struct Scanner {
    cards: Vec<Card>,
    current: Card,
    block: Vec<String>,
    state: State,
}

impl Scanner {
    fn new() -> Self {
        Self {
            cards: Vec::new(),
            current: Card::default(),
            block: Vec::new(),
            state: State::Seeking,
        }
    }

    /// Store the accumulated block into the field the scanner was reading.
    fn flush_block(&mut self) {
        let text = self.block.join("\n").trim().to_string();
        match self.state {
            State::Seeking => {}
            State::Question => self.current.question = text,
            State::Answer => self.current.answer = text,
            State::Context => self.current.context = text,
        }
        self.block.clear();
    }

    /// Finish the open card; cards without a question are dropped.
    fn finish_card(&mut self) {
        if !self.current.question.is_empty() {
            self.cards.push(std::mem::take(&mut self.current));
        } else {
            self.current = Card::default();
        }
    }

    fn feed(&mut self, line: &str) {
        let (next_state, rest) = if let Some(rest) = line.strip_prefix(QUESTION_PREFIX) {
            (State::Question, rest)
        } else if let Some(rest) = line.strip_prefix(ANSWER_PREFIX) {
            (State::Answer, rest)
        } else if let Some(rest) = line.strip_prefix(CONTEXT_PREFIX) {
            (State::Context, rest)
        } else {
            if self.state != State::Seeking {
                self.block.push(line.to_string());
            }
            return;
        };

        self.flush_block();
        if next_state == State::Question {
            self.finish_card();
        }
        self.state = next_state;
        self.block.push(rest.trim().to_string());
    }

    fn into_cards(mut self) -> Vec<Card> {
        self.flush_block();
        self.finish_card();
        self.cards
    }
}

/// Extract all cards from a document.
pub fn parse_str(input: &str) -> Vec<Card> {
    let mut scanner = Scanner::new();
    for line in input.lines() {
        scanner.feed(line);
    }
    scanner.into_cards()
}

/// Extract all cards from a file on disk.
pub fn parse_file(path: impl AsRef<Path>) -> std::io::Result<Vec<Card>> {
    Ok(parse_str(&fs::read_to_string(path)?))
}
