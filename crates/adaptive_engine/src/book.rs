//! Opening book lookup.
//!
//! Books are plain text: one line per sequence of UCI moves played from the
//! start position, a tab, then a weight. The final move of a line is the
//! book reply to the position reached by the moves before it.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chess_core::{parse_uci_move, Move, Position};

use crate::error::BookError;

const EMBEDDED_BOOK: &str = include_str!("../data/openings.tsv");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookEntry {
    pub mv: Move,
    pub weight: u32,
}

/// Source of prepared replies. An empty result means the position is not
/// covered.
pub trait OpeningBook: Send + Sync {
    fn entries(&self, pos: &Position) -> Vec<BookEntry>;

    /// Highest-weight entry; the earliest listed wins ties.
    fn best(&self, pos: &Position) -> Option<BookEntry> {
        let mut best: Option<BookEntry> = None;
        for entry in self.entries(pos) {
            if best.map_or(true, |b| entry.weight > b.weight) {
                best = Some(entry);
            }
        }
        best
    }
}

/// Book built from tab-separated move sequences, keyed by position.
#[derive(Debug, Clone, Default)]
pub struct MoveListBook {
    by_position: HashMap<String, Vec<BookEntry>>,
}

impl MoveListBook {
    /// The small book compiled into the crate.
    pub fn embedded() -> Self {
        match Self::parse(EMBEDDED_BOOK) {
            Ok(book) => book,
            Err(err) => {
                tracing::error!(error = %err, "embedded opening book is invalid");
                Self::default()
            }
        }
    }

    pub fn load(path: &Path) -> Result<Self, BookError> {
        let text = fs::read_to_string(path).map_err(|source| BookError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let book = Self::parse(&text)?;
        tracing::info!(path = ?path, positions = book.len(), "opening book loaded");
        Ok(book)
    }

    pub fn parse(text: &str) -> Result<Self, BookError> {
        let mut book = MoveListBook::default();
        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (moves, weight) = line.split_once('\t').ok_or_else(|| BookError::Format {
                line: line_no,
                reason: "expected `moves<TAB>weight`".to_string(),
            })?;
            let weight: u32 = weight.trim().parse().map_err(|_| BookError::Format {
                line: line_no,
                reason: format!("invalid weight '{}'", weight.trim()),
            })?;

            let tokens: Vec<&str> = moves.split_whitespace().collect();
            let Some((last, prefix)) = tokens.split_last() else {
                return Err(BookError::Format {
                    line: line_no,
                    reason: "no moves".to_string(),
                });
            };

            let mut pos = Position::startpos();
            for token in prefix {
                let mv = parse_uci_move(&pos, token)
                    .map_err(|source| BookError::Move { line: line_no, source })?;
                pos.make_move(mv);
            }
            let reply = parse_uci_move(&pos, last)
                .map_err(|source| BookError::Move { line: line_no, source })?;
            book.insert(&pos, reply, weight);
        }
        Ok(book)
    }

    /// Adds `weight` to the entry for `mv` at `pos`, creating it if needed.
    pub fn insert(&mut self, pos: &Position, mv: Move, weight: u32) {
        let entries = self.by_position.entry(pos.position_key()).or_default();
        match entries.iter_mut().find(|e| e.mv == mv) {
            Some(existing) => existing.weight = existing.weight.saturating_add(weight),
            None => entries.push(BookEntry { mv, weight }),
        }
    }

    /// Number of positions with at least one entry.
    pub fn len(&self) -> usize {
        self.by_position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_position.is_empty()
    }
}

impl OpeningBook for MoveListBook {
    fn entries(&self, pos: &Position) -> Vec<BookEntry> {
        self.by_position
            .get(&pos.position_key())
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "book_tests.rs"]
mod book_tests;
