//! Top-level move selection

use std::time::Instant;

use chess_core::{legal_moves, Move, Position};
use rand::seq::SliceRandom;
use rand::thread_rng;

use crate::book::{MoveListBook, OpeningBook};
use crate::learning::LearningState;
use crate::search::search_root;

/// Games after which the opening book is no longer consulted.
pub const BOOK_GAMES_LIMIT: u32 = 20;

/// Why a move is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPurpose {
    /// The engine's own move (also used for hints).
    BotMove,
    /// What the engine would play in the human's place, searched one ply
    /// deeper and never taken from the book.
    Comparison,
}

/// Where the chosen move came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSource {
    Book,
    Search,
    Random,
    /// No legal move exists.
    None,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    /// Centipawns, positive favours White. Zero for book and random moves.
    pub score: i32,
    pub depth: u8,
    pub source: MoveSource,
}

/// Alpha-beta engine whose depth and evaluation follow a [`LearningState`].
pub struct AdaptiveEngine {
    book: Option<Box<dyn OpeningBook>>,
}

impl Default for AdaptiveEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AdaptiveEngine {
    /// Engine using the embedded opening book.
    pub fn new() -> Self {
        Self::with_book(MoveListBook::embedded())
    }

    pub fn with_book(book: impl OpeningBook + 'static) -> Self {
        Self {
            book: Some(Box::new(book)),
        }
    }

    pub fn without_book() -> Self {
        Self { book: None }
    }

    pub fn choose_move(
        &self,
        pos: &Position,
        state: &LearningState,
        purpose: SearchPurpose,
    ) -> SearchResult {
        let base_depth = state.search_depth();
        let depth = match purpose {
            SearchPurpose::BotMove => base_depth,
            SearchPurpose::Comparison => base_depth + 1,
        };

        if purpose == SearchPurpose::BotMove && state.games < BOOK_GAMES_LIMIT {
            if let Some(entry) = self.book.as_ref().and_then(|b| b.best(pos)) {
                tracing::debug!(mv = %entry.mv, weight = entry.weight, "book move");
                return SearchResult {
                    best_move: Some(entry.mv),
                    score: 0,
                    depth: 0,
                    source: MoveSource::Book,
                };
            }
        }

        let started = Instant::now();
        let (score, best) = search_root(pos, depth, Some(&state.weights));
        tracing::debug!(
            depth,
            score,
            mv = ?best.map(|m| m.to_string()),
            elapsed_ms = started.elapsed().as_millis() as u64,
            ?purpose,
            "search finished"
        );

        match best {
            Some(mv) => SearchResult {
                best_move: Some(mv),
                score,
                depth,
                source: MoveSource::Search,
            },
            None => {
                let moves = legal_moves(pos);
                match moves.choose(&mut thread_rng()).copied() {
                    Some(mv) => {
                        tracing::warn!(mv = %mv, "search produced no move, playing a random legal move");
                        SearchResult {
                            best_move: Some(mv),
                            score,
                            depth,
                            source: MoveSource::Random,
                        }
                    }
                    None => SearchResult {
                        best_move: None,
                        score,
                        depth,
                        source: MoveSource::None,
                    },
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod engine_tests;
