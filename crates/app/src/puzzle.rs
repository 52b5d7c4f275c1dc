//! Built-in one-move puzzles.

use chess_core::{parse_san, Move, Position};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::game::GameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Puzzle {
    pub name: &'static str,
    pub fen: &'static str,
    /// Expected reply in SAN.
    pub solution: &'static str,
}

pub const PUZZLES: &[Puzzle] = &[
    Puzzle {
        name: "Scholar's mate",
        fen: "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4",
        solution: "Qxf7#",
    },
    Puzzle {
        name: "Back rank",
        fen: "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1",
        solution: "Ra8#",
    },
    Puzzle {
        name: "Fool's mate",
        fen: "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2",
        solution: "Qh4#",
    },
    Puzzle {
        name: "Smothered mate",
        fen: "6rk/6pp/8/6N1/8/8/8/6K1 w - - 0 1",
        solution: "Nf7#",
    },
];

/// A puzzle resolved against its position.
#[derive(Debug, Clone)]
pub struct ActivePuzzle {
    pub puzzle: Puzzle,
    pub position: Position,
    pub solution: Move,
}

impl Puzzle {
    pub fn random(rng: &mut impl Rng) -> Puzzle {
        *PUZZLES.choose(rng).unwrap_or(&PUZZLES[0])
    }

    pub fn activate(&self) -> Result<ActivePuzzle, GameError> {
        let position = Position::from_fen(self.fen)?;
        let solution = parse_san(&position, self.solution)?;
        Ok(ActivePuzzle {
            puzzle: *self,
            position,
            solution,
        })
    }
}
