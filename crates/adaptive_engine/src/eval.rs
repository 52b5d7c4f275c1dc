//! Material + piece-square evaluation scaled by learned weights

use std::collections::BTreeMap;

use chess_core::{legal_moves, rank_of, sq_to_coord, Color, PieceKind, Position};
use serde::{Deserialize, Serialize};

use crate::error::EvalError;

/// Score of a forced mate, in centipawns.
pub const MATE_SCORE: i32 = 99_999;

/// Bonus per legal move available to the side to move.
pub const MOBILITY_BONUS: f64 = 5.0;

/// Coarse grouping that decides which learned weight scales a piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WeightCategory {
    Pawn,
    King,
    /// Knights, bishops, rooks and queens, plus the mobility term.
    Mobility,
}

impl WeightCategory {
    pub const ALL: [WeightCategory; 3] = [
        WeightCategory::Pawn,
        WeightCategory::King,
        WeightCategory::Mobility,
    ];

    pub fn for_kind(kind: PieceKind) -> WeightCategory {
        match kind {
            PieceKind::Pawn => WeightCategory::Pawn,
            PieceKind::King => WeightCategory::King,
            _ => WeightCategory::Mobility,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WeightCategory::Pawn => "pawn",
            WeightCategory::King => "king",
            WeightCategory::Mobility => "mobility",
        }
    }
}

/// Learned evaluation multipliers, keyed by category name.
///
/// Unknown keys survive a load/save cycle; missing keys read as 1.0.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weights(BTreeMap<String, f64>);

impl Default for Weights {
    fn default() -> Self {
        Weights(
            WeightCategory::ALL
                .iter()
                .map(|c| (c.as_str().to_string(), 1.0))
                .collect(),
        )
    }
}

impl Weights {
    pub fn get(&self, category: WeightCategory) -> f64 {
        self.0.get(category.as_str()).copied().unwrap_or(1.0)
    }

    pub fn set(&mut self, category: WeightCategory, value: f64) {
        self.0.insert(category.as_str().to_string(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut f64> {
        self.0.values_mut()
    }

    /// Adds any missing standard category at 1.0. Returns true if one was added.
    pub fn fill_missing(&mut self) -> bool {
        let mut added = false;
        for category in WeightCategory::ALL {
            if !self.0.contains_key(category.as_str()) {
                self.0.insert(category.as_str().to_string(), 1.0);
                added = true;
            }
        }
        added
    }
}

#[inline]
pub fn piece_value(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::Pawn => 100,
        PieceKind::Knight => 320,
        PieceKind::Bishop => 330,
        PieceKind::Rook => 500,
        PieceKind::Queen => 900,
        PieceKind::King => 20_000,
    }
}

// Rank 1 first, as seen from White (a1 = 0). Black reads entry 63 - square.
#[rustfmt::skip]
const PAWN_PST: [i32; 64] = [
     0,   0,   0,   0,   0,   0,   0,   0,
     5,  10,  10, -20, -20,  10,  10,   5,
     5,  -5, -10,   0,   0, -10,  -5,   5,
     0,   0,   0,   0,   0,   0,   0,   0,
     5,   5,  10,  25,  25,  10,   5,   5,
    10,  10,  20,  30,  30,  20,  10,  10,
    50,  50,  50,  50,  50,  50,  50,  50,
     0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const KNIGHT_PST: [i32; 64] = [
   -50, -40, -30, -30, -30, -30, -40, -50,
   -40, -20,   0,   5,   5,   0, -20, -40,
   -30,   5,  10,  15,  15,  10,   5, -30,
   -30,  10,  15,  20,  20,  15,  10, -30,
   -30,  10,  15,  20,  20,  15,  10, -30,
   -30,   5,  10,  15,  15,  10,   5, -30,
   -40, -20,   0,   5,   5,   0, -20, -40,
   -50, -40, -30, -30, -30, -30, -40, -50,
];

#[rustfmt::skip]
const BISHOP_PST: [i32; 64] = [
   -20, -10, -10, -10, -10, -10, -10, -20,
   -10,   5,   5,   5,   5,   5,   5, -10,
   -10,   5,  10,  15,  15,  10,   5, -10,
   -10,  10,  10,  15,  15,  10,  10, -10,
   -10,  10,  10,  15,  15,  10,  10, -10,
   -10,   5,  10,  15,  15,  10,   5, -10,
   -10,   5,   5,   5,   5,   5,   5, -10,
   -20, -10, -10, -10, -10, -10, -10, -20,
];

#[rustfmt::skip]
const ROOK_PST: [i32; 64] = [
     0,   0,   0,   5,   5,   0,   0,   0,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
    -5,   0,   0,   0,   0,   0,   0,  -5,
     5,  10,  10,  10,  10,  10,  10,   5,
     0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const QUEEN_PST: [i32; 64] = [
   -20, -10, -10,  -5,  -5, -10, -10, -20,
   -10,   0,   0,   0,   0,   0,   0, -10,
   -10,   0,   5,   5,   5,   5,   0, -10,
    -5,   0,   5,   5,   5,   5,   0,  -5,
    -5,   0,   5,   5,   5,   5,   0,  -5,
   -10,   0,   5,   5,   5,   5,   0, -10,
   -10,   0,   0,   0,   0,   0,   0, -10,
   -20, -10, -10,  -5,  -5, -10, -10, -20,
];

#[rustfmt::skip]
const KING_PST: [i32; 64] = [
    20,  30,  10,   0,   0,  10,  30,  20,
    20,  20,   0,   0,   0,   0,  20,  20,
   -10, -20, -20, -20, -20, -20, -20, -10,
   -20, -30, -30, -40, -40, -30, -30, -20,
   -30, -40, -40, -50, -50, -40, -40, -30,
   -30, -40, -40, -50, -50, -40, -40, -30,
   -30, -40, -40, -50, -50, -40, -40, -30,
   -30, -40, -40, -50, -50, -40, -40, -30,
];

pub fn pst_value(kind: PieceKind, idx: usize) -> i32 {
    let table = match kind {
        PieceKind::Pawn => &PAWN_PST,
        PieceKind::Knight => &KNIGHT_PST,
        PieceKind::Bishop => &BISHOP_PST,
        PieceKind::Rook => &ROOK_PST,
        PieceKind::Queen => &QUEEN_PST,
        PieceKind::King => &KING_PST,
    };
    table[idx]
}

/// Rejects positions the evaluator cannot interpret.
pub fn validate(pos: &Position) -> Result<(), EvalError> {
    for color in [Color::White, Color::Black] {
        let count = (0..64u8)
            .filter_map(|s| pos.piece_at(s))
            .filter(|pc| pc.color == color && pc.kind == PieceKind::King)
            .count();
        if count != 1 {
            return Err(EvalError::KingCount { color, count });
        }
    }
    for s in 0..64u8 {
        if let Some(pc) = pos.piece_at(s) {
            if pc.kind == PieceKind::Pawn && (rank_of(s) == 0 || rank_of(s) == 7) {
                return Err(EvalError::PawnOnBackRank {
                    square: sq_to_coord(s),
                });
            }
        }
    }
    Ok(())
}

/// Scores the position in centipawns; positive favours White.
pub fn try_evaluate(pos: &Position, weights: Option<&Weights>) -> Result<i32, EvalError> {
    validate(pos)?;
    let weight = |category: WeightCategory| weights.map_or(1.0, |w| w.get(category));

    let moves = legal_moves(pos);
    if moves.is_empty() {
        if pos.in_check(pos.side_to_move) {
            return Ok(match pos.side_to_move {
                Color::White => -MATE_SCORE,
                Color::Black => MATE_SCORE,
            });
        }
        return Ok(0);
    }
    if pos.is_insufficient_material() {
        return Ok(0);
    }

    let mut score = 0.0f64;
    for s in 0..64u8 {
        let Some(pc) = pos.piece_at(s) else { continue };
        let idx = match pc.color {
            Color::White => s as usize,
            Color::Black => 63 - s as usize,
        };
        let value = (piece_value(pc.kind) + pst_value(pc.kind, idx)) as f64
            * weight(WeightCategory::for_kind(pc.kind));
        match pc.color {
            Color::White => score += value,
            Color::Black => score -= value,
        }
    }

    let mobility = moves.len() as f64 * MOBILITY_BONUS * weight(WeightCategory::Mobility);
    match pos.side_to_move {
        Color::White => score += mobility,
        Color::Black => score -= mobility,
    }

    Ok(score.round() as i32)
}

/// Like [`try_evaluate`], but logs a malformed position and scores it 0.
pub fn evaluate(pos: &Position, weights: Option<&Weights>) -> i32 {
    match try_evaluate(pos, weights) {
        Ok(score) => score,
        Err(err) => {
            tracing::error!(fen = %pos.to_fen(), error = %err, "evaluation failed");
            0
        }
    }
}

#[cfg(test)]
#[path = "eval_tests.rs"]
mod eval_tests;
