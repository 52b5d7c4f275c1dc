//! Minimax search with alpha-beta pruning

use chess_core::{legal_moves, Move, Position};

use crate::eval::{evaluate, Weights};

/// Bound larger than any score the evaluator can produce.
pub const INFINITY: i32 = 1_000_000;

/// Searches `depth` plies and returns the bound reached plus the move that
/// produced it.
///
/// White maximizes and Black minimizes. Moves are tried in generator order.
/// The position is restored before returning.
pub fn alpha_beta(
    pos: &mut Position,
    depth: u8,
    mut alpha: i32,
    mut beta: i32,
    maximizing: bool,
    weights: Option<&Weights>,
) -> (i32, Option<Move>) {
    if depth == 0 {
        return (evaluate(pos, weights), None);
    }

    let moves = legal_moves(pos);
    if moves.is_empty() || pos.is_insufficient_material() || pos.halfmove_clock >= 150 {
        return (evaluate(pos, weights), None);
    }

    let mut best_move = None;
    for mv in moves {
        let undo = pos.make_move(mv);
        let (score, _) = alpha_beta(pos, depth - 1, alpha, beta, !maximizing, weights);
        pos.unmake_move(mv, undo);

        if maximizing {
            if score > alpha {
                alpha = score;
                best_move = Some(mv);
            }
        } else if score < beta {
            beta = score;
            best_move = Some(mv);
        }

        if alpha >= beta {
            break;
        }
    }

    (if maximizing { alpha } else { beta }, best_move)
}

/// Searches from the root with a full window. Returns the score and best move.
pub fn search_root(pos: &Position, depth: u8, weights: Option<&Weights>) -> (i32, Option<Move>) {
    let mut scratch = pos.clone();
    let maximizing = pos.side_to_move == chess_core::Color::White;
    alpha_beta(&mut scratch, depth, -INFINITY, INFINITY, maximizing, weights)
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod search_tests;
