use crate::board::{Position, CASTLE_ROUTES};
use crate::types::*;

pub(crate) const KNIGHT_STEPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];
pub(crate) const KING_STEPS: [(i8, i8); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];
pub(crate) const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
pub(crate) const ROOK_DIRS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// All legal moves for the side to move.
pub fn legal_moves(pos: &Position) -> Vec<Move> {
    let mut scratch = pos.clone();
    let mut out = Vec::with_capacity(64);
    legal_moves_into(&mut scratch, &mut out);
    out
}

/// Fills `out` with the legal moves, reusing its allocation. The position is
/// restored before returning.
pub fn legal_moves_into(pos: &mut Position, out: &mut Vec<Move>) {
    out.clear();
    pseudo_moves(pos, out);

    let mover = pos.side_to_move;
    out.retain(|&mv| {
        let undo = pos.make_move(mv);
        let leaves_king_attacked = pos.in_check(mover);
        pos.unmake_move(mv, undo);
        !leaves_king_attacked
    });
}

pub fn is_legal(pos: &Position, mv: Move) -> bool {
    legal_moves(pos).contains(&mv)
}

fn pseudo_moves(pos: &Position, out: &mut Vec<Move>) {
    let us = pos.side_to_move;
    for from in 0..64u8 {
        let Some(pc) = pos.piece_at(from) else {
            continue;
        };
        if pc.color != us {
            continue;
        }
        match pc.kind {
            PieceKind::Pawn => pawn_moves(pos, from, us, out),
            PieceKind::Knight => step_moves(pos, from, us, &KNIGHT_STEPS, out),
            PieceKind::Bishop => slide_moves(pos, from, us, &BISHOP_DIRS, out),
            PieceKind::Rook => slide_moves(pos, from, us, &ROOK_DIRS, out),
            PieceKind::Queen => {
                slide_moves(pos, from, us, &BISHOP_DIRS, out);
                slide_moves(pos, from, us, &ROOK_DIRS, out);
            }
            PieceKind::King => {
                step_moves(pos, from, us, &KING_STEPS, out);
                castle_moves(pos, from, us, out);
            }
        }
    }
}

fn pawn_moves(pos: &Position, from: u8, us: Color, out: &mut Vec<Move>) {
    let f = file_of(from);
    let r = rank_of(from);
    let dir = us.forward();
    let home_rank = if us == Color::White { 1 } else { 6 };

    if let Some(one) = sq(f, r + dir) {
        if pos.piece_at(one).is_none() {
            push_pawn_move(from, one, out);
            if r == home_rank {
                if let Some(two) = sq(f, r + 2 * dir) {
                    if pos.piece_at(two).is_none() {
                        out.push(Move::new(from, two));
                    }
                }
            }
        }
    }

    for df in [-1, 1] {
        let Some(to) = sq(f + df, r + dir) else {
            continue;
        };
        match pos.piece_at(to) {
            Some(target) if target.color != us => push_pawn_move(from, to, out),
            None if pos.en_passant == Some(to) => out.push(Move::new(from, to)),
            _ => {}
        }
    }
}

fn push_pawn_move(from: u8, to: u8, out: &mut Vec<Move>) {
    if rank_of(to) == 0 || rank_of(to) == 7 {
        for kind in PieceKind::PROMOTIONS {
            out.push(Move::with_promo(from, to, kind));
        }
    } else {
        out.push(Move::new(from, to));
    }
}

fn step_moves(pos: &Position, from: u8, us: Color, steps: &[(i8, i8)], out: &mut Vec<Move>) {
    let f = file_of(from);
    let r = rank_of(from);
    for &(df, dr) in steps {
        if let Some(to) = sq(f + df, r + dr) {
            if pos.piece_at(to).map_or(true, |pc| pc.color != us) {
                out.push(Move::new(from, to));
            }
        }
    }
}

fn slide_moves(pos: &Position, from: u8, us: Color, dirs: &[(i8, i8)], out: &mut Vec<Move>) {
    for &(df, dr) in dirs {
        let mut f = file_of(from) + df;
        let mut r = rank_of(from) + dr;
        while let Some(to) = sq(f, r) {
            match pos.piece_at(to) {
                None => out.push(Move::new(from, to)),
                Some(pc) => {
                    if pc.color != us {
                        out.push(Move::new(from, to));
                    }
                    break;
                }
            }
            f += df;
            r += dr;
        }
    }
}

fn castle_moves(pos: &Position, from: u8, us: Color, out: &mut Vec<Move>) {
    let routes: Vec<_> = CASTLE_ROUTES
        .iter()
        .filter(|r| r.color == us && r.king_from == from && pos.castling.has(us, r.kingside))
        .collect();
    if routes.is_empty() || pos.in_check(us) {
        return;
    }
    let them = us.other();
    for route in routes {
        if pos.piece_at(route.rook_from) != Some(Piece::new(us, PieceKind::Rook)) {
            continue;
        }
        if route.empty.iter().any(|&s| pos.piece_at(s).is_some()) {
            continue;
        }
        if route.safe.iter().any(|&s| pos.is_square_attacked(s, them)) {
            continue;
        }
        out.push(Move::new(route.king_from, route.king_to));
    }
}

#[cfg(test)]
#[path = "movegen_tests.rs"]
mod movegen_tests;
