//! Move notation: UCI coordinates and Standard Algebraic Notation.

use crate::board::Position;
use crate::error::NotationError;
use crate::movegen::legal_moves;
use crate::types::*;

pub fn move_to_uci(mv: Move) -> String {
    mv.to_string()
}

/// Parses coordinate notation such as `e2e4` or `e7e8q` and checks that the
/// move is legal in `pos`.
pub fn parse_uci_move(pos: &Position, text: &str) -> Result<Move, NotationError> {
    let mv = parse_uci_shape(text.trim())
        .ok_or_else(|| NotationError::Malformed(text.to_string()))?;
    if legal_moves(pos).contains(&mv) {
        Ok(mv)
    } else {
        Err(NotationError::Illegal(text.to_string()))
    }
}

/// Syntax-only UCI parse; says nothing about legality.
pub fn parse_uci_shape(text: &str) -> Option<Move> {
    if !text.is_ascii() || !(4..=5).contains(&text.len()) {
        return None;
    }
    let from = coord_to_sq(&text[0..2])?;
    let to = coord_to_sq(&text[2..4])?;
    let promo = match text[4..].chars().next() {
        None => None,
        Some(ch) => Some(PieceKind::from_char(ch).filter(|k| PieceKind::PROMOTIONS.contains(k))?),
    };
    Some(Move { from, to, promo })
}

/// Standard Algebraic Notation for a legal move, with `+`/`#` suffixes.
pub fn san(pos: &Position, mv: Move) -> String {
    let Some(piece) = pos.piece_at(mv.from) else {
        return mv.to_string();
    };

    let mut out = String::new();
    if pos.is_castling_move(mv) {
        out.push_str(if file_of(mv.to) > file_of(mv.from) {
            "O-O"
        } else {
            "O-O-O"
        });
    } else {
        let capture = pos.captured_piece(mv).is_some();
        if piece.kind == PieceKind::Pawn {
            if capture {
                out.push(file_char(mv.from));
                out.push('x');
            }
            out.push_str(&sq_to_coord(mv.to));
            if let Some(kind) = mv.promo {
                out.push('=');
                out.push(kind.to_char().to_ascii_uppercase());
            }
        } else {
            out.push(piece.kind.to_char().to_ascii_uppercase());
            out.push_str(&disambiguation(pos, mv, piece));
            if capture {
                out.push('x');
            }
            out.push_str(&sq_to_coord(mv.to));
        }
    }

    let mut after = pos.clone();
    after.make_move(mv);
    if after.in_check(after.side_to_move) {
        out.push(if legal_moves(&after).is_empty() { '#' } else { '+' });
    }
    out
}

fn file_char(s: u8) -> char {
    (b'a' + s % 8) as char
}

fn rank_char(s: u8) -> char {
    (b'1' + s / 8) as char
}

// File first, then rank, then the full square.
fn disambiguation(pos: &Position, mv: Move, piece: Piece) -> String {
    let rivals: Vec<u8> = legal_moves(pos)
        .into_iter()
        .filter(|m| m.to == mv.to && m.from != mv.from && pos.piece_at(m.from) == Some(piece))
        .map(|m| m.from)
        .collect();
    if rivals.is_empty() {
        String::new()
    } else if rivals.iter().all(|&s| file_of(s) != file_of(mv.from)) {
        file_char(mv.from).to_string()
    } else if rivals.iter().all(|&s| rank_of(s) != rank_of(mv.from)) {
        rank_char(mv.from).to_string()
    } else {
        sq_to_coord(mv.from)
    }
}

/// Strips check marks and annotation glyphs and accepts zeros for castling.
fn normalize_san(text: &str) -> String {
    text.trim()
        .trim_end_matches(['+', '#', '!', '?'])
        .replace('0', "O")
}

/// SAN reduced to piece, destination and promotion, so that under- or
/// over-disambiguated input can still be matched.
fn loose_san(pos: &Position, mv: Move) -> String {
    let mut out = String::new();
    match pos.piece_at(mv.from) {
        Some(_) if pos.is_castling_move(mv) => return normalize_san(&san(pos, mv)),
        Some(pc) if pc.kind == PieceKind::Pawn => {
            if file_of(mv.from) != file_of(mv.to) {
                out.push(file_char(mv.from));
            }
        }
        Some(pc) => out.push(pc.kind.to_char().to_ascii_uppercase()),
        None => {}
    }
    out.push_str(&sq_to_coord(mv.to));
    if let Some(kind) = mv.promo {
        out.push('=');
        out.push(kind.to_char().to_ascii_uppercase());
    }
    out
}

/// Parses SAN by matching it against the SAN of every legal move.
pub fn parse_san(pos: &Position, text: &str) -> Result<Move, NotationError> {
    let wanted = normalize_san(text);
    if wanted.is_empty() {
        return Err(NotationError::Malformed(text.to_string()));
    }
    let legal = legal_moves(pos);
    let mut matches: Vec<Move> = legal
        .iter()
        .copied()
        .filter(|&mv| normalize_san(&san(pos, mv)) == wanted)
        .collect();
    if matches.is_empty() {
        let loose = wanted.replace('x', "");
        matches = legal
            .into_iter()
            .filter(|&mv| loose_san(pos, mv) == loose)
            .collect();
    }
    match matches.as_slice() {
        [mv] => Ok(*mv),
        [] => Err(NotationError::Illegal(text.to_string())),
        _ => Err(NotationError::Ambiguous(text.to_string())),
    }
}

/// Accepts either UCI or SAN input.
pub fn parse_move(pos: &Position, text: &str) -> Result<Move, NotationError> {
    let text = text.trim();
    match parse_uci_shape(text) {
        Some(_) => parse_uci_move(pos, text),
        None => parse_san(pos, text),
    }
}

#[cfg(test)]
#[path = "notation_tests.rs"]
mod notation_tests;
