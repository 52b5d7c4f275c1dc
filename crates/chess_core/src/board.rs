use std::fmt;

use crate::error::FenError;
use crate::movegen::{legal_moves, BISHOP_DIRS, KING_STEPS, KNIGHT_STEPS, ROOK_DIRS};
use crate::types::*;

/// FEN of the standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CastlingRights {
    pub wk: bool,
    pub wq: bool,
    pub bk: bool,
    pub bq: bool,
}

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights {
        wk: false,
        wq: false,
        bk: false,
        bq: false,
    };

    pub const ALL: CastlingRights = CastlingRights {
        wk: true,
        wq: true,
        bk: true,
        bq: true,
    };

    pub fn has(&self, color: Color, kingside: bool) -> bool {
        match (color, kingside) {
            (Color::White, true) => self.wk,
            (Color::White, false) => self.wq,
            (Color::Black, true) => self.bk,
            (Color::Black, false) => self.bq,
        }
    }

    fn revoke(&mut self, color: Color, kingside: bool) {
        match (color, kingside) {
            (Color::White, true) => self.wk = false,
            (Color::White, false) => self.wq = false,
            (Color::Black, true) => self.bk = false,
            (Color::Black, false) => self.bq = false,
        }
    }

    fn to_fen_field(self) -> String {
        let mut s = String::new();
        for (flag, ch) in [(self.wk, 'K'), (self.wq, 'Q'), (self.bk, 'k'), (self.bq, 'q')] {
            if flag {
                s.push(ch);
            }
        }
        if s.is_empty() {
            s.push('-');
        }
        s
    }
}

/// Geometry of one castling option.
pub(crate) struct CastleRoute {
    pub color: Color,
    pub kingside: bool,
    pub king_from: u8,
    pub king_to: u8,
    pub rook_from: u8,
    pub rook_to: u8,
    /// Squares between king and rook that must be empty.
    pub empty: &'static [u8],
    /// Squares the king crosses or lands on; none may be attacked.
    pub safe: &'static [u8],
}

pub(crate) const CASTLE_ROUTES: [CastleRoute; 4] = [
    CastleRoute {
        color: Color::White,
        kingside: true,
        king_from: 4,
        king_to: 6,
        rook_from: 7,
        rook_to: 5,
        empty: &[5, 6],
        safe: &[5, 6],
    },
    CastleRoute {
        color: Color::White,
        kingside: false,
        king_from: 4,
        king_to: 2,
        rook_from: 0,
        rook_to: 3,
        empty: &[1, 2, 3],
        safe: &[3, 2],
    },
    CastleRoute {
        color: Color::Black,
        kingside: true,
        king_from: 60,
        king_to: 62,
        rook_from: 63,
        rook_to: 61,
        empty: &[61, 62],
        safe: &[61, 62],
    },
    CastleRoute {
        color: Color::Black,
        kingside: false,
        king_from: 60,
        king_to: 58,
        rook_from: 56,
        rook_to: 59,
        empty: &[57, 58, 59],
        safe: &[59, 58],
    },
];

/// Castling right tied to a rook's home square.
fn rook_home(sq: u8) -> Option<(Color, bool)> {
    match sq {
        0 => Some((Color::White, false)),
        7 => Some((Color::White, true)),
        56 => Some((Color::Black, false)),
        63 => Some((Color::Black, true)),
        _ => None,
    }
}

/// Terminal classification of a position, ignoring move history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    /// 150 halfmoves without a capture or pawn move.
    SeventyFiveMoves,
}

impl GameStatus {
    pub fn is_over(self) -> bool {
        self != GameStatus::Ongoing
    }

    pub fn is_draw(self) -> bool {
        matches!(
            self,
            GameStatus::Stalemate | GameStatus::InsufficientMaterial | GameStatus::SeventyFiveMoves
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub board: [Option<Piece>; 64],
    pub side_to_move: Color,
    pub castling: CastlingRights,
    pub en_passant: Option<u8>, // square behind a pawn that just advanced 2
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

/// Everything `unmake_move` needs to restore the previous position.
#[derive(Clone, Debug)]
pub struct Undo {
    pub captured: Option<Piece>,
    pub captured_sq: u8, // differs from the destination only for en passant
    pub castling: CastlingRights,
    pub en_passant: Option<u8>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
    pub moved_piece: Piece,
    pub rook_move: Option<(u8, u8)>,
}

impl Default for Position {
    fn default() -> Self {
        Self::startpos()
    }
}

impl Position {
    pub fn startpos() -> Self {
        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        let mut board = [None; 64];
        for (f, &kind) in back.iter().enumerate() {
            board[f] = Some(Piece::new(Color::White, kind));
            board[8 + f] = Some(Piece::new(Color::White, PieceKind::Pawn));
            board[48 + f] = Some(Piece::new(Color::Black, PieceKind::Pawn));
            board[56 + f] = Some(Piece::new(Color::Black, kind));
        }
        Position {
            board,
            side_to_move: Color::White,
            castling: CastlingRights::ALL,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Parses Forsyth-Edwards Notation. The two move counters are optional.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(FenError::MissingFields(parts.len()));
        }

        let ranks: Vec<&str> = parts[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::RankCount(ranks.len()));
        }

        let mut board = [None; 64];
        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx as i8; // FEN lists rank 8 .. 1
            let mut file: i8 = 0;
            for ch in rank_str.chars() {
                if let Some(d) = ch.to_digit(10) {
                    file += d as i8;
                } else {
                    let piece = Piece::from_symbol(ch).ok_or(FenError::PieceChar(ch))?;
                    let square = sq(file, rank).ok_or(FenError::FileCount { rank: 8 - rank_idx })?;
                    board[square as usize] = Some(piece);
                    file += 1;
                }
                if file > 8 {
                    return Err(FenError::FileCount { rank: 8 - rank_idx });
                }
            }
            if file != 8 {
                return Err(FenError::FileCount { rank: 8 - rank_idx });
            }
        }

        let side_to_move = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::SideToMove(other.to_string())),
        };

        let mut castling = CastlingRights::NONE;
        if parts[2] != "-" {
            for c in parts[2].chars() {
                match c {
                    'K' => castling.wk = true,
                    'Q' => castling.wq = true,
                    'k' => castling.bk = true,
                    'q' => castling.bq = true,
                    _ => return Err(FenError::Castling(parts[2].to_string())),
                }
            }
        }

        let en_passant = match parts[3] {
            "-" => None,
            coord => Some(coord_to_sq(coord).ok_or_else(|| FenError::EnPassant(coord.to_string()))?),
        };

        let counter = |field: Option<&&str>, default: u32| -> Result<u32, FenError> {
            match field {
                Some(text) => text.parse().map_err(|_| FenError::Counter(text.to_string())),
                None => Ok(default),
            }
        };

        Ok(Position {
            board,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock: counter(parts.get(4), 0)?,
            fullmove_number: counter(parts.get(5), 1)?,
        })
    }

    pub fn to_fen(&self) -> String {
        format!(
            "{} {} {}",
            self.position_key(),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// The first four FEN fields: identifies a position for repetition and
    /// opening-book lookups regardless of the move counters.
    pub fn position_key(&self) -> String {
        let mut placement = String::new();
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.board[rank * 8 + file] {
                    Some(pc) => {
                        if empty > 0 {
                            placement.push_str(&empty.to_string());
                            empty = 0;
                        }
                        placement.push(pc.symbol());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                placement.push_str(&empty.to_string());
            }
            if rank > 0 {
                placement.push('/');
            }
        }
        let stm = match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        };
        let ep = self.en_passant.map(sq_to_coord).unwrap_or_else(|| "-".to_string());
        format!("{placement} {stm} {} {ep}", self.castling.to_fen_field())
    }

    pub fn king_sq(&self, c: Color) -> Option<u8> {
        (0..64u8).find(|&s| self.piece_at(s) == Some(Piece::new(c, PieceKind::King)))
    }

    pub fn piece_at(&self, sq: u8) -> Option<Piece> {
        self.board[sq as usize]
    }
    pub fn set_piece(&mut self, sq: u8, pc: Option<Piece>) {
        self.board[sq as usize] = pc;
    }

    pub fn in_check(&self, c: Color) -> bool {
        match self.king_sq(c) {
            Some(ksq) => self.is_square_attacked(ksq, c.other()),
            None => false,
        }
    }

    pub fn is_square_attacked(&self, target: u8, by: Color) -> bool {
        let tf = file_of(target);
        let tr = rank_of(target);

        // A pawn of `by` attacks from one rank behind the target.
        for df in [-1, 1] {
            if let Some(s) = sq(tf + df, tr - by.forward()) {
                if self.piece_at(s) == Some(Piece::new(by, PieceKind::Pawn)) {
                    return true;
                }
            }
        }

        let stepper = |steps: &[(i8, i8)], kind: PieceKind| {
            steps.iter().any(|&(df, dr)| {
                sq(tf + df, tr + dr).is_some_and(|s| self.piece_at(s) == Some(Piece::new(by, kind)))
            })
        };
        if stepper(&KNIGHT_STEPS, PieceKind::Knight) || stepper(&KING_STEPS, PieceKind::King) {
            return true;
        }

        let slider = |dirs: &[(i8, i8)], kind: PieceKind| {
            dirs.iter().any(|&dir| {
                self.first_piece_along(target, dir)
                    .is_some_and(|pc| pc.color == by && (pc.kind == kind || pc.kind == PieceKind::Queen))
            })
        };
        slider(&BISHOP_DIRS, PieceKind::Bishop) || slider(&ROOK_DIRS, PieceKind::Rook)
    }

    fn first_piece_along(&self, from: u8, (df, dr): (i8, i8)) -> Option<Piece> {
        let mut f = file_of(from) + df;
        let mut r = rank_of(from) + dr;
        while let Some(s) = sq(f, r) {
            if let Some(pc) = self.piece_at(s) {
                return Some(pc);
            }
            f += df;
            r += dr;
        }
        None
    }

    /// True when `mv` is a king's two-file step.
    pub fn is_castling_move(&self, mv: Move) -> bool {
        self.piece_at(mv.from).is_some_and(|pc| pc.kind == PieceKind::King)
            && (file_of(mv.to) - file_of(mv.from)).abs() == 2
    }

    /// True when `mv` is a pawn's diagonal step onto the en-passant square.
    pub fn is_en_passant(&self, mv: Move) -> bool {
        self.piece_at(mv.from).is_some_and(|pc| pc.kind == PieceKind::Pawn)
            && self.en_passant == Some(mv.to)
            && file_of(mv.from) != file_of(mv.to)
            && self.piece_at(mv.to).is_none()
    }

    /// Piece removed from the board if `mv` were played.
    pub fn captured_piece(&self, mv: Move) -> Option<Piece> {
        if self.is_en_passant(mv) {
            self.piece_at(rank_of(mv.from) as u8 * 8 + file_of(mv.to) as u8)
        } else {
            self.piece_at(mv.to)
        }
    }

    /// Applies a move produced by legal-move generation.
    ///
    /// # Panics
    /// Panics if the source square is empty.
    pub fn make_move(&mut self, mv: Move) -> Undo {
        let moved = self
            .piece_at(mv.from)
            .expect("make_move called with an empty source square");
        let captured_sq = if self.is_en_passant(mv) {
            rank_of(mv.from) as u8 * 8 + file_of(mv.to) as u8
        } else {
            mv.to
        };
        let is_castle = self.is_castling_move(mv);

        let undo = Undo {
            captured: self.piece_at(captured_sq),
            captured_sq,
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            moved_piece: moved,
            rook_move: None,
        };

        self.set_piece(captured_sq, None);
        self.set_piece(mv.from, None);
        let last_rank = rank_of(mv.to) == 0 || rank_of(mv.to) == 7;
        let placed = if moved.kind == PieceKind::Pawn && last_rank {
            Piece::new(moved.color, mv.promo.unwrap_or(PieceKind::Queen))
        } else {
            moved
        };
        self.set_piece(mv.to, Some(placed));

        let mut rook_move = None;
        if is_castle {
            if let Some(route) = CASTLE_ROUTES
                .iter()
                .find(|r| r.king_from == mv.from && r.king_to == mv.to)
            {
                let rook = self.piece_at(route.rook_from);
                self.set_piece(route.rook_from, None);
                self.set_piece(route.rook_to, rook);
                rook_move = Some((route.rook_from, route.rook_to));
            }
        }

        if moved.kind == PieceKind::King {
            self.castling.revoke(moved.color, true);
            self.castling.revoke(moved.color, false);
        }
        // Leaving or capturing on a rook's home square ends that right.
        for touched in [mv.from, mv.to] {
            if let Some((color, kingside)) = rook_home(touched) {
                self.castling.revoke(color, kingside);
            }
        }

        self.en_passant = None;
        if moved.kind == PieceKind::Pawn && (rank_of(mv.to) - rank_of(mv.from)).abs() == 2 {
            self.en_passant = Some((mv.from + mv.to) / 2);
        }

        self.halfmove_clock = if moved.kind == PieceKind::Pawn || undo.captured.is_some() {
            0
        } else {
            self.halfmove_clock + 1
        };
        if self.side_to_move == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = self.side_to_move.other();

        Undo { rook_move, ..undo }
    }

    pub fn unmake_move(&mut self, mv: Move, undo: Undo) {
        self.side_to_move = self.side_to_move.other();
        self.castling = undo.castling;
        self.en_passant = undo.en_passant;
        self.halfmove_clock = undo.halfmove_clock;
        self.fullmove_number = undo.fullmove_number;

        if let Some((rook_from, rook_to)) = undo.rook_move {
            let rook = self.piece_at(rook_to);
            self.set_piece(rook_to, None);
            self.set_piece(rook_from, rook);
        }

        self.set_piece(mv.to, None);
        self.set_piece(mv.from, Some(undo.moved_piece));
        self.set_piece(undo.captured_sq, undo.captured);
    }

    /// Applies `mv` only if it is legal here.
    pub fn play(&mut self, mv: Move) -> Option<Undo> {
        if legal_moves(self).contains(&mv) {
            Some(self.make_move(mv))
        } else {
            None
        }
    }

    /// Neither side can deliver mate: bare kings, a single minor piece, or
    /// only bishops that all stand on one square color.
    pub fn is_insufficient_material(&self) -> bool {
        let mut minors = Vec::new();
        for (s, pc) in self.board.iter().enumerate() {
            let Some(pc) = pc else { continue };
            match pc.kind {
                PieceKind::King => {}
                PieceKind::Knight | PieceKind::Bishop => minors.push((pc.kind, s as u8)),
                _ => return false,
            }
        }
        match minors.as_slice() {
            [] | [_] => true,
            [(_, first), ..] => {
                let shade = is_light_square(*first);
                minors
                    .iter()
                    .all(|&(kind, s)| kind == PieceKind::Bishop && is_light_square(s) == shade)
            }
        }
    }

    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= 100
    }

    pub fn status(&self) -> GameStatus {
        if legal_moves(self).is_empty() {
            if self.in_check(self.side_to_move) {
                GameStatus::Checkmate
            } else {
                GameStatus::Stalemate
            }
        } else if self.is_insufficient_material() {
            GameStatus::InsufficientMaterial
        } else if self.halfmove_clock >= 150 {
            GameStatus::SeventyFiveMoves
        } else {
            GameStatus::Ongoing
        }
    }

    pub fn is_checkmate(&self) -> bool {
        self.status() == GameStatus::Checkmate
    }

    pub fn is_stalemate(&self) -> bool {
        self.status() == GameStatus::Stalemate
    }

    pub fn is_game_over(&self) -> bool {
        self.status().is_over()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8u8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8u8 {
                let ch = self.board[(rank * 8 + file) as usize].map_or('.', Piece::symbol);
                write!(f, " {ch}")?;
            }
            writeln!(f)?;
        }
        write!(f, "   a b c d e f g h")
    }
}

#[cfg(test)]
#[path = "board_tests.rs"]
mod board_tests;
