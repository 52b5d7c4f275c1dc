//! Error types for parsing positions, moves and game records.

use thiserror::Error;

/// Errors raised while parsing Forsyth-Edwards Notation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("expected at least 4 FEN fields, found {0}")]
    MissingFields(usize),

    #[error("board section must have 8 ranks, found {0}")]
    RankCount(usize),

    #[error("invalid piece character '{0}'")]
    PieceChar(char),

    #[error("rank {rank} does not describe exactly 8 files")]
    FileCount { rank: usize },

    #[error("invalid side to move '{0}'")]
    SideToMove(String),

    #[error("invalid castling field '{0}'")]
    Castling(String),

    #[error("invalid en-passant square '{0}'")]
    EnPassant(String),

    #[error("invalid move counter '{0}'")]
    Counter(String),
}

/// Errors raised while turning text into a move for a given position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotationError {
    #[error("'{0}' is not valid move notation")]
    Malformed(String),

    #[error("'{0}' is not a legal move in this position")]
    Illegal(String),

    #[error("'{0}' matches more than one legal move")]
    Ambiguous(String),
}

/// Errors raised while reading a PGN game record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PgnError {
    #[error("malformed header line: {0}")]
    Header(String),

    #[error("invalid FEN tag: {0}")]
    Fen(#[from] FenError),

    #[error("ply {ply}: {source}")]
    Move {
        ply: usize,
        #[source]
        source: NotationError,
    },
}
