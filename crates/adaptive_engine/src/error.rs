use std::io;
use std::path::PathBuf;

use chess_core::{Color, NotationError};
use thiserror::Error;

/// The position cannot be scored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("{color} has {count} kings")]
    KingCount { color: Color, count: usize },

    #[error("pawn on back rank at {square}")]
    PawnOnBackRank { square: String },
}

/// Failures while loading or storing the learned profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile {path:?} does not exist")]
    Missing { path: PathBuf },

    #[error("profile {path:?} is empty")]
    Empty { path: PathBuf },

    #[error("profile {path:?} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize profile: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failures while reading an opening book.
#[derive(Debug, Error)]
pub enum BookError {
    #[error("cannot read opening book {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("line {line}: {reason}")]
    Format { line: usize, reason: String },

    #[error("line {line}: {source}")]
    Move {
        line: usize,
        #[source]
        source: NotationError,
    },
}
