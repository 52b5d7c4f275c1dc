use std::io;

use chess_core::Color;
use thiserror::Error;

use crate::wire::MAX_FRAME;

/// A frame that cannot be turned into a move.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame of {0} bytes exceeds the {MAX_FRAME} byte limit")]
    FrameTooLong(usize),

    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported protocol version {0}")]
    Version(u32),

    #[error("invalid square '{0}'")]
    Square(String),

    #[error("invalid promotion '{0}'")]
    Promotion(String),
}

#[derive(Debug, Error)]
pub enum NetError {
    #[error("a session is already active")]
    AlreadyActive,

    #[error("no peer is connected")]
    NotConnected,

    #[error("{mover} cannot send: this side plays {local}")]
    OutOfTurn { mover: Color, local: Color },

    #[error("invalid link '{0}'")]
    InvalidLink(String),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("{op} timed out after {secs}s")]
    Timeout { op: &'static str, secs: u64 },

    #[error("{op} failed: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("tunnel: {0}")]
    Tunnel(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
