//! Move frames: one JSON object per line.
//!
//! ```text
//! {"v":1,"from":"e7","to":"e8","promotion":"q"}
//! ```

use chess_core::{coord_to_sq, sq_to_coord, Move, PieceKind};
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

pub const PROTOCOL_VERSION: u32 = 1;

/// Longest accepted frame, excluding the newline.
pub const MAX_FRAME: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MoveFrame {
    pub v: u32,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub promotion: Option<String>,
}

impl From<Move> for MoveFrame {
    fn from(mv: Move) -> Self {
        MoveFrame {
            v: PROTOCOL_VERSION,
            from: sq_to_coord(mv.from),
            to: sq_to_coord(mv.to),
            promotion: mv.promo.map(|k| k.to_char().to_string()),
        }
    }
}

impl TryFrom<MoveFrame> for Move {
    type Error = ProtocolError;

    fn try_from(frame: MoveFrame) -> Result<Self, Self::Error> {
        if frame.v != PROTOCOL_VERSION {
            return Err(ProtocolError::Version(frame.v));
        }
        let square = |s: &str| coord_to_sq(s).ok_or_else(|| ProtocolError::Square(s.to_string()));
        let from = square(&frame.from)?;
        let to = square(&frame.to)?;
        let promo = match frame.promotion.as_deref() {
            None => None,
            Some(p @ ("q" | "r" | "b" | "n")) => p.chars().next().and_then(PieceKind::from_char),
            Some(other) => return Err(ProtocolError::Promotion(other.to_string())),
        };
        Ok(Move { from, to, promo })
    }
}

/// Serializes a move as a newline-terminated frame.
pub fn encode_move(mv: Move) -> Result<String, ProtocolError> {
    let mut line = serde_json::to_string(&MoveFrame::from(mv))?;
    line.push('\n');
    Ok(line)
}

/// Parses one frame; trailing line terminators are ignored.
pub fn decode_move(line: &str) -> Result<Move, ProtocolError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.len() > MAX_FRAME {
        return Err(ProtocolError::FrameTooLong(line.len()));
    }
    let frame: MoveFrame = serde_json::from_str(line)?;
    Move::try_from(frame)
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod wire_tests;
