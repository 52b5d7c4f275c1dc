//! Reading and writing single-game PGN records.

use crate::board::{Position, START_FEN};
use crate::error::PgnError;
use crate::notation::{parse_san, san};
use crate::types::{Color, Move};

const RESULT_TOKENS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

/// A parsed game: tag pairs, starting position and mainline moves.
#[derive(Clone, Debug)]
pub struct PgnGame {
    pub headers: Vec<(String, String)>,
    pub start: Position,
    pub moves: Vec<Move>,
}

impl PgnGame {
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Position after the last mainline move.
    pub fn final_position(&self) -> Position {
        let mut pos = self.start.clone();
        for &mv in &self.moves {
            pos.make_move(mv);
        }
        pos
    }
}

/// Renders a game. `SetUp`/`FEN` tags are added when the game does not
/// start from the standard position, and `Result` is always written last.
pub fn write_pgn(headers: &[(&str, String)], start: &Position, moves: &[Move], result: &str) -> String {
    let mut out = String::new();
    for (key, value) in headers {
        out.push_str(&format!("[{key} \"{}\"]\n", value.replace('"', "\\\"")));
    }
    let start_fen = start.to_fen();
    if start_fen != START_FEN {
        out.push_str("[SetUp \"1\"]\n");
        out.push_str(&format!("[FEN \"{start_fen}\"]\n"));
    }
    out.push_str(&format!("[Result \"{result}\"]\n\n"));

    let mut pos = start.clone();
    let mut tokens = Vec::with_capacity(moves.len() * 2 + 1);
    for (i, &mv) in moves.iter().enumerate() {
        if pos.side_to_move == Color::White {
            tokens.push(format!("{}.", pos.fullmove_number));
        } else if i == 0 {
            tokens.push(format!("{}...", pos.fullmove_number));
        }
        tokens.push(san(&pos, mv));
        pos.make_move(mv);
    }
    tokens.push(result.to_string());

    let mut line_len = 0;
    for token in tokens {
        if line_len > 0 && line_len + token.len() + 1 > 80 {
            out.push('\n');
            line_len = 0;
        } else if line_len > 0 {
            out.push(' ');
            line_len += 1;
        }
        line_len += token.len();
        out.push_str(&token);
    }
    out.push('\n');
    out
}

/// Reads the first game in `text`. Comments, variations and NAGs are skipped.
pub fn read_pgn(text: &str) -> Result<PgnGame, PgnError> {
    let mut headers = Vec::new();
    let mut movetext = String::new();
    for line in text.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            headers.push(parse_header(line)?);
        } else {
            let code = line.split(';').next().unwrap_or_default();
            movetext.push_str(code);
            movetext.push(' ');
        }
    }

    let start = match headers.iter().find(|(k, _)| k == "FEN") {
        Some((_, fen)) => Position::from_fen(fen)?,
        None => Position::startpos(),
    };

    let mut pos = start.clone();
    let mut moves = Vec::new();
    for token in movetext_tokens(&movetext) {
        let mv = parse_san(&pos, &token).map_err(|source| PgnError::Move {
            ply: moves.len() + 1,
            source,
        })?;
        pos.make_move(mv);
        moves.push(mv);
    }

    Ok(PgnGame {
        headers,
        start,
        moves,
    })
}

fn parse_header(line: &str) -> Result<(String, String), PgnError> {
    let malformed = || PgnError::Header(line.to_string());
    let inner = line
        .strip_prefix('[')
        .and_then(|l| l.strip_suffix(']'))
        .ok_or_else(malformed)?;
    let (key, rest) = inner.split_once(char::is_whitespace).ok_or_else(malformed)?;
    let value = rest
        .trim()
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or_else(malformed)?;
    Ok((key.to_string(), value.replace("\\\"", "\"")))
}

fn movetext_tokens(text: &str) -> Vec<String> {
    let mut clean = String::with_capacity(text.len());
    let mut in_comment = false;
    let mut variation_depth = 0u32;
    for ch in text.chars() {
        match ch {
            '{' => in_comment = true,
            '}' => in_comment = false,
            '(' if !in_comment => variation_depth += 1,
            ')' if !in_comment => variation_depth = variation_depth.saturating_sub(1),
            _ if in_comment || variation_depth > 0 => {}
            _ => clean.push(ch),
        }
    }

    clean
        .split_whitespace()
        .filter(|tok| !RESULT_TOKENS.contains(tok) && !tok.starts_with('$'))
        .filter_map(|tok| {
            // "12." / "12..." / "12.Nf3"
            let san = match tok.find('.') {
                Some(idx) if tok[..idx].chars().all(|c| c.is_ascii_digit()) => {
                    tok[idx..].trim_start_matches('.')
                }
                _ => tok,
            };
            (!san.is_empty()).then(|| san.to_string())
        })
        .collect()
}

#[cfg(test)]
#[path = "pgn_tests.rs"]
mod pgn_tests;
