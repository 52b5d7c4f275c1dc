//! Game records and post-game accuracy analysis

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use chess_core::{is_legal, san, Move, Position};

use crate::eval::{evaluate, Weights};
use crate::learning::{MAX_ELO, MIN_ELO};

/// Eval loss, in pawns, above which a move counts as a blunder.
pub const BLUNDER_THRESHOLD: f64 = 3.0;
/// Eval loss, in pawns, above which a move counts as a missed opportunity.
pub const MISSED_THRESHOLD: f64 = 1.0;
/// Clock time, in seconds, under which the report suggests time management.
pub const TIME_PRESSURE_SECS: u64 = 60;

/// A human move and the ply at which it was played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerMove {
    pub ply: usize,
    pub mv: Move,
}

/// What the engine would have played in place of a human move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recommendation {
    pub mv: Option<Move>,
    pub score: i32,
}

/// Moves of one game plus what analysis needs about them.
///
/// `player_moves` and `recommendations` always have the same length.
#[derive(Debug, Clone)]
pub struct GameRecord {
    start: Position,
    moves: Vec<Move>,
    eval_deltas: Vec<i32>,
    player_moves: Vec<PlayerMove>,
    recommendations: Vec<Recommendation>,
}

impl Default for GameRecord {
    fn default() -> Self {
        Self::new(Position::startpos())
    }
}

impl GameRecord {
    pub fn new(start: Position) -> Self {
        Self {
            start,
            moves: Vec::new(),
            eval_deltas: Vec::new(),
            player_moves: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    pub fn start(&self) -> &Position {
        &self.start
    }
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }
    pub fn eval_deltas(&self) -> &[i32] {
        &self.eval_deltas
    }
    pub fn player_moves(&self) -> &[PlayerMove] {
        &self.player_moves
    }
    pub fn recommendations(&self) -> &[Recommendation] {
        &self.recommendations
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Appends a played move with its evaluation change for the mover.
    pub fn push_move(&mut self, mv: Move, eval_delta: i32) {
        self.moves.push(mv);
        self.eval_deltas.push(eval_delta);
    }

    /// Notes that the next ply is a human move, with the engine's choice
    /// for the same position. Call before [`GameRecord::push_move`].
    pub fn push_player_move(&mut self, mv: Move, recommendation: Recommendation) {
        self.player_moves.push(PlayerMove {
            ply: self.moves.len(),
            mv,
        });
        self.recommendations.push(recommendation);
    }

    /// Removes the last ply and, if it was a human move, its recommendation.
    pub fn pop_move(&mut self) -> Option<Move> {
        let mv = self.moves.pop()?;
        self.eval_deltas.pop();
        if self.player_moves.last().map(|p| p.ply) == Some(self.moves.len()) {
            self.player_moves.pop();
            self.recommendations.pop();
        }
        Some(mv)
    }

    /// Drops everything and restarts from `start`.
    pub fn reset(&mut self, start: Position) {
        *self = Self::new(start);
    }

    /// Positions before every ply, plus the final one.
    pub fn positions(&self) -> Vec<Position> {
        let mut out = Vec::with_capacity(self.moves.len() + 1);
        let mut pos = self.start.clone();
        out.push(pos.clone());
        for &mv in &self.moves {
            pos.make_move(mv);
            out.push(pos.clone());
        }
        out
    }

    pub fn final_position(&self) -> Position {
        let mut pos = self.start.clone();
        for &mv in &self.moves {
            pos.make_move(mv);
        }
        pos
    }
}

/// One inaccurate human move.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveIssue {
    /// 1-based index among the human's moves.
    pub number: usize,
    pub played: String,
    pub best: String,
    /// Evaluation gap in pawns.
    pub diff: f64,
}

impl MoveIssue {
    fn line(&self) -> String {
        format!(
            "Move {}: Played {}, Best was {} (Eval diff: {:.1})",
            self.number, self.played, self.best, self.diff
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisSummary {
    pub total: usize,
    pub accurate: usize,
    /// Percentage in [0, 100].
    pub accuracy: f64,
    pub blunders: Vec<MoveIssue>,
    /// Includes the blunders.
    pub missed: Vec<MoveIssue>,
}

fn eval_after(pos: &Position, mv: Move, weights: Option<&Weights>) -> Option<i32> {
    if !is_legal(pos, mv) {
        return None;
    }
    let mut scratch = pos.clone();
    scratch.make_move(mv);
    Some(evaluate(&scratch, weights))
}

/// Compares every human move with the engine's recommendation.
pub fn analyze(record: &GameRecord, weights: Option<&Weights>) -> AnalysisSummary {
    let positions = record.positions();
    let mut summary = AnalysisSummary {
        total: record.player_moves.len(),
        ..Default::default()
    };

    for (i, (pm, rec)) in record
        .player_moves
        .iter()
        .zip(&record.recommendations)
        .enumerate()
    {
        if rec.mv == Some(pm.mv) {
            summary.accurate += 1;
            continue;
        }
        let Some(before) = positions.get(pm.ply) else {
            continue;
        };

        let diff = match (eval_after(before, pm.mv, weights), rec.mv) {
            (Some(played), Some(best)) => match eval_after(before, best, weights) {
                Some(best_score) => (played - best_score).abs() as f64 / 100.0,
                None => 0.0,
            },
            _ => 0.0,
        };

        let issue = MoveIssue {
            number: i + 1,
            played: san(before, pm.mv),
            best: rec.mv.map_or_else(|| "none".to_string(), |b| san(before, b)),
            diff,
        };
        if diff > BLUNDER_THRESHOLD {
            summary.blunders.push(issue.clone());
        }
        if diff > MISSED_THRESHOLD {
            summary.missed.push(issue);
        }
    }

    summary.accuracy = if summary.total > 0 {
        summary.accurate as f64 / summary.total as f64 * 100.0
    } else {
        0.0
    };
    summary
}

/// Local time formatted for report headers.
pub fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Facts about the finished game that the end-of-game report needs.
#[derive(Debug, Clone)]
pub struct ReportContext {
    /// PGN result, e.g. `1-0`.
    pub result: String,
    pub elo: f64,
    /// Either clock finished under [`TIME_PRESSURE_SECS`].
    pub time_pressure: bool,
}

/// End-of-game report block.
pub fn render_report(summary: &AnalysisSummary, ctx: &ReportContext, at: &str) -> String {
    let mut lines = vec![
        format!("Game Analysis - {at}"),
        format!("Result: {}", ctx.result),
        format!("Estimated Elo: {}", ctx.elo as i64),
        format!("Accuracy: {:.1}%", summary.accuracy),
        format!("Accurate Moves: {}/{}", summary.accurate, summary.total),
    ];
    if summary.blunders.is_empty() {
        lines.push("\nNo major blunders! Well played.".to_string());
    } else {
        lines.push("\nMajor Blunders:".to_string());
        lines.extend(summary.blunders.iter().map(MoveIssue::line));
    }

    lines.push("\nSuggestions for Improvement:".to_string());
    if summary.accuracy < 60.0 {
        lines.push("- Focus on finding the best moves by evaluating positions carefully.".to_string());
    }
    if !summary.blunders.is_empty() {
        lines.push(
            "- Avoid blunders by double-checking moves that significantly change the evaluation."
                .to_string(),
        );
    }
    if ctx.time_pressure {
        lines.push("- Manage your time better to avoid time pressure mistakes.".to_string());
    }
    lines.push("- Practice tactical puzzles to improve your calculation skills.".to_string());
    lines.join("\n")
}

/// Detailed analysis with a per-ply evaluation timeline.
#[derive(Debug, Clone)]
pub struct DeepAnalysis {
    pub summary: AnalysisSummary,
    pub result: String,
    pub estimated_elo: u32,
    /// SAN and evaluation in pawns after every ply.
    pub timeline: Vec<(String, f64)>,
}

/// Heuristic rating from accuracy, result (human score) and search depth.
pub fn estimate_elo(accuracy: f64, result: f64, difficulty: u8) -> u32 {
    let raw = 800.0 + accuracy * 10.0 + result * 200.0 + difficulty as f64 * 50.0;
    (raw as i64).clamp(MIN_ELO as i64, MAX_ELO as i64) as u32
}

pub fn deep_analysis(
    record: &GameRecord,
    weights: Option<&Weights>,
    result: &str,
    human_score: f64,
    difficulty: u8,
) -> DeepAnalysis {
    let summary = analyze(record, weights);
    let estimated_elo = estimate_elo(summary.accuracy, human_score, difficulty);

    let mut timeline = Vec::with_capacity(record.len());
    let mut pos = record.start.clone();
    for &mv in &record.moves {
        let text = san(&pos, mv);
        pos.make_move(mv);
        timeline.push((text, evaluate(&pos, weights) as f64 / 100.0));
    }

    DeepAnalysis {
        summary,
        result: result.to_string(),
        estimated_elo,
        timeline,
    }
}

impl DeepAnalysis {
    pub fn render(&self, at: &str) -> String {
        let s = &self.summary;
        let mut lines = vec![
            format!("Detailed Game Analysis - {at}"),
            format!("Result: {}", self.result),
            format!("Estimated Elo: {}", self.estimated_elo),
            format!("Accuracy: {:.1}%", s.accuracy),
            format!("Accurate Moves: {}/{}", s.accurate, s.total),
        ];
        if !s.blunders.is_empty() {
            lines.push("\nMajor Blunders:".to_string());
            lines.extend(s.blunders.iter().map(MoveIssue::line));
        }
        if !s.missed.is_empty() {
            lines.push("\nMissed Opportunities:".to_string());
            lines.extend(s.missed.iter().map(MoveIssue::line));
        }
        lines.push("\nMove-by-Move Evaluation:".to_string());
        for (i, (text, eval)) in self.timeline.iter().enumerate() {
            lines.push(format!("Move {}: {} (Eval: {:+.1})", i + 1, text, eval));
        }
        lines.join("\n")
    }
}

/// Appends a report block followed by a blank line.
pub fn append_report(path: &Path, block: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{block}\n")?;
    tracing::info!(path = ?path, "analysis appended");
    Ok(())
}

#[cfg(test)]
#[path = "analysis_tests.rs"]
mod analysis_tests;
