//! Game state owned by the primary task.
//!
//! Every move, whether typed locally, chosen by the engine or received
//! from a peer, goes through the same path so the game record, captured
//! pieces, repetition history and clocks stay consistent.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use adaptive_engine::analysis::{append_report, render_report, timestamp};
use adaptive_engine::{
    analyze, deep_analysis, evaluate, AdaptiveEngine, AnalysisSummary, DeepAnalysis, GameRecord,
    LearningState, LearningUpdate, MoveListBook, MoveSource, ProfileStore, Recommendation,
    ReportContext, SearchPurpose,
};
use chess_core::{
    is_legal, parse_move, read_pgn, san, write_pgn, Color, FenError, GameStatus, Move,
    NotationError, PgnError, Piece, PieceKind, Position,
};
use netplay::NetError;
use thiserror::Error;
use tracing::{info, warn};

use crate::clock::ChessClock;
use crate::config::AppConfig;
use crate::puzzle::{ActivePuzzle, Puzzle};

/// Largest evaluation in the engine's favour (centipawns) at which it
/// still accepts a draw offer.
pub const DRAW_ACCEPT_MARGIN: i32 = 50;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("the game is over")]
    GameOver,

    #[error("the game is still in progress")]
    InProgress,

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("{0} is not available in this mode")]
    Unavailable(&'static str),

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("no move available")]
    NoMove,

    #[error("illegal move {0} from peer")]
    IllegalRemote(Move),

    #[error("no opponent is connected")]
    NoOpponent,

    #[error(transparent)]
    Network(#[from] NetError),

    #[error(transparent)]
    Notation(#[from] NotationError),

    #[error(transparent)]
    Fen(#[from] FenError),

    #[error(transparent)]
    Pgn(#[from] PgnError),

    #[error("{path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    VsBot { human: Color },
    Network { local: Color },
    Puzzle,
}

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEnd {
    Checkmate { winner: Color },
    Stalemate,
    InsufficientMaterial,
    FiftyMoves,
    SeventyFiveMoves,
    Repetition,
    Timeout { winner: Color },
    Resignation { winner: Color },
    Agreement,
    PuzzleSolved,
}

impl GameEnd {
    pub fn winner(self) -> Option<Color> {
        match self {
            GameEnd::Checkmate { winner }
            | GameEnd::Timeout { winner }
            | GameEnd::Resignation { winner } => Some(winner),
            _ => None,
        }
    }

    /// PGN result token.
    pub fn result(self) -> &'static str {
        match self {
            GameEnd::PuzzleSolved => "*",
            _ => match self.winner() {
                Some(Color::White) => "1-0",
                Some(Color::Black) => "0-1",
                None => "1/2-1/2",
            },
        }
    }

    /// 1, 0.5 or 0 from `color`'s point of view.
    pub fn score_for(self, color: Color) -> f64 {
        match self.winner() {
            Some(w) if w == color => 1.0,
            Some(_) => 0.0,
            None => 0.5,
        }
    }
}

impl fmt::Display for GameEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEnd::Checkmate { winner } => write!(f, "{winner} wins by checkmate"),
            GameEnd::Stalemate => write!(f, "draw by stalemate"),
            GameEnd::InsufficientMaterial => write!(f, "draw by insufficient material"),
            GameEnd::FiftyMoves => write!(f, "draw by the fifty-move rule"),
            GameEnd::SeventyFiveMoves => write!(f, "draw by the seventy-five-move rule"),
            GameEnd::Repetition => write!(f, "draw by threefold repetition"),
            GameEnd::Timeout { winner } => write!(f, "{winner} wins on time"),
            GameEnd::Resignation { winner } => write!(f, "{winner} wins by resignation"),
            GameEnd::Agreement => write!(f, "draw by agreement"),
            GameEnd::PuzzleSolved => write!(f, "puzzle solved"),
        }
    }
}

/// A move that was applied to the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayedMove {
    pub mv: Move,
    pub san: String,
    pub captured: Option<Piece>,
    /// Evaluation after the move, positive favours White.
    pub eval: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Played(PlayedMove),
    PuzzleSolved(PlayedMove),
    /// Wrong puzzle answer; the position is unchanged.
    PuzzleRejected { san: String },
}

/// What [`GameController::finish_game`] did.
#[derive(Debug, Clone)]
pub struct GameSummary {
    pub end: GameEnd,
    pub analysis: AnalysisSummary,
    pub update: LearningUpdate,
    pub report: String,
}

pub struct GameController {
    position: Position,
    record: GameRecord,
    sans: Vec<String>,
    captures: Vec<Option<Piece>>,
    /// Position keys after every ply, starting position included.
    keys: Vec<String>,
    clock: ChessClock,
    mode: Mode,
    puzzle: Option<ActivePuzzle>,
    end: Option<GameEnd>,
    /// Learning already applied for the current game.
    finished: bool,
    learning: LearningState,
    store: ProfileStore,
    engine: AdaptiveEngine,
    report_path: PathBuf,
    analysis_path: PathBuf,
}

impl GameController {
    /// Loads the profile and opening book named by `config`.
    pub fn new(config: &AppConfig) -> Self {
        let engine = if !config.engine.use_book {
            AdaptiveEngine::without_book()
        } else if let Some(path) = &config.paths.opening_book {
            match MoveListBook::load(path) {
                Ok(book) => AdaptiveEngine::with_book(book),
                Err(err) => {
                    warn!(error = %err, "falling back to the embedded opening book");
                    AdaptiveEngine::new()
                }
            }
        } else {
            AdaptiveEngine::new()
        };
        Self::with_engine(config, engine)
    }

    pub fn with_engine(config: &AppConfig, engine: AdaptiveEngine) -> Self {
        let store = ProfileStore::new(&config.paths.profile);
        let learning = store.load();
        info!(
            elo = learning.elo,
            games = learning.games,
            depth = learning.search_depth(),
            "game controller ready"
        );
        let position = Position::startpos();
        let keys = vec![position.position_key()];
        Self {
            record: GameRecord::new(position.clone()),
            position,
            sans: Vec::new(),
            captures: Vec::new(),
            keys,
            clock: ChessClock::new(config.clock.time_control()),
            mode: Mode::VsBot { human: Color::White },
            puzzle: None,
            end: None,
            finished: false,
            learning,
            store,
            engine,
            report_path: config.paths.report.clone(),
            analysis_path: config.paths.deep_analysis.clone(),
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn record(&self) -> &GameRecord {
        &self.record
    }

    pub fn sans(&self) -> &[String] {
        &self.sans
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn clock(&self) -> &ChessClock {
        &self.clock
    }

    pub fn learning(&self) -> &LearningState {
        &self.learning
    }

    pub fn puzzle(&self) -> Option<&ActivePuzzle> {
        self.puzzle.as_ref()
    }

    pub fn game_over(&self) -> Option<GameEnd> {
        self.end
    }

    pub fn evaluation(&self) -> i32 {
        evaluate(&self.position, Some(&self.learning.weights))
    }

    /// Pieces captured by `color`, in capture order.
    pub fn captured_by(&self, color: Color) -> Vec<PieceKind> {
        self.captures
            .iter()
            .flatten()
            .filter(|p| p.color != color)
            .map(|p| p.kind)
            .collect()
    }

    /// The human's color in local and network games.
    fn player_color(&self) -> Option<Color> {
        match self.mode {
            Mode::VsBot { human } => Some(human),
            Mode::Network { local } => Some(local),
            Mode::Puzzle => None,
        }
    }

    fn reset(&mut self, start: Position, mode: Mode) {
        self.record.reset(start.clone());
        self.keys = vec![start.position_key()];
        self.position = start;
        self.sans.clear();
        self.captures.clear();
        self.clock.reset();
        self.mode = mode;
        self.puzzle = None;
        self.end = None;
        self.finished = false;
    }

    pub fn new_game(&mut self, mode: Mode) {
        self.reset(Position::startpos(), mode);
        info!(?mode, "new game started");
    }

    pub fn start_puzzle(&mut self, puzzle: Puzzle) -> Result<&ActivePuzzle, GameError> {
        if matches!(self.mode, Mode::Network { .. }) {
            return Err(GameError::Unavailable("puzzle"));
        }
        let active = puzzle.activate()?;
        self.reset(active.position.clone(), Mode::Puzzle);
        info!(name = puzzle.name, fen = puzzle.fen, "puzzle started");
        Ok(self.puzzle.insert(active))
    }

    /// Ends the game if a clock has run out.
    pub fn check_clock(&mut self, now: Instant) -> Option<GameEnd> {
        if self.end.is_none() {
            if let Some(loser) = self.clock.flagged(now) {
                let end = GameEnd::Timeout {
                    winner: loser.other(),
                };
                info!(%end, "flag fell");
                self.clock.stop(now);
                self.end = Some(end);
            }
        }
        self.end
    }

    fn ensure_playing(&mut self) -> Result<(), GameError> {
        match self.check_clock(Instant::now()) {
            Some(_) => Err(GameError::GameOver),
            None => Ok(()),
        }
    }

    /// Applies a move typed by the local player, in SAN or UCI.
    pub fn apply_local_move(&mut self, text: &str) -> Result<MoveOutcome, GameError> {
        self.ensure_playing()?;
        self.check_turn()?;
        let mv = parse_move(&self.position, text)?;
        self.play_local(mv)
    }

    fn check_turn(&self) -> Result<(), GameError> {
        match self.player_color() {
            Some(color) if self.position.side_to_move != color => Err(GameError::NotYourTurn),
            _ => Ok(()),
        }
    }

    /// Applies an already parsed local move.
    pub fn play_local(&mut self, mv: Move) -> Result<MoveOutcome, GameError> {
        self.ensure_playing()?;
        self.check_turn()?;
        if !is_legal(&self.position, mv) {
            return Err(NotationError::Illegal(mv.to_string()).into());
        }

        match self.mode {
            Mode::Puzzle => {
                let Some(solution) = self.puzzle.as_ref().map(|p| p.solution) else {
                    return Err(GameError::GameOver);
                };
                if mv != solution {
                    let text = san(&self.position, mv);
                    info!(san = %text, "wrong puzzle answer");
                    return Ok(MoveOutcome::PuzzleRejected { san: text });
                }
                let played = self.commit(mv);
                self.puzzle = None;
                self.end = Some(GameEnd::PuzzleSolved);
                self.clock.stop(Instant::now());
                return Ok(MoveOutcome::PuzzleSolved(played));
            }
            Mode::VsBot { .. } => {
                let cmp = self
                    .engine
                    .choose_move(&self.position, &self.learning, SearchPurpose::Comparison);
                self.record.push_player_move(
                    mv,
                    Recommendation {
                        mv: cmp.best_move,
                        score: cmp.score,
                    },
                );
            }
            Mode::Network { .. } => {}
        }
        Ok(MoveOutcome::Played(self.commit(mv)))
    }

    /// Lets the engine move when it is its turn in a local game.
    pub fn play_bot_turn(&mut self) -> Result<Option<PlayedMove>, GameError> {
        let Mode::VsBot { human } = self.mode else {
            return Ok(None);
        };
        if self.end.is_some() || self.position.side_to_move == human {
            return Ok(None);
        }
        self.ensure_playing()?;

        let result = self
            .engine
            .choose_move(&self.position, &self.learning, SearchPurpose::BotMove);
        let Some(mv) = result.best_move else {
            return Err(GameError::NoMove);
        };
        if result.source == MoveSource::Random {
            warn!(mv = %mv, "engine fell back to a random move");
        }
        Ok(Some(self.commit(mv)))
    }

    /// Applies a move received from the peer after checking it.
    pub fn apply_remote_move(&mut self, mv: Move) -> Result<PlayedMove, GameError> {
        let Mode::Network { local } = self.mode else {
            return Err(GameError::Unavailable("remote move"));
        };
        self.ensure_playing()?;
        if self.position.side_to_move == local {
            warn!(mv = %mv, "peer moved out of turn, dropping");
            return Err(GameError::NotYourTurn);
        }
        if !is_legal(&self.position, mv) {
            warn!(mv = %mv, fen = %self.position.to_fen(), "illegal move from peer, dropping");
            return Err(GameError::IllegalRemote(mv));
        }
        Ok(self.commit(mv))
    }

    fn commit(&mut self, mv: Move) -> PlayedMove {
        let weights = Some(&self.learning.weights);
        let mover = self.position.side_to_move;
        let before = evaluate(&self.position, weights);
        let text = san(&self.position, mv);
        let captured = self.position.captured_piece(mv);

        self.position.make_move(mv);
        let after = evaluate(&self.position, weights);
        let delta = match mover {
            Color::White => after - before,
            Color::Black => before - after,
        };

        self.record.push_move(mv, delta);
        self.sans.push(text.clone());
        self.captures.push(captured);
        self.keys.push(self.position.position_key());
        self.clock.press(self.position.side_to_move, Instant::now());
        info!(
            san = %text,
            %mover,
            eval = after as f64 / 100.0,
            fen = %self.position.to_fen(),
            "move played"
        );

        self.end = self.detect_end();
        if self.end.is_some() {
            self.clock.stop(Instant::now());
        }
        PlayedMove {
            mv,
            san: text,
            captured,
            eval: after,
        }
    }

    fn detect_end(&self) -> Option<GameEnd> {
        match self.position.status() {
            GameStatus::Checkmate => {
                return Some(GameEnd::Checkmate {
                    winner: self.position.side_to_move.other(),
                })
            }
            GameStatus::Stalemate => return Some(GameEnd::Stalemate),
            GameStatus::InsufficientMaterial => return Some(GameEnd::InsufficientMaterial),
            GameStatus::SeventyFiveMoves => return Some(GameEnd::SeventyFiveMoves),
            GameStatus::Ongoing => {}
        }
        if self.position.is_fifty_move_draw() {
            return Some(GameEnd::FiftyMoves);
        }
        let current = self.keys.last()?;
        if self.keys.iter().filter(|k| *k == current).count() >= 3 {
            return Some(GameEnd::Repetition);
        }
        None
    }

    /// Takes moves back until it is the human's turn again. Returns how
    /// many plies were removed.
    pub fn undo(&mut self) -> Result<usize, GameError> {
        let Mode::VsBot { human } = self.mode else {
            return Err(GameError::Unavailable("undo"));
        };
        if self.end.is_some() {
            return Err(GameError::GameOver);
        }
        if self.record.is_empty() {
            return Err(GameError::NothingToUndo);
        }

        let mut undone = 0;
        while self.pop_ply().is_some() {
            undone += 1;
            if self.position.side_to_move == human {
                break;
            }
        }
        self.clock.press(self.position.side_to_move, Instant::now());
        info!(undone, "moves undone");
        Ok(undone)
    }

    /// Takes back the local player's last move in a network game after it
    /// failed to reach the peer.
    pub fn retract_unsent(&mut self) -> Result<Move, GameError> {
        let Mode::Network { local } = self.mode else {
            return Err(GameError::Unavailable("retract"));
        };
        if self.finished {
            return Err(GameError::GameOver);
        }
        if self.position.side_to_move == local {
            return Err(GameError::NothingToUndo);
        }
        let mv = self.pop_ply().ok_or(GameError::NothingToUndo)?;
        self.end = None;
        self.clock.press(local, Instant::now());
        info!(mv = %mv, "unsent move taken back");
        Ok(mv)
    }

    fn pop_ply(&mut self) -> Option<Move> {
        let mv = self.record.pop_move()?;
        self.sans.pop();
        self.captures.pop();
        self.keys.pop();
        self.position = self.record.final_position();
        Some(mv)
    }

    /// The engine's suggestion for the side to move.
    pub fn hint(&self) -> Result<(Move, String), GameError> {
        if !matches!(self.mode, Mode::VsBot { .. }) {
            return Err(GameError::Unavailable("hint"));
        }
        if self.end.is_some() {
            return Err(GameError::GameOver);
        }
        let result = self
            .engine
            .choose_move(&self.position, &self.learning, SearchPurpose::BotMove);
        let mv = result.best_move.ok_or(GameError::NoMove)?;
        let text = san(&self.position, mv);
        info!(san = %text, "hint requested");
        Ok((mv, text))
    }

    pub fn resign(&mut self) -> Result<GameEnd, GameError> {
        let Some(color) = self.player_color() else {
            return Err(GameError::Unavailable("resign"));
        };
        self.ensure_playing()?;
        let end = GameEnd::Resignation {
            winner: color.other(),
        };
        info!(%end, "game resigned");
        self.clock.stop(Instant::now());
        self.end = Some(end);
        Ok(end)
    }

    /// Offers a draw. The engine accepts unless it is ahead by more than
    /// [`DRAW_ACCEPT_MARGIN`]; a network peer has no way to refuse.
    pub fn offer_draw(&mut self) -> Result<bool, GameError> {
        let accepted = match self.mode {
            Mode::Puzzle => return Err(GameError::Unavailable("draw")),
            Mode::Network { .. } => true,
            Mode::VsBot { human } => {
                let eval = self.evaluation();
                let engine_view = match human.other() {
                    Color::White => eval,
                    Color::Black => -eval,
                };
                engine_view <= DRAW_ACCEPT_MARGIN
            }
        };
        self.ensure_playing()?;
        if accepted {
            info!("draw agreed");
            self.clock.stop(Instant::now());
            self.end = Some(GameEnd::Agreement);
        } else {
            info!("draw offer declined");
        }
        Ok(accepted)
    }

    /// Applies the result to the learning profile and appends the game
    /// report. Runs once per game; later calls return `None`.
    pub fn finish_game(&mut self) -> Result<Option<GameSummary>, GameError> {
        let end = self.end.ok_or(GameError::InProgress)?;
        if self.finished {
            return Ok(None);
        }
        self.finished = true;
        let Some(color) = self.player_color() else {
            return Ok(None);
        };

        let analysis = analyze(&self.record, Some(&self.learning.weights));
        let update = self.learning.record_result(end.score_for(color));
        info!(%update, accuracy = analysis.accuracy, "learning updated");
        self.store.persist_or_log(&self.learning);

        let ctx = ReportContext {
            result: end.result().to_string(),
            elo: self.learning.elo,
            time_pressure: self.clock.time_pressure(Instant::now()),
        };
        let report = render_report(&analysis, &ctx, &timestamp());
        if let Err(err) = append_report(&self.report_path, &report) {
            warn!(path = ?self.report_path, error = %err, "could not write game report");
        }

        Ok(Some(GameSummary {
            end,
            analysis,
            update,
            report,
        }))
    }

    pub fn deep_analysis(&self) -> Result<DeepAnalysis, GameError> {
        if self.mode == Mode::Puzzle || self.record.is_empty() {
            return Err(GameError::Unavailable("analysis"));
        }
        let (result, score) = match (self.end, self.player_color()) {
            (Some(end), Some(color)) => (end.result(), end.score_for(color)),
            _ => ("*", 0.0),
        };
        Ok(deep_analysis(
            &self.record,
            Some(&self.learning.weights),
            result,
            score,
            self.learning.search_depth(),
        ))
    }

    /// Appends a deep analysis to the export file and returns its text.
    pub fn export_analysis(&self) -> Result<String, GameError> {
        let text = self.deep_analysis()?.render(&timestamp());
        append_report(&self.analysis_path, &text).map_err(|source| GameError::Io {
            path: self.analysis_path.clone(),
            source,
        })?;
        Ok(text)
    }

    pub fn pgn(&self) -> String {
        let (white, black) = match self.mode {
            Mode::VsBot { human: Color::White } => ("Player", "Engine"),
            Mode::VsBot { human: Color::Black } => ("Engine", "Player"),
            Mode::Network { local: Color::White } => ("Player", "Opponent"),
            Mode::Network { local: Color::Black } => ("Opponent", "Player"),
            Mode::Puzzle => ("Player", "Player"),
        };
        let headers = [
            ("Event", "Adaptive Chess Game".to_string()),
            ("Date", chrono::Local::now().format("%Y.%m.%d").to_string()),
            ("White", white.to_string()),
            ("Black", black.to_string()),
        ];
        let result = self.end.map_or("*", GameEnd::result);
        write_pgn(&headers, self.record.start(), self.record.moves(), result)
    }

    pub fn save_pgn(&self, path: &Path) -> Result<(), GameError> {
        fs::write(path, self.pgn()).map_err(|source| GameError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = ?path, "game saved");
        Ok(())
    }

    /// Replaces the current local game with one read from `path`. Loaded
    /// moves carry no engine recommendations.
    pub fn load_pgn(&mut self, path: &Path) -> Result<usize, GameError> {
        let human = match self.mode {
            Mode::VsBot { human } => human,
            Mode::Puzzle => Color::White,
            Mode::Network { .. } => return Err(GameError::Unavailable("load")),
        };
        let text = fs::read_to_string(path).map_err(|source| GameError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let game = read_pgn(&text)?;

        self.reset(game.start.clone(), Mode::VsBot { human });
        for &mv in &game.moves {
            self.commit(mv);
        }
        self.clock.reset();
        info!(path = ?path, plies = game.moves.len(), "game loaded");
        Ok(game.moves.len())
    }

    pub fn status_line(&self) -> String {
        let now = Instant::now();
        let side = self.position.side_to_move;
        let check = if self.position.in_check(side) {
            " (check)"
        } else {
            ""
        };
        let mut line = match (self.end, self.mode) {
            (Some(end), _) => format!("Game over: {end} ({})", end.result()),
            (None, Mode::Puzzle) => format!("Puzzle: {side} to move, find the best move{check}"),
            (None, Mode::Network { local }) if local == side => {
                format!("Your turn ({side}){check}")
            }
            (None, Mode::Network { .. }) => format!("Waiting for opponent ({side}){check}"),
            (None, Mode::VsBot { .. }) => format!("{side}'s turn{check}"),
        };
        if self.clock.is_enabled() && self.mode != Mode::Puzzle {
            line.push_str(&format!(
                " | White {} | Black {}",
                ChessClock::format(self.clock.remaining(Color::White, now)),
                ChessClock::format(self.clock.remaining(Color::Black, now)),
            ));
        }
        line
    }

    /// Numbered SAN movetext of the game so far.
    pub fn move_list(&self) -> String {
        let start = self.record.start();
        let mut number = start.fullmove_number;
        let mut out = Vec::new();
        for (i, text) in self.sans.iter().enumerate() {
            let white_to_move = (start.side_to_move == Color::White) == (i % 2 == 0);
            if white_to_move {
                out.push(format!("{number}. {text}"));
            } else {
                if i == 0 {
                    out.push(format!("{number}... {text}"));
                } else {
                    out.push(text.clone());
                }
                number += 1;
            }
        }
        out.join(" ")
    }
}

#[cfg(test)]
#[path = "game_tests.rs"]
mod game_tests;
