//! Interactive loop: stdin commands and network events on one task.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use chess_core::{Color, PieceKind};
use netplay::{SessionEvent, SessionState, SyncSession};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::game::{GameController, GameEnd, GameError, Mode, MoveOutcome, PlayedMove};
use crate::puzzle::Puzzle;

const HELP: &str = "\
Commands:
  <move>        play a move in SAN (Nf3, exd5, O-O, e8=Q) or UCI (g1f3)
  undo          take back your last move (and the engine's reply)
  hint          ask the engine for a move
  resign        give up the game
  draw          offer a draw
  new           start a new game
  puzzle        start a random puzzle
  board         show the board
  fen           print the position as FEN
  analysis      show a detailed analysis of this game
  export        append the detailed analysis to the export file
  save <file>   save the game as PGN
  load <file>   load a PGN game
  quit          leave";

/// How the session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Start {
    Local { human: Color },
    Host,
    Join { link: String },
}

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Move(String),
    Undo,
    Hint,
    Resign,
    Draw,
    New,
    Puzzle,
    Board,
    Fen,
    Analysis,
    Export,
    Save(PathBuf),
    Load(PathBuf),
    Help,
    Quit,
}

pub fn parse_input(line: &str) -> Result<Input, String> {
    let line = line.trim();
    let (word, arg) = match line.split_once(char::is_whitespace) {
        Some((word, arg)) => (word, arg.trim()),
        None => (line, ""),
    };
    let path = |name: &str| {
        if arg.is_empty() {
            Err(format!("usage: {name} <file>"))
        } else {
            Ok(PathBuf::from(arg))
        }
    };

    Ok(match word.to_ascii_lowercase().as_str() {
        "" => Input::Empty,
        "undo" => Input::Undo,
        "hint" => Input::Hint,
        "resign" => Input::Resign,
        "draw" => Input::Draw,
        "new" => Input::New,
        "puzzle" => Input::Puzzle,
        "board" => Input::Board,
        "fen" => Input::Fen,
        "analysis" => Input::Analysis,
        "export" => Input::Export,
        "save" => Input::Save(path("save")?),
        "load" => Input::Load(path("load")?),
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        _ if arg.is_empty() => Input::Move(word.to_string()),
        _ => return Err(format!("unknown command '{line}', type 'help'")),
    })
}

/// Plays a local move in a network game and relays it to the peer.
///
/// The move is only applied while a peer is connected, and is taken back
/// if it cannot be sent, so both boards stay on the same ply.
pub async fn play_network_move(
    game: &mut GameController,
    session: &SyncSession,
    text: &str,
) -> Result<PlayedMove, GameError> {
    let Mode::Network { local } = game.mode() else {
        return Err(GameError::Unavailable("network move"));
    };
    if session.state().await != SessionState::Connected {
        return Err(GameError::NoOpponent);
    }
    let played = match game.apply_local_move(text)? {
        MoveOutcome::Played(played) => played,
        _ => return Err(GameError::Unavailable("network move")),
    };
    if let Err(err) = session.send(played.mv, local).await {
        warn!(mv = %played.mv, error = %err, "could not send move, taking it back");
        game.retract_unsent()?;
        return Err(err.into());
    }
    Ok(played)
}

enum Flow {
    Continue,
    Quit,
}

struct App {
    game: GameController,
    session: SyncSession,
    /// Game end already reported.
    announced: bool,
}

/// Runs the interactive session until `quit` or end of input.
pub async fn run(config: AppConfig, start: Start) -> anyhow::Result<()> {
    let (session, mut events) = SyncSession::new(config.network.to_net_config());
    let mut app = App {
        game: GameController::new(&config),
        session,
        announced: false,
    };

    match start {
        Start::Local { human } => app.game.new_game(Mode::VsBot { human }),
        Start::Host => {
            let info = app.session.host(None).await.context("hosting game")?;
            app.game.new_game(Mode::Network {
                local: Color::White,
            });
            println!("Hosting on {}. Share this link: {}", info.local_addr, info.link);
            println!("Waiting for an opponent...");
        }
        Start::Join { link } => {
            let peer = app.session.join(&link).await.context("joining game")?;
            app.game.new_game(Mode::Network {
                local: Color::Black,
            });
            println!("Connected to {peer}. You play Black.");
        }
    }

    println!("Type 'help' for commands.");
    app.print_board();
    app.bot_turn();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                if let Flow::Quit = app.handle_line(&line).await {
                    break;
                }
            }
            Some(event) = events.recv() => app.handle_event(event).await,
            _ = ticker.tick() => {
                if app.game.check_clock(Instant::now()).is_some() {
                    app.announce_end().await;
                }
            }
        }
    }

    app.session.teardown().await;
    info!("session ended");
    Ok(())
}

impl App {
    async fn handle_line(&mut self, line: &str) -> Flow {
        let input = match parse_input(line) {
            Ok(input) => input,
            Err(msg) => {
                println!("{msg}");
                return Flow::Continue;
            }
        };

        let outcome = match input {
            Input::Empty => Ok(()),
            Input::Quit => return Flow::Quit,
            Input::Help => {
                println!("{HELP}");
                Ok(())
            }
            Input::Move(text) => self.local_move(&text).await,
            Input::Undo => self.game.undo().map(|n| {
                println!("Took back {n} move(s).");
                self.print_board();
            }),
            Input::Hint => self
                .game
                .hint()
                .map(|(_, san)| println!("Suggested move: {san}")),
            Input::Resign => self.game.resign().map(|_| ()),
            Input::Draw => self.game.offer_draw().map(|accepted| {
                if !accepted {
                    println!("The engine declines the draw.");
                }
            }),
            Input::New => self.new_game(),
            Input::Puzzle => self.start_puzzle(),
            Input::Board => {
                self.print_board();
                Ok(())
            }
            Input::Fen => {
                println!("{}", self.game.position().to_fen());
                Ok(())
            }
            Input::Analysis => self
                .game
                .deep_analysis()
                .map(|deep| println!("{}", deep.render(&adaptive_engine::analysis::timestamp()))),
            Input::Export => self
                .game
                .export_analysis()
                .map(|_| println!("Analysis saved.")),
            Input::Save(path) => self
                .game
                .save_pgn(&path)
                .map(|_| println!("Game saved to {}.", path.display())),
            Input::Load(path) => self.game.load_pgn(&path).map(|plies| {
                self.announced = false;
                println!("Loaded {plies} half-moves from {}.", path.display());
                self.print_board();
            }),
        };

        if let Err(err) = outcome {
            println!("{err}");
        }
        if self.game.game_over().is_some() {
            self.announce_end().await;
        }
        Flow::Continue
    }

    async fn local_move(&mut self, text: &str) -> Result<(), GameError> {
        if matches!(self.game.mode(), Mode::Network { .. }) {
            let played = play_network_move(&mut self.game, &self.session, text).await?;
            self.after_move("You", &played);
            return Ok(());
        }
        match self.game.apply_local_move(text)? {
            MoveOutcome::PuzzleRejected { san } => {
                println!("{san} is not the answer. Try again.");
            }
            MoveOutcome::PuzzleSolved(played) => {
                println!("Correct: {}!", played.san);
                self.print_board();
            }
            MoveOutcome::Played(played) => {
                self.after_move("You", &played);
                self.bot_turn();
            }
        }
        Ok(())
    }

    fn bot_turn(&mut self) {
        match self.game.play_bot_turn() {
            Ok(Some(played)) => self.after_move("Engine", &played),
            Ok(None) => {}
            Err(err) => println!("{err}"),
        }
    }

    fn after_move(&self, who: &str, played: &PlayedMove) {
        println!("{who} played {}", played.san);
        self.print_board();
    }

    fn new_game(&mut self) -> Result<(), GameError> {
        let human = match self.game.mode() {
            Mode::VsBot { human } => human,
            Mode::Puzzle => Color::White,
            Mode::Network { .. } => return Err(GameError::Unavailable("new game")),
        };
        self.game.new_game(Mode::VsBot { human });
        self.announced = false;
        self.print_board();
        self.bot_turn();
        Ok(())
    }

    fn start_puzzle(&mut self) -> Result<(), GameError> {
        let puzzle = Puzzle::random(&mut rand::thread_rng());
        let side = self.game.start_puzzle(puzzle)?.position.side_to_move;
        self.announced = false;
        println!("Puzzle: {}. {side} to move and win.", puzzle.name);
        self.print_board();
        Ok(())
    }

    async fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::PeerConnected(addr) => {
                println!("Opponent connected from {addr}.");
                self.print_board();
            }
            SessionEvent::MoveReceived(mv) => match self.game.apply_remote_move(mv) {
                Ok(played) => {
                    self.after_move("Opponent", &played);
                    if self.game.game_over().is_some() {
                        self.announce_end().await;
                    }
                }
                Err(err) => println!("Ignored a move from the opponent: {err}"),
            },
            SessionEvent::Disconnected => println!("Opponent disconnected."),
            SessionEvent::Failed(err) => println!("Network error: {err}"),
        }
    }

    /// Reports the result once and applies it to the profile.
    async fn announce_end(&mut self) {
        if self.announced {
            return;
        }
        let Some(end) = self.game.game_over() else {
            return;
        };
        self.announced = true;
        println!("Game over: {end} ({})", end.result());

        match self.game.finish_game() {
            Ok(Some(summary)) => println!(
                "Estimated Elo: {:.0} | Accuracy: {:.1}% | Report appended to the analysis log.",
                summary.update.elo_after, summary.analysis.accuracy
            ),
            Ok(None) => {}
            Err(err) => println!("{err}"),
        }

        // These endings have no wire message; closing the connection tells the peer.
        let silent_end = matches!(
            end,
            GameEnd::Resignation { .. } | GameEnd::Agreement | GameEnd::Timeout { .. }
        );
        if silent_end && matches!(self.game.mode(), Mode::Network { .. }) {
            self.session.teardown().await;
        }
    }

    fn print_board(&self) {
        let game = &self.game;
        println!("\n{}", game.position());
        let captured = |color: Color| {
            game.captured_by(color)
                .into_iter()
                .map(|k: PieceKind| k.to_char().to_ascii_uppercase().to_string())
                .collect::<Vec<_>>()
                .join(" ")
        };
        println!(
            "White captures: {} | Black captures: {}",
            captured(Color::White),
            captured(Color::Black)
        );
        if !game.sans().is_empty() {
            println!("Moves: {}", game.move_list());
        }
        println!("Evaluation: {:+.1}", game.evaluation() as f64 / 100.0);
        println!("{}", game.status_line());
    }
}
