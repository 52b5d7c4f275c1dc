//! Terminal front end for the adaptive engine and network play.

pub mod app;
pub mod cli;
pub mod clock;
pub mod config;
pub mod game;
pub mod logging;
pub mod puzzle;

pub use app::{parse_input, play_network_move, run, Input, Start};
pub use cli::{Cli, Command, Side};
pub use clock::{ChessClock, TimeControl};
pub use config::AppConfig;
pub use game::{GameController, GameEnd, GameError, Mode, MoveOutcome, PlayedMove};
pub use puzzle::{Puzzle, PUZZLES};
