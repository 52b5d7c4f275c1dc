//! Chess rules shared by the engine, the network layer and the terminal
//! front end: positions, legal move generation, terminal-state detection,
//! move notation and PGN records.

pub mod board;
pub mod error;
pub mod movegen;
pub mod notation;
pub mod perft;
pub mod pgn;
pub mod types;

pub use board::*;
pub use error::{FenError, NotationError, PgnError};
pub use movegen::*;
pub use notation::*;
pub use perft::{divide, perft};
pub use pgn::{read_pgn, write_pgn, PgnGame};
pub use types::*;
