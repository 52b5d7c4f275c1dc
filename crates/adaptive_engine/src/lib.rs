//! Adaptive Chess Engine
//!
//! Minimax search with alpha-beta pruning over a material and piece-square
//! evaluation whose weights, along with the search depth, adapt to the
//! player's results. Also holds the opening book, the per-game record used
//! for accuracy analysis and the on-disk learning profile.

pub mod analysis;
pub mod book;
pub mod engine;
pub mod error;
pub mod eval;
pub mod learning;
pub mod profile;
pub mod search;

pub use analysis::{
    analyze, deep_analysis, AnalysisSummary, DeepAnalysis, GameRecord, MoveIssue, PlayerMove,
    Recommendation, ReportContext,
};
pub use book::{BookEntry, MoveListBook, OpeningBook};
pub use engine::{AdaptiveEngine, MoveSource, SearchPurpose, SearchResult};
pub use error::{BookError, EvalError, ProfileError};
pub use eval::{evaluate, try_evaluate, WeightCategory, Weights, MATE_SCORE};
pub use learning::{expected_score, search_depth, GameOutcome, LearningState, LearningUpdate};
pub use profile::ProfileStore;
pub use search::{alpha_beta, search_root, INFINITY};
