//! Rating and weight adaptation from game results

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::eval::Weights;

pub const BASE_ELO: f64 = 1500.0;
pub const MIN_ELO: f64 = 800.0;
pub const MAX_ELO: f64 = 2800.0;
pub const MIN_WEIGHT: f64 = 0.1;
pub const MAX_WEIGHT: f64 = 2.0;

/// Rating change per unit of surprise
pub const ELO_K: f64 = 20.0;

/// Weight change per unit of surprise
pub const WEIGHT_RATE: f64 = 0.01;

/// Game result from the human player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    Win,
    Draw,
    Loss,
}

impl GameOutcome {
    pub fn score(self) -> f64 {
        match self {
            GameOutcome::Win => 1.0,
            GameOutcome::Draw => 0.5,
            GameOutcome::Loss => 0.0,
        }
    }
}

/// Probability the engine assigns to the human scoring against it, given
/// the human's current rating.
pub fn expected_score(elo: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf((elo - BASE_ELO) / 400.0))
}

/// Depth used for bot moves after `games` completed games.
pub fn search_depth(games: u32) -> u8 {
    (2 + games / 10).clamp(2, 6) as u8
}

/// Learned weights plus the player's rating history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningState {
    pub weights: Weights,
    pub games: u32,
    pub performance: f64,
    pub elo: f64,
}

impl Default for LearningState {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            games: 0,
            performance: 0.5,
            elo: BASE_ELO,
        }
    }
}

/// What a single call to [`LearningState::record_result`] changed.
#[derive(Debug, Clone, PartialEq)]
pub struct LearningUpdate {
    pub result: f64,
    pub expected: f64,
    pub elo_before: f64,
    pub elo_after: f64,
    pub games: u32,
    pub performance: f64,
}

impl fmt::Display for LearningUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "result {:.1} (expected {:.2}): elo {:.0} -> {:.0}, games {}, performance {:.2}",
            self.result, self.expected, self.elo_before, self.elo_after, self.games, self.performance
        )
    }
}

impl LearningState {
    pub fn search_depth(&self) -> u8 {
        search_depth(self.games)
    }

    /// Applies one finished game with human score `result` (1, 0.5 or 0).
    pub fn record_result(&mut self, result: f64) -> LearningUpdate {
        let expected = expected_score(self.elo);
        let error = result - expected;
        let elo_before = self.elo;

        self.elo = (self.elo + ELO_K * error).clamp(MIN_ELO, MAX_ELO);
        for w in self.weights.values_mut() {
            *w = (*w + WEIGHT_RATE * error).clamp(MIN_WEIGHT, MAX_WEIGHT);
        }
        self.performance = if self.games > 0 {
            (self.performance * (self.games - 1) as f64 + result) / self.games as f64
        } else {
            result
        };
        self.games += 1;

        LearningUpdate {
            result,
            expected,
            elo_before,
            elo_after: self.elo,
            games: self.games,
            performance: self.performance,
        }
    }

    /// Pulls every field back into its valid range. Returns true if anything
    /// had to change.
    pub fn normalize(&mut self) -> bool {
        let before = self.clone();
        self.weights.fill_missing();
        for w in self.weights.values_mut() {
            *w = if w.is_finite() {
                w.clamp(MIN_WEIGHT, MAX_WEIGHT)
            } else {
                1.0
            };
        }
        self.elo = if self.elo.is_finite() {
            self.elo.clamp(MIN_ELO, MAX_ELO)
        } else {
            BASE_ELO
        };
        self.performance = if self.performance.is_finite() {
            self.performance.clamp(0.0, 1.0)
        } else {
            0.5
        };
        *self != before
    }
}

#[cfg(test)]
#[path = "learning_tests.rs"]
mod learning_tests;
