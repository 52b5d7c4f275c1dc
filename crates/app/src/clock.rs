//! Per-side countdown clocks.
//!
//! Times are passed in explicitly so callers (and tests) decide what "now"
//! is.

use std::fmt;
use std::time::{Duration, Instant};

use chess_core::Color;

/// Below this either side is considered short on time.
pub const TIME_PRESSURE: Duration = Duration::from_secs(adaptive_engine::analysis::TIME_PRESSURE_SECS);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeControl {
    pub initial: Duration,
    pub increment: Duration,
}

impl TimeControl {
    pub fn from_secs(initial: u64, increment: u64) -> Self {
        Self {
            initial: Duration::from_secs(initial),
            increment: Duration::from_secs(increment),
        }
    }

    pub fn unlimited() -> Self {
        Self::from_secs(0, 0)
    }

    pub fn is_unlimited(&self) -> bool {
        self.initial.is_zero()
    }
}

impl Default for TimeControl {
    fn default() -> Self {
        Self::from_secs(600, 0)
    }
}

impl fmt::Display for TimeControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unlimited() {
            write!(f, "Unlimited")
        } else {
            write!(
                f,
                "{}+{}",
                self.initial.as_secs() / 60,
                self.increment.as_secs()
            )
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChessClock {
    time_control: TimeControl,
    remaining: [Duration; 2],
    /// Side whose clock is running and since when.
    running: Option<(Color, Instant)>,
}

impl Default for ChessClock {
    fn default() -> Self {
        Self::new(TimeControl::default())
    }
}

impl ChessClock {
    pub fn new(time_control: TimeControl) -> Self {
        Self {
            time_control,
            remaining: [time_control.initial; 2],
            running: None,
        }
    }

    pub fn time_control(&self) -> TimeControl {
        self.time_control
    }

    pub fn is_enabled(&self) -> bool {
        !self.time_control.is_unlimited()
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.time_control);
    }

    pub fn start(&mut self, color: Color, now: Instant) {
        if self.is_enabled() {
            self.running = Some((color, now));
        }
    }

    /// Charges the running side for elapsed time and adds the increment.
    pub fn stop(&mut self, now: Instant) {
        if let Some((color, since)) = self.running.take() {
            let left = self.remaining[color.idx()].saturating_sub(now.saturating_duration_since(since));
            self.remaining[color.idx()] = if left.is_zero() {
                left
            } else {
                left + self.time_control.increment
            };
        }
    }

    /// Stops the running side and starts `next`.
    pub fn press(&mut self, next: Color, now: Instant) {
        self.stop(now);
        self.start(next, now);
    }

    pub fn remaining(&self, color: Color, now: Instant) -> Duration {
        let base = self.remaining[color.idx()];
        match self.running {
            Some((running, since)) if running == color => {
                base.saturating_sub(now.saturating_duration_since(since))
            }
            _ => base,
        }
    }

    /// The side that ran out of time, if any.
    pub fn flagged(&self, now: Instant) -> Option<Color> {
        if !self.is_enabled() {
            return None;
        }
        [Color::White, Color::Black]
            .into_iter()
            .find(|&c| self.remaining(c, now).is_zero())
    }

    pub fn time_pressure(&self, now: Instant) -> bool {
        self.is_enabled()
            && [Color::White, Color::Black]
                .iter()
                .any(|&c| self.remaining(c, now) < TIME_PRESSURE)
    }

    /// `M:SS`, with tenths under ten seconds.
    pub fn format(duration: Duration) -> String {
        let total = duration.as_secs();
        let (mins, secs) = (total / 60, total % 60);
        if duration < Duration::from_secs(10) {
            let tenths = duration.subsec_millis() / 100;
            format!("{mins}:{secs:02}.{tenths}")
        } else {
            format!("{mins}:{secs:02}")
        }
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod clock_tests;
