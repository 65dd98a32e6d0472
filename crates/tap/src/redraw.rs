//! Redraw pacing
//!
//! Listener redraws are driven by a timer owned by the embedding
//! application. `RedrawPacer` lets that timer fire as often as it likes
//! while the actual redraw happens at most once per interval, decoupling
//! presentation cost from packet rate.

use std::time::{Duration, Instant};

#[cfg(test)]
#[path = "redraw_test.rs"]
mod tests;

/// Default interval between paced redraws
pub const DEFAULT_REDRAW_INTERVAL: Duration = Duration::from_secs(3);

/// Decides when a paced redraw is due
#[derive(Debug, Clone)]
pub struct RedrawPacer {
    interval: Duration,
    last_redraw: Option<Instant>,
}

impl RedrawPacer {
    /// Create a pacer with the given minimum interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_redraw: None,
        }
    }

    /// Minimum interval between redraws
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Check whether a redraw is due at `now`, and if so record it
    ///
    /// The first call is always due.
    pub fn is_due(&mut self, now: Instant) -> bool {
        let due = match self.last_redraw {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };
        if due {
            self.last_redraw = Some(now);
        }
        due
    }

    /// Forget the last redraw so the next poll is due immediately
    pub fn reset(&mut self) {
        self.last_redraw = None;
    }
}

impl Default for RedrawPacer {
    fn default() -> Self {
        Self::new(DEFAULT_REDRAW_INTERVAL)
    }
}
