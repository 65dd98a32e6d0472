//! Tap dispatch configuration
//!
//! Sizes the per-packet event queue and paces listener redraws.

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// What the per-packet event queue does once it holds `queue_capacity` events
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Keep accepting events past the capacity (default)
    #[default]
    Grow,
    /// Discard events past the capacity and count them
    Drop,
}

impl OverflowPolicy {
    /// Config spelling of the policy
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grow => "grow",
            Self::Drop => "drop",
        }
    }
}

/// Tap dispatch configuration
///
/// # Example
///
/// ```toml
/// [tap]
/// queue_capacity = 100
/// overflow = "grow"
/// redraw_interval_ms = 3000
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TapConfig {
    /// Events one packet may queue before the overflow policy applies
    /// Default: 100
    pub queue_capacity: usize,

    /// Overflow policy (grow, drop)
    /// Default: grow
    pub overflow: OverflowPolicy,

    /// Minimum time between paced listener redraws, in milliseconds
    /// Default: 3000
    pub redraw_interval_ms: u64,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 100,
            overflow: OverflowPolicy::Grow,
            redraw_interval_ms: 3000,
        }
    }
}

impl TapConfig {
    /// Set the queue capacity
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the overflow policy
    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    /// Set the redraw interval
    pub fn with_redraw_interval_ms(mut self, interval_ms: u64) -> Self {
        self.redraw_interval_ms = interval_ms;
        self
    }

    /// Reject values the tap point cannot run with
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` for a zero queue capacity or redraw interval.
    pub fn validate(&self) -> Result<()> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::invalid_value(
                "tap",
                "queue_capacity",
                "must be at least 1",
            ));
        }

        if self.redraw_interval_ms == 0 {
            return Err(ConfigError::invalid_value(
                "tap",
                "redraw_interval_ms",
                "must be at least 1",
            ));
        }

        Ok(())
    }
}
