//! Logging configuration
//!
//! The tap crate only emits `tracing` events; installing a subscriber is up
//! to the embedding application, which can build its filter from
//! [`LogConfig::directive`].

use serde::Deserialize;

/// Target name used by the tap crate's log events
pub const TAP_LOG_TARGET: &str = "sift_tap";

/// Log level
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Per-window dispatch detail
    Trace,
    /// Subscriptions, removals and activations
    Debug,
    #[default]
    Info,
    /// Queue drops and failed activations
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to a level filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Logging configuration
///
/// # Example
///
/// ```toml
/// [log]
/// level = "debug"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level for the tap crate (trace, debug, info, warn, error)
    /// Default: info
    pub level: LogLevel,
}

impl LogConfig {
    /// Filter directive scoping the configured level to the tap crate,
    /// e.g. `sift_tap=debug`
    pub fn directive(&self) -> String {
        format!("{}={}", TAP_LOG_TARGET, self.level.as_str())
    }
}
