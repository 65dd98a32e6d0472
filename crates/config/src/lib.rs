//! Sift Configuration
//!
//! TOML-based configuration for the tap subsystem. Every section is optional
//! and falls back to the defaults the tap point uses when built without a
//! config file.
//!
//! # Parsing
//!
//! ```
//! use sift_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[tap]\nqueue_capacity = 256").unwrap();
//! assert_eq!(config.tap.queue_capacity, 256);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [tap]
//! queue_capacity = 100
//! overflow = "drop"
//! redraw_interval_ms = 3000
//!
//! [log]
//! level = "debug"
//! ```

mod error;
mod logging;
mod tap;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogLevel};
pub use tap::{OverflowPolicy, TapConfig};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tap dispatch settings (event queue, redraw pacing)
    pub tap: TapConfig,

    /// Logging configuration
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, contains invalid TOML,
    /// or fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        validation::validate_config(&config)?;
        Ok(config)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
