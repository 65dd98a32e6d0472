//! Error types for the tap crate

use sift_config::ConfigError;
use thiserror::Error;

/// Errors that can occur in the tap system
#[derive(Error, Debug)]
pub enum TapError {
    /// A listener referenced a tap channel nobody registered
    #[error("tap '{name}' not found")]
    TapNotFound { name: String },

    /// A listener filter failed to compile
    #[error("filter \"{filter}\" is invalid: {message}")]
    FilterInvalid { filter: String, message: String },

    /// A deferred command-line activation failed to start its listener
    #[error("activation '{argument}' failed: {source}")]
    Activation {
        argument: String,
        #[source]
        source: Box<TapError>,
    },

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl TapError {
    /// Create a TapNotFound error
    #[inline]
    pub fn tap_not_found(name: impl Into<String>) -> Self {
        Self::TapNotFound { name: name.into() }
    }

    /// Create a FilterInvalid error
    #[inline]
    pub fn filter_invalid(filter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FilterInvalid {
            filter: filter.into(),
            message: message.into(),
        }
    }

    /// Wrap an error raised while running a deferred activation
    #[inline]
    pub fn activation(argument: impl Into<String>, source: TapError) -> Self {
        Self::Activation {
            argument: argument.into(),
            source: Box::new(source),
        }
    }
}

/// Result type for tap operations
pub type Result<T> = std::result::Result<T, TapError>;
