//! Configuration validation
//!
//! Rejects values the tap point cannot run with:
//! - a zero-length event queue
//! - a zero redraw interval

use crate::Config;
use crate::error::Result;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    config.tap.validate()
}
