//! Tap channel identifier
//!
//! `TapId` is the handle a decoder gets back from registering a tap channel
//! and passes with every event it queues. Ids are handed out sequentially
//! starting at 1.

use std::fmt;

/// Identifier of a registered tap channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TapId(u32);

impl TapId {
    /// First id handed out by a registry
    pub const FIRST: TapId = TapId(1);

    /// Create a tap id from its numeric value
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the numeric value of this id
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Position of the channel in registration order, if this id can
    /// have been issued by a registry
    #[inline]
    pub(crate) fn index(self) -> Option<usize> {
        (self.0 as usize).checked_sub(1)
    }
}

impl fmt::Display for TapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tap:{}", self.0)
    }
}

impl From<TapId> for u32 {
    #[inline]
    fn from(id: TapId) -> Self {
        id.0
    }
}
