//! Tap channel registry
//!
//! Decoders register the tap channels they can feed once, at load time, and
//! keep the returned `TapId` for queueing events. Listeners resolve channels
//! by name when they subscribe.

use crate::TapId;

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;

/// Registered tap channels, in registration order
///
/// The channel registered n-th gets `TapId::new(n)`. Channels are never
/// removed. Registering a name twice is not rejected; lookups return the
/// first registration.
#[derive(Debug, Clone, Default)]
pub struct TapRegistry {
    names: Vec<String>,
}

impl TapRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tap channel and return its id
    pub fn register(&mut self, name: impl Into<String>) -> TapId {
        self.names.push(name.into());
        TapId::new(self.names.len() as u32)
    }

    /// Look up the id of a channel by exact name
    ///
    /// Linear scan; only called when a listener subscribes, never per packet.
    pub fn find_id(&self, name: &str) -> Option<TapId> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|pos| TapId::new(pos as u32 + 1))
    }

    /// Name of a registered channel
    pub fn name(&self, id: TapId) -> Option<&str> {
        id.index()
            .and_then(|idx| self.names.get(idx))
            .map(String::as_str)
    }

    /// Number of registered channels
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if no channel is registered
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate over all channels in registration order
    pub fn iter(&self) -> impl Iterator<Item = (TapId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(idx, name)| (TapId::new(idx as u32 + 1), name.as_str()))
    }
}
