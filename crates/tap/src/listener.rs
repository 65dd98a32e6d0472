//! Tap listeners and their registry
//!
//! A `TapListener` is the extension side of a subscription: it is told about
//! every event on its tap channel that passes its filter, is reset when the
//! analysed packet set is invalidated, and is asked to draw at low frequency
//! when it has seen something new.
//!
//! The `ListenerRegistry` owns the listeners together with their tap id,
//! compiled filter and dirty flag. Listeners are keyed by a `ListenerId`
//! handed back at subscribe time and iterate in subscription order.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use crate::TapId;
use crate::filter::CompiledFilter;
use crate::packet::DecodedPacket;

#[cfg(test)]
#[path = "listener_test.rs"]
mod tests;

/// Extension callbacks for one tap subscription
///
/// All methods have no-op defaults, so a listener only implements the
/// callbacks it cares about. The listener value itself is the extension's
/// state.
pub trait TapListener {
    /// The analysed packet set was invalidated; drop accumulated state
    fn reset(&mut self) {}

    /// An event on the subscribed tap passed the filter
    ///
    /// `payload` is the decoder-specific data queued with the event (downcast
    /// it to the type the tap documents). It is only borrowed for this call;
    /// copy out whatever must be kept.
    ///
    /// Returns true if the listener needs to be redrawn.
    fn packet(&mut self, _packet: &dyn DecodedPacket, _payload: &dyn Any) -> bool {
        false
    }

    /// Periodic redraw of whatever the listener presents
    fn draw(&mut self) {}
}

/// Handle identifying a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Get the numeric value of this handle
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener:{}", self.0)
    }
}

struct ListenerEntry {
    tap_id: TapId,
    filter: Option<Box<dyn CompiledFilter>>,
    listener: Box<dyn TapListener>,
    dirty: bool,
}

impl fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerEntry")
            .field("tap_id", &self.tap_id)
            .field("filter", &self.filter)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

/// Outcome of delivering one event to the registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Listeners whose `packet` callback ran
    pub delivered: u64,
    /// Listeners on the tap whose filter rejected the packet
    pub filtered: u64,
}

/// All active subscriptions
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    entries: BTreeMap<ListenerId, ListenerEntry>,
    next_id: u64,
    filter_count: usize,
}

impl ListenerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener on `tap_id`, initially dirty
    pub fn insert(
        &mut self,
        tap_id: TapId,
        filter: Option<Box<dyn CompiledFilter>>,
        listener: Box<dyn TapListener>,
    ) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);

        if filter.is_some() {
            self.filter_count += 1;
        }

        self.entries.insert(
            id,
            ListenerEntry {
                tap_id,
                filter,
                listener,
                dirty: true,
            },
        );
        id
    }

    /// Remove a listener, releasing its filter and handing its state back
    ///
    /// Returns `None` if the handle is unknown or was already removed.
    pub fn remove(&mut self, id: ListenerId) -> Option<Box<dyn TapListener>> {
        let entry = self.entries.remove(&id)?;
        if entry.filter.is_some() {
            self.filter_count -= 1;
        }
        Some(entry.listener)
    }

    /// Whether a listener has unseen events
    pub fn is_dirty(&self, id: ListenerId) -> Option<bool> {
        self.entries.get(&id).map(|e| e.dirty)
    }

    /// Number of subscriptions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no subscriptions
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of subscriptions holding a compiled filter
    #[inline]
    pub fn filter_count(&self) -> usize {
        self.filter_count
    }

    /// Tell the packet which fields the listener filters will read
    pub fn prime(&self, packet: &mut dyn DecodedPacket) {
        for filter in self.entries.values().filter_map(|e| e.filter.as_deref()) {
            for field in filter.fields() {
                packet.prime_field(field);
            }
        }
    }

    /// Deliver one event to every listener on its tap whose filter passes
    pub fn deliver(
        &mut self,
        tap_id: TapId,
        packet: &dyn DecodedPacket,
        payload: &dyn Any,
    ) -> Delivery {
        let mut delivery = Delivery::default();

        for entry in self.entries.values_mut().filter(|e| e.tap_id == tap_id) {
            if let Some(ref filter) = entry.filter
                && !filter.matches(packet)
            {
                delivery.filtered += 1;
                continue;
            }

            entry.dirty |= entry.listener.packet(packet, payload);
            delivery.delivered += 1;
        }

        delivery
    }

    /// Reset every listener and mark it dirty
    pub fn reset_all(&mut self) {
        for entry in self.entries.values_mut() {
            entry.listener.reset();
            entry.dirty = true;
        }
    }

    /// Draw dirty listeners (or all of them when `force` is set)
    ///
    /// Every listener comes out clean. Returns how many were drawn.
    pub fn redraw_all(&mut self, force: bool) -> usize {
        let mut drawn = 0;
        for entry in self.entries.values_mut() {
            if entry.dirty || force {
                entry.listener.draw();
                drawn += 1;
            }
            entry.dirty = false;
        }
        drawn
    }
}
