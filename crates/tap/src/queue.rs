//! Per-packet tap event queue
//!
//! While one packet is decoded, every tap it hits appends an event here.
//! The queue lives exactly as long as the decode window, so payloads are
//! plain borrows of the decoder's data and are never copied.
//!
//! The queue has a configured capacity. What happens past it is the
//! overflow policy: `Grow` keeps accepting events, `Drop` discards and
//! counts them.

use std::any::Any;

use sift_config::OverflowPolicy;

use crate::TapId;

#[cfg(test)]
#[path = "queue_test.rs"]
mod tests;

/// Default number of events one packet may queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// One tap hit during the current decode pass
#[derive(Debug, Clone, Copy)]
pub struct QueuedEvent<'p> {
    /// Channel the decoder tapped
    pub tap_id: TapId,
    /// Decoder-specific data, borrowed for the decode pass
    pub payload: &'p dyn Any,
}

/// Events queued during one decode window, in enqueue order
#[derive(Debug)]
pub struct EventQueue<'p> {
    events: Vec<QueuedEvent<'p>>,
    capacity: usize,
    overflow: OverflowPolicy,
    dropped: u64,
}

impl<'p> EventQueue<'p> {
    /// Create an empty queue
    pub fn new(capacity: usize, overflow: OverflowPolicy) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            capacity,
            overflow,
            dropped: 0,
        }
    }

    /// Append an event
    ///
    /// Returns false if the queue is full and the policy discarded it.
    pub fn push(&mut self, tap_id: TapId, payload: &'p dyn Any) -> bool {
        if self.events.len() >= self.capacity && self.overflow == OverflowPolicy::Drop {
            self.dropped += 1;
            return false;
        }
        self.events.push(QueuedEvent { tap_id, payload });
        true
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if nothing was queued
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Configured capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events discarded by the `Drop` policy
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Whether more events were offered than the capacity allows
    pub fn overflowed(&self) -> bool {
        self.dropped > 0 || self.events.len() > self.capacity
    }

    /// Queued events in enqueue order
    pub fn events(&self) -> &[QueuedEvent<'p>] {
        &self.events
    }
}
