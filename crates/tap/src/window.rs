//! Decode window
//!
//! A `DecodeWindow` brackets the decoding of one packet. Decoders queue tap
//! events on it while they run; once the packet is fully decoded the decode
//! loop dispatches the window, which matches the queued events against the
//! listeners and their filters.

use std::any::Any;

use crate::TapId;
use crate::packet::DecodedPacket;
use crate::queue::EventQueue;
use crate::tap_point::TapPoint;

/// Tap events collected while one packet is decoded
///
/// Created by [`TapPoint::begin_window`]. Payloads queued on the window are
/// borrowed for `'p` and never outlive it. Dropping a window without calling
/// [`dispatch`](Self::dispatch) discards its events.
#[derive(Debug)]
pub struct DecodeWindow<'t, 'p> {
    tap: &'t mut TapPoint,
    /// `None` when nobody was listening as the window opened
    queue: Option<EventQueue<'p>>,
    frame: u64,
}

impl<'t, 'p> DecodeWindow<'t, 'p> {
    pub(crate) fn new(tap: &'t mut TapPoint, queue: Option<EventQueue<'p>>, frame: u64) -> Self {
        Self { tap, queue, frame }
    }

    /// Whether events queued on this window will be dispatched
    #[inline]
    pub fn is_active(&self) -> bool {
        self.queue.is_some()
    }

    /// Queue an event for `tap_id` with decoder-specific `payload`
    ///
    /// Called by decoders, possibly several times per packet. Free when the
    /// window is inactive. Taps with nothing to attach pass `&()`.
    #[inline]
    pub fn enqueue(&mut self, tap_id: TapId, payload: &'p dyn Any) {
        if let Some(queue) = self.queue.as_mut() {
            queue.push(tap_id, payload);
        }
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.queue.as_ref().map_or(0, EventQueue::len)
    }

    /// Check if no event is queued
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events this window discarded because its queue was full
    pub fn dropped(&self) -> u64 {
        self.queue.as_ref().map_or(0, EventQueue::dropped)
    }

    /// Close the window and deliver its events against the decoded packet
    ///
    /// Returns the number of listener callbacks run.
    pub fn dispatch(mut self, packet: &dyn DecodedPacket) -> u64 {
        match self.queue.take() {
            Some(queue) => self.tap.close_window(&queue, self.frame, Some(packet)),
            None => 0,
        }
    }
}

impl Drop for DecodeWindow<'_, '_> {
    fn drop(&mut self) {
        if let Some(queue) = self.queue.take() {
            self.tap.close_window(&queue, self.frame, None);
        }
    }
}
