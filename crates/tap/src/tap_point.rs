//! TapPoint - the tap dispatch context
//!
//! `TapPoint` owns everything the tap subsystem keeps between packets:
//!
//! - the tap channels decoders registered
//! - the listeners extensions subscribed, with their filters and dirty flags
//! - the filter compiler and event queue settings
//! - redraw pacing and dispatch statistics
//!
//! # Usage
//!
//! ```
//! use std::any::Any;
//! use sift_tap::{DecodedPacket, PacketFields, TapListener, TapPoint};
//!
//! struct Counter(u32);
//!
//! impl TapListener for Counter {
//!     fn packet(&mut self, _packet: &dyn DecodedPacket, _payload: &dyn Any) -> bool {
//!         self.0 += 1;
//!         true
//!     }
//! }
//!
//! let mut taps = TapPoint::new();
//!
//! // Decoder load time
//! let ip_tap = taps.register_tap("ip");
//!
//! // Extension
//! taps.subscribe("ip", Some("frame.len > 100"), Counter(0)).unwrap();
//!
//! // Decode loop, once per packet
//! let mut packet = PacketFields::new(1);
//! let header = 4u8;
//! let mut window = taps.begin_window(&mut packet);
//! // ... decoding fills in `packet` ...
//! window.enqueue(ip_tap, &header);
//! let delivered = window.dispatch(&packet);
//! assert_eq!(delivered, 0); // packet has no frame.len, filter rejects it
//! ```

use std::time::{Duration, Instant};

use sift_config::{OverflowPolicy, TapConfig};
use tracing::{debug, trace, warn};

use crate::TapId;
use crate::error::{Result, TapError};
use crate::filter::{FieldFilterCompiler, FilterCompiler};
use crate::listener::{ListenerId, ListenerRegistry, TapListener};
use crate::packet::DecodedPacket;
use crate::queue::{DEFAULT_QUEUE_CAPACITY, EventQueue};
use crate::redraw::{DEFAULT_REDRAW_INTERVAL, RedrawPacer};
use crate::registry::TapRegistry;
use crate::window::DecodeWindow;

/// The tap dispatch context
#[derive(Debug)]
pub struct TapPoint {
    /// Registered tap channels
    taps: TapRegistry,
    /// Active subscriptions
    listeners: ListenerRegistry,
    /// Compiler for listener filters
    compiler: Box<dyn FilterCompiler>,
    /// Events one packet may queue before the overflow policy applies
    queue_capacity: usize,
    /// What to do past `queue_capacity`
    overflow: OverflowPolicy,
    /// Paces `poll_redraw`
    pacer: RedrawPacer,
    /// Dispatch counters
    stats: TapStats,
}

impl TapPoint {
    /// Create a tap point with default settings and the built-in filter language
    pub fn new() -> Self {
        Self::with_settings(
            DEFAULT_QUEUE_CAPACITY,
            OverflowPolicy::default(),
            DEFAULT_REDRAW_INTERVAL,
        )
    }

    /// Create a tap point from configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the config fails validation.
    pub fn from_config(config: &TapConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self::with_settings(
            config.queue_capacity,
            config.overflow,
            Duration::from_millis(config.redraw_interval_ms),
        ))
    }

    fn with_settings(
        queue_capacity: usize,
        overflow: OverflowPolicy,
        redraw_interval: Duration,
    ) -> Self {
        Self {
            taps: TapRegistry::new(),
            listeners: ListenerRegistry::new(),
            compiler: Box::new(FieldFilterCompiler),
            queue_capacity,
            overflow,
            pacer: RedrawPacer::new(redraw_interval),
            stats: TapStats::default(),
        }
    }

    /// Use a different filter compiler for subsequent subscriptions
    pub fn with_compiler(mut self, compiler: impl FilterCompiler + 'static) -> Self {
        self.compiler = Box::new(compiler);
        self
    }

    // ------------------------------------------------------------------------
    // Tap channels (decoder side)
    // ------------------------------------------------------------------------

    /// Register a tap channel, returning the id to queue events with
    pub fn register_tap(&mut self, name: &str) -> TapId {
        let id = self.taps.register(name);
        debug!(tap = name, %id, "tap registered");
        id
    }

    /// Look up a tap channel by name
    pub fn find_tap(&self, name: &str) -> Option<TapId> {
        self.taps.find_id(name)
    }

    /// Registered tap channels
    pub fn taps(&self) -> &TapRegistry {
        &self.taps
    }

    // ------------------------------------------------------------------------
    // Listeners (extension side)
    // ------------------------------------------------------------------------

    /// Subscribe a listener to the tap channel named `tap_name`
    ///
    /// When `filter` is given, it is compiled now and the listener only sees
    /// events of packets matching it.
    ///
    /// # Errors
    ///
    /// - `TapNotFound` if no channel has that name
    /// - `FilterInvalid` if the filter does not compile
    ///
    /// Nothing is registered on error.
    pub fn subscribe(
        &mut self,
        tap_name: &str,
        filter: Option<&str>,
        listener: impl TapListener + 'static,
    ) -> Result<ListenerId> {
        let tap_id = self
            .taps
            .find_id(tap_name)
            .ok_or_else(|| TapError::tap_not_found(tap_name))?;

        let compiled = match filter {
            Some(expr) => Some(
                self.compiler
                    .compile(expr)
                    .map_err(|message| TapError::filter_invalid(expr, message))?,
            ),
            None => None,
        };

        let id = self.listeners.insert(tap_id, compiled, Box::new(listener));
        debug!(
            tap = tap_name,
            listener = %id,
            filtered = filter.is_some(),
            "tap listener added"
        );
        Ok(id)
    }

    /// Remove a listener, handing its state back
    ///
    /// Unknown or already-removed handles are ignored and return `None`.
    pub fn unsubscribe(&mut self, id: ListenerId) -> Option<Box<dyn TapListener>> {
        let listener = self.listeners.remove(id)?;
        debug!(listener = %id, "tap listener removed");
        Some(listener)
    }

    /// Check if any listener is subscribed
    ///
    /// The decode engine uses this to skip building a full decoded packet
    /// when nobody would look at it.
    #[inline]
    pub fn has_listeners(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// Check if any listener carries a filter
    ///
    /// Filters need decoded fields even when nothing else does.
    #[inline]
    pub fn has_filtering_listeners(&self) -> bool {
        self.listeners.filter_count() > 0
    }

    /// Number of active listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Number of compiled filters held by active listeners
    pub fn filter_count(&self) -> usize {
        self.listeners.filter_count()
    }

    /// Whether a listener has unseen events; `None` for unknown handles
    pub fn is_dirty(&self, id: ListenerId) -> Option<bool> {
        self.listeners.is_dirty(id)
    }

    /// Reset every listener
    ///
    /// Call when the analysed packet set is invalidated (new capture,
    /// reload, rescan). All listeners become dirty and the next
    /// `poll_redraw` draws them without waiting for the interval.
    pub fn reset_all(&mut self) {
        debug!(listeners = self.listeners.len(), "resetting tap listeners");
        self.listeners.reset_all();
        self.pacer.reset();
    }

    /// Redraw dirty listeners, or all of them with `force`
    ///
    /// Returns the number of listeners drawn.
    pub fn redraw_all(&mut self, force: bool) -> usize {
        self.listeners.redraw_all(force)
    }

    /// Redraw dirty listeners if the redraw interval has elapsed
    ///
    /// Meant to be called from the application's periodic timer. Returns
    /// true if a redraw pass ran.
    pub fn poll_redraw(&mut self, now: Instant) -> bool {
        if !self.pacer.is_due(now) {
            return false;
        }
        let drawn = self.redraw_all(false);
        trace!(drawn, "paced redraw");
        true
    }

    // ------------------------------------------------------------------------
    // Decode windows (decode loop side)
    // ------------------------------------------------------------------------

    /// Open the tap window for one packet, before decoding it
    ///
    /// With no listeners the window is inactive and every `enqueue` is a
    /// no-op. Otherwise the listener filters' fields are primed on the
    /// packet. The window borrows the tap point, so windows cannot nest and
    /// listeners cannot change until it is dispatched or dropped.
    pub fn begin_window<'p>(&mut self, packet: &mut dyn DecodedPacket) -> DecodeWindow<'_, 'p> {
        self.stats.windows_opened += 1;
        let frame = packet.frame_number();

        if self.listeners.is_empty() {
            return DecodeWindow::new(self, None, frame);
        }

        self.stats.windows_active += 1;
        self.listeners.prime(packet);
        let queue = EventQueue::new(self.queue_capacity, self.overflow);
        DecodeWindow::new(self, Some(queue), frame)
    }

    /// Account for a closed window and, given the decoded packet, dispatch
    /// its events
    ///
    /// Events go out in enqueue order; each one reaches every matching
    /// listener before the next event is looked at.
    pub(crate) fn close_window(
        &mut self,
        queue: &EventQueue<'_>,
        frame: u64,
        packet: Option<&dyn DecodedPacket>,
    ) -> u64 {
        self.stats.events_queued += queue.len() as u64;
        self.stats.events_dropped += queue.dropped();

        if queue.dropped() > 0 {
            warn!(
                frame,
                dropped = queue.dropped(),
                capacity = queue.capacity(),
                "tap event queue full, events dropped"
            );
        } else if queue.overflowed() {
            debug!(
                frame,
                queued = queue.len(),
                capacity = queue.capacity(),
                "tap event queue grew past capacity"
            );
        }

        let Some(packet) = packet else {
            if !queue.is_empty() {
                debug!(frame, discarded = queue.len(), "tap window closed without dispatch");
            }
            return 0;
        };

        let mut delivered = 0;
        for event in queue.events() {
            let delivery = self.listeners.deliver(event.tap_id, packet, event.payload);
            delivered += delivery.delivered;
            self.stats.events_filtered += delivery.filtered;
        }
        self.stats.events_delivered += delivered;

        trace!(frame, events = queue.len(), delivered, "tap window dispatched");
        delivered
    }

    /// Get dispatch statistics
    pub fn stats(&self) -> TapStats {
        self.stats
    }
}

impl Default for TapPoint {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about tap dispatch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TapStats {
    /// Decode windows opened
    pub windows_opened: u64,
    /// Windows opened while at least one listener was subscribed
    pub windows_active: u64,
    /// Events accepted into a window's queue
    pub events_queued: u64,
    /// Events discarded by the `Drop` overflow policy
    pub events_dropped: u64,
    /// Listener `packet` callbacks run
    pub events_delivered: u64,
    /// Events on a listener's tap that its filter rejected
    pub events_filtered: u64,
}

#[cfg(test)]
#[path = "tap_point_test.rs"]
mod tests;
