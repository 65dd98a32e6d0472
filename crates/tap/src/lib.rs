//! Sift Tap - tap dispatch for the packet decode engine
//!
//! Decoders publish events on named tap channels while a packet is being
//! dissected. Extensions (statistics, conversation tables, UI windows)
//! subscribe listeners to those channels, optionally with a filter, and are
//! told about every event of every packet that passes it.
//!
//! - Events are queued during the decode pass and dispatched only once the
//!   packet is fully decoded, so filters see the complete packet
//! - Dispatch is event-major: each event reaches all its listeners, in
//!   subscription order, before the next event is looked at
//! - Listeners draw at low frequency, only when they have seen something new
//! - Has near-zero cost when no listener is subscribed
//!
//! # Architecture
//!
//! ```text
//! Decode loop (per packet)
//!     │
//!     ├──→ TapPoint::begin_window ◄── primes filter fields
//!     │         │
//!     │         ▼
//!     │    DecodeWindow ◄── decoders: enqueue(tap_id, &payload)
//!     │         │
//!     ├──→ DecodeWindow::dispatch(&packet)
//!     │         │
//!     │         ▼
//!     │    ListenerRegistry ◄── tap id match + filter
//!     │         │
//!     │         ▼
//!     │    TapListener::packet ──→ dirty flag
//!     │
//! Timer ──→ TapPoint::poll_redraw ──→ TapListener::draw (dirty only)
//!
//! Command line ──→ CommandRegistry::try_activate
//!                        │
//!                        └──→ run_pending ──→ TapPoint::subscribe
//! ```

pub mod activation;
mod error;
pub mod filter;
pub mod listener;
pub mod packet;
pub mod queue;
pub mod redraw;
pub mod registry;
mod tap_id;
pub mod tap_point;
pub mod window;

#[cfg(test)]
pub(crate) mod test_utils;

pub use activation::{ActivationSummary, CommandRegistry, Resolver};
pub use error::{Result, TapError};
pub use filter::{CompiledFilter, FieldFilter, FieldFilterCompiler, FilterCompiler};
pub use listener::{ListenerId, TapListener};
pub use packet::{DecodedPacket, FieldValue, PacketFields};
pub use queue::{DEFAULT_QUEUE_CAPACITY, EventQueue, QueuedEvent};
pub use redraw::{DEFAULT_REDRAW_INTERVAL, RedrawPacer};
pub use registry::TapRegistry;
pub use sift_config::{OverflowPolicy, TapConfig};
pub use tap_id::TapId;
pub use tap_point::{TapPoint, TapStats};
pub use window::DecodeWindow;
