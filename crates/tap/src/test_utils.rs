//! Listeners that record their callbacks, for tests

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::listener::TapListener;
use crate::packet::DecodedPacket;

/// Shared record of callback invocations, in call order
pub(crate) type CallLog = Rc<RefCell<Vec<String>>>;

pub(crate) fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Snapshot of the log contents
pub(crate) fn calls(log: &CallLog) -> Vec<String> {
    log.borrow().clone()
}

/// Listener logging `name:reset`, `name:draw` and
/// `name:packet:<frame>:<payload>` for `u32` payloads
pub(crate) struct Recorder {
    name: &'static str,
    log: CallLog,
    needs_redraw: bool,
}

impl Recorder {
    pub(crate) fn new(name: &'static str, log: &CallLog) -> Self {
        Self {
            name,
            log: Rc::clone(log),
            needs_redraw: true,
        }
    }

    /// Make `packet` report that no redraw is needed
    pub(crate) fn quiet(mut self) -> Self {
        self.needs_redraw = false;
        self
    }

    pub(crate) fn boxed(self) -> Box<dyn TapListener> {
        Box::new(self)
    }
}

impl TapListener for Recorder {
    fn reset(&mut self) {
        self.log.borrow_mut().push(format!("{}:reset", self.name));
    }

    fn packet(&mut self, packet: &dyn DecodedPacket, payload: &dyn Any) -> bool {
        let payload = payload
            .downcast_ref::<u32>()
            .map_or_else(|| "?".to_string(), u32::to_string);
        self.log.borrow_mut().push(format!(
            "{}:packet:{}:{}",
            self.name,
            packet.frame_number(),
            payload
        ));
        self.needs_redraw
    }

    fn draw(&mut self) {
        self.log.borrow_mut().push(format!("{}:draw", self.name));
    }
}

/// Listener relying on every default callback
pub(crate) struct Silent;

impl TapListener for Silent {}
