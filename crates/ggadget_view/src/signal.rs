//! Script-style signals
//!
//! A signal is a list of handlers connected to one event type of a view or an
//! element. Handlers receive the view and read the event being dispatched
//! through [`View::event`](crate::View::event); cancelling is done by setting
//! the event's return value.

use std::rc::Rc;

use ggadget_core::EventType;
use rustc_hash::FxHashMap;

use crate::view::View;

/// Signal handler
pub type Handler = Rc<dyn Fn(&mut View)>;

/// Identifies a connected handler for later disconnection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Connection(pub(crate) u64);

/// Handlers connected to one signal, in connection order
#[derive(Clone, Default)]
pub struct Signal {
    slots: Vec<(Connection, Handler)>,
}

impl Signal {
    pub fn connect(&mut self, connection: Connection, handler: Handler) {
        self.slots.push((connection, handler));
    }

    pub fn disconnect(&mut self, connection: Connection) -> bool {
        let before = self.slots.len();
        self.slots.retain(|(c, _)| *c != connection);
        self.slots.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Snapshot of the handlers, so emission survives connects and
    /// disconnects made by the handlers themselves
    pub fn handlers(&self) -> Vec<Handler> {
        self.slots.iter().map(|(_, h)| Rc::clone(h)).collect()
    }
}

/// Signals keyed by event type
#[derive(Clone, Default)]
pub struct SignalTable {
    signals: FxHashMap<EventType, Signal>,
}

impl SignalTable {
    pub fn connect(&mut self, ty: EventType, connection: Connection, handler: Handler) {
        self.signals.entry(ty).or_default().connect(connection, handler);
    }

    /// Remove a handler from whichever signal holds it
    pub fn disconnect(&mut self, connection: Connection) -> bool {
        self.signals
            .values_mut()
            .any(|signal| signal.disconnect(connection))
    }

    pub fn handlers(&self, ty: EventType) -> Vec<Handler> {
        self.signals
            .get(&ty)
            .map(Signal::handlers)
            .unwrap_or_default()
    }

    pub fn has_handlers(&self, ty: EventType) -> bool {
        self.signals.get(&ty).is_some_and(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Handler {
        Rc::new(|_view: &mut View| {})
    }

    #[test]
    fn test_connect_and_disconnect() {
        let mut table = SignalTable::default();
        table.connect(EventType::Click, Connection(1), noop());
        table.connect(EventType::Click, Connection(2), noop());
        table.connect(EventType::KeyDown, Connection(3), noop());

        assert_eq!(table.handlers(EventType::Click).len(), 2);
        assert!(table.disconnect(Connection(1)));
        assert!(!table.disconnect(Connection(1)));
        assert_eq!(table.handlers(EventType::Click).len(), 1);
        assert!(table.has_handlers(EventType::KeyDown));
        assert!(!table.has_handlers(EventType::MouseMove));
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut signal = Signal::default();
        signal.connect(Connection(1), noop());
        let snapshot = signal.handlers();
        signal.disconnect(Connection(1));
        assert_eq!(snapshot.len(), 1);
        assert!(signal.is_empty());
    }
}
