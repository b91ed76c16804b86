//! Event wrapper seen by signal handlers

use ggadget_core::{Event, EventResult, EventType};

use crate::tree::ElementId;

/// An event being dispatched, as exposed to handlers
///
/// Handlers read the event and its source element, and report back through
/// the return value. `Sizing` handlers may also propose a different result
/// through the output event.
#[derive(Clone, Debug, PartialEq)]
pub struct ScriptableEvent {
    event: Event,
    src_element: Option<ElementId>,
    return_value: EventResult,
    output_event: Option<Event>,
}

impl ScriptableEvent {
    pub fn new(event: impl Into<Event>, src_element: Option<ElementId>) -> Self {
        Self {
            event: event.into(),
            src_element,
            return_value: EventResult::Unhandled,
            output_event: None,
        }
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn event_type(&self) -> EventType {
        self.event.event_type()
    }

    /// Element the event was delivered to, `None` for view-level events
    pub fn src_element(&self) -> Option<ElementId> {
        self.src_element
    }

    pub fn return_value(&self) -> EventResult {
        self.return_value
    }

    pub fn set_return_value(&mut self, value: EventResult) {
        self.return_value = value;
    }

    /// Stop the event from propagating further
    pub fn cancel(&mut self) {
        self.return_value = EventResult::Canceled;
    }

    pub fn is_canceled(&self) -> bool {
        self.return_value.is_canceled()
    }

    pub fn output_event(&self) -> Option<&Event> {
        self.output_event.as_ref()
    }

    pub fn set_output_event(&mut self, event: impl Into<Event>) {
        self.output_event = Some(event.into());
    }
}
