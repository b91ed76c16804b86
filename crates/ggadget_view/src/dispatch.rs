//! Input dispatch
//!
//! Three independent pieces of state steer where input goes:
//!
//! - **grabbed**: set by a mouse-down on an element; moves and the matching
//!   up go there regardless of the pointer position
//! - **hovered**: the element under the pointer; changes synthesize a
//!   mouse-out on the old element and a mouse-over on the new one
//! - **focused**: receives keyboard input
//!
//! Handlers run synchronously and may remove, disable or move any element,
//! including the one being dispatched to. The state fields are therefore
//! updated before the handler they trigger runs, removal clears them, and
//! every id is re-validated after a handler returns.

use ggadget_core::{
    CursorType, DragEvent, Event, EventResult, EventType, KeyboardEvent, MouseEvent, SimpleEvent,
};
use tracing::{debug, trace};

use crate::event::ScriptableEvent;
use crate::tree::ElementId;
use crate::view::View;

impl View {
    // ─────────────────────────────────────────────────────────────────────────
    // Mouse
    // ─────────────────────────────────────────────────────────────────────────

    /// Deliver a host mouse event in view coordinates
    pub fn on_mouse_event(&mut self, event: &MouseEvent) -> EventResult {
        if self.is_destroyed() || !event.ty.is_mouse() {
            return EventResult::Unhandled;
        }
        trace!("View {:?} at ({}, {})", event.ty, event.x, event.y);

        let view_event = self.fire_view_signal(ScriptableEvent::new(*event, None));
        if view_event.is_canceled() {
            return EventResult::Canceled;
        }
        let view_result = view_event.return_value();

        match event.ty {
            EventType::MouseOver => return view_result,
            EventType::MouseOut => {
                let old = self.hovered.take();
                let result = match self.live(old) {
                    Some(old) => self.deliver_mouse_at(old, event, EventType::MouseOut),
                    None => EventResult::Unhandled,
                };
                self.update_pointer_feedback(None);
                return view_result.merge(result);
            }
            _ => {}
        }

        if matches!(event.ty, EventType::MouseMove | EventType::MouseUp) {
            if let Some(grabbed) = self.grabbed_element().filter(|id| self.is_enabled(*id)) {
                let result = self.deliver_mouse_at(grabbed, event, event.ty);
                if event.ty == EventType::MouseUp && self.grabbed == Some(grabbed) {
                    debug!("Released grab of {:?}", grabbed);
                    self.grabbed = None;
                }
                return view_result.merge(result);
            }
        }

        let routing = self.hit_test_top_level(event);
        let fired = self.live(routing.fired);
        match event.ty {
            EventType::MouseDown => match fired {
                Some(element) => {
                    debug!("Grabbed by {:?}", element);
                    self.grabbed = Some(element);
                    self.set_focus(Some(element));
                }
                None => {
                    self.grabbed = None;
                    self.set_focus(None);
                }
            },
            EventType::MouseUp => self.grabbed = None,
            _ => {}
        }

        self.update_hover(fired, event);
        self.update_pointer_feedback(self.live(routing.in_element));
        view_result.merge(routing.result)
    }

    /// Map a view-space event into `id` and deliver it as `ty`
    fn deliver_mouse_at(&mut self, id: ElementId, event: &MouseEvent, ty: EventType) -> EventResult {
        let (x, y) = self.view_coord_to_element_coord(id, event.x, event.y);
        self.deliver_mouse_to_element(id, &event.retyped(ty).at(x, y))
    }

    /// Move hover to `target`, pairing a mouse-out with a mouse-over
    fn update_hover(&mut self, target: Option<ElementId>, event: &MouseEvent) {
        let previous = self.live(self.hovered);
        if previous == target {
            return;
        }
        debug!("Hover {:?} -> {:?}", previous, target);
        self.hovered = target;
        if let Some(old) = previous {
            self.deliver_mouse_at(old, event, EventType::MouseOut);
        }
        // The out handler may have removed or disabled the new element, or
        // moved hover elsewhere by dispatching another event
        let Some(new) = target else {
            return;
        };
        if self.hovered == Some(new) && self.tree.contains(new) && self.is_enabled(new) {
            self.deliver_mouse_at(new, event, EventType::MouseOver);
        }
    }

    /// Push the cursor and tooltip of the element under the pointer to the
    /// host when they change
    fn update_pointer_feedback(&mut self, in_element: Option<ElementId>) {
        let cursor = in_element.map_or(CursorType::Arrow, |id| self.cursor(id));
        let tooltip = self.inherited_tooltip(in_element);
        let Some(host) = self.host().cloned() else {
            return;
        };
        if self.last_cursor != Some(cursor) {
            self.last_cursor = Some(cursor);
            host.set_cursor(cursor);
        }
        if self.last_tooltip != tooltip {
            host.set_tooltip(&tooltip);
            self.last_tooltip = tooltip;
        }
    }

    /// Tooltip of the element or its nearest ancestor that has one
    fn inherited_tooltip(&self, id: Option<ElementId>) -> String {
        let mut current = id;
        while let Some(node_id) = current {
            match self.tooltip(node_id) {
                Some(tooltip) if !tooltip.is_empty() => return tooltip.to_string(),
                Some(_) => current = self.parent_element(node_id),
                None => break,
            }
        }
        String::new()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Keyboard
    // ─────────────────────────────────────────────────────────────────────────

    /// Deliver a key event to the view, then to the focused element only
    pub fn on_key_event(&mut self, event: &KeyboardEvent) -> EventResult {
        if self.is_destroyed() || !event.ty.is_keyboard() {
            return EventResult::Unhandled;
        }
        let view_event = self.fire_view_signal(ScriptableEvent::new(*event, None));
        if view_event.is_canceled() {
            return EventResult::Canceled;
        }
        let view_result = view_event.return_value();
        let Some(focused) = self.focused_element().filter(|id| self.is_enabled(*id)) else {
            return view_result;
        };
        if self.is_designer_mode(focused) {
            return view_result;
        }
        trace!("{:?} -> {:?}", event.ty, focused);
        let result = self.fire_element_signal(focused, ScriptableEvent::new(*event, Some(focused)));
        if result.is_canceled() {
            return result;
        }
        let result = match self.behavior(focused) {
            Some(behavior) => result.merge(behavior.handle_key_event(self, focused, event)),
            None => result,
        };
        view_result.merge(result)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Drag and drop
    // ─────────────────────────────────────────────────────────────────────────

    /// Deliver a host drag event in view coordinates
    ///
    /// Motion tracks the drop target under the pointer, a drop goes to the
    /// current target and a drag leaving the view clears it.
    pub fn on_drag_event(&mut self, event: &DragEvent) -> EventResult {
        if self.is_destroyed() || !event.ty.is_drag() {
            return EventResult::Unhandled;
        }
        let view_event = self.fire_view_signal(ScriptableEvent::new(event.clone(), None));
        if view_event.is_canceled() {
            return EventResult::Canceled;
        }

        match event.ty {
            EventType::DragOut => {
                let old = self.drag_over.take();
                if let Some(old) = self.live(old) {
                    self.deliver_drag_at(old, event, EventType::DragOut);
                }
                EventResult::Unhandled
            }
            EventType::DragDrop => {
                let target = self.drag_over.take();
                match self.live(target) {
                    Some(target) => self.deliver_drag_at(target, event, EventType::DragDrop),
                    None => EventResult::Unhandled,
                }
            }
            _ => {
                let found = self.route_drag_to_children(None, event);
                let target = found.as_ref().map(|(id, _)| *id);
                let previous = self.live(self.drag_over);
                if target != previous {
                    debug!("Drag over {:?} -> {:?}", previous, target);
                    self.drag_over = target;
                    if let Some(old) = previous {
                        self.deliver_drag_at(old, event, EventType::DragOut);
                    }
                    if let Some((new, local)) = found {
                        if self.drag_over == Some(new) && self.tree.contains(new) {
                            self.deliver_drag_to_element(
                                new,
                                &local.retyped(EventType::DragOver),
                            );
                        }
                    }
                }
                // Tells the host whether a drop would be accepted here
                if self.drag_over_element().is_some() {
                    EventResult::Handled
                } else {
                    EventResult::Unhandled
                }
            }
        }
    }

    fn deliver_drag_at(&mut self, id: ElementId, event: &DragEvent, ty: EventType) -> EventResult {
        let (x, y) = self.view_coord_to_element_coord(id, event.x, event.y);
        self.deliver_drag_to_element(id, &event.retyped(ty).at(x, y))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Other events and focus
    // ─────────────────────────────────────────────────────────────────────────

    /// Deliver a view-level event such as focus changes or `onok`
    ///
    /// Losing host focus also takes focus away from the focused element.
    pub fn on_other_event(&mut self, event: &Event) -> EventResult {
        if self.is_destroyed() {
            return EventResult::Unhandled;
        }
        let view_event = self.fire_view_signal(ScriptableEvent::new(event.clone(), None));
        if event.event_type() == EventType::FocusOut {
            self.set_focus(None);
        }
        view_event.return_value()
    }

    /// Move keyboard focus
    ///
    /// Disabled or removed targets are refused. The focus field changes
    /// before the old element gets focus-out and the new one focus-in.
    pub fn set_focus(&mut self, target: Option<ElementId>) {
        if let Some(id) = target {
            if !self.tree.contains(id) || !self.is_enabled(id) {
                debug!("Refusing focus for {:?}", id);
                return;
            }
        }
        let previous = self.live(self.focused);
        if previous == target {
            return;
        }
        debug!("Focus {:?} -> {:?}", previous, target);
        self.focused = target;
        if let Some(old) = previous {
            self.deliver_other_to_element(old, EventType::FocusOut);
        }
        if let Some(new) = target {
            if self.focused == Some(new) && self.tree.contains(new) {
                self.deliver_other_to_element(new, EventType::FocusIn);
            }
        }
    }

    fn deliver_other_to_element(&mut self, id: ElementId, ty: EventType) -> EventResult {
        if self.is_designer_mode(id) {
            return EventResult::Unhandled;
        }
        let event = Event::Simple(SimpleEvent { ty });
        let result = self.fire_element_signal(id, ScriptableEvent::new(event.clone(), Some(id)));
        if result.is_canceled() {
            return result;
        }
        match self.behavior(id) {
            Some(behavior) => result.merge(behavior.handle_other_event(self, id, &event)),
            None => result,
        }
    }
}
