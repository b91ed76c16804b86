//! Ordered child collections
//!
//! Children are kept in z-order: the first child is drawn first and sits at
//! the bottom, the last child is on top and is hit-tested first. Every
//! mutation renumbers the cached indices of the children it shifted.

use ggadget_core::{
    child_extent_in_parent, degrees_to_radians, Canvas, Color, DebugMode, DragEvent, EventResult,
    EventType, GadgetError, MouseEvent, Result,
};
use tracing::{debug, trace, warn};

use crate::event::ScriptableEvent;
use crate::geometry::{FlipMode, HitTest};
use crate::tree::{ElementId, ElementNode};
use crate::view::View;

/// Children of an element, or the top level of a view
#[derive(Clone, Debug, Default)]
pub struct Elements {
    pub(crate) children: Vec<ElementId>,
    scrollable: bool,
    extent: (f64, f64),
}

impl Elements {
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Children bottom to top
    pub fn ids(&self) -> &[ElementId] {
        &self.children
    }

    pub fn get(&self, index: usize) -> Option<ElementId> {
        self.children.get(index).copied()
    }

    /// Scrollable collections measure their children during layout
    pub fn is_scrollable(&self) -> bool {
        self.scrollable
    }

    /// Right and bottom edge of the union of the children, as of the last
    /// layout; zero unless scrollable
    pub fn extent(&self) -> (f64, f64) {
        self.extent
    }
}

/// Outcome of routing a mouse event into a collection
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MouseRouting {
    pub result: EventResult,
    /// Element whose handlers ran
    pub fired: Option<ElementId>,
    /// Topmost element under the pointer, fired or not
    pub in_element: Option<ElementId>,
    pub hit_test: HitTest,
}

impl View {
    // ─────────────────────────────────────────────────────────────────────────
    // Access
    // ─────────────────────────────────────────────────────────────────────────

    /// Child collection of `parent`, or the top level for `None`
    pub fn elements(&self, parent: Option<ElementId>) -> Option<&Elements> {
        match parent {
            None => Some(&self.root),
            Some(id) => self.tree.get(id)?.children.as_ref(),
        }
    }

    fn elements_mut(&mut self, parent: Option<ElementId>) -> Option<&mut Elements> {
        match parent {
            None => Some(&mut self.root),
            Some(id) => self.tree.get_mut(id)?.children.as_mut(),
        }
    }

    pub fn children(&self, parent: Option<ElementId>) -> &[ElementId] {
        self.elements(parent).map_or(&[], Elements::ids)
    }

    pub fn child_count(&self, parent: Option<ElementId>) -> usize {
        self.children(parent).len()
    }

    pub fn child_at(&self, parent: Option<ElementId>, index: usize) -> Option<ElementId> {
        self.children(parent).get(index).copied()
    }

    /// First child with the given name
    pub fn child_by_name(&self, parent: Option<ElementId>, name: &str) -> Option<ElementId> {
        if name.is_empty() {
            return None;
        }
        self.children(parent)
            .iter()
            .copied()
            .find(|id| self.element_name(*id) == Some(name))
    }

    pub fn children_extent(&self, parent: Option<ElementId>) -> (f64, f64) {
        self.elements(parent).map_or((0.0, 0.0), Elements::extent)
    }

    pub fn set_children_scrollable(&mut self, parent: Option<ElementId>, scrollable: bool) {
        if let Some(elements) = self.elements_mut(parent) {
            elements.scrollable = scrollable;
            if !scrollable {
                elements.extent = (0.0, 0.0);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────────────────────────────────

    /// Create an element from `tag` and put it on top of `parent`'s children
    pub fn append_element(
        &mut self,
        parent: Option<ElementId>,
        tag: &str,
        name: &str,
    ) -> Result<ElementId> {
        self.insert_element(parent, tag, None, name)
    }

    /// Create an element and insert it below `before`; a `before` that is
    /// not a child of `parent` appends
    pub fn insert_element(
        &mut self,
        parent: Option<ElementId>,
        tag: &str,
        before: Option<ElementId>,
        name: &str,
    ) -> Result<ElementId> {
        self.ensure_alive()?;
        if let Some(parent_id) = parent {
            let node = self.tree.get(parent_id).ok_or(GadgetError::ElementNotFound)?;
            if node.children.is_none() {
                return Err(GadgetError::ChildrenNotAllowed(node.tag.clone()));
            }
        }
        let behavior = self.factory().create(tag).map_err(|err| {
            warn!("{}", err);
            err
        })?;
        let tag = behavior.tag_name();
        let id = self
            .tree
            .insert(ElementNode::new(tag, name, behavior, parent));

        let Some(elements) = self.elements_mut(parent) else {
            self.tree.remove(id);
            return Err(GadgetError::ElementNotFound);
        };
        let position = before
            .and_then(|b| elements.children.iter().position(|c| *c == b))
            .unwrap_or(elements.children.len());
        elements.children.insert(position, id);
        self.reindex(parent, position);
        self.on_element_added(id);
        self.queue_draw_element(id);
        Ok(id)
    }

    /// Remove an element and destroy its subtree depth-first
    pub fn remove_element(&mut self, id: ElementId) -> Result<()> {
        self.ensure_alive()?;
        let Some(node) = self.tree.get(id) else {
            warn!("Removing element {:?} that is not in the tree", id);
            return Err(GadgetError::ElementNotFound);
        };
        let (parent, index) = (node.parent, node.index);
        self.queue_draw_element(id);

        if let Some(elements) = self.elements_mut(parent) {
            if elements.children.get(index) == Some(&id) {
                elements.children.remove(index);
            } else {
                elements.children.retain(|c| *c != id);
            }
        }
        self.reindex(parent, index);
        self.destroy_subtree(id);
        if let Some(parent) = parent {
            self.queue_draw_element(parent);
        }
        Ok(())
    }

    /// Remove every child of `parent`
    pub fn remove_all_elements(&mut self, parent: Option<ElementId>) {
        let Some(elements) = self.elements_mut(parent) else {
            return;
        };
        let removed = std::mem::take(&mut elements.children);
        if removed.is_empty() {
            return;
        }
        for id in removed {
            self.destroy_subtree(id);
        }
        match parent {
            Some(parent) => self.queue_draw_element(parent),
            None => self.queue_draw(),
        }
    }

    /// Children go first so that nothing ever refers to a removed parent
    fn destroy_subtree(&mut self, id: ElementId) {
        let children = self
            .tree
            .get_mut(id)
            .and_then(|n| n.children.take())
            .map(|e| e.children)
            .unwrap_or_default();
        for child in children {
            self.destroy_subtree(child);
        }
        self.on_element_removed(id);
        if let Some(node) = self.tree.remove(id) {
            debug!("Removed <{}> {:?}", node.tag, node.name);
        }
    }

    fn reindex(&mut self, parent: Option<ElementId>, from: usize) {
        let shifted: Vec<ElementId> = self.children(parent).iter().skip(from).copied().collect();
        for (offset, id) in shifted.into_iter().enumerate() {
            if let Some(node) = self.tree.get_mut(id) {
                node.index = from + offset;
            }
        }
    }

    /// Mark every descendant of `id` (the whole view for `None`) changed
    pub fn mark_redraw(&mut self, id: Option<ElementId>) {
        if let Some(node) = id.and_then(|id| self.tree.get_mut(id)) {
            node.flags.visual_changed = true;
            node.cached_canvas = None;
        }
        for child in self.children(id).to_vec() {
            self.mark_redraw(Some(child));
        }
    }

    /// The pixel size of `parent` (the view for `None`) changed; invalidate
    /// children placed relative to it
    pub(crate) fn notify_parent_size_changed(&mut self, parent: Option<ElementId>) {
        for child in self.children(parent).to_vec() {
            let Some(node) = self.tree.get_mut(child) else {
                continue;
            };
            let geometry = node.geometry;
            if geometry.x.is_relative() || geometry.y.is_relative() {
                node.flags.position_changed = true;
                node.flags.visual_changed = true;
            }
            if geometry.width.is_relative() || geometry.height.is_relative() {
                node.flags.size_changed = true;
                node.flags.visual_changed = true;
                self.notify_parent_size_changed(Some(child));
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mouse routing
    // ─────────────────────────────────────────────────────────────────────────

    /// Hit-test `parent`'s children top to bottom and deliver to the first
    /// one under the point
    ///
    /// The point is in `parent`'s space. The first child containing it ends
    /// the search even when it is disabled, so disabled elements occlude
    /// whatever is below them.
    pub fn route_mouse_to_children(
        &mut self,
        parent: Option<ElementId>,
        event: &MouseEvent,
    ) -> MouseRouting {
        let children = self.children(parent).to_vec();
        for child in children.into_iter().rev() {
            let Some(node) = self.tree.get(child) else {
                continue;
            };
            if !node.visible || node.opacity <= 0.0 || node.hit_test == HitTest::Transparent {
                continue;
            }
            let flip = node.geometry.flip;
            let (x, y) = self.into_child_space(parent, child, event.x, event.y);
            if !self.is_point_in(child, x, y) {
                continue;
            }
            let mut local = event.at(x, y);
            if flip.contains(FlipMode::HORIZONTAL) {
                local.wheel_delta_x = -local.wheel_delta_x;
            }
            if flip.contains(FlipMode::VERTICAL) {
                local.wheel_delta_y = -local.wheel_delta_y;
            }
            return self.element_mouse_event(child, &local, false);
        }
        MouseRouting::default()
    }

    /// Entry point of an element for a mouse event in its own space
    ///
    /// Unless `direct`, descendants get the event first and the element only
    /// fires when none of them did. Disabled elements never fire.
    pub fn element_mouse_event(
        &mut self,
        id: ElementId,
        event: &MouseEvent,
        direct: bool,
    ) -> MouseRouting {
        let mut routing = MouseRouting {
            in_element: Some(id),
            hit_test: self.hit_test_area(id),
            ..MouseRouting::default()
        };
        if !direct && self.elements(Some(id)).is_some() {
            let inner = self.route_mouse_to_children(Some(id), event);
            if inner.in_element.is_some() {
                routing.in_element = inner.in_element;
                routing.hit_test = inner.hit_test;
            }
            if inner.fired.is_some() || !self.tree.contains(id) {
                let result = self.bubble_wheel(id, event, inner.result);
                return MouseRouting {
                    result,
                    fired: inner.fired,
                    ..routing
                };
            }
        }
        if !self.is_enabled(id) {
            return routing;
        }
        routing.fired = Some(id);
        routing.result = self.deliver_mouse_to_element(id, event);
        routing
    }

    /// A wheel event no descendant handled goes to the ancestors' behaviors,
    /// so scrolling containers scroll over their content
    fn bubble_wheel(&mut self, id: ElementId, event: &MouseEvent, result: EventResult) -> EventResult {
        if event.ty != EventType::MouseWheel
            || result != EventResult::Unhandled
            || !self.tree.contains(id)
            || !self.is_enabled(id)
            || self.is_designer_mode(id)
        {
            return result;
        }
        match self.behavior(id) {
            Some(behavior) => behavior.handle_mouse_event(self, id, event),
            None => result,
        }
    }

    /// Fire the element's signal, then its behavior, unless canceled
    pub(crate) fn deliver_mouse_to_element(&mut self, id: ElementId, event: &MouseEvent) -> EventResult {
        if self.is_designer_mode(id) {
            return EventResult::Unhandled;
        }
        trace!("{:?} -> {:?} at ({}, {})", event.ty, id, event.x, event.y);
        let result = self.fire_element_signal(id, ScriptableEvent::new(*event, Some(id)));
        if result.is_canceled() {
            return result;
        }
        let Some(behavior) = self.behavior(id) else {
            return result;
        };
        result.merge(behavior.handle_mouse_event(self, id, event))
    }

    /// Run an element's handlers for the event's type
    ///
    /// Returns `Handled` when at least one handler ran and none canceled.
    pub(crate) fn fire_element_signal(&mut self, id: ElementId, event: ScriptableEvent) -> EventResult {
        let handlers = self
            .tree
            .get(id)
            .map(|n| n.signals.handlers(event.event_type()))
            .unwrap_or_default();
        if handlers.is_empty() {
            return EventResult::Unhandled;
        }
        let event = self.fire_event(event, &handlers);
        match event.return_value() {
            EventResult::Unhandled => EventResult::Handled,
            other => other,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Drag routing
    // ─────────────────────────────────────────────────────────────────────────

    /// Find the topmost enabled drop target under the point
    ///
    /// Returns the target and the event in its space. Unlike mouse routing,
    /// elements that are not drop targets let the search continue below.
    pub fn route_drag_to_children(
        &mut self,
        parent: Option<ElementId>,
        event: &DragEvent,
    ) -> Option<(ElementId, DragEvent)> {
        let children = self.children(parent).to_vec();
        for child in children.into_iter().rev() {
            if !self.really_visible(child) {
                continue;
            }
            let (x, y) = self.into_child_space(parent, child, event.x, event.y);
            if !self.is_point_in(child, x, y) {
                continue;
            }
            let local = event.at(x, y);
            if let Some(found) = self.route_drag_to_children(Some(child), &local) {
                return Some(found);
            }
            if self.is_drop_target(child) && self.is_enabled(child) {
                return Some((child, local));
            }
        }
        None
    }

    /// Fire an element's drag signal, then its behavior
    pub(crate) fn deliver_drag_to_element(&mut self, id: ElementId, event: &DragEvent) -> EventResult {
        if self.is_designer_mode(id) {
            return EventResult::Unhandled;
        }
        let result = self.fire_element_signal(id, ScriptableEvent::new(event.clone(), Some(id)));
        if result.is_canceled() {
            return result;
        }
        let Some(behavior) = self.behavior(id) else {
            return result;
        };
        result.merge(behavior.handle_drag_event(self, id, event))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Layout and drawing
    // ─────────────────────────────────────────────────────────────────────────

    /// Lay out the whole view
    pub fn layout(&mut self) {
        self.layout_children(None);
    }

    /// Children first, then each child's own hook; scrollable collections
    /// then measure their content
    pub(crate) fn layout_children(&mut self, parent: Option<ElementId>) {
        let children = self.children(parent).to_vec();
        for &child in &children {
            if self.elements(Some(child)).is_some() {
                self.layout_children(Some(child));
            }
            if let Some(behavior) = self.behavior(child) {
                behavior.layout(self, child);
            }
        }
        if !self.elements(parent).is_some_and(Elements::is_scrollable) {
            return;
        }
        let extent = children
            .iter()
            .filter(|id| self.is_visible(**id))
            .fold((0.0_f64, 0.0_f64), |(right, bottom), &id| {
                let (r, b) = child_extent_in_parent(
                    self.pixel_x(id),
                    self.pixel_y(id),
                    self.pixel_pin_x(id),
                    self.pixel_pin_y(id),
                    self.pixel_width(id),
                    self.pixel_height(id),
                    degrees_to_radians(self.rotation(id)),
                );
                (right.max(r), bottom.max(b))
            });
        if let Some(elements) = self.elements_mut(parent) {
            elements.extent = extent;
        }
    }

    /// Compose `parent`'s children bottom to top onto `canvas`
    ///
    /// `canvas` is in `parent`'s space. Returns whether any child changed
    /// since it was last drawn.
    pub fn draw_children(&mut self, parent: Option<ElementId>, canvas: &mut dyn Canvas) -> bool {
        let mut changed = false;
        for child in self.children(parent).to_vec() {
            let Some(node) = self.tree.get(child) else {
                continue;
            };
            let empty = self.pixel_width(child) <= 0.0 || self.pixel_height(child) <= 0.0;
            if !node.visible || node.opacity <= 0.0 || empty {
                changed |= self.draw_element(child, canvas);
                continue;
            }
            let rotation = node.geometry.rotation;
            let (x, y) = (self.pixel_x(child), self.pixel_y(child));
            let (pin_x, pin_y) = (self.pixel_pin_x(child), self.pixel_pin_y(child));

            canvas.push_state();
            if rotation == 0.0 {
                canvas.translate(x - pin_x, y - pin_y);
            } else {
                canvas.translate(x, y);
                canvas.rotate(degrees_to_radians(rotation));
                canvas.translate(-pin_x, -pin_y);
            }
            changed |= self.draw_element(child, canvas);
            if self.debug_mode() == DebugMode::All {
                let (w, h) = (self.pixel_width(child), self.pixel_height(child));
                draw_debug_box(canvas, w, h, Color::rgb(1.0, 0.0, 0.0));
            }
            canvas.pop_state();
        }

        if self.debug_mode() != DebugMode::Disabled && !self.children(parent).is_empty() {
            let (w, h) = match parent {
                Some(id) => (self.pixel_width(id), self.pixel_height(id)),
                None => (f64::from(self.width()), f64::from(self.height())),
            };
            draw_debug_box(canvas, w, h, Color::BLACK);
        }
        changed
    }

    /// Route into the top level and remember the hit-test area under the
    /// pointer
    pub(crate) fn hit_test_top_level(&mut self, event: &MouseEvent) -> MouseRouting {
        let routing = self.route_mouse_to_children(None, event);
        self.last_hit_test = routing.hit_test;
        routing
    }
}

/// Outline and diagonals of a `width`x`height` box
fn draw_debug_box(canvas: &mut dyn Canvas, width: f64, height: f64, color: Color) {
    canvas.draw_line(0.0, 0.0, 0.0, height, 1.0, color);
    canvas.draw_line(0.0, 0.0, width, 0.0, 1.0, color);
    canvas.draw_line(width, height, 0.0, height, 1.0, color);
    canvas.draw_line(width, height, width, 0.0, 1.0, color);
    canvas.draw_line(0.0, 0.0, width, height, 1.0, color);
    canvas.draw_line(width, 0.0, 0.0, height, 1.0, color);
}
