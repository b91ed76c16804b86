//! Per-type element behavior
//!
//! Every element stores its type-specific logic as an `Rc<dyn
//! ElementBehavior>`. The view clones the `Rc` out of the arena before calling
//! a hook, so hooks get full `&mut View` access and may add, remove or mutate
//! any element, including their own, while they run. Behaviors that keep
//! mutable state use interior mutability.

use std::any::Any;

use ggadget_core::{Canvas, DragEvent, Event, EventResult, KeyboardEvent, MouseEvent};

use crate::tree::ElementId;
use crate::view::View;

/// Virtual hooks of an element type
pub trait ElementBehavior: Any {
    /// Tag name the type was registered under
    fn tag_name(&self) -> &'static str;

    /// Whether the element owns a child collection
    fn allows_children(&self) -> bool {
        false
    }

    /// Size used when width or height is unspecified
    fn default_size(&self, _view: &View, _id: ElementId) -> (f64, f64) {
        (0.0, 0.0)
    }

    /// Position used when x or y is unspecified
    fn default_position(&self, _view: &View, _id: ElementId) -> (f64, f64) {
        (0.0, 0.0)
    }

    /// Narrow the hit area after the rectangle and mask tests passed
    ///
    /// Only ever called for points inside the element, so an implementation
    /// cannot widen the hit area.
    fn is_point_in(&self, _view: &View, _id: ElementId, _x: f64, _y: f64) -> bool {
        true
    }

    /// Map a point in this element's space into `child`'s space
    fn self_coord_to_child_coord(
        &self,
        view: &View,
        _id: ElementId,
        child: ElementId,
        x: f64,
        y: f64,
    ) -> (f64, f64) {
        view.placement_to_child(child, x, y)
    }

    /// Map a point in `child`'s space into this element's space
    fn child_coord_to_self_coord(
        &self,
        view: &View,
        _id: ElementId,
        child: ElementId,
        x: f64,
        y: f64,
    ) -> (f64, f64) {
        view.placement_to_parent(child, x, y)
    }

    /// Called during the layout pass after the children were laid out
    fn layout(&self, _view: &mut View, _id: ElementId) {}

    /// Paint the element in its own coordinate space
    fn do_draw(&self, view: &mut View, id: ElementId, canvas: &mut dyn Canvas) {
        view.draw_children(Some(id), canvas);
    }

    fn handle_mouse_event(
        &self,
        _view: &mut View,
        _id: ElementId,
        _event: &MouseEvent,
    ) -> EventResult {
        EventResult::Unhandled
    }

    fn handle_key_event(
        &self,
        _view: &mut View,
        _id: ElementId,
        _event: &KeyboardEvent,
    ) -> EventResult {
        EventResult::Unhandled
    }

    fn handle_drag_event(
        &self,
        _view: &mut View,
        _id: ElementId,
        _event: &DragEvent,
    ) -> EventResult {
        EventResult::Unhandled
    }

    /// Focus changes and other non-input events
    fn handle_other_event(&self, _view: &mut View, _id: ElementId, _event: &Event) -> EventResult {
        EventResult::Unhandled
    }

    fn as_any(&self) -> &dyn Any;
}

impl dyn ElementBehavior {
    /// Concrete behavior of an element, if it is a `T`
    pub fn downcast_ref<T: ElementBehavior>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: ElementBehavior>(&self) -> bool {
        self.as_any().is::<T>()
    }
}
