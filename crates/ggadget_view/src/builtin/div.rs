//! `<div>`: a plain container
//!
//! With `autoscroll` on, the div measures its children during layout and
//! scrolls over them. The scroll offset lives entirely in the coordinate
//! hooks and in `do_draw`, so nested scrolling composes without the view
//! knowing about it.

use std::any::Any;
use std::cell::Cell;

use ggadget_core::{Canvas, Color, EventResult, EventType, MouseEvent};

use crate::behavior::ElementBehavior;
use crate::tree::ElementId;
use crate::view::View;

/// Pixels scrolled per wheel notch
const LINE_STEP: f64 = 10.0;
/// Wheel delta of one notch
const WHEEL_NOTCH: f64 = 120.0;

#[derive(Debug, Default)]
pub struct DivElement {
    background: Cell<Option<Color>>,
    autoscroll: Cell<bool>,
    scroll_x: Cell<f64>,
    scroll_y: Cell<f64>,
    range_x: Cell<f64>,
    range_y: Cell<f64>,
}

impl DivElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn background(&self) -> Option<Color> {
        self.background.get()
    }

    pub fn set_background(&self, view: &mut View, id: ElementId, color: Option<Color>) {
        if self.background.replace(color) != color {
            view.queue_draw_element(id);
        }
    }

    pub fn is_autoscroll(&self) -> bool {
        self.autoscroll.get()
    }

    pub fn set_autoscroll(&self, view: &mut View, id: ElementId, autoscroll: bool) {
        if self.autoscroll.replace(autoscroll) == autoscroll {
            return;
        }
        view.set_children_scrollable(Some(id), autoscroll);
        if !autoscroll {
            self.range_x.set(0.0);
            self.range_y.set(0.0);
            self.set_scroll_position(view, id, 0.0, 0.0);
        }
        view.queue_draw_element(id);
    }

    pub fn scroll_position(&self) -> (f64, f64) {
        (self.scroll_x.get(), self.scroll_y.get())
    }

    /// Largest scroll position along each axis, as of the last layout
    pub fn scroll_range(&self) -> (f64, f64) {
        (self.range_x.get(), self.range_y.get())
    }

    /// Scroll to a position, clamped to the scroll range
    pub fn set_scroll_position(&self, view: &mut View, id: ElementId, x: f64, y: f64) -> bool {
        if !x.is_finite() || !y.is_finite() {
            return false;
        }
        let x = x.clamp(0.0, self.range_x.get());
        let y = y.clamp(0.0, self.range_y.get());
        let changed = self.scroll_x.replace(x) != x || self.scroll_y.replace(y) != y;
        if changed {
            view.queue_draw_element(id);
        }
        changed
    }

    pub fn scroll_by(&self, view: &mut View, id: ElementId, dx: f64, dy: f64) -> bool {
        let (x, y) = self.scroll_position();
        self.set_scroll_position(view, id, x + dx, y + dy)
    }
}

impl ElementBehavior for DivElement {
    fn tag_name(&self) -> &'static str {
        "div"
    }

    fn allows_children(&self) -> bool {
        true
    }

    fn self_coord_to_child_coord(
        &self,
        view: &View,
        _id: ElementId,
        child: ElementId,
        x: f64,
        y: f64,
    ) -> (f64, f64) {
        view.placement_to_child(child, x + self.scroll_x.get(), y + self.scroll_y.get())
    }

    fn child_coord_to_self_coord(
        &self,
        view: &View,
        _id: ElementId,
        child: ElementId,
        x: f64,
        y: f64,
    ) -> (f64, f64) {
        let (x, y) = view.placement_to_parent(child, x, y);
        (x - self.scroll_x.get(), y - self.scroll_y.get())
    }

    fn layout(&self, view: &mut View, id: ElementId) {
        if !self.autoscroll.get() {
            return;
        }
        let (extent_x, extent_y) = view.children_extent(Some(id));
        self.range_x
            .set((extent_x - view.pixel_width(id)).max(0.0));
        self.range_y
            .set((extent_y - view.pixel_height(id)).max(0.0));
        let (x, y) = self.scroll_position();
        self.set_scroll_position(view, id, x, y);
    }

    fn do_draw(&self, view: &mut View, id: ElementId, canvas: &mut dyn Canvas) {
        if let Some(color) = self.background.get() {
            canvas.draw_filled_rect(0.0, 0.0, view.pixel_width(id), view.pixel_height(id), color);
        }
        let (x, y) = self.scroll_position();
        if x == 0.0 && y == 0.0 {
            view.draw_children(Some(id), canvas);
        } else {
            canvas.push_state();
            canvas.translate(-x, -y);
            view.draw_children(Some(id), canvas);
            canvas.pop_state();
        }
    }

    fn handle_mouse_event(&self, view: &mut View, id: ElementId, event: &MouseEvent) -> EventResult {
        if event.ty != EventType::MouseWheel || !self.autoscroll.get() {
            return EventResult::Unhandled;
        }
        let dx = -f64::from(event.wheel_delta_x) * LINE_STEP / WHEEL_NOTCH;
        let dy = -f64::from(event.wheel_delta_y) * LINE_STEP / WHEEL_NOTCH;
        self.scroll_by(view, id, dx, dy);
        EventResult::Handled
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
