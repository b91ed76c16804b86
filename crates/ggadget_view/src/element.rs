//! Element operations
//!
//! Everything a single element can do, expressed as [`View`] methods keyed
//! by [`ElementId`]: geometry resolution and setters, visibility and input
//! state, hit-testing, coordinate mapping between nested spaces, redraw
//! requests and drawing itself.
//!
//! Queries on an id that no longer resolves return neutral values (zero
//! size, not visible, no name) and setters on it are no-ops.

use std::rc::Rc;

use ggadget_core::{
    child_coord_from_parent_coord, degrees_to_radians, is_point_in_element,
    parent_coord_from_child_coord, Canvas, ChildCoordCalculator, CursorType, Rect,
};
use tracing::{debug, trace};

use crate::behavior::ElementBehavior;
use crate::geometry::{Dimension, FlipMode, Geometry, HitTest};
use crate::tree::{ElementId, ElementNode, Mask};
use crate::view::View;

/// Which placement value a dimension setter writes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    X,
    Y,
    Width,
    Height,
    PinX,
    PinY,
}

impl Slot {
    fn is_size(self) -> bool {
        matches!(self, Slot::Width | Slot::Height)
    }

    fn field(self, geometry: &mut Geometry) -> &mut Dimension {
        match self {
            Slot::X => &mut geometry.x,
            Slot::Y => &mut geometry.y,
            Slot::Width => &mut geometry.width,
            Slot::Height => &mut geometry.height,
            Slot::PinX => &mut geometry.pin_x,
            Slot::PinY => &mut geometry.pin_y,
        }
    }
}

impl View {
    // ─────────────────────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────────────────────

    pub fn tag_name(&self, id: ElementId) -> Option<&str> {
        self.tree.get(id).map(|n| n.tag.as_str())
    }

    pub fn element_name(&self, id: ElementId) -> Option<&str> {
        self.tree.get(id).map(|n| n.name.as_str())
    }

    pub fn parent_element(&self, id: ElementId) -> Option<ElementId> {
        self.tree.parent(id)
    }

    /// Position of the element in its parent's child order
    pub fn index(&self, id: ElementId) -> Option<usize> {
        self.tree.get(id).map(|n| n.index)
    }

    pub fn behavior(&self, id: ElementId) -> Option<Rc<dyn ElementBehavior>> {
        self.tree.get(id).map(|n| Rc::clone(&n.behavior))
    }

    pub fn geometry(&self, id: ElementId) -> Option<Geometry> {
        self.tree.get(id).map(|n| n.geometry)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Pixel geometry
    // ─────────────────────────────────────────────────────────────────────────

    fn parent_width(&self, id: ElementId) -> f64 {
        match self.tree.parent(id) {
            Some(parent) => self.pixel_width(parent),
            None => f64::from(self.width()),
        }
    }

    fn parent_height(&self, id: ElementId) -> f64 {
        match self.tree.parent(id) {
            Some(parent) => self.pixel_height(parent),
            None => f64::from(self.height()),
        }
    }

    /// Effective width; relative widths follow the parent live
    pub fn pixel_width(&self, id: ElementId) -> f64 {
        let Some(node) = self.tree.get(id) else {
            return 0.0;
        };
        let width = match node.geometry.width {
            Dimension::Unspecified => node.behavior.default_size(self, id).0,
            Dimension::Pixel(value) => value,
            Dimension::Relative(fraction) => fraction * self.parent_width(id),
        };
        width.max(0.0)
    }

    pub fn pixel_height(&self, id: ElementId) -> f64 {
        let Some(node) = self.tree.get(id) else {
            return 0.0;
        };
        let height = match node.geometry.height {
            Dimension::Unspecified => node.behavior.default_size(self, id).1,
            Dimension::Pixel(value) => value,
            Dimension::Relative(fraction) => fraction * self.parent_height(id),
        };
        height.max(0.0)
    }

    pub fn pixel_x(&self, id: ElementId) -> f64 {
        let Some(node) = self.tree.get(id) else {
            return 0.0;
        };
        match node.geometry.x {
            Dimension::Unspecified => node.behavior.default_position(self, id).0,
            Dimension::Pixel(value) => value,
            Dimension::Relative(fraction) => fraction * self.parent_width(id),
        }
    }

    pub fn pixel_y(&self, id: ElementId) -> f64 {
        let Some(node) = self.tree.get(id) else {
            return 0.0;
        };
        match node.geometry.y {
            Dimension::Unspecified => node.behavior.default_position(self, id).1,
            Dimension::Pixel(value) => value,
            Dimension::Relative(fraction) => fraction * self.parent_height(id),
        }
    }

    /// Pin x in the element's own space; relative to its own width
    pub fn pixel_pin_x(&self, id: ElementId) -> f64 {
        self.tree
            .get(id)
            .map_or(0.0, |n| n.geometry.pin_x.resolve(self.pixel_width(id), 0.0))
    }

    pub fn pixel_pin_y(&self, id: ElementId) -> f64 {
        self.tree
            .get(id)
            .map_or(0.0, |n| n.geometry.pin_y.resolve(self.pixel_height(id), 0.0))
    }

    /// Rotation in degrees, clockwise
    pub fn rotation(&self, id: ElementId) -> f64 {
        self.tree.get(id).map_or(0.0, |n| n.geometry.rotation)
    }

    pub fn flip(&self, id: ElementId) -> FlipMode {
        self.tree.get(id).map_or(FlipMode::NONE, |n| n.geometry.flip)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Geometry setters
    // ─────────────────────────────────────────────────────────────────────────

    pub fn set_x(&mut self, id: ElementId, x: impl Into<Dimension>) {
        self.set_dimension(id, Slot::X, x.into());
    }

    pub fn set_y(&mut self, id: ElementId, y: impl Into<Dimension>) {
        self.set_dimension(id, Slot::Y, y.into());
    }

    /// Negative widths are ignored
    pub fn set_width(&mut self, id: ElementId, width: impl Into<Dimension>) {
        self.set_dimension(id, Slot::Width, width.into());
    }

    pub fn set_height(&mut self, id: ElementId, height: impl Into<Dimension>) {
        self.set_dimension(id, Slot::Height, height.into());
    }

    pub fn set_pin_x(&mut self, id: ElementId, pin_x: impl Into<Dimension>) {
        self.set_dimension(id, Slot::PinX, pin_x.into());
    }

    pub fn set_pin_y(&mut self, id: ElementId, pin_y: impl Into<Dimension>) {
        self.set_dimension(id, Slot::PinY, pin_y.into());
    }

    fn set_dimension(&mut self, id: ElementId, slot: Slot, value: Dimension) {
        if !value.is_finite() || (slot.is_size() && value.is_negative()) {
            debug!("Ignoring invalid {:?} value {:?}", slot, value);
            return;
        }
        let Some(node) = self.tree.get(id) else {
            return;
        };
        let mut geometry = node.geometry;
        if *slot.field(&mut geometry) == value {
            return;
        }
        // Invalidate the old area before moving
        self.queue_draw_element(id);
        *slot.field(&mut geometry) = value;
        let Some(node) = self.tree.get_mut(id) else {
            return;
        };
        node.geometry = geometry;
        if slot.is_size() {
            node.flags.size_changed = true;
            self.notify_parent_size_changed(Some(id));
        } else {
            node.flags.position_changed = true;
        }
        self.queue_draw_element(id);
    }

    /// Set the rotation in degrees; non-finite values are ignored
    pub fn set_rotation(&mut self, id: ElementId, degrees: f64) {
        if !degrees.is_finite() || self.rotation(id) == degrees {
            return;
        }
        self.queue_draw_element(id);
        if let Some(node) = self.tree.get_mut(id) {
            node.geometry.rotation = degrees;
            node.flags.position_changed = true;
        }
        self.queue_draw_element(id);
    }

    pub fn set_flip(&mut self, id: ElementId, flip: FlipMode) {
        let Some(node) = self.tree.get_mut(id) else {
            return;
        };
        if node.geometry.flip != flip {
            node.geometry.flip = flip;
            self.queue_draw_element(id);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Visual and input state
    // ─────────────────────────────────────────────────────────────────────────

    pub fn opacity(&self, id: ElementId) -> f64 {
        self.tree.get(id).map_or(0.0, |n| n.opacity)
    }

    /// Values outside `0..=1` are ignored
    pub fn set_opacity(&mut self, id: ElementId, opacity: f64) {
        if !(0.0..=1.0).contains(&opacity) {
            debug!("Ignoring opacity {}", opacity);
            return;
        }
        let Some(node) = self.tree.get_mut(id) else {
            return;
        };
        if node.opacity != opacity {
            node.opacity = opacity;
            self.queue_draw_area(id, None, true);
        }
    }

    pub fn is_visible(&self, id: ElementId) -> bool {
        self.tree.get(id).is_some_and(|n| n.visible)
    }

    pub fn set_visible(&mut self, id: ElementId, visible: bool) {
        let Some(node) = self.tree.get_mut(id) else {
            return;
        };
        if node.visible != visible {
            node.visible = visible;
            // Hiding must still repaint the area the element covered
            self.queue_draw_area(id, None, true);
        }
    }

    /// Visible with non-zero opacity, and so are all ancestors
    pub fn really_visible(&self, id: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            match self.tree.get(node_id) {
                Some(node) if node.visible && node.opacity > 0.0 => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    pub fn is_enabled(&self, id: ElementId) -> bool {
        self.tree.get(id).is_some_and(|n| n.enabled)
    }

    pub fn set_enabled(&mut self, id: ElementId, enabled: bool) {
        let Some(node) = self.tree.get_mut(id) else {
            return;
        };
        if node.enabled != enabled {
            node.enabled = enabled;
            self.queue_draw_element(id);
        }
    }

    pub fn hit_test_area(&self, id: ElementId) -> HitTest {
        self.tree.get(id).map_or(HitTest::default(), |n| n.hit_test)
    }

    pub fn set_hit_test_area(&mut self, id: ElementId, hit_test: HitTest) {
        if let Some(node) = self.tree.get_mut(id) {
            node.hit_test = hit_test;
        }
    }

    pub fn cursor(&self, id: ElementId) -> CursorType {
        self.tree.get(id).map_or(CursorType::default(), |n| n.cursor)
    }

    pub fn set_cursor(&mut self, id: ElementId, cursor: CursorType) {
        if let Some(node) = self.tree.get_mut(id) {
            node.cursor = cursor;
        }
    }

    pub fn tooltip(&self, id: ElementId) -> Option<&str> {
        self.tree.get(id).map(|n| n.tooltip.as_str())
    }

    pub fn set_tooltip(&mut self, id: ElementId, tooltip: impl Into<String>) {
        if let Some(node) = self.tree.get_mut(id) {
            node.tooltip = tooltip.into();
        }
    }

    pub fn is_drop_target(&self, id: ElementId) -> bool {
        self.tree.get(id).is_some_and(|n| n.drop_target)
    }

    pub fn set_drop_target(&mut self, id: ElementId, drop_target: bool) {
        if let Some(node) = self.tree.get_mut(id) {
            node.drop_target = drop_target;
        }
    }

    /// Whether the element or an ancestor is in designer mode
    pub fn is_designer_mode(&self, id: ElementId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.tree.get(node_id) else {
                return false;
            };
            if node.designer_mode {
                return true;
            }
            current = node.parent;
        }
        false
    }

    /// In designer mode an element and its descendants still hit-test but
    /// no longer react to input
    pub fn set_designer_mode(&mut self, id: ElementId, designer_mode: bool) {
        if let Some(node) = self.tree.get_mut(id) {
            node.designer_mode = designer_mode;
        }
    }

    pub fn mask_name(&self, id: ElementId) -> Option<&str> {
        self.tree.get(id).map(|n| n.mask.name.as_str())
    }

    /// Set the clipping mask by image name; an empty name removes it
    pub fn set_mask(&mut self, id: ElementId, name: &str) {
        if self.tree.get(id).map_or(true, |n| n.mask.name == name) {
            return;
        }
        let image = self.load_image(name, true);
        if let Some(node) = self.tree.get_mut(id) {
            node.mask = Mask {
                name: name.to_string(),
                image,
            };
            node.cached_canvas = None;
        }
        self.queue_draw_element(id);
    }

    pub fn is_canvas_cache_enabled(&self, id: ElementId) -> bool {
        self.tree.get(id).is_some_and(|n| n.cache_enabled)
    }

    /// Keep an offscreen copy of the element and reuse it while unchanged
    pub fn enable_canvas_cache(&mut self, id: ElementId, enable: bool) {
        if let Some(node) = self.tree.get_mut(id) {
            node.cache_enabled = enable;
            if !enable {
                node.cached_canvas = None;
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Change flags
    // ─────────────────────────────────────────────────────────────────────────

    pub fn is_position_changed(&self, id: ElementId) -> bool {
        self.tree.get(id).is_some_and(|n| n.flags.position_changed)
    }

    /// Position changes are acknowledged explicitly, not by drawing
    pub fn clear_position_changed(&mut self, id: ElementId) {
        if let Some(node) = self.tree.get_mut(id) {
            node.flags.position_changed = false;
        }
    }

    pub fn is_size_changed(&self, id: ElementId) -> bool {
        self.tree.get(id).is_some_and(|n| n.flags.size_changed)
    }

    pub fn is_visual_changed(&self, id: ElementId) -> bool {
        self.tree.get(id).is_some_and(|n| n.flags.visual_changed)
    }

    /// The behavior's default size changed; behaviors call this after
    /// swapping whatever their default size derives from
    pub fn default_size_changed(&mut self, id: ElementId) {
        let Some(node) = self.tree.get_mut(id) else {
            return;
        };
        let geometry = node.geometry;
        if geometry.width.is_specified() && geometry.height.is_specified() {
            return;
        }
        node.flags.size_changed = true;
        self.notify_parent_size_changed(Some(id));
        self.queue_draw_area(id, None, false);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Hit-testing and coordinates
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether a point in the element's own space hits it
    ///
    /// The rectangle test comes first, then the mask (a black mask pixel
    /// is a miss, an unreadable one is a hit), then the behavior, which can
    /// only narrow the result.
    pub fn is_point_in(&self, id: ElementId, x: f64, y: f64) -> bool {
        let Some(node) = self.tree.get(id) else {
            return false;
        };
        if !is_point_in_element(x, y, self.pixel_width(id), self.pixel_height(id)) {
            return false;
        }
        if let Some(mask) = &node.mask.image {
            if let Some((color, _)) = mask.point_value(x, y) {
                if color.is_black() {
                    return false;
                }
            }
        }
        node.behavior.is_point_in(self, id, x, y)
    }

    /// Parent-to-child transform of `child`'s placement
    pub fn child_coord_calculator(&self, child: ElementId) -> ChildCoordCalculator {
        ChildCoordCalculator::new(
            self.pixel_x(child),
            self.pixel_y(child),
            self.pixel_pin_x(child),
            self.pixel_pin_y(child),
            degrees_to_radians(self.rotation(child)),
        )
    }

    /// Map a point from the parent's space into `child` using only the
    /// child's placement
    pub fn placement_to_child(&self, child: ElementId, x: f64, y: f64) -> (f64, f64) {
        child_coord_from_parent_coord(
            x,
            y,
            self.pixel_x(child),
            self.pixel_y(child),
            self.pixel_pin_x(child),
            self.pixel_pin_y(child),
            degrees_to_radians(self.rotation(child)),
        )
    }

    pub fn placement_to_parent(&self, child: ElementId, x: f64, y: f64) -> (f64, f64) {
        parent_coord_from_child_coord(
            x,
            y,
            self.pixel_x(child),
            self.pixel_y(child),
            self.pixel_pin_x(child),
            self.pixel_pin_y(child),
            degrees_to_radians(self.rotation(child)),
        )
    }

    /// Map a point in `id`'s space into its child's space
    pub fn self_coord_to_child_coord(
        &self,
        id: ElementId,
        child: ElementId,
        x: f64,
        y: f64,
    ) -> (f64, f64) {
        match self.tree.get(id) {
            Some(node) => node
                .behavior
                .self_coord_to_child_coord(self, id, child, x, y),
            None => (x, y),
        }
    }

    pub fn child_coord_to_self_coord(
        &self,
        id: ElementId,
        child: ElementId,
        x: f64,
        y: f64,
    ) -> (f64, f64) {
        match self.tree.get(id) {
            Some(node) => node
                .behavior
                .child_coord_to_self_coord(self, id, child, x, y),
            None => (x, y),
        }
    }

    /// From the space of `parent` (the view when `None`) into `child`
    pub(crate) fn into_child_space(
        &self,
        parent: Option<ElementId>,
        child: ElementId,
        x: f64,
        y: f64,
    ) -> (f64, f64) {
        match parent {
            Some(parent) => self.self_coord_to_child_coord(parent, child, x, y),
            None => self.placement_to_child(child, x, y),
        }
    }

    /// From `child` into its parent's space (the view for top-level)
    pub(crate) fn into_parent_space(&self, child: ElementId, x: f64, y: f64) -> (f64, f64) {
        match self.tree.parent(child) {
            Some(parent) => self.child_coord_to_self_coord(parent, child, x, y),
            None => self.placement_to_parent(child, x, y),
        }
    }

    /// Map a view-space point into `id`'s space through every ancestor
    pub fn view_coord_to_element_coord(&self, id: ElementId, x: f64, y: f64) -> (f64, f64) {
        let (mut x, mut y) = (x, y);
        let mut parent = None;
        for node in self.tree.path_from_root(id) {
            (x, y) = self.into_child_space(parent, node, x, y);
            parent = Some(node);
        }
        (x, y)
    }

    pub fn element_coord_to_view_coord(&self, id: ElementId, x: f64, y: f64) -> (f64, f64) {
        let (mut x, mut y) = (x, y);
        let mut current = self.tree.contains(id).then_some(id);
        while let Some(node) = current {
            (x, y) = self.into_parent_space(node, x, y);
            current = self.tree.parent(node);
        }
        (x, y)
    }

    /// View-space bounding box of a rectangle in `id`'s space
    pub fn element_rect_to_view_rect(&self, id: ElementId, rect: Rect) -> Option<Rect> {
        let corners = [
            (rect.x, rect.y),
            (rect.right(), rect.y),
            (rect.x, rect.bottom()),
            (rect.right(), rect.bottom()),
        ]
        .map(|(x, y)| self.element_coord_to_view_coord(id, x, y));
        Rect::bounding(&corners)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Focus
    // ─────────────────────────────────────────────────────────────────────────

    pub fn focus(&mut self, id: ElementId) {
        self.set_focus(Some(id));
    }

    /// Drop keyboard focus if `id` holds it
    pub fn kill_focus(&mut self, id: ElementId) {
        if self.focused_element() == Some(id) {
            self.set_focus(None);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Redraw requests
    // ─────────────────────────────────────────────────────────────────────────

    /// Mark the element changed and request a redraw of its area
    pub fn queue_draw_element(&mut self, id: ElementId) {
        self.queue_draw_area(id, None, false);
    }

    /// Request a redraw of part of the element, in its own space
    pub fn queue_draw_rect(&mut self, id: ElementId, rect: Rect) {
        self.queue_draw_area(id, Some(rect), false);
    }

    /// `force` requests a redraw even when the element is not visible now
    pub(crate) fn queue_draw_area(&mut self, id: ElementId, rect: Option<Rect>, force: bool) {
        if !self.tree.contains(id) {
            return;
        }
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.tree.get_mut(node_id) else {
                break;
            };
            node.flags.visual_changed = true;
            current = node.parent;
        }
        let ancestors_visible = self
            .tree
            .parent(id)
            .map_or(true, |p| self.really_visible(p));
        if !ancestors_visible || (!force && !self.really_visible(id)) {
            return;
        }
        let local = rect.unwrap_or_else(|| {
            Rect::new(0.0, 0.0, self.pixel_width(id), self.pixel_height(id))
        });
        if let Some(area) = self.element_rect_to_view_rect(id, local) {
            self.add_dirty_rect(area);
        }
        self.queue_draw();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Drawing
    // ─────────────────────────────────────────────────────────────────────────

    /// Draw one element in its own coordinate space
    ///
    /// The caller has already applied the element's placement. Returns
    /// whether the element changed since it was last drawn.
    pub fn draw_element(&mut self, id: ElementId, canvas: &mut dyn Canvas) -> bool {
        let Some(node) = self.tree.get(id) else {
            return false;
        };
        let (width, height) = (self.pixel_width(id), self.pixel_height(id));
        let changed = node.flags.visual_changed || node.flags.size_changed;
        if !node.visible || node.opacity <= 0.0 || width <= 0.0 || height <= 0.0 {
            self.clear_draw_flags(id);
            return changed;
        }

        let opacity = node.opacity;
        let flip = node.geometry.flip;
        let behavior = Rc::clone(&node.behavior);
        let mask = node.mask.image.clone();
        let cache_enabled = node.cache_enabled;

        canvas.push_state();
        if opacity < 1.0 {
            canvas.multiply_opacity(opacity);
        }
        if flip.contains(FlipMode::HORIZONTAL) {
            canvas.translate(width, 0.0);
            canvas.scale(-1.0, 1.0);
        }
        if flip.contains(FlipMode::VERTICAL) {
            canvas.translate(0.0, height);
            canvas.scale(1.0, -1.0);
        }

        let offscreen = if cache_enabled || mask.is_some() {
            self.offscreen_canvas(id, width, height, changed)
        } else {
            None
        };
        match offscreen {
            Some((mut offscreen, reused)) => {
                if reused {
                    trace!("Reusing cached canvas of {:?}", id);
                } else {
                    offscreen.clear();
                    behavior.do_draw(self, id, offscreen.as_mut());
                }
                match &mask {
                    Some(mask) => {
                        canvas.draw_canvas_with_mask(0.0, 0.0, offscreen.as_ref(), 0.0, 0.0, &**mask)
                    }
                    None => canvas.draw_canvas(0.0, 0.0, offscreen.as_ref()),
                }
                if cache_enabled {
                    if let Some(node) = self.tree.get_mut(id) {
                        node.cached_canvas = Some(offscreen);
                    }
                }
            }
            None => {
                canvas.intersect_rect_clip(0.0, 0.0, width, height);
                behavior.do_draw(self, id, canvas);
            }
        }
        canvas.pop_state();

        self.clear_draw_flags(id);
        changed
    }

    /// Cached canvas when still valid, otherwise a fresh one
    fn offscreen_canvas(
        &mut self,
        id: ElementId,
        width: f64,
        height: f64,
        changed: bool,
    ) -> Option<(Box<dyn Canvas>, bool)> {
        let cached = self
            .tree
            .get_mut(id)
            .and_then(|n| n.cached_canvas.take())
            .filter(|c| c.width() == width && c.height() == height);
        match cached {
            Some(canvas) => Some((canvas, !changed)),
            None => {
                let canvas = self.host()?.graphics().new_canvas(width, height);
                if canvas.is_none() {
                    debug!("No offscreen canvas for {:?}; drawing directly", id);
                }
                canvas.map(|c| (c, false))
            }
        }
    }

    fn clear_draw_flags(&mut self, id: ElementId) {
        if let Some(node) = self.tree.get_mut(id) {
            node.flags.size_changed = false;
            node.flags.visual_changed = false;
        }
    }

    pub(crate) fn node(&self, id: ElementId) -> Option<&ElementNode> {
        self.tree.get(id)
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use ggadget_core::{
        BitmapImage, Color, DrawCommand, EventType, MemoryImageLoader, MouseEvent,
    };

    use super::*;
    use crate::factory::ElementFactory;
    use crate::testing::{last_frame, test_view, test_view_with_factory};

    /// Leaf with a fixed default size and position
    struct Sized;

    impl ElementBehavior for Sized {
        fn tag_name(&self) -> &'static str {
            "sized"
        }

        fn default_size(&self, _view: &View, _id: ElementId) -> (f64, f64) {
            (30.0, -5.0)
        }

        fn default_position(&self, _view: &View, _id: ElementId) -> (f64, f64) {
            (4.0, 6.0)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn sized_factory() -> ElementFactory {
        let mut factory = ElementFactory::with_builtins();
        factory.register("sized", || Rc::new(Sized));
        factory
    }

    #[test]
    fn test_relative_size_follows_parent() {
        let (mut view, _, _) = test_view();
        let outer = view.append_element(None, "div", "outer").unwrap();
        view.set_width(outer, 200.0);
        view.set_height(outer, "50%");
        let inner = view.append_element(Some(outer), "div", "inner").unwrap();
        view.set_width(inner, "25%");
        view.set_height(inner, Dimension::Relative(1.0));

        assert_eq!(view.pixel_width(inner), 50.0);
        assert_eq!(view.pixel_height(inner), 50.0);

        view.set_width(outer, 400.0);
        view.set_size(100, 300);
        assert_eq!(view.pixel_width(inner), 100.0);
        assert_eq!(view.pixel_height(inner), 150.0);
    }

    #[test]
    fn test_unspecified_uses_defaults() {
        let (mut view, _, _) = test_view_with_factory(sized_factory());
        let id = view.append_element(None, "sized", "").unwrap();
        assert_eq!(view.pixel_width(id), 30.0);
        // Negative defaults clamp to zero
        assert_eq!(view.pixel_height(id), 0.0);
        assert_eq!((view.pixel_x(id), view.pixel_y(id)), (4.0, 6.0));

        view.set_x(id, 10.0);
        assert_eq!(view.pixel_x(id), 10.0);
        view.set_x(id, Dimension::Unspecified);
        assert_eq!(view.pixel_x(id), 4.0);
    }

    #[test]
    fn test_invalid_values_are_ignored_or_unspecified() {
        let (mut view, _, _) = test_view();
        let id = view.append_element(None, "div", "").unwrap();
        view.set_width(id, 40.0);

        view.set_width(id, -3.0);
        view.set_width(id, f64::NAN);
        view.set_width(id, Dimension::Relative(f64::INFINITY));
        assert_eq!(view.pixel_width(id), 40.0);

        view.set_width(id, "forty");
        assert_eq!(view.geometry(id).unwrap().width, Dimension::Unspecified);
        assert_eq!(view.pixel_width(id), 0.0);

        view.set_opacity(id, 1.5);
        view.set_opacity(id, f64::NAN);
        assert_eq!(view.opacity(id), 1.0);
        view.set_rotation(id, f64::INFINITY);
        assert_eq!(view.rotation(id), 0.0);
    }

    #[test]
    fn test_pin_relative_to_own_size() {
        let (mut view, _, _) = test_view();
        let id = view.append_element(None, "div", "").unwrap();
        view.set_width(id, 40.0);
        view.set_height(id, 20.0);
        view.set_pin_x(id, "50%");
        view.set_pin_y(id, "50%");
        assert_eq!((view.pixel_pin_x(id), view.pixel_pin_y(id)), (20.0, 10.0));
    }

    #[test]
    fn test_position_changed_cleared_explicitly() {
        let (mut view, _, _) = test_view();
        let id = view.append_element(None, "div", "").unwrap();
        view.clear_position_changed(id);
        view.set_x(id, 5.0);
        assert!(view.is_position_changed(id));

        view.draw().unwrap();
        assert!(view.is_position_changed(id));
        assert!(!view.is_size_changed(id));
        view.clear_position_changed(id);
        assert!(!view.is_position_changed(id));
    }

    #[test]
    fn test_rotated_coordinates_round_trip() {
        let (mut view, _, _) = test_view();
        let outer = view.append_element(None, "div", "").unwrap();
        view.set_x(outer, 50.0);
        view.set_y(outer, 50.0);
        view.set_width(outer, 40.0);
        view.set_height(outer, 40.0);
        view.set_rotation(outer, 90.0);
        let inner = view.append_element(Some(outer), "div", "").unwrap();
        view.set_x(inner, 10.0);
        view.set_width(inner, 10.0);
        view.set_height(inner, 10.0);

        // Rotating 90° clockwise maps the outer x axis onto the view's y axis
        let (vx, vy) = view.element_coord_to_view_coord(inner, 0.0, 0.0);
        assert!((vx - 50.0).abs() < 1e-9 && (vy - 60.0).abs() < 1e-9);

        let (x, y) = view.view_coord_to_element_coord(inner, vx + 0.5, vy + 0.5);
        let (bx, by) = view.element_coord_to_view_coord(inner, x, y);
        assert!((bx - vx - 0.5).abs() < 1e-9 && (by - vy - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_mask_hit_testing() {
        let mut loader = MemoryImageLoader::new();
        let mut mask = BitmapImage::filled(20, 20, Color::WHITE, 1.0);
        for x in 0..10 {
            for y in 0..20 {
                mask.pixels_mut()
                    .put_pixel(x, y, image::Rgba([0, 0, 0, 255]));
            }
        }
        loader.insert("mask.png", Rc::new(mask));

        let (mut view, _, _) = test_view();
        view.set_image_loader(Rc::new(loader));
        let id = view.append_element(None, "div", "").unwrap();
        view.set_width(id, 30.0);
        view.set_height(id, 20.0);
        view.set_mask(id, "mask.png");
        assert_eq!(view.mask_name(id), Some("mask.png"));

        assert!(!view.is_point_in(id, 5.0, 5.0));
        assert!(view.is_point_in(id, 15.0, 5.0));
        // Outside the mask bitmap but inside the element
        assert!(view.is_point_in(id, 25.0, 5.0));
        assert!(!view.is_point_in(id, 35.0, 5.0));

        view.set_mask(id, "");
        assert!(view.is_point_in(id, 5.0, 5.0));
    }

    #[test]
    fn test_queue_draw_accumulates_dirty_region() {
        let (mut view, host, _) = test_view();
        let a = view.append_element(None, "div", "").unwrap();
        let b = view.append_element(None, "div", "").unwrap();
        view.draw().unwrap();
        let requests = host.draw_requests();

        view.set_width(a, 10.0);
        view.set_height(a, 10.0);
        view.set_x(b, 50.0);
        view.set_width(b, 20.0);
        view.set_height(b, 5.0);
        assert_eq!(view.dirty_region(), Some(Rect::new(0.0, 0.0, 70.0, 10.0)));
        assert_eq!(host.draw_requests(), requests + 1);
        assert!(view.is_visual_changed(a));

        view.draw().unwrap();
        assert_eq!(view.dirty_region(), None);
        assert!(!view.is_visual_changed(a));
    }

    #[test]
    fn test_hidden_parent_suppresses_redraw() {
        let (mut view, host, _) = test_view();
        let parent = view.append_element(None, "div", "").unwrap();
        let child = view.append_element(Some(parent), "div", "").unwrap();
        view.set_visible(parent, false);
        view.draw().unwrap();
        let requests = host.draw_requests();

        view.set_width(child, 10.0);
        assert_eq!(host.draw_requests(), requests);
        assert!(!view.really_visible(child));
    }

    #[test]
    fn test_draw_applies_opacity_and_flip() {
        let (mut view, _, _) = test_view();
        let id = view.append_element(None, "div", "").unwrap();
        view.set_width(id, 20.0);
        view.set_height(id, 10.0);
        view.set_opacity(id, 0.5);
        view.set_flip(id, FlipMode::HORIZONTAL);

        let commands = last_frame(&mut view);
        let expected = [
            DrawCommand::PushState,
            DrawCommand::MultiplyOpacity(0.5),
            DrawCommand::Translate(20.0, 0.0),
            DrawCommand::Scale(-1.0, 1.0),
        ];
        assert!(commands.windows(4).any(|w| w == expected));
    }

    #[test]
    fn test_invisible_or_empty_elements_are_skipped() {
        let (mut view, _, _) = test_view();
        let empty = view.append_element(None, "div", "").unwrap();
        let hidden = view.append_element(None, "div", "").unwrap();
        view.set_width(hidden, 10.0);
        view.set_height(hidden, 10.0);
        view.set_visible(hidden, false);
        let _ = empty;

        let commands = last_frame(&mut view);
        assert!(!commands.contains(&DrawCommand::PushState));
    }

    #[test]
    fn test_canvas_cache_reused_while_unchanged() {
        let (mut view, _, _) = test_view();
        let id = view.append_element(None, "div", "").unwrap();
        view.set_width(id, 20.0);
        view.set_height(id, 20.0);
        view.enable_canvas_cache(id, true);

        let (_, changed) = view.draw().unwrap();
        assert!(changed);
        assert!(view.node(id).is_some_and(|n| n.cached_canvas.is_some()));

        let (_, changed) = view.draw().unwrap();
        assert!(!changed);

        view.queue_draw_element(id);
        let (_, changed) = view.draw().unwrap();
        assert!(changed);

        view.enable_canvas_cache(id, false);
        assert!(view.node(id).is_some_and(|n| n.cached_canvas.is_none()));
    }

    #[test]
    fn test_focus_and_kill_focus() {
        let (mut view, _, _) = test_view();
        let id = view.append_element(None, "div", "").unwrap();
        view.focus(id);
        assert_eq!(view.focused_element(), Some(id));
        view.kill_focus(id);
        assert_eq!(view.focused_element(), None);
    }

    #[test]
    fn test_designer_mode_is_inherited() {
        let (mut view, _, _) = test_view();
        let parent = view.append_element(None, "div", "").unwrap();
        let child = view.append_element(Some(parent), "div", "").unwrap();
        view.set_designer_mode(parent, true);
        assert!(view.is_designer_mode(child));

        view.set_width(child, 10.0);
        view.set_height(child, 10.0);
        view.set_width(parent, 10.0);
        view.set_height(parent, 10.0);
        let log = crate::testing::EventLog::new();
        log.watch(&mut view, child, &[EventType::MouseDown]);
        view.on_mouse_event(&MouseEvent::new(EventType::MouseDown, 5.0, 5.0));
        assert!(log.is_empty());
    }
}
