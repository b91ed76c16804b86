//! Coordinate conversion between a parent and a rotated, pinned child
//!
//! A child is placed in its parent by rotating it by `θ` around its pin
//! point `(pin_x, pin_y)` (child space) and then moving the pin point to
//! `(x_pos, y_pos)` (parent space). Drawing applies exactly that composition,
//! so hit-testing through these helpers always agrees with what is on screen.

use std::f64::consts::PI;

/// Converts a parent-space point into child space
pub fn child_coord_from_parent_coord(
    parent_x: f64,
    parent_y: f64,
    child_x_pos: f64,
    child_y_pos: f64,
    child_pin_x: f64,
    child_pin_y: f64,
    rotation_radians: f64,
) -> (f64, f64) {
    ChildCoordCalculator::new(
        child_x_pos,
        child_y_pos,
        child_pin_x,
        child_pin_y,
        rotation_radians,
    )
    .convert(parent_x, parent_y)
}

/// Converts a child-space point back into parent space
pub fn parent_coord_from_child_coord(
    child_x: f64,
    child_y: f64,
    child_x_pos: f64,
    child_y_pos: f64,
    child_pin_x: f64,
    child_pin_y: f64,
    rotation_radians: f64,
) -> (f64, f64) {
    ParentCoordCalculator::new(
        child_x_pos,
        child_y_pos,
        child_pin_x,
        child_pin_y,
        rotation_radians,
    )
    .convert(child_x, child_y)
}

/// Parent to child conversion with the trigonometry precomputed
///
/// Routing a single mouse event converts the same point through every
/// ancestor, and a hovered element receives many events with the same
/// placement, so the sine, cosine and translation terms are derived once.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChildCoordCalculator {
    sin_theta: f64,
    cos_theta: f64,
    a13: f64,
    a23: f64,
}

impl ChildCoordCalculator {
    pub fn new(
        child_x_pos: f64,
        child_y_pos: f64,
        child_pin_x: f64,
        child_pin_y: f64,
        rotation_radians: f64,
    ) -> Self {
        let (sin_theta, cos_theta) = rotation_radians.sin_cos();
        Self {
            sin_theta,
            cos_theta,
            a13: child_pin_x - child_y_pos * sin_theta - child_x_pos * cos_theta,
            a23: child_pin_y + child_x_pos * sin_theta - child_y_pos * cos_theta,
        }
    }

    pub fn convert(&self, parent_x: f64, parent_y: f64) -> (f64, f64) {
        (
            self.child_x(parent_x, parent_y),
            self.child_y(parent_x, parent_y),
        )
    }

    pub fn child_x(&self, parent_x: f64, parent_y: f64) -> f64 {
        parent_x * self.cos_theta + parent_y * self.sin_theta + self.a13
    }

    pub fn child_y(&self, parent_x: f64, parent_y: f64) -> f64 {
        parent_y * self.cos_theta - parent_x * self.sin_theta + self.a23
    }
}

/// Child to parent conversion: rotate by `-θ` relative to the forward
/// transform, then translate back
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParentCoordCalculator {
    sin_theta: f64,
    cos_theta: f64,
    x_pos: f64,
    y_pos: f64,
    pin_x: f64,
    pin_y: f64,
}

impl ParentCoordCalculator {
    pub fn new(
        child_x_pos: f64,
        child_y_pos: f64,
        child_pin_x: f64,
        child_pin_y: f64,
        rotation_radians: f64,
    ) -> Self {
        let (sin_theta, cos_theta) = rotation_radians.sin_cos();
        Self {
            sin_theta,
            cos_theta,
            x_pos: child_x_pos,
            y_pos: child_y_pos,
            pin_x: child_pin_x,
            pin_y: child_pin_y,
        }
    }

    pub fn convert(&self, child_x: f64, child_y: f64) -> (f64, f64) {
        let dx = child_x - self.pin_x;
        let dy = child_y - self.pin_y;
        (
            dx * self.cos_theta - dy * self.sin_theta + self.x_pos,
            dx * self.sin_theta + dy * self.cos_theta + self.y_pos,
        )
    }
}

pub fn degrees_to_radians(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

pub fn radians_to_degrees(radians: f64) -> f64 {
    radians * 180.0 / PI
}

/// Whether `(x, y)` lies in the half-open box `[0, width) x [0, height)`
pub fn is_point_in_element(x: f64, y: f64, width: f64, height: f64) -> bool {
    0.0 <= x && 0.0 <= y && x < width && y < height
}

/// Right and bottom extent of a placed child's bounding box in parent space
///
/// Used to size the scrollable content area of a container.
pub fn child_extent_in_parent(
    child_x_pos: f64,
    child_y_pos: f64,
    child_pin_x: f64,
    child_pin_y: f64,
    child_width: f64,
    child_height: f64,
    rotation_radians: f64,
) -> (f64, f64) {
    let calc = ParentCoordCalculator::new(
        child_x_pos,
        child_y_pos,
        child_pin_x,
        child_pin_y,
        rotation_radians,
    );
    [
        (0.0, 0.0),
        (child_width, 0.0),
        (0.0, child_height),
        (child_width, child_height),
    ]
    .iter()
    .map(|&(x, y)| calc.convert(x, y))
    .fold((f64::MIN, f64::MIN), |(right, bottom), (x, y)| {
        (right.max(x), bottom.max(y))
    })
}

// ============================================================================
// Rect
// ============================================================================

/// Axis-aligned rectangle
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bounding box of a set of points
    pub fn bounding(points: &[(f64, f64)]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let (mut min_x, mut min_y) = *first;
        let (mut max_x, mut max_y) = *first;
        for &(x, y) in rest {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        is_point_in_element(x - self.x, y - self.y, self.width, self.height)
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-8;

    fn assert_near(a: f64, b: f64) {
        assert!((a - b).abs() < EPSILON, "{a} != {b}");
    }

    #[test]
    fn test_calculator_rotates_about_pin() {
        for theta in [0.0, PI / 2.0, PI, 1.5 * PI, 2.0 * PI] {
            let calc = ChildCoordCalculator::new(0.0, 0.0, 50.0, 50.0, theta);
            let (x, y) = calc.convert(0.0, 0.0);
            assert_eq!(x, calc.child_x(0.0, 0.0));
            assert_eq!(y, calc.child_y(0.0, 0.0));
            assert_near(x, 50.0);
            assert_near(y, 50.0);
        }
    }

    #[test]
    fn test_full_turn_is_identity() {
        let (cx, cy, px, py) = (12.0, -7.0, 3.0, 9.0);
        for (x, y) in [(0.0, 0.0), (15.5, 40.0), (-3.0, 8.0)] {
            let plain = child_coord_from_parent_coord(x, y, cx, cy, px, py, 0.0);
            let turned = child_coord_from_parent_coord(x, y, cx, cy, px, py, 2.0 * PI);
            assert_near(plain.0, turned.0);
            assert_near(plain.1, turned.1);
        }
    }

    #[test]
    fn test_zero_rotation_is_translation() {
        for i in 0..360 {
            let v = i as f64;
            let (x, y) = child_coord_from_parent_coord(v, v * 0.5, v, 3.0, 0.0, 0.0, 0.0);
            assert_eq!(x, 0.0);
            assert_eq!(y, v * 0.5 - 3.0);
        }
    }

    #[test]
    fn test_distance_to_pin_is_invariant() {
        let (px, py) = (1.0, 1.0);
        let (x0, y0) = child_coord_from_parent_coord(0.0, 0.0, 0.0, 0.0, px, py, 0.0);
        let reference = (x0 - px).powi(2) + (y0 - py).powi(2);
        for deg in 0..360 {
            let (x, y) = child_coord_from_parent_coord(
                0.0,
                0.0,
                0.0,
                0.0,
                px,
                py,
                degrees_to_radians(deg as f64),
            );
            assert_near((x - px).powi(2) + (y - py).powi(2), reference);
        }
    }

    #[test]
    fn test_distance_from_origin_is_invariant() {
        for deg in 0..360 {
            let theta = degrees_to_radians(deg as f64);
            let (x, y) = child_coord_from_parent_coord(100.0, 100.0, 0.0, 0.0, 0.0, 0.0, theta);
            assert!((x * x + y * y - 20000.0).abs() < 1e-6);
            let (x, y) = child_coord_from_parent_coord(0.0, 0.0, 100.0, 100.0, 0.0, 0.0, theta);
            assert!((x * x + y * y - 20000.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_parent_coord_inverts_child_coord() {
        let (cx, cy, px, py) = (25.0, 48.0, 77.0, 71.0);
        let (x, y) = (123.4, 432.1);
        for deg in (0..360).step_by(7) {
            let theta = degrees_to_radians(deg as f64);
            let (u, v) = child_coord_from_parent_coord(x, y, cx, cy, px, py, theta);
            let (x1, y1) = parent_coord_from_child_coord(u, v, cx, cy, px, py, theta);
            assert!((x - x1).abs() < 1e-6 && (y - y1).abs() < 1e-6);
        }
    }

    #[test]
    fn test_pin_lands_on_position() {
        for theta in [0.0, PI / 2.0, PI] {
            let (x, y) = parent_coord_from_child_coord(40.0, 50.0, 0.0, 0.0, 40.0, 50.0, theta);
            assert_near(x, 0.0);
            assert_near(y, 0.0);
        }
    }

    #[test]
    fn test_point_in_element_boundaries() {
        assert!(is_point_in_element(0.0, 0.0, 50.0, 20.0));
        assert!(is_point_in_element(1.0, 1.0, 50.0, 20.0));
        assert!(is_point_in_element(49.9, 19.9, 50.0, 20.0));
        assert!(!is_point_in_element(50.0, 0.0, 50.0, 20.0));
        assert!(!is_point_in_element(0.0, 20.0, 50.0, 20.0));
        assert!(!is_point_in_element(-5.0, 0.0, 50.0, 20.0));
        assert!(!is_point_in_element(0.0, -5.0, 50.0, 20.0));
        assert!(!is_point_in_element(60.0, 0.0, 50.0, 20.0));
    }

    #[test]
    fn test_degrees_to_radians() {
        assert_eq!(degrees_to_radians(360.0), 2.0 * PI);
        assert_eq!(degrees_to_radians(180.0), PI);
        assert_eq!(degrees_to_radians(0.0), 0.0);
        assert_near(radians_to_degrees(PI / 2.0), 90.0);
    }

    #[test]
    fn test_child_extent() {
        assert_eq!(
            child_extent_in_parent(40.0, 50.0, 0.0, 0.0, 7.0, 8.0, 0.0),
            (47.0, 58.0)
        );
        assert_eq!(
            child_extent_in_parent(40.0, 50.0, 3.0, 4.0, 7.0, 8.0, 0.0),
            (44.0, 54.0)
        );
        // A 10x10 square turned a quarter around its top-left corner hangs to
        // the left of its position, so the right extent is the position itself.
        let (right, bottom) = child_extent_in_parent(20.0, 20.0, 0.0, 0.0, 10.0, 10.0, PI / 2.0);
        assert_near(right, 20.0);
        assert_near(bottom, 30.0);
    }

    #[test]
    fn test_rect_union_and_contains() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, -5.0, 10.0, 10.0);
        let u = a.union(&b);
        assert_eq!(u, Rect::new(0.0, -5.0, 15.0, 15.0));
        assert!(u.contains(14.0, -5.0));
        assert!(!u.contains(15.0, 0.0));
        assert_eq!(Rect::default().union(&a), a);
        let bounds = Rect::bounding(&[(3.0, 4.0), (-1.0, 8.0), (2.0, 2.0)]);
        assert_eq!(bounds, Some(Rect::new(-1.0, 2.0, 4.0, 6.0)));
    }
}
