//! Canvas boundary
//!
//! The core never rasterizes anything itself. Elements draw through the
//! [`Canvas`] trait, and the host's [`Graphics`] backend hands out canvases.
//! [`RecordingCanvas`] records every call as a [`DrawCommand`] so drawing can
//! be inspected without a backend.

use std::any::Any;

use crate::image::Image;

// ─────────────────────────────────────────────────────────────────────────────
// Color
// ─────────────────────────────────────────────────────────────────────────────

/// RGB color with channels in `0.0..=1.0`
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue }
    }

    /// Build from 8-bit channels
    pub fn from_rgb8(red: u8, green: u8, blue: u8) -> Self {
        Self::rgb(
            f64::from(red) / 255.0,
            f64::from(green) / 255.0,
            f64::from(blue) / 255.0,
        )
    }

    pub fn is_black(&self) -> bool {
        *self == Color::BLACK
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Canvas
// ─────────────────────────────────────────────────────────────────────────────

/// An opaque compositing surface
///
/// State (transform, clip, opacity) is saved and restored with
/// `push_state`/`pop_state`, matching how elements nest their drawing.
pub trait Canvas: Any {
    fn width(&self) -> f64;
    fn height(&self) -> f64;

    fn push_state(&mut self);
    fn pop_state(&mut self);

    /// Multiply the current opacity by `opacity`
    fn multiply_opacity(&mut self, opacity: f64);
    fn translate(&mut self, dx: f64, dy: f64);
    /// Rotate the coordinate space clockwise by `radians`
    fn rotate(&mut self, radians: f64);
    fn scale(&mut self, sx: f64, sy: f64);
    fn intersect_rect_clip(&mut self, x: f64, y: f64, width: f64, height: f64);

    /// Clear the whole surface to transparent
    fn clear(&mut self);
    fn draw_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, width: f64, color: Color);
    fn draw_filled_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color);

    /// Composite another canvas with its top-left corner at `(x, y)`
    fn draw_canvas(&mut self, x: f64, y: f64, source: &dyn Canvas);

    /// Composite `source`, using `mask`'s alpha positioned at `(mx, my)`
    fn draw_canvas_with_mask(
        &mut self,
        x: f64,
        y: f64,
        source: &dyn Canvas,
        mx: f64,
        my: f64,
        mask: &dyn Image,
    );

    /// Draw an image stretched to the given rectangle
    fn draw_image(&mut self, x: f64, y: f64, width: f64, height: f64, image: &dyn Image);

    fn as_any(&self) -> &dyn Any;
}

/// Graphics backend that produces canvases
pub trait Graphics {
    /// Create a new transparent canvas, `None` if the size is unsupported
    fn new_canvas(&self, width: f64, height: f64) -> Option<Box<dyn Canvas>>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Recording canvas
// ─────────────────────────────────────────────────────────────────────────────

/// Recorded canvas operation
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    PushState,
    PopState,
    MultiplyOpacity(f64),
    Translate(f64, f64),
    Rotate(f64),
    Scale(f64, f64),
    ClipRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Clear,
    Line {
        from: (f64, f64),
        to: (f64, f64),
        width: f64,
        color: Color,
    },
    FillRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: Color,
    },
    /// A composited canvas; nested recordings are captured by value
    Canvas {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        commands: Vec<DrawCommand>,
    },
    MaskedCanvas {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        mask_origin: (f64, f64),
        commands: Vec<DrawCommand>,
    },
    Image {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        source_size: (f64, f64),
    },
}

/// Canvas that records commands instead of drawing
#[derive(Clone, Debug, Default)]
pub struct RecordingCanvas {
    width: f64,
    height: f64,
    commands: Vec<DrawCommand>,
    depth: usize,
}

impl RecordingCanvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
            depth: 0,
        }
    }

    /// Get the recorded commands
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take the recorded commands
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Current `push_state` nesting depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// All filled rectangles, including those in nested canvases
    pub fn filled_rects(&self) -> Vec<DrawCommand> {
        fn collect(commands: &[DrawCommand], out: &mut Vec<DrawCommand>) {
            for command in commands {
                match command {
                    DrawCommand::FillRect { .. } => out.push(command.clone()),
                    DrawCommand::Canvas { commands, .. }
                    | DrawCommand::MaskedCanvas { commands, .. } => collect(commands, out),
                    _ => {}
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.commands, &mut out);
        out
    }

    fn nested_commands(source: &dyn Canvas) -> Vec<DrawCommand> {
        source
            .as_any()
            .downcast_ref::<RecordingCanvas>()
            .map(|c| c.commands.clone())
            .unwrap_or_default()
    }
}

impl Canvas for RecordingCanvas {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn push_state(&mut self) {
        self.depth += 1;
        self.commands.push(DrawCommand::PushState);
    }

    fn pop_state(&mut self) {
        if self.depth == 0 {
            tracing::warn!("pop_state without matching push_state");
            return;
        }
        self.depth -= 1;
        self.commands.push(DrawCommand::PopState);
    }

    fn multiply_opacity(&mut self, opacity: f64) {
        self.commands.push(DrawCommand::MultiplyOpacity(opacity));
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.commands.push(DrawCommand::Translate(dx, dy));
    }

    fn rotate(&mut self, radians: f64) {
        self.commands.push(DrawCommand::Rotate(radians));
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.commands.push(DrawCommand::Scale(sx, sy));
    }

    fn intersect_rect_clip(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.commands.push(DrawCommand::ClipRect {
            x,
            y,
            width,
            height,
        });
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.depth = 0;
        self.commands.push(DrawCommand::Clear);
    }

    fn draw_line(&mut self, x0: f64, y0: f64, x1: f64, y1: f64, width: f64, color: Color) {
        self.commands.push(DrawCommand::Line {
            from: (x0, y0),
            to: (x1, y1),
            width,
            color,
        });
    }

    fn draw_filled_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Color) {
        self.commands.push(DrawCommand::FillRect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn draw_canvas(&mut self, x: f64, y: f64, source: &dyn Canvas) {
        self.commands.push(DrawCommand::Canvas {
            x,
            y,
            width: source.width(),
            height: source.height(),
            commands: Self::nested_commands(source),
        });
    }

    fn draw_canvas_with_mask(
        &mut self,
        x: f64,
        y: f64,
        source: &dyn Canvas,
        mx: f64,
        my: f64,
        _mask: &dyn Image,
    ) {
        self.commands.push(DrawCommand::MaskedCanvas {
            x,
            y,
            width: source.width(),
            height: source.height(),
            mask_origin: (mx, my),
            commands: Self::nested_commands(source),
        });
    }

    fn draw_image(&mut self, x: f64, y: f64, width: f64, height: f64, image: &dyn Image) {
        self.commands.push(DrawCommand::Image {
            x,
            y,
            width,
            height,
            source_size: (image.width(), image.height()),
        });
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Graphics backend producing [`RecordingCanvas`]es
#[derive(Clone, Copy, Debug, Default)]
pub struct RecordingGraphics;

impl Graphics for RecordingGraphics {
    fn new_canvas(&self, width: f64, height: f64) -> Option<Box<dyn Canvas>> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return None;
        }
        Some(Box::new(RecordingCanvas::new(width, height)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_canvas_is_captured() {
        let mut inner = RecordingCanvas::new(10.0, 5.0);
        inner.draw_filled_rect(0.0, 0.0, 10.0, 5.0, Color::WHITE);

        let mut outer = RecordingCanvas::new(100.0, 100.0);
        outer.push_state();
        outer.translate(3.0, 4.0);
        outer.draw_canvas(0.0, 0.0, &inner);
        outer.pop_state();

        assert_eq!(outer.depth(), 0);
        assert_eq!(outer.filled_rects().len(), 1);
        match &outer.commands()[2] {
            DrawCommand::Canvas { width, height, .. } => assert_eq!((*width, *height), (10.0, 5.0)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_unbalanced_pop_is_ignored() {
        let mut canvas = RecordingCanvas::new(1.0, 1.0);
        canvas.pop_state();
        assert!(canvas.commands().is_empty());
    }

    #[test]
    fn test_graphics_rejects_empty_canvas() {
        assert!(RecordingGraphics.new_canvas(0.0, 10.0).is_none());
        assert!(RecordingGraphics.new_canvas(f64::NAN, 10.0).is_none());
        assert!(RecordingGraphics.new_canvas(3.0, 10.0).is_some());
    }

    #[test]
    fn test_color_from_rgb8() {
        assert!(Color::from_rgb8(0, 0, 0).is_black());
        assert_eq!(Color::from_rgb8(255, 255, 255), Color::WHITE);
    }
}
