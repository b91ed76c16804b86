//! ggadget Core
//!
//! Leaf primitives shared by the gadget view engine:
//!
//! - **Events**: typed event values with range-based classification
//! - **Coordinate math**: parent/child conversion for rotated, pinned elements
//! - **Canvas**: the drawing boundary and a recording implementation
//! - **Images**: pixel-readable images and name-based loading
//! - **Host & main loop**: services a view consumes from its embedder
//! - **Configuration**: serde-backed view presets
//!
//! Nothing in this crate knows about the element tree; see `ggadget_view`.

pub mod config;
pub mod draw;
pub mod error;
pub mod events;
pub mod host;
pub mod image;
pub mod main_loop;
pub mod math;

pub use config::{DebugMode, ResizableMode, ViewConfig};
pub use draw::{Canvas, Color, DrawCommand, Graphics, RecordingCanvas, RecordingGraphics};
pub use error::{GadgetError, Result};
pub use events::{
    DragEvent, Event, EventResult, EventType, KeyboardEvent, Modifiers, MouseButtons, MouseEvent,
    SimpleEvent, SizingEvent, TimerEvent, TimerToken,
};
pub use host::{CursorType, ViewHost};
pub use image::{BitmapImage, Image, ImageLoader, MemoryImageLoader};
pub use main_loop::{MainLoop, ManualMainLoop};
pub use math::{
    child_coord_from_parent_coord, child_extent_in_parent, degrees_to_radians,
    is_point_in_element, parent_coord_from_child_coord, radians_to_degrees, ChildCoordCalculator,
    ParentCoordCalculator, Rect,
};
