//! View host boundary
//!
//! The host owns the native window. A view asks it for canvases, redraws,
//! resizes, cursor shapes and tooltips; it never talks to the platform
//! directly.

use serde::{Deserialize, Serialize};

use crate::draw::Graphics;

/// Mouse cursor shapes an element may request
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorType {
    #[default]
    Arrow,
    IBeam,
    Wait,
    Cross,
    UpArrow,
    Size,
    SizeNwse,
    SizeNesw,
    SizeWe,
    SizeNs,
    SizeAll,
    No,
    Hand,
    Busy,
    Help,
}

/// Services a view needs from its host
pub trait ViewHost {
    /// Backend used to create canvases
    fn graphics(&self) -> &dyn Graphics;

    /// Request that the view be drawn again soon
    fn queue_draw(&self);

    /// The view's size changed and the host window should follow
    fn queue_resize(&self);

    fn set_cursor(&self, cursor: CursorType);

    /// Show a tooltip, or hide it when `text` is empty
    fn set_tooltip(&self, text: &str);
}
