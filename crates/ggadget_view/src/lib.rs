//! ggadget View Engine
//!
//! Element tree, hit-testing, input dispatch and timers for one gadget
//! surface.
//!
//! # Architecture
//!
//! - A [`View`] owns every element of its surface in a generation-tagged
//!   arena. Elements are addressed by [`ElementId`]; an id of a removed
//!   element never resolves again.
//! - Type-specific logic lives in an [`ElementBehavior`] created by the
//!   [`ElementFactory`] from a tag name (`div` and `img` are built in).
//! - Input enters through `View::on_mouse_event`, `on_key_event`,
//!   `on_drag_event` and `on_other_event`. The view fires its own signal
//!   first, then routes into the tree, converting coordinates at each level.
//! - Script-style handlers connect to view or element signals and see the
//!   event being dispatched through `View::event`. Handlers may mutate the
//!   tree freely, including removing the element being dispatched to.
//! - Timers and animations run on the host's main loop through
//!   `View::on_timer`.
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//!
//! use ggadget_core::{EventType, ManualMainLoop, MouseEvent, ViewConfig};
//! use ggadget_view::prelude::*;
//!
//! let main_loop = Rc::new(ManualMainLoop::new());
//! let mut view = View::new(
//!     ViewConfig::standard(),
//!     main_loop,
//!     Rc::new(ElementFactory::with_builtins()),
//! );
//!
//! let button = view.append_element(None, "div", "button").unwrap();
//! view.set_width(button, 40.0);
//! view.set_height(button, 20.0);
//! view.connect_element(button, EventType::MouseDown, |view| {
//!     view.set_caption("pressed");
//! })
//! .unwrap();
//!
//! view.on_mouse_event(&MouseEvent::new(EventType::MouseDown, 5.0, 5.0));
//! assert_eq!(view.caption(), "pressed");
//! assert_eq!(view.focused_element(), Some(button));
//! ```

pub mod behavior;
pub mod builtin;
mod dispatch;
mod element;
pub mod elements;
pub mod event;
pub mod factory;
pub mod geometry;
pub mod signal;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod timer;
pub mod tree;
pub mod view;

pub use behavior::ElementBehavior;
pub use builtin::{DivElement, ImgElement};
pub use elements::{Elements, MouseRouting};
pub use event::ScriptableEvent;
pub use factory::ElementFactory;
pub use geometry::{Dimension, FlipMode, Geometry, HitTest};
pub use signal::{Connection, Handler};
pub use timer::{TimerCallback, TimerKind};
pub use tree::{AncestorChain, ChangeFlags, ElementId};
pub use view::View;

pub mod prelude {
    pub use crate::behavior::ElementBehavior;
    pub use crate::builtin::{DivElement, ImgElement};
    pub use crate::event::ScriptableEvent;
    pub use crate::factory::ElementFactory;
    pub use crate::geometry::{Dimension, FlipMode, HitTest};
    pub use crate::signal::Connection;
    pub use crate::timer::TimerCallback;
    pub use crate::tree::ElementId;
    pub use crate::view::View;
}
