//! In-memory host and helpers for exercising views without a platform
//!
//! Enabled for this crate's tests and, for downstream crates, through the
//! `testing` feature.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ggadget_core::{
    CursorType, DrawCommand, EventType, Graphics, MainLoop, ManualMainLoop, RecordingCanvas,
    RecordingGraphics, ViewConfig, ViewHost,
};

use crate::factory::ElementFactory;
use crate::tree::ElementId;
use crate::view::View;

/// Host that records the requests a view makes
#[derive(Debug, Default)]
pub struct TestHost {
    graphics: RecordingGraphics,
    draw_requests: Cell<usize>,
    resize_requests: Cell<usize>,
    cursor: Cell<Option<CursorType>>,
    tooltip: RefCell<Option<String>>,
}

impl TestHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw_requests(&self) -> usize {
        self.draw_requests.get()
    }

    pub fn resize_requests(&self) -> usize {
        self.resize_requests.get()
    }

    /// Last cursor pushed by the view
    pub fn cursor(&self) -> Option<CursorType> {
        self.cursor.get()
    }

    /// Last tooltip pushed by the view
    pub fn tooltip(&self) -> Option<String> {
        self.tooltip.borrow().clone()
    }
}

impl ViewHost for TestHost {
    fn graphics(&self) -> &dyn Graphics {
        &self.graphics
    }

    fn queue_draw(&self) {
        self.draw_requests.set(self.draw_requests.get() + 1);
    }

    fn queue_resize(&self) {
        self.resize_requests.set(self.resize_requests.get() + 1);
    }

    fn set_cursor(&self, cursor: CursorType) {
        self.cursor.set(Some(cursor));
    }

    fn set_tooltip(&self, text: &str) {
        *self.tooltip.borrow_mut() = Some(text.to_string());
    }
}

/// A 100x100 view with the built-in elements, attached to a [`TestHost`]
pub fn test_view() -> (View, Rc<TestHost>, Rc<ManualMainLoop>) {
    test_view_with(ViewConfig::testing(), ElementFactory::with_builtins())
}

pub fn test_view_with_factory(factory: ElementFactory) -> (View, Rc<TestHost>, Rc<ManualMainLoop>) {
    test_view_with(ViewConfig::testing(), factory)
}

pub fn test_view_with_config(config: ViewConfig) -> (View, Rc<TestHost>, Rc<ManualMainLoop>) {
    test_view_with(config, ElementFactory::with_builtins())
}

fn test_view_with(
    config: ViewConfig,
    factory: ElementFactory,
) -> (View, Rc<TestHost>, Rc<ManualMainLoop>) {
    let main_loop = Rc::new(ManualMainLoop::new());
    let host = Rc::new(TestHost::new());
    let mut view = View::new(config, Rc::clone(&main_loop) as Rc<dyn MainLoop>, Rc::new(factory));
    view.attach_host(Rc::clone(&host) as Rc<dyn ViewHost>);
    (view, host, main_loop)
}

/// Draw a frame and return what was recorded
///
/// # Panics
///
/// Panics if the view cannot draw or its host is not recording.
pub fn last_frame(view: &mut View) -> Vec<DrawCommand> {
    let (canvas, _) = view.draw().expect("view failed to draw");
    canvas
        .as_any()
        .downcast_ref::<RecordingCanvas>()
        .expect("host graphics is not recording")
        .commands()
        .to_vec()
}

/// Fire every watch due up to `until` in time order, then leave the clock
/// at `until`
///
/// Returns the number of watch firings, including throttled ones.
pub fn run_timers(view: &mut View, main_loop: &ManualMainLoop, until: u64) -> usize {
    let mut fired = 0;
    while let Some((token, at)) = main_loop.next_due(until) {
        main_loop.set_time(at);
        fired += 1;
        if view.on_timer(token) {
            main_loop.reschedule(token);
        } else {
            main_loop.remove_watch(token);
        }
    }
    if main_loop.current_time() < until {
        main_loop.set_time(until);
    }
    fired
}

/// Records which element received which event, in delivery order
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<(String, EventType)>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log `types` delivered to `id` under the element's current name
    pub fn watch(&self, view: &mut View, id: ElementId, types: &[EventType]) {
        let name = view.element_name(id).unwrap_or_default().to_string();
        for &ty in types {
            let events = Rc::clone(&self.events);
            let name = name.clone();
            let _ = view.connect_element(id, ty, move |_| {
                events.borrow_mut().push((name.clone(), ty));
            });
        }
    }

    pub fn events(&self) -> Vec<(String, EventType)> {
        self.events.borrow().clone()
    }

    pub fn count_for(&self, name: &str) -> usize {
        self.events.borrow().iter().filter(|(n, _)| n == name).count()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

/// Route `tracing` output to the test harness; `RUST_LOG` picks the level
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
