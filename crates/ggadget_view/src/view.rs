//! View
//!
//! A [`View`] is the root of one visual surface. It owns the element arena,
//! the top-level [`Elements`] collection, the name registry, the timer table
//! and the transient dispatch state (focus, hover, grab, drag-over).
//!
//! Element operations, tree mutation, input dispatch and timers are
//! implemented as separate `impl View` blocks in `element`, `elements`,
//! `dispatch` and `timer`.

use std::rc::Rc;

use ggadget_core::{
    Canvas, CursorType, DebugMode, Event, EventType, GadgetError, Image, ImageLoader, MainLoop, Rect,
    ResizableMode, Result, SimpleEvent, SizingEvent, TimerToken, ViewConfig, ViewHost,
};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::elements::Elements;
use crate::event::ScriptableEvent;
use crate::factory::ElementFactory;
use crate::geometry::HitTest;
use crate::signal::{Connection, Handler, SignalTable};
use crate::timer::TimerEntry;
use crate::tree::{ElementId, ElementTree};

/// Root container and dispatcher of one visual surface
pub struct View {
    config: ViewConfig,
    width: u32,
    height: u32,
    resizable: ResizableMode,
    caption: String,
    show_caption_always: bool,
    debug_mode: DebugMode,

    host: Option<Rc<dyn ViewHost>>,
    main_loop: Rc<dyn MainLoop>,
    factory: Rc<ElementFactory>,
    image_loader: Option<Rc<dyn ImageLoader>>,

    pub(crate) tree: ElementTree,
    pub(crate) root: Elements,
    registry: FxHashMap<String, ElementId>,

    // Dispatch state. These never own the element; removal clears them.
    pub(crate) focused: Option<ElementId>,
    pub(crate) hovered: Option<ElementId>,
    pub(crate) grabbed: Option<ElementId>,
    pub(crate) drag_over: Option<ElementId>,
    pub(crate) last_hit_test: HitTest,
    pub(crate) last_cursor: Option<CursorType>,
    pub(crate) last_tooltip: String,

    pub(crate) event_stack: Vec<ScriptableEvent>,
    pub(crate) signals: SignalTable,
    next_connection: u64,

    pub(crate) timers: FxHashMap<TimerToken, TimerEntry>,
    pub(crate) next_timer_token: u32,

    canvas: Option<Box<dyn Canvas>>,
    draw_queued: bool,
    pub(crate) in_draw: bool,
    pub(crate) in_layout: bool,
    redraw_deferred: bool,
    pub(crate) dirty_region: Option<Rect>,
    destroyed: bool,
}

impl View {
    pub fn new(
        config: ViewConfig,
        main_loop: Rc<dyn MainLoop>,
        factory: Rc<ElementFactory>,
    ) -> Self {
        Self {
            width: config.width,
            height: config.height,
            resizable: config.resizable,
            caption: config.caption.clone(),
            show_caption_always: config.show_caption_always,
            debug_mode: config.debug_mode,
            config,
            host: None,
            main_loop,
            factory,
            image_loader: None,
            tree: ElementTree::new(),
            root: Elements::default(),
            registry: FxHashMap::default(),
            focused: None,
            hovered: None,
            grabbed: None,
            drag_over: None,
            last_hit_test: HitTest::default(),
            last_cursor: None,
            last_tooltip: String::new(),
            event_stack: Vec::new(),
            signals: SignalTable::default(),
            next_connection: 1,
            timers: FxHashMap::default(),
            next_timer_token: 1,
            canvas: None,
            draw_queued: false,
            in_draw: false,
            in_layout: false,
            redraw_deferred: false,
            dirty_region: None,
            destroyed: false,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Collaborators
    // ─────────────────────────────────────────────────────────────────────────

    pub fn attach_host(&mut self, host: Rc<dyn ViewHost>) {
        self.host = Some(host);
        self.draw_queued = false;
        self.queue_draw();
    }

    pub fn detach_host(&mut self) -> Option<Rc<dyn ViewHost>> {
        self.canvas = None;
        self.host.take()
    }

    pub fn host(&self) -> Option<&Rc<dyn ViewHost>> {
        self.host.as_ref()
    }

    pub fn main_loop(&self) -> &Rc<dyn MainLoop> {
        &self.main_loop
    }

    pub fn factory(&self) -> &Rc<ElementFactory> {
        &self.factory
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn set_image_loader(&mut self, loader: Rc<dyn ImageLoader>) {
        self.image_loader = Some(loader);
    }

    /// Load an image by name; empty names and missing images give `None`
    pub fn load_image(&self, name: &str, is_mask: bool) -> Option<Rc<dyn Image>> {
        if name.is_empty() {
            return None;
        }
        let image = self.image_loader.as_ref()?.load_image(name, is_mask);
        if image.is_none() {
            debug!("Image {:?} not found", name);
        }
        image
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Attributes
    // ─────────────────────────────────────────────────────────────────────────

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set_view_width(&mut self, width: u32) {
        self.set_size(width, self.height);
    }

    pub fn set_view_height(&mut self, height: u32) {
        self.set_size(self.width, height);
    }

    /// Resize the view, firing `onsize` when the size actually changed
    pub fn set_size(&mut self, width: u32, height: u32) {
        if self.destroyed || (width == self.width && height == self.height) {
            return;
        }
        debug!(
            "View resized from {}x{} to {}x{}",
            self.width, self.height, width, height
        );
        self.width = width;
        self.height = height;
        self.canvas = None;
        self.notify_parent_size_changed(None);
        self.queue_draw();
        if let Some(host) = self.host.clone() {
            host.queue_resize();
        }
        self.fire_view_signal(ScriptableEvent::new(
            SimpleEvent {
                ty: EventType::Size,
            },
            None,
        ));
    }

    pub fn resize_by(&mut self, dw: i64, dh: i64) {
        let grow = |value: u32, delta: i64| {
            u32::try_from((i64::from(value) + delta).max(0)).unwrap_or(u32::MAX)
        };
        self.set_size(grow(self.width, dw), grow(self.height, dh));
    }

    /// Ask the view whether the host may resize it to `width`x`height`
    ///
    /// Returns the size the host should apply, which `onsizing` handlers
    /// may adjust through the output event, or `None` when refused.
    pub fn on_sizing(&mut self, width: u32, height: u32) -> Option<(u32, u32)> {
        if self.resizable == ResizableMode::Fixed {
            return None;
        }
        let proposed = SizingEvent { width, height };
        let mut event = ScriptableEvent::new(proposed, None);
        event.set_output_event(proposed);
        let event = self.fire_view_signal(event);
        if event.is_canceled() {
            debug!("Sizing to {}x{} canceled", width, height);
            return None;
        }
        let size = event
            .output_event()
            .and_then(Event::as_sizing)
            .map_or((width, height), |s| (s.width, s.height));
        Some(size)
    }

    pub fn resizable(&self) -> ResizableMode {
        self.resizable
    }

    pub fn set_resizable(&mut self, resizable: ResizableMode) {
        self.resizable = resizable;
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn set_caption(&mut self, caption: impl Into<String>) {
        self.caption = caption.into();
    }

    pub fn show_caption_always(&self) -> bool {
        self.show_caption_always
    }

    pub fn set_show_caption_always(&mut self, show: bool) {
        self.show_caption_always = show;
    }

    pub fn debug_mode(&self) -> DebugMode {
        self.debug_mode
    }

    pub fn set_debug_mode(&mut self, mode: DebugMode) {
        if self.debug_mode != mode {
            self.debug_mode = mode;
            self.mark_redraw(None);
            self.queue_draw();
        }
    }

    /// Hit-test area of the topmost element under the pointer
    pub fn hit_test(&self) -> HitTest {
        self.last_hit_test
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub(crate) fn ensure_alive(&self) -> Result<()> {
        if self.destroyed {
            Err(GadgetError::ViewDestroyed)
        } else {
            Ok(())
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registry and dispatch state
    // ─────────────────────────────────────────────────────────────────────────

    /// Look up an element by name; the first element registered wins
    pub fn element_by_name(&self, name: &str) -> Option<ElementId> {
        self.registry.get(name).copied()
    }

    pub(crate) fn on_element_added(&mut self, id: ElementId) {
        let Some(node) = self.tree.get(id) else {
            return;
        };
        if !node.name.is_empty() && !self.registry.contains_key(&node.name) {
            self.registry.insert(node.name.clone(), id);
        }
        debug!("Added <{}> {:?}", node.tag, node.name);
    }

    /// Forget a node that is about to leave the tree
    pub(crate) fn on_element_removed(&mut self, id: ElementId) {
        if let Some(node) = self.tree.get(id) {
            if self.registry.get(&node.name) == Some(&id) {
                self.registry.remove(&node.name);
            }
        }
        for field in [
            &mut self.focused,
            &mut self.hovered,
            &mut self.grabbed,
            &mut self.drag_over,
        ] {
            if *field == Some(id) {
                *field = None;
            }
        }
    }

    /// `id` when it still refers to an element of this view
    pub(crate) fn live(&self, id: Option<ElementId>) -> Option<ElementId> {
        id.filter(|id| self.tree.contains(*id))
    }

    pub fn focused_element(&self) -> Option<ElementId> {
        self.live(self.focused)
    }

    pub fn hovered_element(&self) -> Option<ElementId> {
        self.live(self.hovered)
    }

    pub fn grabbed_element(&self) -> Option<ElementId> {
        self.live(self.grabbed)
    }

    pub fn drag_over_element(&self) -> Option<ElementId> {
        self.live(self.drag_over)
    }

    pub fn contains_element(&self, id: ElementId) -> bool {
        self.tree.contains(id)
    }

    pub fn element_count(&self) -> usize {
        self.tree.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Signals
    // ─────────────────────────────────────────────────────────────────────────

    /// The innermost event currently being dispatched
    pub fn event(&self) -> Option<&ScriptableEvent> {
        self.event_stack.last()
    }

    pub fn event_mut(&mut self) -> Option<&mut ScriptableEvent> {
        self.event_stack.last_mut()
    }

    /// Connect a view-level handler
    pub fn connect(&mut self, ty: EventType, handler: impl Fn(&mut View) + 'static) -> Connection {
        let connection = self.next_connection();
        self.signals.connect(ty, connection, Rc::new(handler));
        connection
    }

    /// Connect a handler to one element's signal
    pub fn connect_element(
        &mut self,
        id: ElementId,
        ty: EventType,
        handler: impl Fn(&mut View) + 'static,
    ) -> Result<Connection> {
        let connection = self.next_connection();
        let node = self.tree.get_mut(id).ok_or(GadgetError::ElementNotFound)?;
        node.signals.connect(ty, connection, Rc::new(handler));
        Ok(connection)
    }

    /// Disconnect a view-level handler
    pub fn disconnect(&mut self, connection: Connection) -> bool {
        self.signals.disconnect(connection)
    }

    pub fn disconnect_element(&mut self, id: ElementId, connection: Connection) -> bool {
        self.tree
            .get_mut(id)
            .is_some_and(|node| node.signals.disconnect(connection))
    }

    fn next_connection(&mut self) -> Connection {
        let connection = Connection(self.next_connection);
        self.next_connection += 1;
        connection
    }

    /// Run `handlers` with `event` on top of the event stack
    ///
    /// Handlers may dispatch nested events; the stack is restored to this
    /// level before the event is popped and handed back. Handlers left over
    /// after one destroys the view are not run.
    pub(crate) fn fire_event(
        &mut self,
        event: ScriptableEvent,
        handlers: &[Handler],
    ) -> ScriptableEvent {
        if handlers.is_empty() {
            return event;
        }
        let depth = self.event_stack.len();
        self.event_stack.push(event.clone());
        for handler in handlers {
            handler(self);
            if self.destroyed {
                break;
            }
        }
        self.event_stack.truncate(depth + 1);
        if self.event_stack.len() > depth {
            if let Some(event) = self.event_stack.pop() {
                return event;
            }
        }
        event
    }

    /// Fire the view-level signal matching the event's type
    pub(crate) fn fire_view_signal(&mut self, event: ScriptableEvent) -> ScriptableEvent {
        let handlers = self.signals.handlers(event.event_type());
        self.fire_event(event, &handlers)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Drawing
    // ─────────────────────────────────────────────────────────────────────────

    /// Ask the host for a redraw
    ///
    /// Requests made while drawing are deferred until the frame is done;
    /// requests made by the layout pass are covered by the frame in progress.
    pub fn queue_draw(&mut self) {
        if self.destroyed {
            return;
        }
        if self.in_layout {
            return;
        }
        if self.in_draw {
            self.redraw_deferred = true;
            return;
        }
        if self.draw_queued {
            return;
        }
        if let Some(host) = self.host.clone() {
            self.draw_queued = true;
            host.queue_draw();
        }
    }

    /// Lay out and compose the whole view onto its frame canvas
    ///
    /// Returns the frame and whether any element changed since the
    /// previous frame.
    pub fn draw(&mut self) -> Result<(&dyn Canvas, bool)> {
        self.ensure_alive()?;
        let Some(host) = self.host.clone() else {
            warn!("Draw requested without a view host");
            return Err(GadgetError::NoHost);
        };
        self.draw_queued = false;

        self.in_layout = true;
        self.layout();
        self.in_layout = false;

        let (width, height) = (f64::from(self.width), f64::from(self.height));
        let mut canvas = match self.canvas.take() {
            Some(mut canvas) if canvas.width() == width && canvas.height() == height => {
                canvas.clear();
                canvas
            }
            _ => host
                .graphics()
                .new_canvas(width, height)
                .ok_or(GadgetError::CanvasCreation {
                    width: self.width,
                    height: self.height,
                })?,
        };

        self.in_draw = true;
        let changed = self.draw_children(None, canvas.as_mut());
        self.in_draw = false;
        self.dirty_region = None;

        if std::mem::take(&mut self.redraw_deferred) {
            self.queue_draw();
        }
        Ok((&**self.canvas.insert(canvas), changed))
    }

    /// The last composed frame
    pub fn canvas(&self) -> Option<&dyn Canvas> {
        self.canvas.as_deref()
    }

    /// View-space area queued for redraw since the last frame
    pub fn dirty_region(&self) -> Option<Rect> {
        self.dirty_region
    }

    pub(crate) fn add_dirty_rect(&mut self, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        self.dirty_region = Some(match self.dirty_region {
            Some(region) => region.union(&rect),
            None => rect,
        });
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Teardown
    // ─────────────────────────────────────────────────────────────────────────

    /// Cancel every timer, then destroy the element tree depth-first
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        debug!("Destroying view with {} elements", self.tree.len());
        self.cancel_all_timers();
        self.destroyed = true;
        self.focused = None;
        self.hovered = None;
        self.grabbed = None;
        self.drag_over = None;
        self.remove_all_elements(None);
        self.registry.clear();
        self.signals = SignalTable::default();
        self.canvas = None;
    }
}

impl Drop for View {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use ggadget_core::{ManualMainLoop, MouseEvent};

    use super::*;
    use crate::testing::{test_view, TestHost};

    #[test]
    fn test_set_size_fires_onsize_once() {
        let (mut view, _, _) = test_view();
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        view.connect(EventType::Size, move |_| counter.set(counter.get() + 1));

        view.set_size(300, 150);
        view.set_size(300, 150);
        assert_eq!((view.width(), view.height()), (300, 150));
        assert_eq!(fired.get(), 1);

        view.resize_by(-400, 10);
        assert_eq!((view.width(), view.height()), (0, 160));
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn test_set_size_requests_host_resize() {
        let (mut view, host, _) = test_view();
        view.set_size(120, 80);
        assert_eq!(host.resize_requests(), 1);
    }

    #[test]
    fn test_on_sizing() {
        let (mut view, _, _) = test_view();
        assert_eq!(view.on_sizing(50, 60), Some((50, 60)));

        view.connect(EventType::Sizing, |view| {
            if let Some(event) = view.event_mut() {
                event.set_output_event(SizingEvent {
                    width: 64,
                    height: 64,
                });
            }
        });
        assert_eq!(view.on_sizing(50, 60), Some((64, 64)));

        view.set_resizable(ResizableMode::Fixed);
        assert_eq!(view.on_sizing(50, 60), None);
    }

    #[test]
    fn test_on_sizing_canceled() {
        let (mut view, _, _) = test_view();
        view.connect(EventType::Sizing, |view| {
            if let Some(event) = view.event_mut() {
                event.cancel();
            }
        });
        assert_eq!(view.on_sizing(50, 60), None);
    }

    #[test]
    fn test_registry_first_name_wins() {
        let (mut view, _, _) = test_view();
        let first = view.append_element(None, "div", "panel").unwrap();
        let second = view.append_element(None, "div", "panel").unwrap();
        assert_eq!(view.element_by_name("panel"), Some(first));

        view.remove_element(first).unwrap();
        assert_eq!(view.element_by_name("panel"), None);
        assert!(view.contains_element(second));
    }

    #[test]
    fn test_nested_events_restore_stack() {
        let (mut view, _, _) = test_view();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let log = Rc::clone(&seen);
        view.connect(EventType::Click, move |view| {
            log.borrow_mut()
                .push(view.event().map(ScriptableEvent::event_type));
            view.on_other_event(&Event::simple(EventType::Ok));
            log.borrow_mut()
                .push(view.event().map(ScriptableEvent::event_type));
        });
        let log = Rc::clone(&seen);
        view.connect(EventType::Ok, move |view| {
            log.borrow_mut()
                .push(view.event().map(ScriptableEvent::event_type));
        });

        view.on_mouse_event(&MouseEvent::new(EventType::Click, 1.0, 1.0));
        assert_eq!(
            *seen.borrow(),
            vec![
                Some(EventType::Click),
                Some(EventType::Ok),
                Some(EventType::Click)
            ]
        );
        assert!(view.event().is_none());
    }

    #[test]
    fn test_queue_draw_coalesces_until_drawn() {
        let (mut view, host, _) = test_view();
        let baseline = host.draw_requests();
        view.queue_draw();
        view.queue_draw();
        assert_eq!(host.draw_requests(), baseline);

        view.draw().unwrap();
        view.queue_draw();
        assert_eq!(host.draw_requests(), baseline + 1);
    }

    #[test]
    fn test_draw_without_host() {
        let main_loop = Rc::new(ManualMainLoop::new());
        let mut view = View::new(
            ViewConfig::testing(),
            main_loop,
            Rc::new(ElementFactory::with_builtins()),
        );
        assert!(matches!(view.draw(), Err(GadgetError::NoHost)));

        view.attach_host(Rc::new(TestHost::new()));
        let (canvas, _) = view.draw().unwrap();
        assert_eq!((canvas.width(), canvas.height()), (100.0, 100.0));
    }

    #[test]
    fn test_destroy_cancels_timers_and_rejects_mutation() {
        let (mut view, _, main_loop) = test_view();
        view.append_element(None, "div", "a").unwrap();
        view.set_interval(Rc::new(|_, _| {}), 50).unwrap();
        view.set_timeout(Rc::new(|_, _| {}), 50).unwrap();
        assert_eq!(main_loop.watch_count(), 2);

        view.destroy();
        assert_eq!(main_loop.watch_count(), 0);
        assert_eq!(view.element_count(), 0);
        assert!(matches!(
            view.append_element(None, "div", "b"),
            Err(GadgetError::ViewDestroyed)
        ));
        assert!(matches!(
            view.set_timeout(Rc::new(|_, _| {}), 10),
            Err(GadgetError::ViewDestroyed)
        ));

        view.destroy();
        assert!(view.is_destroyed());
    }

    #[test]
    fn test_view_handler_may_destroy_view() {
        let (mut view, _, main_loop) = test_view();
        view.append_element(None, "div", "a").unwrap();
        view.set_interval(Rc::new(|_, _| {}), 10).unwrap();
        let later = Rc::new(Cell::new(false));
        let flag = Rc::clone(&later);
        view.connect(EventType::Click, |view| view.destroy());
        view.connect(EventType::Click, move |_| flag.set(true));

        view.on_mouse_event(&MouseEvent::new(EventType::Click, 1.0, 1.0));
        assert!(view.is_destroyed());
        assert!(!later.get());
        assert!(view.event().is_none());
        assert_eq!(main_loop.watch_count(), 0);
    }

    #[test]
    fn test_element_handler_may_destroy_view() {
        let (mut view, _, _) = test_view();
        let id = view.append_element(None, "div", "a").unwrap();
        view.set_width(id, 50.0);
        view.set_height(id, 50.0);
        view.connect_element(id, EventType::MouseDown, |view| view.destroy())
            .unwrap();

        view.on_mouse_event(&MouseEvent::new(EventType::MouseDown, 10.0, 10.0));
        assert!(view.is_destroyed());
        assert_eq!(view.element_count(), 0);
        assert_eq!(view.focused_element(), None);
        assert_eq!(view.grabbed_element(), None);
        assert!(view.event().is_none());
    }

    #[test]
    fn test_drop_removes_watches() {
        let (mut view, _, main_loop) = test_view();
        view.begin_animation(Rc::new(|_, _| {}), 0, 10, 100).unwrap();
        assert!(main_loop.watch_count() > 0);
        drop(view);
        assert_eq!(main_loop.watch_count(), 0);
    }
}
