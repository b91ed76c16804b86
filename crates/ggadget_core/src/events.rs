//! Event model
//!
//! Events are small value types delivered by the host to a view. Every event
//! carries an [`EventType`]; the numeric value of the type places it in one of
//! the mouse, keyboard, drag or "other" ranges, which is how dispatch decides
//! where an event is routed.

use bitflags::bitflags;

// ============================================================================
// Event Types
// ============================================================================

const MOUSE_RANGE_START: u16 = 10_000;
const MOUSE_RANGE_END: u16 = 20_000;
const KEY_RANGE_START: u16 = 20_000;
const KEY_RANGE_END: u16 = 30_000;
const DRAG_RANGE_START: u16 = 30_000;
const DRAG_RANGE_END: u16 = 40_000;

/// Event type identifiers, grouped in numeric ranges
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum EventType {
    // Other events
    Cancel = 1,
    Close,
    Dock,
    Minimize,
    Ok,
    Open,
    PopIn,
    PopOut,
    Restore,
    Size,
    Sizing,
    Undock,
    FocusIn,
    FocusOut,
    OptionChanged,
    Timer,

    // Mouse events
    MouseDown = MOUSE_RANGE_START,
    MouseUp,
    Click,
    DblClick,
    RClick,
    RDblClick,
    MouseMove,
    MouseOut,
    MouseOver,
    MouseWheel,

    // Keyboard events
    KeyDown = KEY_RANGE_START,
    KeyUp,
    KeyPress,

    // Drag events
    DragDrop = DRAG_RANGE_START,
    DragOut,
    DragOver,
    DragMotion,
}

impl EventType {
    /// Numeric code of the type
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn is_mouse(self) -> bool {
        (MOUSE_RANGE_START..MOUSE_RANGE_END).contains(&self.code())
    }

    pub fn is_keyboard(self) -> bool {
        (KEY_RANGE_START..KEY_RANGE_END).contains(&self.code())
    }

    pub fn is_drag(self) -> bool {
        (DRAG_RANGE_START..DRAG_RANGE_END).contains(&self.code())
    }

    pub fn is_other(self) -> bool {
        self.code() < MOUSE_RANGE_START
    }

    /// Name of the script signal fired for this event type
    pub fn signal_name(self) -> &'static str {
        match self {
            EventType::Cancel => "oncancel",
            EventType::Close => "onclose",
            EventType::Dock => "ondock",
            EventType::Minimize => "onminimize",
            EventType::Ok => "onok",
            EventType::Open => "onopen",
            EventType::PopIn => "onpopin",
            EventType::PopOut => "onpopout",
            EventType::Restore => "onrestore",
            EventType::Size => "onsize",
            EventType::Sizing => "onsizing",
            EventType::Undock => "onundock",
            EventType::FocusIn => "onfocusin",
            EventType::FocusOut => "onfocusout",
            EventType::OptionChanged => "onoptionchanged",
            EventType::Timer => "ontimer",
            EventType::MouseDown => "onmousedown",
            EventType::MouseUp => "onmouseup",
            EventType::Click => "onclick",
            EventType::DblClick => "ondblclick",
            EventType::RClick => "onrclick",
            EventType::RDblClick => "onrdblclick",
            EventType::MouseMove => "onmousemove",
            EventType::MouseOut => "onmouseout",
            EventType::MouseOver => "onmouseover",
            EventType::MouseWheel => "onmousewheel",
            EventType::KeyDown => "onkeydown",
            EventType::KeyUp => "onkeyup",
            EventType::KeyPress => "onkeypress",
            EventType::DragDrop => "ondragdrop",
            EventType::DragOut => "ondragout",
            EventType::DragOver => "ondragover",
            EventType::DragMotion => "ondragmotion",
        }
    }
}

/// Outcome of delivering an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EventResult {
    /// Nobody consumed the event
    #[default]
    Unhandled,
    /// The event was consumed
    Handled,
    /// A handler cancelled the event; propagation stops
    Canceled,
}

impl EventResult {
    pub fn is_canceled(self) -> bool {
        self == EventResult::Canceled
    }

    /// Combine two results, keeping the strongest outcome
    pub fn merge(self, other: EventResult) -> EventResult {
        match (self, other) {
            (EventResult::Canceled, _) | (_, EventResult::Canceled) => EventResult::Canceled,
            (EventResult::Handled, _) | (_, EventResult::Handled) => EventResult::Handled,
            _ => EventResult::Unhandled,
        }
    }
}

// ============================================================================
// Modifiers & Buttons
// ============================================================================

bitflags! {
    /// Mouse buttons held during a mouse event
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MouseButtons: u32 {
        const NONE = 0;
        const LEFT = 1 << 0;
        const MIDDLE = 1 << 1;
        const RIGHT = 1 << 2;
        const ALL = Self::LEFT.bits() | Self::MIDDLE.bits() | Self::RIGHT.bits();
    }
}

bitflags! {
    /// Modifier keys held during an input event
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u32 {
        const NONE = 0;
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
    }
}

// ============================================================================
// Event Payloads
// ============================================================================

/// An event with no parameters beyond its type
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimpleEvent {
    pub ty: EventType,
}

/// Mouse event in the coordinate space of its current receiver
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MouseEvent {
    pub ty: EventType,
    pub x: f64,
    pub y: f64,
    pub wheel_delta_x: i32,
    pub wheel_delta_y: i32,
    pub buttons: MouseButtons,
    pub modifiers: Modifiers,
}

impl MouseEvent {
    pub fn new(ty: EventType, x: f64, y: f64) -> Self {
        debug_assert!(ty.is_mouse(), "{ty:?} is not a mouse event type");
        Self {
            ty,
            x,
            y,
            wheel_delta_x: 0,
            wheel_delta_y: 0,
            buttons: MouseButtons::NONE,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_buttons(mut self, buttons: MouseButtons) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_wheel_delta(mut self, dx: i32, dy: i32) -> Self {
        self.wheel_delta_x = dx;
        self.wheel_delta_y = dy;
        self
    }

    /// Same event relocated to another coordinate space
    pub fn at(&self, x: f64, y: f64) -> Self {
        Self { x, y, ..*self }
    }

    /// Same event with a different type, used to synthesize over/out
    pub fn retyped(&self, ty: EventType) -> Self {
        Self { ty, ..*self }
    }
}

/// Keyboard event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyboardEvent {
    pub ty: EventType,
    /// Platform independent key code, or the character code for key-press
    pub key_code: u32,
    pub modifiers: Modifiers,
}

impl KeyboardEvent {
    pub fn new(ty: EventType, key_code: u32) -> Self {
        debug_assert!(ty.is_keyboard(), "{ty:?} is not a keyboard event type");
        Self {
            ty,
            key_code,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Drag-and-drop event carrying the dragged file list
#[derive(Clone, Debug, PartialEq)]
pub struct DragEvent {
    pub ty: EventType,
    pub x: f64,
    pub y: f64,
    pub files: Vec<String>,
}

impl DragEvent {
    pub fn new(ty: EventType, x: f64, y: f64, files: Vec<String>) -> Self {
        debug_assert!(ty.is_drag(), "{ty:?} is not a drag event type");
        Self { ty, x, y, files }
    }

    pub fn at(&self, x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..self.clone()
        }
    }

    pub fn retyped(&self, ty: EventType) -> Self {
        Self {
            ty,
            ..self.clone()
        }
    }
}

/// Handle of a scheduled timer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(pub u32);

impl std::fmt::Display for TimerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Timer tick; `value` is the interpolated value for animations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerEvent {
    pub token: TimerToken,
    pub value: i32,
}

/// Proposed new view size during an interactive resize
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizingEvent {
    pub width: u32,
    pub height: u32,
}

/// Any event the core understands
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Simple(SimpleEvent),
    Mouse(MouseEvent),
    Keyboard(KeyboardEvent),
    Drag(DragEvent),
    Timer(TimerEvent),
    Sizing(SizingEvent),
}

impl Event {
    pub fn simple(ty: EventType) -> Self {
        Event::Simple(SimpleEvent { ty })
    }

    pub fn event_type(&self) -> EventType {
        match self {
            Event::Simple(e) => e.ty,
            Event::Mouse(e) => e.ty,
            Event::Keyboard(e) => e.ty,
            Event::Drag(e) => e.ty,
            Event::Timer(_) => EventType::Timer,
            Event::Sizing(_) => EventType::Sizing,
        }
    }

    pub fn as_mouse(&self) -> Option<&MouseEvent> {
        match self {
            Event::Mouse(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_keyboard(&self) -> Option<&KeyboardEvent> {
        match self {
            Event::Keyboard(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_drag(&self) -> Option<&DragEvent> {
        match self {
            Event::Drag(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_timer(&self) -> Option<&TimerEvent> {
        match self {
            Event::Timer(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_sizing(&self) -> Option<&SizingEvent> {
        match self {
            Event::Sizing(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SimpleEvent> for Event {
    fn from(e: SimpleEvent) -> Self {
        Event::Simple(e)
    }
}

impl From<MouseEvent> for Event {
    fn from(e: MouseEvent) -> Self {
        Event::Mouse(e)
    }
}

impl From<KeyboardEvent> for Event {
    fn from(e: KeyboardEvent) -> Self {
        Event::Keyboard(e)
    }
}

impl From<DragEvent> for Event {
    fn from(e: DragEvent) -> Self {
        Event::Drag(e)
    }
}

impl From<TimerEvent> for Event {
    fn from(e: TimerEvent) -> Self {
        Event::Timer(e)
    }
}

impl From<SizingEvent> for Event {
    fn from(e: SizingEvent) -> Self {
        Event::Sizing(e)
    }
}
