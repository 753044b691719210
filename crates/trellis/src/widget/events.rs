//! Event types delivered to widgets.
//!
//! Each event struct embeds an [`EventBase`] carrying the accepted flag.
//! Events are wrapped in [`WidgetEvent`] for dispatch; a widget's `event`
//! method matches on the variant and calls `accept` (or returns true) to
//! stop propagation.

use std::any::Any;
use std::time::Instant;

use trellis_core::geometry::{Point, Rect, Size};
use trellis_core::timer::TimerId;

/// Common data shared by all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventBase {
    accepted: bool,
}

impl EventBase {
    /// Create an unaccepted event base.
    pub fn new() -> Self {
        Self { accepted: false }
    }

    /// Mark the event as handled.
    pub fn accept(&mut self) {
        self.accepted = true;
    }

    /// Clear the handled flag.
    pub fn ignore(&mut self) {
        self.accepted = false;
    }

    /// Whether the event has been handled.
    pub fn is_accepted(&self) -> bool {
        self.accepted
    }
}

/// Keyboard modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyboardModifiers {
    /// The Shift key is held.
    pub shift: bool,
    /// The Control key is held.
    pub control: bool,
    /// The Alt key is held.
    pub alt: bool,
    /// The Meta/Super key is held.
    pub meta: bool,
}

impl KeyboardModifiers {
    /// No modifiers pressed.
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };

    /// Shift modifier only.
    pub const SHIFT: Self = Self {
        shift: true,
        control: false,
        alt: false,
        meta: false,
    };

    /// Control modifier only.
    pub const CTRL: Self = Self {
        shift: false,
        control: true,
        alt: false,
        meta: false,
    };

    /// Alt modifier only.
    pub const ALT: Self = Self {
        shift: false,
        control: false,
        alt: true,
        meta: false,
    };

    /// Check if any modifier is pressed.
    pub fn any(&self) -> bool {
        self.shift || self.control || self.alt || self.meta
    }

    /// Check if no modifiers are pressed.
    pub fn none(&self) -> bool {
        !self.any()
    }

    /// Check if any of Control, Alt, or Meta is pressed (Shift excluded).
    ///
    /// This is the set consulted for velocity-drag key overrides.
    pub fn any_command_modifier(&self) -> bool {
        self.control || self.alt || self.meta
    }
}

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button (usually left).
    Left,
    /// Secondary button (usually right).
    Right,
    /// Middle button (scroll wheel click).
    Middle,
}

/// Keyboard key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    // Letters
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

    // Numbers (main keyboard)
    Digit0, Digit1, Digit2, Digit3, Digit4,
    Digit5, Digit6, Digit7, Digit8, Digit9,

    // Navigation
    ArrowUp, ArrowDown, ArrowLeft, ArrowRight,
    Home, End, PageUp, PageDown,

    // Editing
    Backspace, Delete, Insert,
    Enter, Tab,

    // Whitespace
    Space,

    // Control
    Escape,

    // Function keys
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,

    /// Unmapped platform key code.
    Unknown(u16),
}

impl Key {
    /// Check if this is a navigation key.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Key::ArrowUp
                | Key::ArrowDown
                | Key::ArrowLeft
                | Key::ArrowRight
                | Key::Home
                | Key::End
                | Key::PageUp
                | Key::PageDown
        )
    }
}

/// Reason for a focus change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusReason {
    /// Focus changed due to a mouse click.
    Mouse,
    /// Focus changed due to the Tab key.
    Tab,
    /// Focus changed due to Shift+Tab (backtab).
    Backtab,
    /// Focus changed because the window gained or lost activation.
    Window,
    /// Focus changed programmatically.
    #[default]
    Other,
}

/// Mouse button press.
#[derive(Debug, Clone, Copy)]
pub struct MousePressEvent {
    pub base: EventBase,
    pub button: MouseButton,
    /// Position in the receiving widget's coordinates.
    pub local_pos: Point,
    /// Position in window coordinates.
    pub window_pos: Point,
    pub modifiers: KeyboardModifiers,
    pub time: Instant,
}

impl MousePressEvent {
    pub fn new(
        button: MouseButton,
        local_pos: Point,
        window_pos: Point,
        modifiers: KeyboardModifiers,
        time: Instant,
    ) -> Self {
        Self {
            base: EventBase::new(),
            button,
            local_pos,
            window_pos,
            modifiers,
            time,
        }
    }
}

/// Mouse button release.
#[derive(Debug, Clone, Copy)]
pub struct MouseReleaseEvent {
    pub base: EventBase,
    pub button: MouseButton,
    pub local_pos: Point,
    pub window_pos: Point,
    pub modifiers: KeyboardModifiers,
    pub time: Instant,
}

impl MouseReleaseEvent {
    pub fn new(
        button: MouseButton,
        local_pos: Point,
        window_pos: Point,
        modifiers: KeyboardModifiers,
        time: Instant,
    ) -> Self {
        Self {
            base: EventBase::new(),
            button,
            local_pos,
            window_pos,
            modifiers,
            time,
        }
    }
}

/// Mouse movement. Delivered to the pressed widget during a drag.
#[derive(Debug, Clone, Copy)]
pub struct MouseMoveEvent {
    pub base: EventBase,
    pub local_pos: Point,
    pub window_pos: Point,
    pub modifiers: KeyboardModifiers,
    pub time: Instant,
}

impl MouseMoveEvent {
    pub fn new(
        local_pos: Point,
        window_pos: Point,
        modifiers: KeyboardModifiers,
        time: Instant,
    ) -> Self {
        Self {
            base: EventBase::new(),
            local_pos,
            window_pos,
            modifiers,
            time,
        }
    }
}

/// Second press of a double click.
#[derive(Debug, Clone, Copy)]
pub struct MouseDoubleClickEvent {
    pub base: EventBase,
    pub button: MouseButton,
    pub local_pos: Point,
    pub window_pos: Point,
    pub modifiers: KeyboardModifiers,
    pub time: Instant,
}

impl MouseDoubleClickEvent {
    pub fn new(
        button: MouseButton,
        local_pos: Point,
        window_pos: Point,
        modifiers: KeyboardModifiers,
        time: Instant,
    ) -> Self {
        Self {
            base: EventBase::new(),
            button,
            local_pos,
            window_pos,
            modifiers,
            time,
        }
    }
}

/// Scroll wheel movement.
///
/// Deltas are in notches; positive `delta_y` scrolls up/away.
#[derive(Debug, Clone, Copy)]
pub struct WheelEvent {
    pub base: EventBase,
    pub local_pos: Point,
    pub delta_x: f32,
    pub delta_y: f32,
    /// Natural-scrolling direction flip reported by the platform.
    pub is_reversed: bool,
    pub modifiers: KeyboardModifiers,
    pub time: Instant,
}

impl WheelEvent {
    pub fn new(
        local_pos: Point,
        delta_x: f32,
        delta_y: f32,
        is_reversed: bool,
        modifiers: KeyboardModifiers,
        time: Instant,
    ) -> Self {
        Self {
            base: EventBase::new(),
            local_pos,
            delta_x,
            delta_y,
            is_reversed,
            modifiers,
            time,
        }
    }
}

/// Key press.
#[derive(Debug, Clone, Copy)]
pub struct KeyPressEvent {
    pub base: EventBase,
    pub key: Key,
    pub modifiers: KeyboardModifiers,
    /// The character this press produces, if any.
    pub text: Option<char>,
}

impl KeyPressEvent {
    pub fn new(key: Key, modifiers: KeyboardModifiers) -> Self {
        Self {
            base: EventBase::new(),
            key,
            modifiers,
            text: None,
        }
    }

    pub fn with_text(mut self, text: char) -> Self {
        self.text = Some(text);
        self
    }
}

/// Key release (or a non-press key state change).
#[derive(Debug, Clone, Copy)]
pub struct KeyReleaseEvent {
    pub base: EventBase,
    pub key: Key,
    pub modifiers: KeyboardModifiers,
}

impl KeyReleaseEvent {
    pub fn new(key: Key, modifiers: KeyboardModifiers) -> Self {
        Self {
            base: EventBase::new(),
            key,
            modifiers,
        }
    }
}

/// Widget gained keyboard focus.
#[derive(Debug, Clone, Copy)]
pub struct FocusInEvent {
    pub base: EventBase,
    pub reason: FocusReason,
}

impl FocusInEvent {
    pub fn new(reason: FocusReason) -> Self {
        Self {
            base: EventBase::new(),
            reason,
        }
    }
}

/// Widget lost keyboard focus.
#[derive(Debug, Clone, Copy)]
pub struct FocusOutEvent {
    pub base: EventBase,
    pub reason: FocusReason,
}

impl FocusOutEvent {
    pub fn new(reason: FocusReason) -> Self {
        Self {
            base: EventBase::new(),
            reason,
        }
    }
}

/// Widget position changed.
#[derive(Debug, Clone, Copy)]
pub struct MoveEvent {
    pub base: EventBase,
    pub old_pos: Point,
    pub new_pos: Point,
}

impl MoveEvent {
    pub fn new(old_pos: Point, new_pos: Point) -> Self {
        Self {
            base: EventBase::new(),
            old_pos,
            new_pos,
        }
    }
}

/// Widget size changed.
#[derive(Debug, Clone, Copy)]
pub struct ResizeEvent {
    pub base: EventBase,
    pub old_size: Size,
    pub new_size: Size,
}

impl ResizeEvent {
    pub fn new(old_size: Size, new_size: Size) -> Self {
        Self {
            base: EventBase::new(),
            old_size,
            new_size,
        }
    }
}

/// A scheduled timer fired.
#[derive(Debug, Clone, Copy)]
pub struct TimerEvent {
    pub base: EventBase,
    pub timer_id: TimerId,
    pub now: Instant,
}

impl TimerEvent {
    pub fn new(timer_id: TimerId, now: Instant) -> Self {
        Self {
            base: EventBase::new(),
            timer_id,
            now,
        }
    }
}

/// Input arrived for a widget blocked by a modal widget.
///
/// Sent to the active modal widget so it can flash, beep, or dismiss.
#[derive(Debug, Clone, Copy)]
pub struct ModalInputAttemptEvent {
    pub base: EventBase,
}

impl ModalInputAttemptEvent {
    pub fn new() -> Self {
        Self {
            base: EventBase::new(),
        }
    }
}

impl Default for ModalInputAttemptEvent {
    fn default() -> Self {
        Self::new()
    }
}

/// The window holding this widget was raised above its siblings.
#[derive(Debug, Clone, Copy)]
pub struct BroughtToFrontEvent {
    pub base: EventBase,
}

impl BroughtToFrontEvent {
    pub fn new() -> Self {
        Self {
            base: EventBase::new(),
        }
    }
}

impl Default for BroughtToFrontEvent {
    fn default() -> Self {
        Self::new()
    }
}

/// The user asked to close the window. Accept to allow the close.
#[derive(Debug, Clone, Copy)]
pub struct CloseRequestEvent {
    pub base: EventBase,
}

impl CloseRequestEvent {
    pub fn new() -> Self {
        Self {
            base: EventBase::new(),
        }
    }
}

impl Default for CloseRequestEvent {
    fn default() -> Self {
        Self::new()
    }
}

/// The screen hosting the window changed size or layout.
#[derive(Debug, Clone, Copy)]
pub struct ScreenChangeEvent {
    pub base: EventBase,
    /// New available screen area, in window coordinates.
    pub available_area: Rect,
}

impl ScreenChangeEvent {
    pub fn new(available_area: Rect) -> Self {
        Self {
            base: EventBase::new(),
            available_area,
        }
    }
}

/// The global keyboard modifier state changed.
#[derive(Debug, Clone, Copy)]
pub struct ModifiersChangeEvent {
    pub base: EventBase,
    pub modifiers: KeyboardModifiers,
}

impl ModifiersChangeEvent {
    pub fn new(modifiers: KeyboardModifiers) -> Self {
        Self {
            base: EventBase::new(),
            modifiers,
        }
    }
}

/// Widget became visible.
#[derive(Debug, Clone, Copy)]
pub struct ShowEvent {
    pub base: EventBase,
}

impl ShowEvent {
    pub fn new() -> Self {
        Self {
            base: EventBase::new(),
        }
    }
}

impl Default for ShowEvent {
    fn default() -> Self {
        Self::new()
    }
}

/// Widget became hidden (including window minimization).
#[derive(Debug, Clone, Copy)]
pub struct HideEvent {
    pub base: EventBase,
}

impl HideEvent {
    pub fn new() -> Self {
        Self {
            base: EventBase::new(),
        }
    }
}

impl Default for HideEvent {
    fn default() -> Self {
        Self::new()
    }
}

/// Application-defined payload routed through the dispatcher.
///
/// Used for deferred deliveries (popup-menu results and similar) where the
/// payload is resolved against widget storage on a later loop turn.
pub struct CustomEvent {
    pub base: EventBase,
    pub payload: Box<dyn Any + Send>,
}

impl CustomEvent {
    pub fn new(payload: Box<dyn Any + Send>) -> Self {
        Self {
            base: EventBase::new(),
            payload,
        }
    }

    /// Borrow the payload as a concrete type.
    pub fn payload_as<T: 'static>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl std::fmt::Debug for CustomEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomEvent").finish_non_exhaustive()
    }
}

/// All events a widget can receive, for dispatch.
#[derive(Debug)]
pub enum WidgetEvent {
    MousePress(MousePressEvent),
    MouseRelease(MouseReleaseEvent),
    MouseMove(MouseMoveEvent),
    MouseDoubleClick(MouseDoubleClickEvent),
    Wheel(WheelEvent),
    KeyPress(KeyPressEvent),
    KeyRelease(KeyReleaseEvent),
    FocusIn(FocusInEvent),
    FocusOut(FocusOutEvent),
    Move(MoveEvent),
    Resize(ResizeEvent),
    Show(ShowEvent),
    Hide(HideEvent),
    Timer(TimerEvent),
    ModalInputAttempt(ModalInputAttemptEvent),
    BroughtToFront(BroughtToFrontEvent),
    CloseRequest(CloseRequestEvent),
    ScreenChange(ScreenChangeEvent),
    ModifiersChange(ModifiersChangeEvent),
    Custom(CustomEvent),
}

impl WidgetEvent {
    fn base(&self) -> &EventBase {
        match self {
            Self::MousePress(e) => &e.base,
            Self::MouseRelease(e) => &e.base,
            Self::MouseMove(e) => &e.base,
            Self::MouseDoubleClick(e) => &e.base,
            Self::Wheel(e) => &e.base,
            Self::KeyPress(e) => &e.base,
            Self::KeyRelease(e) => &e.base,
            Self::FocusIn(e) => &e.base,
            Self::FocusOut(e) => &e.base,
            Self::Move(e) => &e.base,
            Self::Resize(e) => &e.base,
            Self::Show(e) => &e.base,
            Self::Hide(e) => &e.base,
            Self::Timer(e) => &e.base,
            Self::ModalInputAttempt(e) => &e.base,
            Self::BroughtToFront(e) => &e.base,
            Self::CloseRequest(e) => &e.base,
            Self::ScreenChange(e) => &e.base,
            Self::ModifiersChange(e) => &e.base,
            Self::Custom(e) => &e.base,
        }
    }

    fn base_mut(&mut self) -> &mut EventBase {
        match self {
            Self::MousePress(e) => &mut e.base,
            Self::MouseRelease(e) => &mut e.base,
            Self::MouseMove(e) => &mut e.base,
            Self::MouseDoubleClick(e) => &mut e.base,
            Self::Wheel(e) => &mut e.base,
            Self::KeyPress(e) => &mut e.base,
            Self::KeyRelease(e) => &mut e.base,
            Self::FocusIn(e) => &mut e.base,
            Self::FocusOut(e) => &mut e.base,
            Self::Move(e) => &mut e.base,
            Self::Resize(e) => &mut e.base,
            Self::Show(e) => &mut e.base,
            Self::Hide(e) => &mut e.base,
            Self::Timer(e) => &mut e.base,
            Self::ModalInputAttempt(e) => &mut e.base,
            Self::BroughtToFront(e) => &mut e.base,
            Self::CloseRequest(e) => &mut e.base,
            Self::ScreenChange(e) => &mut e.base,
            Self::ModifiersChange(e) => &mut e.base,
            Self::Custom(e) => &mut e.base,
        }
    }

    /// Whether the event has been handled.
    pub fn is_accepted(&self) -> bool {
        self.base().is_accepted()
    }

    /// Mark the event as handled.
    pub fn accept(&mut self) {
        self.base_mut().accept();
    }

    /// Whether this event propagates to ancestors when ignored.
    pub fn propagates(&self) -> bool {
        matches!(
            self,
            Self::MousePress(_)
                | Self::MouseRelease(_)
                | Self::MouseDoubleClick(_)
                | Self::Wheel(_)
        )
    }

    /// Position local to the receiving widget, for positioned events.
    pub fn local_pos(&self) -> Option<Point> {
        match self {
            Self::MousePress(e) => Some(e.local_pos),
            Self::MouseRelease(e) => Some(e.local_pos),
            Self::MouseMove(e) => Some(e.local_pos),
            Self::MouseDoubleClick(e) => Some(e.local_pos),
            Self::Wheel(e) => Some(e.local_pos),
            _ => None,
        }
    }

    /// Rewrite the local position, used when retargeting to an ancestor.
    pub(crate) fn set_local_pos(&mut self, pos: Point) {
        match self {
            Self::MousePress(e) => e.local_pos = pos,
            Self::MouseRelease(e) => e.local_pos = pos,
            Self::MouseMove(e) => e.local_pos = pos,
            Self::MouseDoubleClick(e) => e.local_pos = pos,
            Self::Wheel(e) => e.local_pos = pos,
            _ => {}
        }
    }
}
