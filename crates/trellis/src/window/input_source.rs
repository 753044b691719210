//! Pointer input routing.
//!
//! Each pointing device (mouse, pen, touch point) is one
//! [`MouseInputSource`]. The desktop feeds it raw window-space pointer
//! events; the source performs hit testing, press capture, and
//! double-click detection, and dispatches widget events.

use std::time::{Duration, Instant};

use trellis_core::geometry::Point;
use trellis_core::object::ObjectId;

use crate::widget::dispatcher::{EventDispatcher, WidgetAccess};
use crate::widget::events::{
    KeyboardModifiers, MouseButton, MouseDoubleClickEvent, MouseMoveEvent, MousePressEvent,
    MouseReleaseEvent, WheelEvent, WidgetEvent,
};

const DOUBLE_CLICK_TIME: Duration = Duration::from_millis(400);
const DOUBLE_CLICK_DISTANCE: f32 = 5.0;

/// What a pointer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    Down(MouseButton),
    Up(MouseButton),
    Move,
}

/// A raw pointer event in window coordinates.
#[derive(Debug, Clone, Copy)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub position: Point,
    pub modifiers: KeyboardModifiers,
    pub time: Instant,
}

/// One pointing device feeding a widget tree.
pub trait MouseInputSource: Send {
    /// Route a pointer event into the tree rooted at `root`.
    fn handle_event(&mut self, storage: &mut dyn WidgetAccess, root: ObjectId, event: PointerEvent);

    /// Route a wheel event; `event.local_pos` arrives in window space.
    fn handle_wheel(&mut self, storage: &mut dyn WidgetAccess, root: ObjectId, event: WheelEvent);

    /// Let the pointer move without screen-edge clamping (velocity drags).
    fn enable_unbounded_movement(&mut self, enabled: bool) {
        let _ = enabled;
    }

    /// The widget currently under (or captured by) this pointer.
    fn widget_under_pointer(&self) -> Option<ObjectId> {
        None
    }
}

/// Standard mouse behavior: press capture, hover tracking, and
/// double-click synthesis.
pub struct DefaultMouseSource {
    captured: Option<ObjectId>,
    over: Option<ObjectId>,
    unbounded: bool,
    last_click_time: Option<Instant>,
    last_click_pos: Point,
}

impl DefaultMouseSource {
    pub fn new() -> Self {
        Self {
            captured: None,
            over: None,
            unbounded: false,
            last_click_time: None,
            last_click_pos: Point::ZERO,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.unbounded
    }

    fn is_double_click(&self, position: Point, time: Instant) -> bool {
        match self.last_click_time {
            Some(last) => {
                time.duration_since(last) <= DOUBLE_CLICK_TIME
                    && self.last_click_pos.distance_to(position) <= DOUBLE_CLICK_DISTANCE
            }
            None => false,
        }
    }

    fn deliver_press(
        &mut self,
        storage: &mut dyn WidgetAccess,
        target: ObjectId,
        button: MouseButton,
        event: PointerEvent,
    ) {
        let Some(local) = EventDispatcher::window_to_local(storage, target, event.position) else {
            return;
        };
        let mut widget_event = if self.is_double_click(event.position, event.time) {
            self.last_click_time = None;
            WidgetEvent::MouseDoubleClick(MouseDoubleClickEvent::new(
                button,
                local,
                event.position,
                event.modifiers,
                event.time,
            ))
        } else {
            self.last_click_time = Some(event.time);
            self.last_click_pos = event.position;
            WidgetEvent::MousePress(MousePressEvent::new(
                button,
                local,
                event.position,
                event.modifiers,
                event.time,
            ))
        };
        EventDispatcher::send_event(storage, target, &mut widget_event);
    }
}

impl Default for DefaultMouseSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MouseInputSource for DefaultMouseSource {
    fn handle_event(&mut self, storage: &mut dyn WidgetAccess, root: ObjectId, event: PointerEvent) {
        match event.kind {
            PointerEventKind::Down(button) => {
                let hit = EventDispatcher::hit_test(storage, root, event.position);
                self.captured = hit;
                self.over = hit;
                if let Some(target) = hit {
                    self.deliver_press(storage, target, button, event);
                    // The handler may have destroyed the widget.
                    if !EventDispatcher::is_live(storage, self.captured.unwrap_or(target)) {
                        self.captured = None;
                        self.over = None;
                    }
                }
            }
            PointerEventKind::Move => {
                let target = match self.captured {
                    Some(captured) if EventDispatcher::is_live(storage, captured) => Some(captured),
                    Some(_) => {
                        self.captured = None;
                        None
                    }
                    None => {
                        let hit = EventDispatcher::hit_test(storage, root, event.position);
                        self.over = hit;
                        hit
                    }
                };
                if let Some(target) = target
                    && let Some(local) =
                        EventDispatcher::window_to_local(storage, target, event.position)
                {
                    let mut widget_event = WidgetEvent::MouseMove(MouseMoveEvent::new(
                        local,
                        event.position,
                        event.modifiers,
                        event.time,
                    ));
                    EventDispatcher::send_event_direct(storage, target, &mut widget_event);
                }
            }
            PointerEventKind::Up(button) => {
                let target = self.captured.take();
                self.unbounded = false;
                if let Some(target) = target
                    && let Some(local) =
                        EventDispatcher::window_to_local(storage, target, event.position)
                {
                    let mut widget_event = WidgetEvent::MouseRelease(MouseReleaseEvent::new(
                        button,
                        local,
                        event.position,
                        event.modifiers,
                        event.time,
                    ));
                    EventDispatcher::send_event_direct(storage, target, &mut widget_event);
                }
            }
        }
    }

    fn handle_wheel(&mut self, storage: &mut dyn WidgetAccess, root: ObjectId, event: WheelEvent) {
        let window_pos = event.local_pos;
        let Some(target) = EventDispatcher::hit_test(storage, root, window_pos) else {
            return;
        };
        let Some(local) = EventDispatcher::window_to_local(storage, target, window_pos) else {
            return;
        };
        let mut wheel = event;
        wheel.local_pos = local;
        let mut widget_event = WidgetEvent::Wheel(wheel);
        EventDispatcher::send_event(storage, target, &mut widget_event);
    }

    fn enable_unbounded_movement(&mut self, enabled: bool) {
        self.unbounded = enabled;
    }

    fn widget_under_pointer(&self) -> Option<ObjectId> {
        self.captured.or(self.over)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::Widget;
    use crate::widget::base::WidgetBase;
    use crate::widget::store::WidgetStore;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI32, Ordering};
    use trellis_core::geometry::Rect;
    use trellis_core::object::init_global_registry;

    struct Recorder {
        base: WidgetBase,
        presses: Arc<AtomicI32>,
        moves: Arc<AtomicI32>,
        releases: Arc<AtomicI32>,
        double_clicks: Arc<AtomicI32>,
    }

    impl Recorder {
        fn new(base: WidgetBase) -> Self {
            Self {
                base,
                presses: Arc::new(AtomicI32::new(0)),
                moves: Arc::new(AtomicI32::new(0)),
                releases: Arc::new(AtomicI32::new(0)),
                double_clicks: Arc::new(AtomicI32::new(0)),
            }
        }
    }

    impl Widget for Recorder {
        fn widget_base(&self) -> &WidgetBase {
            &self.base
        }

        fn widget_base_mut(&mut self) -> &mut WidgetBase {
            &mut self.base
        }

        fn event(&mut self, event: &mut WidgetEvent) -> bool {
            match event {
                WidgetEvent::MousePress(_) => self.presses.fetch_add(1, Ordering::SeqCst),
                WidgetEvent::MouseMove(_) => self.moves.fetch_add(1, Ordering::SeqCst),
                WidgetEvent::MouseRelease(_) => self.releases.fetch_add(1, Ordering::SeqCst),
                WidgetEvent::MouseDoubleClick(_) => {
                    self.double_clicks.fetch_add(1, Ordering::SeqCst)
                }
                _ => return false,
            };
            true
        }
    }

    fn pointer(kind: PointerEventKind, x: f32, y: f32, time: Instant) -> PointerEvent {
        PointerEvent {
            kind,
            position: Point::new(x, y),
            modifiers: KeyboardModifiers::NONE,
            time,
        }
    }

    fn setup() -> (WidgetStore, ObjectId, Arc<AtomicI32>, Arc<AtomicI32>, Arc<AtomicI32>) {
        init_global_registry();
        let mut store = WidgetStore::new();
        let mut root_base = WidgetBase::new();
        root_base.set_rect(Rect::new(0.0, 0.0, 200.0, 200.0));
        let root = store.insert(Recorder::new(root_base));

        let mut child_base = WidgetBase::new_child(root);
        child_base.set_rect(Rect::new(50.0, 50.0, 100.0, 100.0));
        let child = Recorder::new(child_base);
        let presses = Arc::clone(&child.presses);
        let moves = Arc::clone(&child.moves);
        let releases = Arc::clone(&child.releases);
        store.insert(child);
        (store, root, presses, moves, releases)
    }

    #[test]
    fn press_captures_and_routes_the_gesture() {
        let (mut store, root, presses, moves, releases) = setup();
        let mut source = DefaultMouseSource::new();
        let t0 = Instant::now();

        source.handle_event(&mut store, root, pointer(PointerEventKind::Down(MouseButton::Left), 60.0, 60.0, t0));
        assert_eq!(presses.load(Ordering::SeqCst), 1);

        // Moves outside the child still go to it while captured.
        source.handle_event(&mut store, root, pointer(PointerEventKind::Move, 10.0, 10.0, t0));
        assert_eq!(moves.load(Ordering::SeqCst), 1);

        source.handle_event(&mut store, root, pointer(PointerEventKind::Up(MouseButton::Left), 10.0, 10.0, t0));
        assert_eq!(releases.load(Ordering::SeqCst), 1);

        // Capture released: this move goes to whatever is under the pointer.
        source.handle_event(&mut store, root, pointer(PointerEventKind::Move, 10.0, 10.0, t0));
        assert_eq!(moves.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn quick_second_click_becomes_a_double_click() {
        init_global_registry();
        let mut store = WidgetStore::new();
        let mut base = WidgetBase::new();
        base.set_rect(Rect::new(0.0, 0.0, 100.0, 100.0));
        let widget = Recorder::new(base);
        let double_clicks = Arc::clone(&widget.double_clicks);
        let presses = Arc::clone(&widget.presses);
        let root = store.insert(widget);

        let mut source = DefaultMouseSource::new();
        let t0 = Instant::now();
        let down = |t| pointer(PointerEventKind::Down(MouseButton::Left), 50.0, 50.0, t);
        let up = |t| pointer(PointerEventKind::Up(MouseButton::Left), 50.0, 50.0, t);

        source.handle_event(&mut store, root, down(t0));
        source.handle_event(&mut store, root, up(t0));
        source.handle_event(&mut store, root, down(t0 + Duration::from_millis(100)));
        assert_eq!(presses.load(Ordering::SeqCst), 1);
        assert_eq!(double_clicks.load(Ordering::SeqCst), 1);

        // A third quick click starts a fresh press, not another double.
        source.handle_event(&mut store, root, up(t0 + Duration::from_millis(120)));
        source.handle_event(&mut store, root, down(t0 + Duration::from_millis(200)));
        assert_eq!(presses.load(Ordering::SeqCst), 2);
        assert_eq!(double_clicks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn slow_or_distant_second_click_stays_a_press() {
        init_global_registry();
        let mut store = WidgetStore::new();
        let mut base = WidgetBase::new();
        base.set_rect(Rect::new(0.0, 0.0, 100.0, 100.0));
        let widget = Recorder::new(base);
        let double_clicks = Arc::clone(&widget.double_clicks);
        let presses = Arc::clone(&widget.presses);
        let root = store.insert(widget);

        let mut source = DefaultMouseSource::new();
        let t0 = Instant::now();

        source.handle_event(&mut store, root, pointer(PointerEventKind::Down(MouseButton::Left), 50.0, 50.0, t0));
        source.handle_event(&mut store, root, pointer(PointerEventKind::Up(MouseButton::Left), 50.0, 50.0, t0));
        // Too far away.
        source.handle_event(
            &mut store,
            root,
            pointer(PointerEventKind::Down(MouseButton::Left), 80.0, 50.0, t0 + Duration::from_millis(100)),
        );
        assert_eq!(presses.load(Ordering::SeqCst), 2);

        source.handle_event(&mut store, root, pointer(PointerEventKind::Up(MouseButton::Left), 80.0, 50.0, t0));
        // Too slow.
        source.handle_event(
            &mut store,
            root,
            pointer(PointerEventKind::Down(MouseButton::Left), 80.0, 50.0, t0 + Duration::from_millis(900)),
        );
        assert_eq!(presses.load(Ordering::SeqCst), 3);
        assert_eq!(double_clicks.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn wheel_routes_to_the_widget_under_the_pointer() {
        init_global_registry();
        let mut store = WidgetStore::new();
        let mut root_base = WidgetBase::new();
        root_base.set_rect(Rect::new(0.0, 0.0, 200.0, 200.0));
        let root = store.insert(Recorder::new(root_base));

        struct WheelProbe {
            base: WidgetBase,
            local: Arc<parking_lot::Mutex<Option<Point>>>,
        }
        impl Widget for WheelProbe {
            fn widget_base(&self) -> &WidgetBase {
                &self.base
            }
            fn widget_base_mut(&mut self) -> &mut WidgetBase {
                &mut self.base
            }
            fn event(&mut self, event: &mut WidgetEvent) -> bool {
                if let WidgetEvent::Wheel(e) = event {
                    *self.local.lock() = Some(e.local_pos);
                    return true;
                }
                false
            }
        }

        let mut child_base = WidgetBase::new_child(root);
        child_base.set_rect(Rect::new(50.0, 50.0, 100.0, 100.0));
        let local = Arc::new(parking_lot::Mutex::new(None));
        store.insert(WheelProbe {
            base: child_base,
            local: Arc::clone(&local),
        });

        let mut source = DefaultMouseSource::new();
        source.handle_wheel(
            &mut store,
            root,
            WheelEvent::new(
                Point::new(70.0, 90.0),
                0.0,
                1.0,
                false,
                KeyboardModifiers::NONE,
                Instant::now(),
            ),
        );
        assert_eq!(*local.lock(), Some(Point::new(20.0, 40.0)));
    }
}
