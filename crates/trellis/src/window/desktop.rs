//! Desktop: the bridge between native window callbacks and the widget
//! tree.
//!
//! Platform glue reports raw events (pointer, key, drag, paint, window
//! state) against a [`PeerId`]; the desktop resolves targets, applies
//! modal blocking and focus rules, and dispatches widget events. Work
//! that must not run inside a platform callback (drop delivery, popup
//! menu results) is queued as a [`DeferredAction`] and drained by the
//! host between callbacks.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use slotmap::SlotMap;
use trellis_core::geometry::{Point, Rect};
use trellis_core::object::{ObjectId, global_registry};
use trellis_core::signal::Signal;
use trellis_core::timer::TimerService;

use crate::style::{Canvas, DefaultLookAndFeel, LookAndFeel, PaintContext};
use crate::widget::dispatcher::{DispatchResult, EventDispatcher, WidgetAccess};
use crate::widget::drag_drop::{self, DragInfo, DragPayload};
use crate::widget::events::{
    BroughtToFrontEvent, CloseRequestEvent, CustomEvent, FocusReason, HideEvent, Key,
    KeyPressEvent, KeyReleaseEvent, KeyboardModifiers, ModifiersChangeEvent, MoveEvent,
    ResizeEvent, ScreenChangeEvent, ShowEvent, TimerEvent, WidgetEvent,
};
use crate::widget::focus::FocusManager;
use crate::widget::modal::ModalManager;
use crate::window::input_source::{
    DefaultMouseSource, MouseInputSource, PointerEvent, PointerEventKind,
};
use crate::window::peer::{PeerId, StyleFlags, WindowPeer};

/// Work queued during a platform callback, run afterwards by
/// [`Desktop::run_deferred_actions`].
pub enum DeferredAction {
    /// Deliver a completed file drop.
    DropFiles {
        target: ObjectId,
        files: Vec<PathBuf>,
        position: Point,
    },
    /// Deliver a completed text drop.
    DropText {
        target: ObjectId,
        text: String,
        position: Point,
    },
    /// Deliver an arbitrary payload as a custom widget event.
    Custom {
        target: ObjectId,
        payload: Box<dyn Any + Send>,
    },
}

/// Owns the window peers and all per-desktop input state.
pub struct Desktop {
    peers: SlotMap<PeerId, WindowPeer>,
    last_unique_id: u64,
    focus: FocusManager,
    modal: ModalManager,
    modifiers: KeyboardModifiers,
    sources: Vec<Box<dyn MouseInputSource>>,
    timers: Arc<TimerService>,
    deferred: VecDeque<DeferredAction>,
    look_and_feel: Box<dyn LookAndFeel>,

    /// Signal emitted whenever the focused widget changes.
    pub focus_changed: Signal<Option<ObjectId>>,
}

impl Desktop {
    /// A desktop with one standard mouse source.
    pub fn new() -> Self {
        Self {
            peers: SlotMap::with_key(),
            last_unique_id: 1,
            focus: FocusManager::new(),
            modal: ModalManager::new(),
            modifiers: KeyboardModifiers::NONE,
            sources: vec![Box::new(DefaultMouseSource::new())],
            timers: Arc::new(TimerService::new()),
            deferred: VecDeque::new(),
            look_and_feel: Box::new(DefaultLookAndFeel::new()),
            focus_changed: Signal::new(),
        }
    }

    // ===== Peers =====

    /// Register a window showing `root`.
    pub fn create_peer(&mut self, root: ObjectId, bounds: Rect, style_flags: StyleFlags) -> PeerId {
        // Odd ids, never zero, so platform glue can use 0 as "no window".
        self.last_unique_id += 2;
        let unique_id = self.last_unique_id;
        tracing::debug!(target: "trellis::desktop", ?root, unique_id, "create peer");
        self.peers
            .insert(WindowPeer::new(unique_id, root, bounds, style_flags))
    }

    /// Remove a window, clearing focus bookkeeping that pointed into it.
    pub fn destroy_peer(&mut self, id: PeerId) -> bool {
        let removed = self.peers.remove(id).is_some();
        if removed {
            tracing::debug!(target: "trellis::desktop", ?id, "destroy peer");
            self.focus_changed.emit(self.focus.focused_widget());
        }
        removed
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn peer(&self, id: PeerId) -> Option<&WindowPeer> {
        self.peers.get(id)
    }

    pub fn peer_mut(&mut self, id: PeerId) -> Option<&mut WindowPeer> {
        self.peers.get_mut(id)
    }

    pub fn is_valid_peer(&self, id: PeerId) -> bool {
        self.peers.contains_key(id)
    }

    /// The peer whose root is `widget` or one of its ancestors.
    pub fn peer_for_widget(&self, widget: ObjectId) -> Option<PeerId> {
        self.peers
            .iter()
            .find(|(_, peer)| global_registry().is_ancestor_of(peer.root_widget(), widget))
            .map(|(id, _)| id)
    }

    // ===== Services =====

    pub fn focus_manager(&mut self) -> &mut FocusManager {
        &mut self.focus
    }

    pub fn modal_manager(&mut self) -> &mut ModalManager {
        &mut self.modal
    }

    /// Shared timer service; widgets keep a clone for their own timers.
    pub fn timer_service(&self) -> Arc<TimerService> {
        Arc::clone(&self.timers)
    }

    pub fn set_look_and_feel(&mut self, look_and_feel: Box<dyn LookAndFeel>) {
        self.look_and_feel = look_and_feel;
    }

    /// Modifier state as of the last reported input event.
    pub fn current_modifiers(&self) -> KeyboardModifiers {
        self.modifiers
    }

    pub fn add_mouse_source(&mut self, source: Box<dyn MouseInputSource>) -> usize {
        self.sources.push(source);
        self.sources.len() - 1
    }

    /// Queue work to run outside the current platform callback.
    pub fn defer(&mut self, action: DeferredAction) {
        self.deferred.push_back(action);
    }

    /// Drain the deferred queue, re-checking target liveness per item.
    pub fn run_deferred_actions<S: WidgetAccess + ?Sized>(&mut self, storage: &mut S) {
        while let Some(action) = self.deferred.pop_front() {
            match action {
                DeferredAction::DropFiles {
                    target,
                    files,
                    position,
                } => {
                    let Some(local) = EventDispatcher::window_to_local(storage, target, position)
                    else {
                        continue;
                    };
                    if let Some(widget) = storage.get_widget_mut(target)
                        && let Some(drop_target) = widget.as_file_drop_target()
                    {
                        drop_target.files_dropped(&files, local);
                    }
                }
                DeferredAction::DropText {
                    target,
                    text,
                    position,
                } => {
                    let Some(local) = EventDispatcher::window_to_local(storage, target, position)
                    else {
                        continue;
                    };
                    if let Some(widget) = storage.get_widget_mut(target)
                        && let Some(drop_target) = widget.as_text_drop_target()
                    {
                        drop_target.text_dropped(&text, local);
                    }
                }
                DeferredAction::Custom { target, payload } => {
                    let mut event = WidgetEvent::Custom(CustomEvent::new(payload));
                    EventDispatcher::send_event_direct(storage, target, &mut event);
                }
            }
        }
    }

    /// Fire due timers as widget events.
    pub fn process_timers<S: WidgetAccess + ?Sized>(&mut self, storage: &mut S, now: Instant) {
        for (timer_id, owner) in self.timers.poll(now) {
            let mut event = WidgetEvent::Timer(TimerEvent::new(timer_id, now));
            EventDispatcher::send_event_direct(storage, owner, &mut event);
        }
    }

    // ===== Keyboard =====

    /// Route a key press: focused widget's key listeners first (newest
    /// registration first), then the widget itself, then Tab traversal,
    /// then each ancestor in turn.
    pub fn handle_key_press<S: WidgetAccess + ?Sized>(
        &mut self,
        storage: &mut S,
        peer_id: PeerId,
        event: KeyPressEvent,
    ) -> bool {
        self.modifiers = event.modifiers;
        let Some(peer) = self.peers.get(peer_id) else {
            return false;
        };
        if peer.style_flags().contains(StyleFlags::IGNORES_KEY_PRESSES) {
            return false;
        }
        let root = peer.root_widget();

        let focused = self.focus.focused_widget().filter(|id| {
            global_registry().is_ancestor_of(root, *id) && EventDispatcher::is_live(storage, *id)
        });
        let mut target = focused.unwrap_or(root);
        if self.modal.is_blocked(target) {
            match self.modal.current_modal() {
                Some(modal) => target = modal,
                None => return false,
            }
        }

        loop {
            // Newest listeners first; skip any removed mid-walk, and stop
            // if a listener destroys the target.
            let listeners = match storage.get_widget(target) {
                Some(widget) => widget.widget_base().key_listeners_snapshot(),
                None => return false,
            };
            for (listener_id, listener) in listeners {
                let still_registered = storage
                    .get_widget(target)
                    .map(|w| w.widget_base().has_key_listener(listener_id))
                    .unwrap_or(false);
                if !still_registered {
                    continue;
                }
                let used = listener.key_pressed(&event, target);
                if used {
                    return true;
                }
                if !EventDispatcher::is_live(storage, target) {
                    return false;
                }
            }

            let mut widget_event = WidgetEvent::KeyPress(event);
            match EventDispatcher::send_event_direct(storage, target, &mut widget_event) {
                DispatchResult::Accepted => return true,
                DispatchResult::WidgetNotFound => return false,
                DispatchResult::Ignored => {}
            }
            if !EventDispatcher::is_live(storage, target) {
                return false;
            }

            // Unconsumed Tab moves focus along the tab order.
            if event.key == Key::Tab
                && focused.is_some()
                && (event.modifiers == KeyboardModifiers::NONE
                    || event.modifiers == KeyboardModifiers::SHIFT)
            {
                let moved = if event.modifiers.shift {
                    self.focus.focus_previous(storage, root)
                } else {
                    self.focus.focus_next(storage, root)
                };
                if moved {
                    self.focus_changed.emit(self.focus.focused_widget());
                }
                return moved;
            }

            match global_registry().parent_of(target) {
                Some(parent) => target = parent,
                None => return false,
            }
        }
    }

    /// Route a key up/down state change through the same listener-first,
    /// ancestor-climbing path as a press.
    pub fn handle_key_state_change<S: WidgetAccess + ?Sized>(
        &mut self,
        storage: &mut S,
        peer_id: PeerId,
        key: Key,
        is_down: bool,
    ) -> bool {
        let Some(peer) = self.peers.get(peer_id) else {
            return false;
        };
        if peer.style_flags().contains(StyleFlags::IGNORES_KEY_PRESSES) {
            return false;
        }
        let root = peer.root_widget();

        let focused = self.focus.focused_widget().filter(|id| {
            global_registry().is_ancestor_of(root, *id) && EventDispatcher::is_live(storage, *id)
        });
        let mut target = focused.unwrap_or(root);
        if self.modal.is_blocked(target) {
            match self.modal.current_modal() {
                Some(modal) => target = modal,
                None => return false,
            }
        }

        loop {
            let listeners = match storage.get_widget(target) {
                Some(widget) => widget.widget_base().key_listeners_snapshot(),
                None => return false,
            };
            for (listener_id, listener) in listeners {
                let still_registered = storage
                    .get_widget(target)
                    .map(|w| w.widget_base().has_key_listener(listener_id))
                    .unwrap_or(false);
                if !still_registered {
                    continue;
                }
                let used = listener.key_state_changed(is_down, target);
                if used {
                    return true;
                }
                if !EventDispatcher::is_live(storage, target) {
                    return false;
                }
            }

            if !is_down {
                let mut widget_event =
                    WidgetEvent::KeyRelease(KeyReleaseEvent::new(key, self.modifiers));
                match EventDispatcher::send_event_direct(storage, target, &mut widget_event) {
                    DispatchResult::Accepted => return true,
                    DispatchResult::WidgetNotFound => return false,
                    DispatchResult::Ignored => {}
                }
                if !EventDispatcher::is_live(storage, target) {
                    return false;
                }
            }

            match global_registry().parent_of(target) {
                Some(parent) => target = parent,
                None => return false,
            }
        }
    }

    /// Modifier state changed without a key event. The widget under the
    /// pointer hears about it first, so velocity-mode drags can react.
    pub fn handle_modifier_keys_change<S: WidgetAccess + ?Sized>(
        &mut self,
        storage: &mut S,
        peer_id: PeerId,
        modifiers: KeyboardModifiers,
    ) {
        self.modifiers = modifiers;
        let Some(peer) = self.peers.get(peer_id) else {
            return;
        };
        let root = peer.root_widget();
        let target = self
            .sources
            .iter()
            .find_map(|source| source.widget_under_pointer())
            .or_else(|| self.focus.focused_widget())
            .unwrap_or(root);

        let mut event = WidgetEvent::ModifiersChange(ModifiersChangeEvent::new(modifiers));
        EventDispatcher::send_event_direct(storage, target, &mut event);
    }

    // ===== Pointer =====

    /// Route a raw pointer event through the numbered input source.
    pub fn handle_mouse_event<S: WidgetAccess>(
        &mut self,
        storage: &mut S,
        peer_id: PeerId,
        source_index: usize,
        event: PointerEvent,
    ) {
        self.modifiers = event.modifiers;
        let Some(peer) = self.peers.get(peer_id) else {
            return;
        };
        if peer.style_flags().contains(StyleFlags::IGNORES_MOUSE_CLICKS) {
            return;
        }
        let root = peer.root_widget();

        if let PointerEventKind::Down(_) = event.kind
            && let Some(hit) = EventDispatcher::hit_test(storage, root, event.position)
        {
            if self.modal.is_blocked(hit) {
                self.modal.deliver_modal_input_attempt(storage);
                return;
            }
            if self.focus.focus_on_click(storage, hit, event.position) {
                self.focus_changed.emit(self.focus.focused_widget());
            }
        }

        let Some(source) = self.sources.get_mut(source_index) else {
            debug_assert!(false, "mouse event from unregistered source {source_index}");
            tracing::error!(
                target: "trellis::desktop",
                source_index,
                "mouse event from unregistered source"
            );
            return;
        };
        source.handle_event(storage, root, event);
    }

    /// Route a wheel event; `event.local_pos` arrives in window space.
    pub fn handle_wheel<S: WidgetAccess>(
        &mut self,
        storage: &mut S,
        peer_id: PeerId,
        source_index: usize,
        event: crate::widget::events::WheelEvent,
    ) {
        self.modifiers = event.modifiers;
        let Some(peer) = self.peers.get(peer_id) else {
            return;
        };
        let root = peer.root_widget();

        if let Some(hit) = EventDispatcher::hit_test(storage, root, event.local_pos)
            && self.modal.is_blocked(hit)
        {
            tracing::trace!(target: "trellis::desktop", ?hit, "wheel discarded by modal");
            return;
        }

        let Some(source) = self.sources.get_mut(source_index) else {
            debug_assert!(false, "wheel event from unregistered source {source_index}");
            tracing::error!(
                target: "trellis::desktop",
                source_index,
                "wheel event from unregistered source"
            );
            return;
        };
        source.handle_wheel(storage, root, event);
    }

    // ===== Drag and drop =====

    /// Track an external drag across the window. Returns whether the drag
    /// is currently over a target that accepted it.
    pub fn handle_drag_move<S: WidgetAccess + ?Sized>(
        &mut self,
        storage: &mut S,
        peer_id: PeerId,
        info: &DragInfo,
    ) -> bool {
        let Some(peer) = self.peers.get_mut(peer_id) else {
            return false;
        };
        let root = peer.root_widget();
        let hit = if peer.is_point_masked(info.position) {
            None
        } else {
            EventDispatcher::hit_test(storage, root, info.position)
        };

        // The interest query runs only when the hit widget changes, so a
        // target that said yes stays locked for the rest of the hover.
        if hit != peer.last_drag_widget {
            peer.last_drag_widget = hit;
            let last = peer.drag_target;
            let next = drag_drop::find_drop_target(storage, hit, info, last);
            if next != last {
                if let Some(old) = last {
                    peer.drag_target = None;
                    send_drag_exit(storage, old, info);
                }
                if let Some(new) = next {
                    peer.drag_target = Some(new);
                    send_drag_enter(storage, new, info);
                }
            }
        }

        let Some(target) = peer.drag_target else {
            return false;
        };
        if !EventDispatcher::is_live(storage, target) {
            peer.drag_target = None;
            return false;
        }
        send_drag_over(storage, target, info);
        true
    }

    /// The drag left the window (or was cancelled).
    pub fn handle_drag_exit<S: WidgetAccess + ?Sized>(
        &mut self,
        storage: &mut S,
        peer_id: PeerId,
        info: &DragInfo,
    ) {
        // An off-window position makes the normal move path fire the exit.
        self.handle_drag_move(storage, peer_id, &info.at(Point::new(-1.0, -1.0)));
        if let Some(peer) = self.peers.get_mut(peer_id) {
            peer.last_drag_widget = None;
            debug_assert!(peer.drag_target.is_none());
            peer.drag_target = None;
        }
    }

    /// The payload was dropped. Delivery is deferred; returns whether a
    /// target had accepted the drag.
    pub fn handle_drag_drop<S: WidgetAccess + ?Sized>(
        &mut self,
        storage: &mut S,
        peer_id: PeerId,
        info: &DragInfo,
    ) -> bool {
        self.handle_drag_move(storage, peer_id, info);
        let Some(peer) = self.peers.get_mut(peer_id) else {
            return false;
        };
        let target = peer.drag_target.take();
        peer.last_drag_widget = None;
        let Some(target) = target else {
            return false;
        };

        if self.modal.is_blocked(target) {
            self.modal.deliver_modal_input_attempt(storage);
            if self.modal.is_blocked(target) {
                tracing::debug!(target: "trellis::desktop", ?target, "drop discarded by modal");
                return true;
            }
        }

        match &info.payload {
            DragPayload::Files(files) => self.defer(DeferredAction::DropFiles {
                target,
                files: files.clone(),
                position: info.position,
            }),
            DragPayload::Text(text) => self.defer(DeferredAction::DropText {
                target,
                text: text.clone(),
                position: info.position,
            }),
        }
        true
    }

    // ===== Window state =====

    /// Repaint the window's widget tree. A panicking paint handler is
    /// contained so the platform callback can return normally.
    pub fn handle_paint<S: WidgetAccess + ?Sized>(
        &mut self,
        storage: &mut S,
        peer_id: PeerId,
        canvas: &mut dyn Canvas,
    ) {
        let Some(peer) = self.peers.get_mut(peer_id) else {
            return;
        };
        let root = peer.root_widget();
        peer.last_paint_time = Instant::now();

        let look_and_feel = self.look_and_feel.as_ref();
        let result = catch_unwind(AssertUnwindSafe(|| {
            paint_recursive(storage, root, canvas, look_and_feel);
        }));
        if result.is_err() {
            tracing::error!(target: "trellis::desktop", ?root, "paint handler panicked");
        }
    }

    /// The native window moved or resized (or its minimized/fullscreen
    /// state changed). Move/Resize events fire only for the dimensions
    /// that actually changed.
    pub fn handle_moved_or_resized<S: WidgetAccess + ?Sized>(
        &mut self,
        storage: &mut S,
        peer_id: PeerId,
        new_bounds: Rect,
        minimized: bool,
        fullscreen: bool,
    ) {
        let Some(peer) = self.peers.get_mut(peer_id) else {
            return;
        };
        let root = peer.root_widget();
        let old_bounds = peer.bounds;

        peer.fullscreen = fullscreen;
        if !fullscreen {
            peer.last_non_fullscreen_bounds = new_bounds;
        }

        let moved = new_bounds.origin != old_bounds.origin;
        let resized = new_bounds.size != old_bounds.size;
        if moved || resized {
            peer.bounds = new_bounds;
            if let Some(widget) = storage.get_widget_mut(root) {
                let rect = widget.widget_base().rect();
                widget
                    .widget_base_mut()
                    .set_rect(rect.with_origin(Point::ZERO).with_size(new_bounds.size));
            }
            if moved {
                let mut event =
                    WidgetEvent::Move(MoveEvent::new(old_bounds.origin, new_bounds.origin));
                EventDispatcher::send_event_direct(storage, root, &mut event);
            }
            // The move handler may have destroyed the tree.
            if resized && EventDispatcher::is_live(storage, root) {
                let mut event =
                    WidgetEvent::Resize(ResizeEvent::new(old_bounds.size, new_bounds.size));
                EventDispatcher::send_event_direct(storage, root, &mut event);
            }
        }

        if !EventDispatcher::is_live(storage, root) {
            return;
        }
        let Some(peer) = self.peers.get_mut(peer_id) else {
            return;
        };
        if peer.minimized != minimized {
            peer.minimized = minimized;
            let mut event = if minimized {
                WidgetEvent::Hide(HideEvent::new())
            } else {
                WidgetEvent::Show(ShowEvent::new())
            };
            EventDispatcher::send_event_direct(storage, root, &mut event);
        }
    }

    /// The window gained keyboard focus: restore the widget that held
    /// focus when it was lost, or fall back to the root.
    pub fn handle_focus_gain<S: WidgetAccess + ?Sized>(
        &mut self,
        storage: &mut S,
        peer_id: PeerId,
    ) {
        let Some(peer) = self.peers.get(peer_id) else {
            return;
        };
        let root = peer.root_widget();
        let remembered = peer
            .last_focused_widget
            .filter(|id| {
                global_registry().is_ancestor_of(root, *id)
                    && EventDispatcher::is_live(storage, *id)
            })
            .unwrap_or(root);

        if self.modal.is_blocked(remembered) {
            self.modal.deliver_modal_input_attempt(storage);
            return;
        }
        self.focus
            .set_focus(storage, Some(remembered), FocusReason::Window);
        self.focus_changed.emit(self.focus.focused_widget());
    }

    /// The window lost keyboard focus.
    pub fn handle_focus_loss<S: WidgetAccess + ?Sized>(
        &mut self,
        storage: &mut S,
        peer_id: PeerId,
    ) {
        let remembered = self.focus.focused_widget();
        if let Some(peer) = self.peers.get_mut(peer_id) {
            peer.last_focused_widget = remembered;
        }
        self.focus.clear_focus(storage, FocusReason::Window);
        self.focus_changed.emit(None);
    }

    /// The window was raised above its siblings.
    pub fn handle_brought_to_front<S: WidgetAccess + ?Sized>(
        &mut self,
        storage: &mut S,
        peer_id: PeerId,
    ) {
        let Some(peer) = self.peers.get(peer_id) else {
            return;
        };
        let root = peer.root_widget();
        if self.modal.is_blocked(root) {
            self.modal.deliver_modal_input_attempt(storage);
            return;
        }
        let mut event = WidgetEvent::BroughtToFront(BroughtToFrontEvent::new());
        EventDispatcher::send_event_direct(storage, root, &mut event);
    }

    /// The user asked to close the window. Returns whether the root
    /// consented.
    pub fn handle_user_closing_window<S: WidgetAccess + ?Sized>(
        &mut self,
        storage: &mut S,
        peer_id: PeerId,
    ) -> bool {
        let Some(peer) = self.peers.get(peer_id) else {
            return false;
        };
        let root = peer.root_widget();
        let mut event = WidgetEvent::CloseRequest(CloseRequestEvent::new());
        EventDispatcher::send_event_direct(storage, root, &mut event) == DispatchResult::Accepted
    }

    /// The available screen area changed.
    pub fn handle_screen_size_change<S: WidgetAccess + ?Sized>(
        &mut self,
        storage: &mut S,
        peer_id: PeerId,
        available_area: Rect,
    ) {
        let Some(peer) = self.peers.get(peer_id) else {
            return;
        };
        let root = peer.root_widget();
        let mut event = WidgetEvent::ScreenChange(ScreenChangeEvent::new(available_area));
        EventDispatcher::send_event_direct(storage, root, &mut event);
    }

}

impl Default for Desktop {
    fn default() -> Self {
        Self::new()
    }
}

fn paint_recursive<S: WidgetAccess + ?Sized>(
    storage: &mut S,
    id: ObjectId,
    canvas: &mut dyn Canvas,
    look_and_feel: &dyn LookAndFeel,
) {
    let rect = {
        let Some(widget) = storage.get_widget(id) else {
            return;
        };
        if !widget.widget_base().is_visible() {
            return;
        }
        widget.widget_base().rect()
    };
    if let Some(widget) = storage.get_widget_mut(id) {
        let mut ctx = PaintContext {
            canvas,
            look_and_feel,
            rect: rect.with_origin(Point::ZERO),
        };
        widget.paint(&mut ctx);
    }
    for child in global_registry().children_of(id) {
        let Some(origin) = storage
            .get_widget(child)
            .map(|w| w.widget_base().rect().origin)
        else {
            continue;
        };
        canvas.push_translation(origin);
        paint_recursive(storage, child, canvas, look_and_feel);
        canvas.pop_translation();
    }
}

fn send_drag_enter<S: WidgetAccess + ?Sized>(storage: &mut S, target: ObjectId, info: &DragInfo) {
    let Some(local) = EventDispatcher::window_to_local(storage, target, info.position) else {
        return;
    };
    let Some(widget) = storage.get_widget_mut(target) else {
        return;
    };
    match &info.payload {
        DragPayload::Files(files) => {
            if let Some(drop_target) = widget.as_file_drop_target() {
                drop_target.file_drag_enter(files, local);
            }
        }
        DragPayload::Text(text) => {
            if let Some(drop_target) = widget.as_text_drop_target() {
                drop_target.text_drag_enter(text, local);
            }
        }
    }
}

fn send_drag_over<S: WidgetAccess + ?Sized>(storage: &mut S, target: ObjectId, info: &DragInfo) {
    let Some(local) = EventDispatcher::window_to_local(storage, target, info.position) else {
        return;
    };
    let Some(widget) = storage.get_widget_mut(target) else {
        return;
    };
    match &info.payload {
        DragPayload::Files(files) => {
            if let Some(drop_target) = widget.as_file_drop_target() {
                drop_target.file_drag_move(files, local);
            }
        }
        DragPayload::Text(text) => {
            if let Some(drop_target) = widget.as_text_drop_target() {
                drop_target.text_drag_move(text, local);
            }
        }
    }
}

fn send_drag_exit<S: WidgetAccess + ?Sized>(storage: &mut S, target: ObjectId, info: &DragInfo) {
    let Some(widget) = storage.get_widget_mut(target) else {
        return;
    };
    match &info.payload {
        DragPayload::Files(files) => {
            if let Some(drop_target) = widget.as_file_drop_target() {
                drop_target.file_drag_exit(files);
            }
        }
        DragPayload::Text(text) => {
            if let Some(drop_target) = widget.as_text_drop_target() {
                drop_target.text_drag_exit(text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::base::WidgetBase;
    use crate::widget::drag_drop::FileDropTarget;
    use crate::widget::store::WidgetStore;
    use crate::widget::{FocusPolicy, KeyListener, Widget};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::time::Duration;
    use trellis_core::geometry::Size;
    use trellis_core::object::init_global_registry;

    #[derive(Default)]
    struct DropLog {
        enters: AtomicI32,
        moves: AtomicI32,
        exits: AtomicI32,
        drops: AtomicI32,
    }

    struct DropBox {
        base: WidgetBase,
        interested: bool,
        log: Arc<DropLog>,
    }

    impl DropBox {
        fn new(base: WidgetBase, interested: bool) -> Self {
            Self {
                base,
                interested,
                log: Arc::new(DropLog::default()),
            }
        }
    }

    impl FileDropTarget for DropBox {
        fn is_interested_in_file_drag(&self, _files: &[PathBuf]) -> bool {
            self.interested
        }
        fn file_drag_enter(&mut self, _files: &[PathBuf], _position: Point) {
            self.log.enters.fetch_add(1, Ordering::SeqCst);
        }
        fn file_drag_move(&mut self, _files: &[PathBuf], _position: Point) {
            self.log.moves.fetch_add(1, Ordering::SeqCst);
        }
        fn file_drag_exit(&mut self, _files: &[PathBuf]) {
            self.log.exits.fetch_add(1, Ordering::SeqCst);
        }
        fn files_dropped(&mut self, _files: &[PathBuf], _position: Point) {
            self.log.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Widget for DropBox {
        fn widget_base(&self) -> &WidgetBase {
            &self.base
        }
        fn widget_base_mut(&mut self) -> &mut WidgetBase {
            &mut self.base
        }
        fn as_file_drop_target(&mut self) -> Option<&mut dyn FileDropTarget> {
            Some(self)
        }
    }

    struct Probe {
        base: WidgetBase,
        moves: Arc<AtomicI32>,
        resizes: Arc<AtomicI32>,
        modal_attempts: Arc<AtomicI32>,
        accept_close: bool,
    }

    impl Probe {
        fn new(base: WidgetBase) -> Self {
            Self {
                base,
                moves: Arc::new(AtomicI32::new(0)),
                resizes: Arc::new(AtomicI32::new(0)),
                modal_attempts: Arc::new(AtomicI32::new(0)),
                accept_close: false,
            }
        }
    }

    impl Widget for Probe {
        fn widget_base(&self) -> &WidgetBase {
            &self.base
        }
        fn widget_base_mut(&mut self) -> &mut WidgetBase {
            &mut self.base
        }
        fn event(&mut self, event: &mut WidgetEvent) -> bool {
            match event {
                WidgetEvent::Move(_) => {
                    self.moves.fetch_add(1, Ordering::SeqCst);
                    true
                }
                WidgetEvent::Resize(_) => {
                    self.resizes.fetch_add(1, Ordering::SeqCst);
                    true
                }
                WidgetEvent::ModalInputAttempt(_) => {
                    self.modal_attempts.fetch_add(1, Ordering::SeqCst);
                    true
                }
                WidgetEvent::CloseRequest(_) => self.accept_close,
                _ => false,
            }
        }
    }

    fn sized_base(rect: Rect) -> WidgetBase {
        let mut base = WidgetBase::new();
        base.set_rect(rect);
        base
    }

    fn child_base(parent: ObjectId, rect: Rect) -> WidgetBase {
        let mut base = WidgetBase::new_child(parent);
        base.set_rect(rect);
        base
    }

    fn setup() {
        init_global_registry();
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    }

    #[test]
    fn unique_peer_ids_are_odd_and_nonzero() {
        setup();
        let mut desktop = Desktop::new();
        let mut store = WidgetStore::new();
        let mut ids = Vec::new();
        for _ in 0..4 {
            let root = store.insert(Probe::new(sized_base(Rect::new(0.0, 0.0, 10.0, 10.0))));
            let peer = desktop.create_peer(root, Rect::new(0.0, 0.0, 10.0, 10.0), StyleFlags::empty());
            ids.push(desktop.peer(peer).unwrap().unique_id());
        }
        for id in &ids {
            assert_ne!(*id, 0);
            assert_eq!(id % 2, 1);
        }
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn peer_for_widget_matches_descendants_of_the_root() {
        setup();
        let mut desktop = Desktop::new();
        let mut store = WidgetStore::new();

        let root = store.insert(Probe::new(sized_base(Rect::new(0.0, 0.0, 100.0, 100.0))));
        let child = store.insert(Probe::new(child_base(root, Rect::new(0.0, 0.0, 50.0, 50.0))));
        let stranger = store.insert(Probe::new(sized_base(Rect::new(0.0, 0.0, 10.0, 10.0))));

        let peer = desktop.create_peer(root, Rect::new(0.0, 0.0, 100.0, 100.0), StyleFlags::empty());
        assert_eq!(desktop.peer_for_widget(root), Some(peer));
        assert_eq!(desktop.peer_for_widget(child), Some(peer));
        assert_eq!(desktop.peer_for_widget(stranger), None);
        assert!(desktop.is_valid_peer(peer));

        assert!(desktop.destroy_peer(peer));
        assert!(!desktop.is_valid_peer(peer));
        assert_eq!(desktop.peer_count(), 0);
    }

    #[test]
    fn drag_crosses_from_one_target_to_another() {
        setup();
        let mut desktop = Desktop::new();
        let mut store = WidgetStore::new();

        let root = store.insert(Probe::new(sized_base(Rect::new(0.0, 0.0, 200.0, 100.0))));
        let left = DropBox::new(child_base(root, Rect::new(0.0, 0.0, 100.0, 100.0)), true);
        let right = DropBox::new(child_base(root, Rect::new(100.0, 0.0, 100.0, 100.0)), true);
        let left_log = Arc::clone(&left.log);
        let right_log = Arc::clone(&right.log);
        store.insert(left);
        store.insert(right);

        let peer = desktop.create_peer(root, Rect::new(0.0, 0.0, 200.0, 100.0), StyleFlags::empty());
        let info = DragInfo::files(vec![PathBuf::from("/tmp/a.txt")], Point::new(20.0, 50.0));

        assert!(desktop.handle_drag_move(&mut store, peer, &info));
        assert_eq!(left_log.enters.load(Ordering::SeqCst), 1);
        assert_eq!(left_log.moves.load(Ordering::SeqCst), 1);

        // Second move over the same widget: no re-enter.
        assert!(desktop.handle_drag_move(&mut store, peer, &info.at(Point::new(40.0, 50.0))));
        assert_eq!(left_log.enters.load(Ordering::SeqCst), 1);
        assert_eq!(left_log.moves.load(Ordering::SeqCst), 2);

        // Crossing into the right box swaps exit for enter.
        assert!(desktop.handle_drag_move(&mut store, peer, &info.at(Point::new(150.0, 50.0))));
        assert_eq!(left_log.exits.load(Ordering::SeqCst), 1);
        assert_eq!(right_log.enters.load(Ordering::SeqCst), 1);

        // Drop is queued, not delivered inside the callback.
        assert!(desktop.handle_drag_drop(&mut store, peer, &info.at(Point::new(150.0, 50.0))));
        assert_eq!(right_log.drops.load(Ordering::SeqCst), 0);
        desktop.run_deferred_actions(&mut store);
        assert_eq!(right_log.drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drag_exit_clears_the_locked_target() {
        setup();
        let mut desktop = Desktop::new();
        let mut store = WidgetStore::new();

        let root = store.insert(Probe::new(sized_base(Rect::new(0.0, 0.0, 100.0, 100.0))));
        let target = DropBox::new(child_base(root, Rect::new(0.0, 0.0, 100.0, 100.0)), true);
        let log = Arc::clone(&target.log);
        store.insert(target);

        let peer = desktop.create_peer(root, Rect::new(0.0, 0.0, 100.0, 100.0), StyleFlags::empty());
        let info = DragInfo::files(vec![PathBuf::from("/tmp/a.txt")], Point::new(50.0, 50.0));

        desktop.handle_drag_move(&mut store, peer, &info);
        assert_eq!(log.enters.load(Ordering::SeqCst), 1);

        desktop.handle_drag_exit(&mut store, peer, &info);
        assert_eq!(log.exits.load(Ordering::SeqCst), 1);
        assert!(desktop.peer(peer).unwrap().drag_target.is_none());

        // A drop with no target reports failure and queues nothing.
        assert!(!desktop.handle_drag_drop(&mut store, peer, &info.at(Point::new(-5.0, -5.0))));
        desktop.run_deferred_actions(&mut store);
        assert_eq!(log.drops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn uninterested_target_is_skipped_for_its_ancestor() {
        setup();
        let mut desktop = Desktop::new();
        let mut store = WidgetStore::new();

        let outer = DropBox::new(sized_base(Rect::new(0.0, 0.0, 100.0, 100.0)), true);
        let outer_log = Arc::clone(&outer.log);
        let root = store.insert(outer);
        let inner = DropBox::new(child_base(root, Rect::new(10.0, 10.0, 50.0, 50.0)), false);
        let inner_log = Arc::clone(&inner.log);
        store.insert(inner);

        let peer = desktop.create_peer(root, Rect::new(0.0, 0.0, 100.0, 100.0), StyleFlags::empty());
        let info = DragInfo::files(vec![PathBuf::from("/tmp/a.txt")], Point::new(30.0, 30.0));

        assert!(desktop.handle_drag_move(&mut store, peer, &info));
        assert_eq!(inner_log.enters.load(Ordering::SeqCst), 0);
        assert_eq!(outer_log.enters.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn masked_region_hides_targets_from_drags() {
        setup();
        let mut desktop = Desktop::new();
        let mut store = WidgetStore::new();

        let target = DropBox::new(sized_base(Rect::new(0.0, 0.0, 100.0, 100.0)), true);
        let log = Arc::clone(&target.log);
        let root = store.insert(target);

        let peer = desktop.create_peer(root, Rect::new(0.0, 0.0, 100.0, 100.0), StyleFlags::empty());
        desktop
            .peer_mut(peer)
            .unwrap()
            .add_masked_region(Rect::new(40.0, 40.0, 20.0, 20.0));

        let info = DragInfo::files(vec![PathBuf::from("/tmp/a.txt")], Point::new(50.0, 50.0));
        assert!(!desktop.handle_drag_move(&mut store, peer, &info));
        assert_eq!(log.enters.load(Ordering::SeqCst), 0);

        assert!(desktop.handle_drag_move(&mut store, peer, &info.at(Point::new(10.0, 10.0))));
        assert_eq!(log.enters.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn modal_blocks_drops_outside_the_modal_subtree() {
        setup();
        let mut desktop = Desktop::new();
        let mut store = WidgetStore::new();

        let root = store.insert(Probe::new(sized_base(Rect::new(0.0, 0.0, 200.0, 100.0))));
        let target = DropBox::new(child_base(root, Rect::new(0.0, 0.0, 100.0, 100.0)), true);
        let log = Arc::clone(&target.log);
        store.insert(target);
        let modal = Probe::new(child_base(root, Rect::new(100.0, 0.0, 100.0, 100.0)));
        let attempts = Arc::clone(&modal.modal_attempts);
        let modal_id = store.insert(modal);

        desktop.modal_manager().begin_modal(modal_id);
        let peer = desktop.create_peer(root, Rect::new(0.0, 0.0, 200.0, 100.0), StyleFlags::empty());
        let info = DragInfo::files(vec![PathBuf::from("/tmp/a.txt")], Point::new(50.0, 50.0));

        assert!(desktop.handle_drag_drop(&mut store, peer, &info));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        desktop.run_deferred_actions(&mut store);
        assert_eq!(log.drops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn move_and_resize_events_fire_only_for_changed_dimensions() {
        setup();
        let mut desktop = Desktop::new();
        let mut store = WidgetStore::new();

        let probe = Probe::new(sized_base(Rect::new(0.0, 0.0, 100.0, 100.0)));
        let moves = Arc::clone(&probe.moves);
        let resizes = Arc::clone(&probe.resizes);
        let root = store.insert(probe);

        let peer = desktop.create_peer(root, Rect::new(0.0, 0.0, 100.0, 100.0), StyleFlags::empty());

        desktop.handle_moved_or_resized(
            &mut store,
            peer,
            Rect::new(20.0, 30.0, 100.0, 100.0),
            false,
            false,
        );
        assert_eq!(moves.load(Ordering::SeqCst), 1);
        assert_eq!(resizes.load(Ordering::SeqCst), 0);

        desktop.handle_moved_or_resized(
            &mut store,
            peer,
            Rect::new(20.0, 30.0, 150.0, 100.0),
            false,
            false,
        );
        assert_eq!(moves.load(Ordering::SeqCst), 1);
        assert_eq!(resizes.load(Ordering::SeqCst), 1);
        assert_eq!(
            store.get_widget(root).unwrap().widget_base().rect().size,
            Size::new(150.0, 100.0)
        );

        // Unchanged bounds: nothing fires.
        desktop.handle_moved_or_resized(
            &mut store,
            peer,
            Rect::new(20.0, 30.0, 150.0, 100.0),
            false,
            false,
        );
        assert_eq!(moves.load(Ordering::SeqCst), 1);
        assert_eq!(resizes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fullscreen_bounds_are_not_remembered_for_restore() {
        setup();
        let mut desktop = Desktop::new();
        let mut store = WidgetStore::new();

        let root = store.insert(Probe::new(sized_base(Rect::new(0.0, 0.0, 100.0, 100.0))));
        let peer = desktop.create_peer(root, Rect::new(0.0, 0.0, 100.0, 100.0), StyleFlags::empty());

        desktop.handle_moved_or_resized(&mut store, peer, Rect::new(10.0, 10.0, 300.0, 200.0), false, false);
        desktop.handle_moved_or_resized(&mut store, peer, Rect::new(0.0, 0.0, 1920.0, 1080.0), false, true);

        let peer_ref = desktop.peer(peer).unwrap();
        assert!(peer_ref.is_fullscreen());
        assert_eq!(
            peer_ref.last_non_fullscreen_bounds(),
            Rect::new(10.0, 10.0, 300.0, 200.0)
        );
    }

    #[test]
    fn minimize_toggles_hide_and_show() {
        setup();
        let mut desktop = Desktop::new();
        let mut store = WidgetStore::new();

        struct Visibility {
            base: WidgetBase,
            hides: Arc<AtomicI32>,
            shows: Arc<AtomicI32>,
        }
        impl Widget for Visibility {
            fn widget_base(&self) -> &WidgetBase {
                &self.base
            }
            fn widget_base_mut(&mut self) -> &mut WidgetBase {
                &mut self.base
            }
            fn event(&mut self, event: &mut WidgetEvent) -> bool {
                match event {
                    WidgetEvent::Hide(_) => self.hides.fetch_add(1, Ordering::SeqCst),
                    WidgetEvent::Show(_) => self.shows.fetch_add(1, Ordering::SeqCst),
                    _ => return false,
                };
                true
            }
        }

        let hides = Arc::new(AtomicI32::new(0));
        let shows = Arc::new(AtomicI32::new(0));
        let root = store.insert(Visibility {
            base: sized_base(Rect::new(0.0, 0.0, 100.0, 100.0)),
            hides: Arc::clone(&hides),
            shows: Arc::clone(&shows),
        });
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let peer = desktop.create_peer(root, bounds, StyleFlags::empty());

        desktop.handle_moved_or_resized(&mut store, peer, bounds, true, false);
        assert_eq!(hides.load(Ordering::SeqCst), 1);
        desktop.handle_moved_or_resized(&mut store, peer, bounds, false, false);
        assert_eq!(shows.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn paint_panic_is_contained() {
        setup();
        let mut desktop = Desktop::new();
        let mut store = WidgetStore::new();

        struct PanicPainter {
            base: WidgetBase,
        }
        impl Widget for PanicPainter {
            fn widget_base(&self) -> &WidgetBase {
                &self.base
            }
            fn widget_base_mut(&mut self) -> &mut WidgetBase {
                &mut self.base
            }
            fn paint(&mut self, _ctx: &mut PaintContext<'_>) {
                panic!("paint failure");
            }
        }

        let root = store.insert(PanicPainter {
            base: sized_base(Rect::new(0.0, 0.0, 100.0, 100.0)),
        });
        let peer = desktop.create_peer(root, Rect::new(0.0, 0.0, 100.0, 100.0), StyleFlags::empty());

        let mut canvas = crate::style::NullCanvas;
        desktop.handle_paint(&mut store, peer, &mut canvas);
        // Still usable afterwards.
        assert!(desktop.is_valid_peer(peer));
    }

    #[test]
    fn key_listener_runs_before_the_widget() {
        setup();
        let mut desktop = Desktop::new();
        let mut store = WidgetStore::new();

        struct Consumer {
            calls: Arc<AtomicI32>,
        }
        impl KeyListener for Consumer {
            fn key_pressed(&self, _event: &KeyPressEvent, _origin: ObjectId) -> bool {
                self.calls.fetch_add(1, Ordering::SeqCst);
                true
            }
        }

        let mut base = sized_base(Rect::new(0.0, 0.0, 100.0, 100.0));
        base.set_focus_policy(FocusPolicy::StrongFocus);
        let calls = Arc::new(AtomicI32::new(0));
        base.add_key_listener(Arc::new(Consumer {
            calls: Arc::clone(&calls),
        }));
        let root = store.insert(Probe::new(base));
        let peer = desktop.create_peer(root, Rect::new(0.0, 0.0, 100.0, 100.0), StyleFlags::empty());

        desktop
            .focus_manager()
            .set_focus(&mut store, Some(root), FocusReason::Other);
        let used = desktop.handle_key_press(
            &mut store,
            peer,
            KeyPressEvent::new(Key::A, KeyboardModifiers::NONE),
        );
        assert!(used);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_destroying_its_widget_stops_the_walk() {
        setup();
        let mut desktop = Desktop::new();
        let mut store = WidgetStore::new();

        struct Destroyer {
            victim: ObjectId,
        }
        impl KeyListener for Destroyer {
            fn key_pressed(&self, _event: &KeyPressEvent, _origin: ObjectId) -> bool {
                global_registry().destroy(self.victim);
                false
            }
        }

        let root = store.insert(Probe::new(sized_base(Rect::new(0.0, 0.0, 100.0, 100.0))));
        let mut base = child_base(root, Rect::new(0.0, 0.0, 50.0, 50.0));
        base.set_focus_policy(FocusPolicy::StrongFocus);
        let victim = base.id();
        base.add_key_listener(Arc::new(Destroyer { victim }));
        let focused = store.insert(Probe::new(base));
        let peer = desktop.create_peer(root, Rect::new(0.0, 0.0, 100.0, 100.0), StyleFlags::empty());

        desktop
            .focus_manager()
            .set_focus(&mut store, Some(focused), FocusReason::Other);
        let used = desktop.handle_key_press(
            &mut store,
            peer,
            KeyPressEvent::new(Key::A, KeyboardModifiers::NONE),
        );
        assert!(!used);
        assert!(!global_registry().contains(victim));
    }

    #[test]
    fn listener_destroying_its_widget_stops_the_key_state_walk() {
        setup();
        let mut desktop = Desktop::new();
        let mut store = WidgetStore::new();

        struct Destroyer {
            victim: ObjectId,
        }
        impl KeyListener for Destroyer {
            fn key_pressed(&self, _event: &KeyPressEvent, _origin: ObjectId) -> bool {
                false
            }

            fn key_state_changed(&self, _is_down: bool, _origin: ObjectId) -> bool {
                global_registry().destroy(self.victim);
                false
            }
        }

        let root = store.insert(Probe::new(sized_base(Rect::new(0.0, 0.0, 100.0, 100.0))));
        let mut base = child_base(root, Rect::new(0.0, 0.0, 50.0, 50.0));
        base.set_focus_policy(FocusPolicy::StrongFocus);
        let victim = base.id();
        base.add_key_listener(Arc::new(Destroyer { victim }));
        let focused = store.insert(Probe::new(base));
        let peer = desktop.create_peer(root, Rect::new(0.0, 0.0, 100.0, 100.0), StyleFlags::empty());

        desktop
            .focus_manager()
            .set_focus(&mut store, Some(focused), FocusReason::Other);
        // The walk must not climb to the (live) root and must not report
        // the dead widget's turn as consumed.
        let used = desktop.handle_key_state_change(&mut store, peer, Key::A, false);
        assert!(!used);
        assert!(!global_registry().contains(victim));
    }

    #[test]
    fn tab_moves_focus_between_widgets() {
        setup();
        let mut desktop = Desktop::new();
        let mut store = WidgetStore::new();

        let root = store.insert(Probe::new(sized_base(Rect::new(0.0, 0.0, 200.0, 100.0))));
        let mut a_base = child_base(root, Rect::new(0.0, 0.0, 100.0, 100.0));
        a_base.set_focus_policy(FocusPolicy::StrongFocus);
        let a = store.insert(Probe::new(a_base));
        let mut b_base = child_base(root, Rect::new(100.0, 0.0, 100.0, 100.0));
        b_base.set_focus_policy(FocusPolicy::StrongFocus);
        let b = store.insert(Probe::new(b_base));

        let peer = desktop.create_peer(root, Rect::new(0.0, 0.0, 200.0, 100.0), StyleFlags::empty());
        desktop
            .focus_manager()
            .set_focus(&mut store, Some(a), FocusReason::Other);

        assert!(desktop.handle_key_press(
            &mut store,
            peer,
            KeyPressEvent::new(Key::Tab, KeyboardModifiers::NONE),
        ));
        assert_eq!(desktop.focus_manager().focused_widget(), Some(b));

        assert!(desktop.handle_key_press(
            &mut store,
            peer,
            KeyPressEvent::new(Key::Tab, KeyboardModifiers::SHIFT),
        ));
        assert_eq!(desktop.focus_manager().focused_widget(), Some(a));
    }

    #[test]
    fn window_focus_loss_and_gain_restore_the_focused_widget() {
        setup();
        let mut desktop = Desktop::new();
        let mut store = WidgetStore::new();

        let root = store.insert(Probe::new(sized_base(Rect::new(0.0, 0.0, 200.0, 100.0))));
        let mut inner_base = child_base(root, Rect::new(0.0, 0.0, 100.0, 100.0));
        inner_base.set_focus_policy(FocusPolicy::StrongFocus);
        let inner = store.insert(Probe::new(inner_base));
        let peer = desktop.create_peer(root, Rect::new(0.0, 0.0, 200.0, 100.0), StyleFlags::empty());

        desktop
            .focus_manager()
            .set_focus(&mut store, Some(inner), FocusReason::Other);

        desktop.handle_focus_loss(&mut store, peer);
        assert_eq!(desktop.focus_manager().focused_widget(), None);

        desktop.handle_focus_gain(&mut store, peer);
        assert_eq!(desktop.focus_manager().focused_widget(), Some(inner));
    }

    #[test]
    fn close_request_reports_the_roots_answer() {
        setup();
        let mut desktop = Desktop::new();
        let mut store = WidgetStore::new();

        let mut refuser = Probe::new(sized_base(Rect::new(0.0, 0.0, 100.0, 100.0)));
        refuser.accept_close = false;
        let root = store.insert(refuser);
        let peer = desktop.create_peer(root, Rect::new(0.0, 0.0, 100.0, 100.0), StyleFlags::empty());
        assert!(!desktop.handle_user_closing_window(&mut store, peer));

        let mut acceptor = Probe::new(sized_base(Rect::new(0.0, 0.0, 100.0, 100.0)));
        acceptor.accept_close = true;
        let root2 = store.insert(acceptor);
        let peer2 = desktop.create_peer(root2, Rect::new(0.0, 0.0, 100.0, 100.0), StyleFlags::empty());
        assert!(desktop.handle_user_closing_window(&mut store, peer2));
    }

    #[test]
    fn due_timers_are_delivered_as_widget_events() {
        setup();
        let mut desktop = Desktop::new();
        let mut store = WidgetStore::new();

        struct TimerTaker {
            base: WidgetBase,
            fired: Arc<AtomicI32>,
        }
        impl Widget for TimerTaker {
            fn widget_base(&self) -> &WidgetBase {
                &self.base
            }
            fn widget_base_mut(&mut self) -> &mut WidgetBase {
                &mut self.base
            }
            fn event(&mut self, event: &mut WidgetEvent) -> bool {
                matches!(event, WidgetEvent::Timer(_)) && {
                    self.fired.fetch_add(1, Ordering::SeqCst);
                    true
                }
            }
        }

        let fired = Arc::new(AtomicI32::new(0));
        let widget = store.insert(TimerTaker {
            base: sized_base(Rect::new(0.0, 0.0, 10.0, 10.0)),
            fired: Arc::clone(&fired),
        });

        let now = Instant::now();
        desktop
            .timer_service()
            .start(widget, Duration::from_millis(10), now);

        desktop.process_timers(&mut store, now + Duration::from_millis(5));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        desktop.process_timers(&mut store, now + Duration::from_millis(20));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn custom_deferred_action_reaches_its_target() {
        setup();
        let mut desktop = Desktop::new();
        let mut store = WidgetStore::new();

        struct PayloadTaker {
            base: WidgetBase,
            seen: Arc<AtomicI32>,
        }
        impl Widget for PayloadTaker {
            fn widget_base(&self) -> &WidgetBase {
                &self.base
            }
            fn widget_base_mut(&mut self) -> &mut WidgetBase {
                &mut self.base
            }
            fn event(&mut self, event: &mut WidgetEvent) -> bool {
                if let WidgetEvent::Custom(custom) = event
                    && let Some(value) = custom.payload_as::<i32>()
                {
                    self.seen.store(*value, Ordering::SeqCst);
                    return true;
                }
                false
            }
        }

        let seen = Arc::new(AtomicI32::new(0));
        let target = store.insert(PayloadTaker {
            base: sized_base(Rect::new(0.0, 0.0, 10.0, 10.0)),
            seen: Arc::clone(&seen),
        });

        desktop.defer(DeferredAction::Custom {
            target,
            payload: Box::new(42i32),
        });
        desktop.run_deferred_actions(&mut store);
        assert_eq!(seen.load(Ordering::SeqCst), 42);
    }
}
