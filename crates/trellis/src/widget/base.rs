//! Shared per-widget state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use trellis_core::geometry::Rect;
use trellis_core::object::{ObjectId, global_registry};

use super::FocusPolicy;
use super::events::KeyPressEvent;

/// Identifies a registered key listener on one widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyListenerId(u64);

static NEXT_KEY_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Observer attached to a widget's key events.
///
/// Listeners registered later are consulted first. A listener may remove
/// itself, remove others, or destroy the widget; the dispatch walk
/// re-checks liveness and membership before each call.
pub trait KeyListener: Send + Sync {
    /// A key was pressed while the widget had focus. Return true to consume.
    fn key_pressed(&self, event: &KeyPressEvent, origin: ObjectId) -> bool;

    /// A key went down or up without producing a press. Return true to consume.
    fn key_state_changed(&self, is_down: bool, origin: ObjectId) -> bool {
        let _ = (is_down, origin);
        false
    }
}

/// State common to every widget, embedded by each widget struct.
pub struct WidgetBase {
    id: ObjectId,
    rect: Rect,
    visible: bool,
    enabled: bool,
    focus_policy: FocusPolicy,
    key_listeners: Vec<(KeyListenerId, Arc<dyn KeyListener>)>,
}

impl WidgetBase {
    /// Create a base registered as a root object.
    pub fn new() -> Self {
        Self::with_id(global_registry().register())
    }

    /// Create a base registered as a child of `parent`.
    pub fn new_child(parent: ObjectId) -> Self {
        let id = global_registry()
            .register_child(parent)
            .unwrap_or_else(|_| global_registry().register());
        Self::with_id(id)
    }

    fn with_id(id: ObjectId) -> Self {
        Self {
            id,
            rect: Rect::ZERO,
            visible: true,
            enabled: true,
            focus_policy: FocusPolicy::NoFocus,
            key_listeners: Vec::new(),
        }
    }

    /// This widget's object id.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Bounds in the parent's coordinate space.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Set the bounds. Callers are responsible for sending Move/Resize events.
    pub fn set_rect(&mut self, rect: Rect) {
        self.rect = rect;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn focus_policy(&self) -> FocusPolicy {
        self.focus_policy
    }

    pub fn set_focus_policy(&mut self, policy: FocusPolicy) {
        self.focus_policy = policy;
    }

    /// Register a key listener. Later registrations are consulted first.
    pub fn add_key_listener(&mut self, listener: Arc<dyn KeyListener>) -> KeyListenerId {
        let id = KeyListenerId(NEXT_KEY_LISTENER_ID.fetch_add(1, Ordering::Relaxed));
        self.key_listeners.push((id, listener));
        id
    }

    /// Remove a key listener. Returns whether it was registered.
    pub fn remove_key_listener(&mut self, id: KeyListenerId) -> bool {
        let before = self.key_listeners.len();
        self.key_listeners.retain(|(lid, _)| *lid != id);
        self.key_listeners.len() != before
    }

    /// Whether the listener is currently registered.
    pub fn has_key_listener(&self, id: KeyListenerId) -> bool {
        self.key_listeners.iter().any(|(lid, _)| *lid == id)
    }

    /// Snapshot of the listener list, newest first, for dispatch.
    pub fn key_listeners_snapshot(&self) -> Vec<(KeyListenerId, Arc<dyn KeyListener>)> {
        self.key_listeners.iter().rev().cloned().collect()
    }
}

impl Default for WidgetBase {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WidgetBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetBase")
            .field("id", &self.id)
            .field("rect", &self.rect)
            .field("visible", &self.visible)
            .field("enabled", &self.enabled)
            .field("key_listeners", &self.key_listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::object::init_global_registry;

    struct NullListener;

    impl KeyListener for NullListener {
        fn key_pressed(&self, _event: &KeyPressEvent, _origin: ObjectId) -> bool {
            false
        }
    }

    #[test]
    fn key_listener_registration() {
        init_global_registry();
        let mut base = WidgetBase::new();

        let a = base.add_key_listener(Arc::new(NullListener));
        let b = base.add_key_listener(Arc::new(NullListener));
        assert!(base.has_key_listener(a));

        // Newest first.
        let snapshot = base.key_listeners_snapshot();
        assert_eq!(snapshot[0].0, b);
        assert_eq!(snapshot[1].0, a);

        assert!(base.remove_key_listener(a));
        assert!(!base.remove_key_listener(a));
        assert!(!base.has_key_listener(a));
        assert!(base.has_key_listener(b));
    }

    #[test]
    fn child_base_links_into_registry() {
        init_global_registry();
        let parent = WidgetBase::new();
        let child = WidgetBase::new_child(parent.id());
        assert_eq!(global_registry().parent_of(child.id()), Some(parent.id()));
    }
}
