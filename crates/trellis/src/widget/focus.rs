//! Keyboard focus management.
//!
//! One [`FocusManager`] tracks the focused widget for a desktop. Tab order
//! is DFS pre-order over the widget tree, restricted to visible, enabled
//! widgets whose focus policy accepts Tab.

use trellis_core::geometry::Point;
use trellis_core::object::{ObjectId, global_registry};

use super::dispatcher::{EventDispatcher, WidgetAccess};
use super::events::{FocusInEvent, FocusOutEvent, FocusReason, WidgetEvent};

/// Tracks and moves keyboard focus.
#[derive(Debug, Default)]
pub struct FocusManager {
    focused: Option<ObjectId>,
}

impl FocusManager {
    /// Create a manager with nothing focused.
    pub fn new() -> Self {
        Self { focused: None }
    }

    /// The currently focused widget, filtered for liveness.
    pub fn focused_widget(&self) -> Option<ObjectId> {
        self.focused.filter(|id| global_registry().contains(*id))
    }

    /// Move focus to `target` (or clear it with `None`).
    ///
    /// Sends FocusOut to the old widget and FocusIn to the new one. Either
    /// handler may destroy widgets; liveness is re-checked in between.
    /// Returns true if the stored focus actually changed.
    pub fn set_focus<S: WidgetAccess + ?Sized>(
        &mut self,
        storage: &mut S,
        target: Option<ObjectId>,
        reason: FocusReason,
    ) -> bool {
        let old = self.focused_widget();
        let target = target.filter(|id| global_registry().contains(*id));
        if old == target {
            return false;
        }

        tracing::debug!(target: "trellis::focus", ?old, new = ?target, ?reason, "focus change");
        self.focused = target;

        if let Some(old_id) = old {
            let mut event = WidgetEvent::FocusOut(FocusOutEvent::new(reason));
            EventDispatcher::send_event_direct(storage, old_id, &mut event);
        }
        // The FocusOut handler may have destroyed the new target.
        if let Some(new_id) = target {
            if global_registry().contains(new_id) {
                let mut event = WidgetEvent::FocusIn(FocusInEvent::new(reason));
                EventDispatcher::send_event_direct(storage, new_id, &mut event);
            } else {
                self.focused = None;
            }
        }
        true
    }

    /// Drop focus entirely.
    pub fn clear_focus<S: WidgetAccess + ?Sized>(
        &mut self,
        storage: &mut S,
        reason: FocusReason,
    ) {
        self.set_focus(storage, None, reason);
    }

    /// Advance focus to the next widget in tab order under `root`.
    ///
    /// Returns true only if focus actually moved.
    pub fn focus_next<S: WidgetAccess + ?Sized>(
        &mut self,
        storage: &mut S,
        root: ObjectId,
    ) -> bool {
        self.traverse(storage, root, FocusReason::Tab, 1)
    }

    /// Move focus to the previous widget in tab order under `root`.
    pub fn focus_previous<S: WidgetAccess + ?Sized>(
        &mut self,
        storage: &mut S,
        root: ObjectId,
    ) -> bool {
        self.traverse(storage, root, FocusReason::Backtab, -1)
    }

    fn traverse<S: WidgetAccess + ?Sized>(
        &mut self,
        storage: &mut S,
        root: ObjectId,
        reason: FocusReason,
        direction: isize,
    ) -> bool {
        let order = Self::tab_order(storage, root);
        if order.is_empty() {
            return false;
        }

        let next = match self.focused_widget().and_then(|f| {
            order.iter().position(|id| *id == f)
        }) {
            Some(index) => {
                let len = order.len() as isize;
                let next = (index as isize + direction).rem_euclid(len);
                order[next as usize]
            }
            // Nothing focused: enter the cycle at either end.
            None if direction > 0 => order[0],
            None => order[order.len() - 1],
        };

        if Some(next) == self.focused_widget() {
            return false;
        }
        self.set_focus(storage, Some(next), reason)
    }

    /// Tab order: DFS pre-order of focusable widgets under `root`.
    pub fn tab_order<S: WidgetAccess + ?Sized>(storage: &S, root: ObjectId) -> Vec<ObjectId> {
        let mut order = Vec::new();
        Self::collect_focusable(storage, root, &mut order);
        order
    }

    fn collect_focusable<S: WidgetAccess + ?Sized>(
        storage: &S,
        id: ObjectId,
        order: &mut Vec<ObjectId>,
    ) {
        let Some(widget) = storage.get_widget(id) else {
            return;
        };
        let base = widget.widget_base();
        if !base.is_visible() {
            return;
        }
        if base.is_enabled() && base.focus_policy().accepts_tab() {
            order.push(id);
        }
        for child in global_registry().children_of(id) {
            Self::collect_focusable(storage, child, order);
        }
    }

    /// Focus the widget that was clicked, if its policy allows it.
    pub fn focus_on_click<S: WidgetAccess + ?Sized>(
        &mut self,
        storage: &mut S,
        clicked: ObjectId,
        _pos: Point,
    ) -> bool {
        let accepts = storage
            .get_widget(clicked)
            .map(|w| {
                w.widget_base().is_enabled() && w.widget_base().focus_policy().accepts_click()
            })
            .unwrap_or(false);
        if accepts {
            self.set_focus(storage, Some(clicked), FocusReason::Mouse)
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::base::WidgetBase;
    use crate::widget::store::WidgetStore;
    use crate::widget::{FocusPolicy, Widget};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicI32, Ordering};
    use trellis_core::object::init_global_registry;

    struct Focusable {
        base: WidgetBase,
        focus_in: Arc<AtomicI32>,
        focus_out: Arc<AtomicI32>,
    }

    impl Focusable {
        fn new(base: WidgetBase) -> Self {
            Self {
                base,
                focus_in: Arc::new(AtomicI32::new(0)),
                focus_out: Arc::new(AtomicI32::new(0)),
            }
        }
    }

    impl Widget for Focusable {
        fn widget_base(&self) -> &WidgetBase {
            &self.base
        }

        fn widget_base_mut(&mut self) -> &mut WidgetBase {
            &mut self.base
        }

        fn event(&mut self, event: &mut WidgetEvent) -> bool {
            match event {
                WidgetEvent::FocusIn(_) => {
                    self.focus_in.fetch_add(1, Ordering::SeqCst);
                    true
                }
                WidgetEvent::FocusOut(_) => {
                    self.focus_out.fetch_add(1, Ordering::SeqCst);
                    true
                }
                _ => false,
            }
        }
    }

    fn focusable_child(store: &mut WidgetStore, parent: ObjectId) -> ObjectId {
        let mut base = WidgetBase::new_child(parent);
        base.set_focus_policy(FocusPolicy::StrongFocus);
        store.insert(Focusable::new(base))
    }

    fn build_tree(store: &mut WidgetStore) -> (ObjectId, Vec<ObjectId>) {
        let root = store.insert(Focusable::new(WidgetBase::new()));
        let a = focusable_child(store, root);
        let b = focusable_child(store, root);
        let c = focusable_child(store, root);
        (root, vec![a, b, c])
    }

    #[test]
    fn tab_cycles_forward_and_wraps() {
        init_global_registry();
        let mut store = WidgetStore::new();
        let (root, kids) = build_tree(&mut store);
        let mut focus = FocusManager::new();

        assert!(focus.focus_next(&mut store, root));
        assert_eq!(focus.focused_widget(), Some(kids[0]));
        assert!(focus.focus_next(&mut store, root));
        assert_eq!(focus.focused_widget(), Some(kids[1]));
        assert!(focus.focus_next(&mut store, root));
        assert_eq!(focus.focused_widget(), Some(kids[2]));
        assert!(focus.focus_next(&mut store, root));
        assert_eq!(focus.focused_widget(), Some(kids[0]));
    }

    #[test]
    fn backtab_enters_at_the_end() {
        init_global_registry();
        let mut store = WidgetStore::new();
        let (root, kids) = build_tree(&mut store);
        let mut focus = FocusManager::new();

        assert!(focus.focus_previous(&mut store, root));
        assert_eq!(focus.focused_widget(), Some(kids[2]));
        assert!(focus.focus_previous(&mut store, root));
        assert_eq!(focus.focused_widget(), Some(kids[1]));
    }

    #[test]
    fn invisible_and_disabled_widgets_are_skipped() {
        init_global_registry();
        let mut store = WidgetStore::new();
        let (root, kids) = build_tree(&mut store);

        store.get_widget_mut(kids[1]).unwrap().widget_base_mut().set_enabled(false);
        let order = FocusManager::tab_order(&store, root);
        assert_eq!(order, vec![kids[0], kids[2]]);

        store.get_widget_mut(kids[2]).unwrap().widget_base_mut().set_visible(false);
        let order = FocusManager::tab_order(&store, root);
        assert_eq!(order, vec![kids[0]]);
    }

    #[test]
    fn single_focusable_reports_no_movement() {
        init_global_registry();
        let mut store = WidgetStore::new();
        let root = store.insert(Focusable::new(WidgetBase::new()));
        let only = focusable_child(&mut store, root);
        let mut focus = FocusManager::new();

        assert!(focus.focus_next(&mut store, root));
        assert_eq!(focus.focused_widget(), Some(only));
        // Wrapping back onto itself is not a move.
        assert!(!focus.focus_next(&mut store, root));
    }

    #[test]
    fn destroyed_focused_widget_resolves_to_none() {
        init_global_registry();
        let mut store = WidgetStore::new();
        let (root, kids) = build_tree(&mut store);
        let mut focus = FocusManager::new();

        focus.set_focus(&mut store, Some(kids[0]), FocusReason::Other);
        global_registry().destroy(kids[0]);
        assert_eq!(focus.focused_widget(), None);

        // Traversal recovers by entering the cycle fresh.
        assert!(focus.focus_next(&mut store, root));
        assert_eq!(focus.focused_widget(), Some(kids[1]));
    }
}
