//! Modal blocking.
//!
//! While a modal widget is active, input aimed at widgets outside its
//! subtree is blocked. Blocked input turns into a single
//! [`ModalInputAttemptEvent`] delivered to the modal widget, which may use
//! it to flash, beep, or dismiss itself.

use trellis_core::object::{ObjectId, global_registry};

use super::dispatcher::{DispatchResult, EventDispatcher, WidgetAccess};
use super::events::{ModalInputAttemptEvent, WidgetEvent};

/// Stack of active modal widgets. The most recent one blocks.
#[derive(Debug, Default)]
pub struct ModalManager {
    stack: Vec<ObjectId>,
}

impl ModalManager {
    /// Create a manager with no modal widgets.
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    /// Push a widget onto the modal stack.
    pub fn begin_modal(&mut self, id: ObjectId) {
        tracing::debug!(target: "trellis::modal", ?id, "begin modal");
        self.stack.push(id);
    }

    /// Remove a widget from the modal stack. Returns whether it was there.
    pub fn end_modal(&mut self, id: ObjectId) -> bool {
        let before = self.stack.len();
        self.stack.retain(|m| *m != id);
        let removed = self.stack.len() != before;
        if removed {
            tracing::debug!(target: "trellis::modal", ?id, "end modal");
        }
        removed
    }

    /// The widget currently blocking input, if any.
    ///
    /// Destroyed entries are popped lazily.
    pub fn current_modal(&mut self) -> Option<ObjectId> {
        while let Some(top) = self.stack.last().copied() {
            if global_registry().contains(top) {
                return Some(top);
            }
            self.stack.pop();
        }
        None
    }

    /// Whether any modal widget is active.
    pub fn is_modal_active(&mut self) -> bool {
        self.current_modal().is_some()
    }

    /// Whether input to `id` is blocked by the active modal widget.
    ///
    /// The modal widget itself and its descendants are never blocked.
    pub fn is_blocked(&mut self, id: ObjectId) -> bool {
        match self.current_modal() {
            Some(modal) => !global_registry().is_ancestor_of(modal, id),
            None => false,
        }
    }

    /// Notify the modal widget that blocked input arrived.
    ///
    /// Returns true if a modal widget existed and received the event.
    pub fn deliver_modal_input_attempt<S: WidgetAccess + ?Sized>(
        &mut self,
        storage: &mut S,
    ) -> bool {
        let Some(modal) = self.current_modal() else {
            return false;
        };
        let mut event = WidgetEvent::ModalInputAttempt(ModalInputAttemptEvent::new());
        EventDispatcher::send_event_direct(storage, modal, &mut event)
            != DispatchResult::WidgetNotFound
    }
}
