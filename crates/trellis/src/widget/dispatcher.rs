//! Event dispatch into the widget tree.
//!
//! The dispatcher owns no widgets: callers hand it a [`WidgetAccess`]
//! implementation for instance lookup, and tree structure comes from the
//! global object registry. Every step that follows a widget callback
//! re-checks liveness, because any callback may destroy the widget it was
//! invoked on (or any other widget).

use trellis_core::geometry::Point;
use trellis_core::object::{ObjectId, global_registry};

use super::Widget;
use super::events::WidgetEvent;

/// Lookup of widget instances by id.
///
/// Implementations must return `None` for ids whose registry entry has been
/// destroyed, even if the instance has not been reclaimed yet.
pub trait WidgetAccess {
    fn get_widget(&self, id: ObjectId) -> Option<&dyn Widget>;
    fn get_widget_mut(&mut self, id: ObjectId) -> Option<&mut dyn Widget>;
}

/// Outcome of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchResult {
    /// A widget handled the event.
    Accepted,
    /// No widget along the propagation path handled the event.
    Ignored,
    /// The target id did not resolve to a live widget.
    WidgetNotFound,
}

/// Stateless dispatch entry points.
pub struct EventDispatcher;

impl EventDispatcher {
    /// Whether the id still refers to a live, resolvable widget.
    pub fn is_live<S: WidgetAccess + ?Sized>(storage: &S, id: ObjectId) -> bool {
        global_registry().contains(id) && storage.get_widget(id).is_some()
    }

    /// Deliver an event to exactly one widget, no propagation.
    pub fn send_event_direct<S: WidgetAccess + ?Sized>(
        storage: &mut S,
        target: ObjectId,
        event: &mut WidgetEvent,
    ) -> DispatchResult {
        let Some(widget) = storage.get_widget_mut(target) else {
            return DispatchResult::WidgetNotFound;
        };
        if event.propagates() && !widget.widget_base().is_enabled() {
            return DispatchResult::Ignored;
        }
        let handled = widget.event(event);
        if handled || event.is_accepted() {
            event.accept();
            DispatchResult::Accepted
        } else {
            DispatchResult::Ignored
        }
    }

    /// Deliver an event, propagating ignored pointer events to ancestors.
    ///
    /// The event's local position is rewritten at each hop. The walk stops
    /// as soon as a handler accepts, the chain runs out, or a liveness
    /// check fails after a handler call.
    pub fn send_event<S: WidgetAccess + ?Sized>(
        storage: &mut S,
        target: ObjectId,
        event: &mut WidgetEvent,
    ) -> DispatchResult {
        let mut current = target;
        let mut result = Self::send_event_direct(storage, current, event);

        while result == DispatchResult::Ignored && event.propagates() {
            // The handler may have destroyed anything, including `current`.
            if !global_registry().contains(current) {
                tracing::trace!(
                    target: "trellis::dispatcher",
                    ?current,
                    "target destroyed during dispatch, stopping"
                );
                return DispatchResult::Ignored;
            }
            let Some(parent) = global_registry().parent_of(current) else {
                break;
            };
            if let (Some(pos), Some(widget)) = (event.local_pos(), storage.get_widget(current)) {
                let origin = widget.widget_base().rect().origin;
                event.set_local_pos(pos + origin);
            }
            current = parent;
            result = Self::send_event_direct(storage, current, event);
        }
        result
    }

    /// Find the deepest visible widget containing a point.
    ///
    /// `pos` is in `root`'s coordinate space. Later children are treated as
    /// topmost and searched first.
    pub fn hit_test<S: WidgetAccess + ?Sized>(
        storage: &S,
        root: ObjectId,
        pos: Point,
    ) -> Option<ObjectId> {
        let widget = storage.get_widget(root)?;
        if !widget.widget_base().is_visible() || !widget.contains_point(pos) {
            return None;
        }
        let children = global_registry().children_of(root);
        for child in children.into_iter().rev() {
            if let Some(child_widget) = storage.get_widget(child) {
                let child_pos = pos - child_widget.widget_base().rect().origin;
                if let Some(hit) = Self::hit_test(storage, child, child_pos) {
                    return Some(hit);
                }
            }
        }
        Some(root)
    }

    /// Convert a window-space point into `id`'s local coordinates.
    pub fn window_to_local<S: WidgetAccess + ?Sized>(
        storage: &S,
        id: ObjectId,
        window_pos: Point,
    ) -> Option<Point> {
        let mut offset = Point::ZERO;
        for ancestor in Self::ancestor_chain(id) {
            let widget = storage.get_widget(ancestor)?;
            offset = offset + widget.widget_base().rect().origin;
        }
        Some(window_pos - offset)
    }

    /// The chain from `id` (inclusive) up to its root.
    pub fn ancestor_chain(id: ObjectId) -> Vec<ObjectId> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if !global_registry().contains(current) {
                break;
            }
            chain.push(current);
            cursor = global_registry().parent_of(current);
        }
        chain
    }
}
