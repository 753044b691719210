//! Widget storage.
//!
//! [`WidgetStore`] owns widgets boxed behind the [`Widget`] trait, keyed by
//! their [`ObjectId`]. Structure (parent/children) lives in the global
//! object registry; the store only maps ids to widget instances. Lookups
//! filter out widgets whose registry entry has been destroyed, so a widget
//! destroyed from inside a callback stops resolving immediately even though
//! its box is only reclaimed when the host prunes.

use std::collections::HashMap;

use trellis_core::object::{ObjectId, global_registry};

use super::Widget;
use super::dispatcher::WidgetAccess;

/// Maps object ids to widget instances.
#[derive(Default)]
pub struct WidgetStore {
    widgets: HashMap<ObjectId, Box<dyn Widget>>,
}

impl WidgetStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            widgets: HashMap::new(),
        }
    }

    /// Insert a widget, keyed by its own object id.
    pub fn insert<W: Widget + 'static>(&mut self, widget: W) -> ObjectId {
        let id = widget.widget_base().id();
        self.widgets.insert(id, Box::new(widget));
        id
    }

    /// Remove a widget and destroy its registry entry (and subtree).
    pub fn remove(&mut self, id: ObjectId) -> Option<Box<dyn Widget>> {
        global_registry().destroy(id);
        let removed = self.widgets.remove(&id);
        self.prune_dead();
        removed
    }

    /// Drop boxes whose registry entries are gone (destroyed mid-callback
    /// or as part of a subtree destroy).
    pub fn prune_dead(&mut self) {
        self.widgets.retain(|id, _| global_registry().contains(*id));
    }

    /// Number of stored widgets, live or awaiting prune.
    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }
}

impl WidgetAccess for WidgetStore {
    fn get_widget(&self, id: ObjectId) -> Option<&dyn Widget> {
        if !global_registry().contains(id) {
            return None;
        }
        self.widgets.get(&id).map(|w| w.as_ref() as &dyn Widget)
    }

    fn get_widget_mut(&mut self, id: ObjectId) -> Option<&mut dyn Widget> {
        if !global_registry().contains(id) {
            return None;
        }
        self.widgets
            .get_mut(&id)
            .map(|w| w.as_mut() as &mut dyn Widget)
    }
}
