//! Object identity and the liveness registry.
//!
//! Every widget registers itself here on construction and is removed on
//! destruction. An [`ObjectId`] is a generational slotmap key, so a stale id
//! held across a callback simply stops resolving once the object is
//! destroyed. Dispatch loops call [`ObjectRegistry::contains`] after every
//! callback that crosses into widget code and stop when it fails.
//!
//! The registry also records the parent/child structure of the tree.
//! Destroying an object destroys its subtree.

use std::fmt;
use std::sync::OnceLock;

use parking_lot::RwLock;
use slotmap::SlotMap;

use crate::signal::Signal;

slotmap::new_key_type! {
    /// Identifies a registered object for its whole lifetime.
    pub struct ObjectId;
}

/// Errors from registry operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectError {
    /// The id does not refer to a live object.
    InvalidObjectId,
    /// Reparenting would create a cycle.
    ParentCycle,
}

impl fmt::Display for ObjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidObjectId => write!(f, "object id is not registered"),
            Self::ParentCycle => write!(f, "reparenting would create a cycle"),
        }
    }
}

impl std::error::Error for ObjectError {}

struct ObjectEntry {
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
}

struct RegistryInner {
    objects: SlotMap<ObjectId, ObjectEntry>,
}

/// Registry of live objects and their tree structure.
pub struct ObjectRegistry {
    inner: RwLock<RegistryInner>,
    /// Emitted with the id of each object after it is removed.
    pub destroyed: Signal<ObjectId>,
}

impl ObjectRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                objects: SlotMap::with_key(),
            }),
            destroyed: Signal::new(),
        }
    }

    /// Register a new root object and return its id.
    pub fn register(&self) -> ObjectId {
        let id = self.inner.write().objects.insert(ObjectEntry {
            parent: None,
            children: Vec::new(),
        });
        tracing::trace!(target: "trellis_core::object", ?id, "registered");
        id
    }

    /// Register a new object as a child of `parent`.
    pub fn register_child(&self, parent: ObjectId) -> Result<ObjectId, ObjectError> {
        let mut inner = self.inner.write();
        if !inner.objects.contains_key(parent) {
            return Err(ObjectError::InvalidObjectId);
        }
        let id = inner.objects.insert(ObjectEntry {
            parent: Some(parent),
            children: Vec::new(),
        });
        inner.objects[parent].children.push(id);
        Ok(id)
    }

    /// Move an object under a new parent (or detach it with `None`).
    pub fn set_parent(&self, id: ObjectId, parent: Option<ObjectId>) -> Result<(), ObjectError> {
        let mut inner = self.inner.write();
        if !inner.objects.contains_key(id) {
            return Err(ObjectError::InvalidObjectId);
        }
        if let Some(p) = parent {
            if !inner.objects.contains_key(p) {
                return Err(ObjectError::InvalidObjectId);
            }
            // Walk up from the new parent; hitting `id` means a cycle.
            let mut cursor = Some(p);
            while let Some(c) = cursor {
                if c == id {
                    return Err(ObjectError::ParentCycle);
                }
                cursor = inner.objects[c].parent;
            }
        }
        if let Some(old) = inner.objects[id].parent {
            if let Some(entry) = inner.objects.get_mut(old) {
                entry.children.retain(|c| *c != id);
            }
        }
        inner.objects[id].parent = parent;
        if let Some(p) = parent {
            inner.objects[p].children.push(id);
        }
        Ok(())
    }

    /// Destroy an object and its entire subtree.
    ///
    /// The `destroyed` signal fires once per removed object, after all
    /// removals are complete, so observers always see a consistent registry.
    pub fn destroy(&self, id: ObjectId) -> bool {
        let removed = {
            let mut inner = self.inner.write();
            if !inner.objects.contains_key(id) {
                return false;
            }
            if let Some(parent) = inner.objects[id].parent {
                if let Some(entry) = inner.objects.get_mut(parent) {
                    entry.children.retain(|c| *c != id);
                }
            }
            let mut removed = Vec::new();
            let mut stack = vec![id];
            while let Some(next) = stack.pop() {
                if let Some(entry) = inner.objects.remove(next) {
                    stack.extend(entry.children);
                    removed.push(next);
                }
            }
            removed
        };
        tracing::debug!(target: "trellis_core::object", ?id, count = removed.len(), "destroyed");
        for dead in removed {
            self.destroyed.emit(dead);
        }
        true
    }

    /// Whether the id refers to a live object. This is the liveness check.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.inner.read().objects.contains_key(id)
    }

    /// Parent of an object, if it has one.
    pub fn parent_of(&self, id: ObjectId) -> Option<ObjectId> {
        self.inner.read().objects.get(id).and_then(|e| e.parent)
    }

    /// Children of an object, in insertion order.
    pub fn children_of(&self, id: ObjectId) -> Vec<ObjectId> {
        self.inner
            .read()
            .objects
            .get(id)
            .map(|e| e.children.clone())
            .unwrap_or_default()
    }

    /// Whether `ancestor` is `id` itself or one of its ancestors.
    pub fn is_ancestor_of(&self, ancestor: ObjectId, id: ObjectId) -> bool {
        let inner = self.inner.read();
        let mut cursor = Some(id);
        while let Some(c) = cursor {
            if c == ancestor {
                return true;
            }
            cursor = inner.objects.get(c).and_then(|e| e.parent);
        }
        false
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.inner.read().objects.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().objects.is_empty()
    }
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_REGISTRY: OnceLock<ObjectRegistry> = OnceLock::new();

/// Initialize the process-global registry. Safe to call more than once.
pub fn init_global_registry() {
    let _ = GLOBAL_REGISTRY.set(ObjectRegistry::new());
}

/// The process-global registry, initializing it on first use.
pub fn global_registry() -> &'static ObjectRegistry {
    GLOBAL_REGISTRY.get_or_init(ObjectRegistry::new)
}

static_assertions::assert_impl_all!(ObjectRegistry: Send, Sync);
