//! Reactive properties with change detection.
//!
//! A [`Property`] wraps a value and reports whether a `set` actually changed
//! it. Widgets pair a property with a [`Signal`](crate::signal::Signal) and
//! only emit when `set` returns true, which is what makes redundant external
//! driving a no-op instead of a notification storm.

use parking_lot::RwLock;

/// A value with compare-before-store change detection.
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T: Clone> Property<T> {
    /// Create a property with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Access the value through a closure without cloning.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.value.read())
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Store a new value. Returns true if it differed from the old one.
    pub fn set(&self, new_value: T) -> bool {
        let mut value = self.value.write();
        if *value == new_value {
            false
        } else {
            *value = new_value;
            true
        }
    }
}

impl<T: Clone + std::fmt::Debug> std::fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Property").field(&self.get()).finish()
    }
}
