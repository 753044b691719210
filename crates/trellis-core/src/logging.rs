//! Logging and debugging helpers.
//!
//! Trellis instruments itself with the `tracing` crate. Nothing is
//! printed until the application installs a subscriber:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt::init();
//!     // ...
//! }
//! ```
//!
//! [`ObjectTreeDebug`] renders the object hierarchy for debugging:
//!
//! ```ignore
//! use trellis_core::logging::ObjectTreeDebug;
//!
//! println!("{}", ObjectTreeDebug::new().format_subtree(root));
//! ```

use std::fmt::Write as _;

use crate::object::{ObjectId, global_registry};

/// Target names for log filtering with `tracing` directives.
pub mod targets {
    /// Whole-crate target.
    pub const CORE: &str = "trellis_core";
    /// Object registry target.
    pub const OBJECT: &str = "trellis_core::object";
    /// Signal emission target.
    pub const SIGNAL: &str = "trellis_core::signal";
    /// Timer service target.
    pub const TIMER: &str = "trellis_core::timer";
}

/// Renders object subtrees as indented text.
#[derive(Debug, Clone)]
pub struct ObjectTreeDebug {
    show_ids: bool,
    max_depth: Option<usize>,
}

impl ObjectTreeDebug {
    pub fn new() -> Self {
        Self {
            show_ids: true,
            max_depth: None,
        }
    }

    /// Omit object ids from the output.
    pub fn without_ids(mut self) -> Self {
        self.show_ids = false;
        self
    }

    /// Stop descending below the given depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Format the subtree rooted at `root`, one line per object.
    pub fn format_subtree(&self, root: ObjectId) -> String {
        let mut output = String::new();
        self.format_into(root, 0, &mut output);
        output
    }

    fn format_into(&self, id: ObjectId, depth: usize, output: &mut String) {
        if let Some(max) = self.max_depth
            && depth > max
        {
            return;
        }
        if !global_registry().contains(id) {
            return;
        }
        for _ in 0..depth {
            output.push_str("  ");
        }
        if self.show_ids {
            writeln!(output, "- {id:?}").expect("write to String");
        } else {
            output.push_str("- object\n");
        }
        for child in global_registry().children_of(id) {
            self.format_into(child, depth + 1, output);
        }
    }
}

impl Default for ObjectTreeDebug {
    fn default() -> Self {
        Self::new()
    }
}
