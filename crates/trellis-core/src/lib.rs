//! Core systems for Trellis.
//!
//! This crate holds the foundation the widget layer builds on:
//!
//! - [`geometry`]: points, rectangles, colors, and numeric ranges
//! - [`signal`]: mutation-safe multicast signals
//! - [`object`]: object identity, tree structure, and liveness checks
//! - [`property`]: values with compare-before-store change detection
//! - [`timer`]: poll-driven timer scheduling for the UI loop
//! - [`logging`]: tracing targets and object-tree debug output
//!
//! Everything here is `Send + Sync`, but the intended model is a single
//! logical UI thread: platform callbacks are marshaled onto that thread
//! before touching any of these structures.

pub mod geometry;
pub mod logging;
pub mod object;
pub mod property;
pub mod signal;
pub mod timer;

pub use geometry::{Color, Point, Rect, Size, Span};
pub use object::{
    ObjectError, ObjectId, ObjectRegistry, global_registry, init_global_registry,
};
pub use property::Property;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
pub use timer::{TimerId, TimerService};
