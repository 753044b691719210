//! Per-window state.
//!
//! A [`WindowPeer`] is the desktop-side record of one native window: its
//! root widget, bounds, style flags, and the bookkeeping the event
//! handlers need between callbacks (drag tracking, last focus, masked
//! regions).

use std::time::Instant;

use trellis_core::geometry::{Point, Rect};
use trellis_core::object::ObjectId;

slotmap::new_key_type! {
    /// Key identifying a window peer within a desktop.
    pub struct PeerId;
}

/// Window decoration and behavior flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StyleFlags(u32);

impl StyleFlags {
    pub const HAS_TITLE_BAR: StyleFlags = StyleFlags(1 << 0);
    pub const IS_RESIZABLE: StyleFlags = StyleFlags(1 << 1);
    pub const HAS_CLOSE_BUTTON: StyleFlags = StyleFlags(1 << 2);
    pub const HAS_MINIMISE_BUTTON: StyleFlags = StyleFlags(1 << 3);
    pub const HAS_MAXIMISE_BUTTON: StyleFlags = StyleFlags(1 << 4);
    pub const APPEARS_ON_TASKBAR: StyleFlags = StyleFlags(1 << 5);
    /// Tooltip/menu style window that never takes keyboard focus.
    pub const IS_TEMPORARY: StyleFlags = StyleFlags(1 << 6);
    pub const IGNORES_MOUSE_CLICKS: StyleFlags = StyleFlags(1 << 7);
    pub const IGNORES_KEY_PRESSES: StyleFlags = StyleFlags(1 << 8);
    pub const IS_SEMI_TRANSPARENT: StyleFlags = StyleFlags(1 << 9);

    pub fn empty() -> Self {
        StyleFlags(0)
    }

    pub fn contains(self, other: StyleFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn with(self, other: StyleFlags) -> Self {
        StyleFlags(self.0 | other.0)
    }
}

/// Restricts where a window may be moved or resized to.
pub trait BoundsConstrainer: Send {
    /// Adjust a proposed bounds change. `previous` is the current bounds.
    fn constrain(&self, proposed: Rect, previous: Rect) -> Rect;
}

/// Desktop-side record of one native window.
pub struct WindowPeer {
    unique_id: u64,
    root: ObjectId,
    pub(crate) bounds: Rect,
    style_flags: StyleFlags,
    pub(crate) last_paint_time: Instant,
    constrainer: Option<Box<dyn BoundsConstrainer>>,
    pub(crate) last_non_fullscreen_bounds: Rect,
    pub(crate) fullscreen: bool,
    pub(crate) minimized: bool,
    masked_region: Vec<Rect>,

    // Transient input bookkeeping.
    pub(crate) drag_target: Option<ObjectId>,
    pub(crate) last_drag_widget: Option<ObjectId>,
    pub(crate) last_focused_widget: Option<ObjectId>,
}

impl WindowPeer {
    pub(crate) fn new(unique_id: u64, root: ObjectId, bounds: Rect, style_flags: StyleFlags) -> Self {
        Self {
            unique_id,
            root,
            bounds,
            style_flags,
            last_paint_time: Instant::now(),
            constrainer: None,
            last_non_fullscreen_bounds: bounds,
            fullscreen: false,
            minimized: false,
            masked_region: Vec::new(),
            drag_target: None,
            last_drag_widget: None,
            last_focused_widget: None,
        }
    }

    /// Id that is unique across all peers ever created by a desktop.
    pub fn unique_id(&self) -> u64 {
        self.unique_id
    }

    /// Root widget shown in this window.
    pub fn root_widget(&self) -> ObjectId {
        self.root
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn style_flags(&self) -> StyleFlags {
        self.style_flags
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    /// Bounds to restore to when leaving fullscreen.
    pub fn last_non_fullscreen_bounds(&self) -> Rect {
        self.last_non_fullscreen_bounds
    }

    pub fn last_paint_time(&self) -> Instant {
        self.last_paint_time
    }

    pub fn set_constrainer(&mut self, constrainer: Option<Box<dyn BoundsConstrainer>>) {
        self.constrainer = constrainer;
    }

    /// Run a proposed bounds change through the constrainer, if any.
    pub fn constrain_bounds(&self, proposed: Rect) -> Rect {
        match &self.constrainer {
            Some(constrainer) => constrainer.constrain(proposed, self.bounds),
            None => proposed,
        }
    }

    // Masked regions exclude areas (such as a floating drag image) from
    // hit testing during drags.

    pub fn clear_masked_region(&mut self) {
        self.masked_region.clear();
    }

    pub fn add_masked_region(&mut self, area: Rect) {
        self.masked_region.push(area);
    }

    /// Whether a window-space point falls inside a masked area.
    pub fn is_point_masked(&self, pos: Point) -> bool {
        self.masked_region.iter().any(|r| r.contains(pos))
    }
}
