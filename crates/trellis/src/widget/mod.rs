//! Widget system: the [`Widget`] trait, shared base state, event dispatch,
//! focus handling, modality, and drag-and-drop.
//!
//! Widgets are plain structs embedding a [`WidgetBase`] and implementing
//! [`Widget`]. They live in a [`WidgetStore`] (or any other
//! [`WidgetAccess`] implementation); tree structure and liveness are
//! recorded in the global object registry, so an [`ObjectId`] held across a
//! callback can always be re-checked before further use.

pub mod base;
pub mod dispatcher;
pub mod drag_drop;
pub mod events;
pub mod focus;
pub mod modal;
pub mod store;
pub mod text_input;
pub mod widgets;

use trellis_core::geometry::Point;
use trellis_core::object::ObjectId;

pub use base::{KeyListener, KeyListenerId, WidgetBase};
pub use dispatcher::{DispatchResult, EventDispatcher, WidgetAccess};
pub use drag_drop::{DragInfo, DragPayload, FileDropTarget, TextDropTarget};
pub use events::{
    FocusReason, Key, KeyboardModifiers, MouseButton, WidgetEvent,
};
pub use focus::FocusManager;
pub use modal::ModalManager;
pub use store::WidgetStore;
pub use text_input::{TextEditor, TextInputClient};

use crate::style::PaintContext;
use drag_drop::{FileDropTarget as FileTarget, TextDropTarget as TextTarget};
use text_input::TextInputClient as TextInput;

/// How a widget participates in keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusPolicy {
    /// Never receives focus.
    #[default]
    NoFocus,
    /// Receives focus via Tab traversal.
    TabFocus,
    /// Receives focus via mouse click.
    ClickFocus,
    /// Receives focus via Tab or click.
    StrongFocus,
}

impl FocusPolicy {
    /// Whether Tab traversal may land on this widget.
    pub fn accepts_tab(&self) -> bool {
        matches!(self, Self::TabFocus | Self::StrongFocus)
    }

    /// Whether a mouse click may focus this widget.
    pub fn accepts_click(&self) -> bool {
        matches!(self, Self::ClickFocus | Self::StrongFocus)
    }
}

/// Axis of a scrollbar or linear slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// The interface every widget implements.
///
/// The capability queries (`as_file_drop_target` and friends) replace
/// downcasting: dispatch code asks a widget for the interface it needs and
/// gets `None` from widgets that do not provide it.
pub trait Widget: Send {
    /// Shared widget state.
    fn widget_base(&self) -> &WidgetBase;

    /// Shared widget state, mutable.
    fn widget_base_mut(&mut self) -> &mut WidgetBase;

    /// Handle an event. Return true (or accept the event) when handled.
    fn event(&mut self, event: &mut WidgetEvent) -> bool {
        let _ = event;
        false
    }

    /// Draw this widget. The context origin is the widget's top-left corner.
    fn paint(&mut self, ctx: &mut PaintContext<'_>) {
        let _ = ctx;
    }

    /// Hit test in local coordinates. Defaults to the widget's rectangle.
    fn contains_point(&self, local_pos: Point) -> bool {
        let size = self.widget_base().rect().size;
        local_pos.x >= 0.0
            && local_pos.y >= 0.0
            && local_pos.x < size.width
            && local_pos.y < size.height
    }

    /// File drag-and-drop capability, if this widget accepts file drags.
    fn as_file_drop_target(&mut self) -> Option<&mut dyn FileTarget> {
        None
    }

    /// Text drag-and-drop capability, if this widget accepts text drags.
    fn as_text_drop_target(&mut self) -> Option<&mut dyn TextTarget> {
        None
    }

    /// Text input capability, if this widget edits text.
    fn as_text_input(&mut self) -> Option<&mut dyn TextInput> {
        None
    }
}

/// Convenience accessor for a widget's object id.
pub fn widget_id(widget: &dyn Widget) -> ObjectId {
    widget.widget_base().id()
}
