//! Drag-and-drop payloads and target capabilities.
//!
//! A drag carries either a file list or free text. Widgets opt into
//! receiving drags by returning themselves from the matching capability
//! query on [`Widget`](super::Widget); the two capabilities are mutually
//! exclusive per drag, decided by the payload kind.
//!
//! The enter/move/exit/drop state machine itself lives on the desktop
//! (`Desktop::handle_drag_move` and friends); this module holds the data
//! types, the target traits, and the ancestor walk that picks a target.

use std::path::PathBuf;

use trellis_core::geometry::Point;
use trellis_core::object::{ObjectId, global_registry};

use super::dispatcher::WidgetAccess;

/// What a drag carries.
#[derive(Debug, Clone, PartialEq)]
pub enum DragPayload {
    /// One or more file paths.
    Files(Vec<PathBuf>),
    /// A piece of text.
    Text(String),
}

/// One in-flight drag step: payload plus a window-space position.
#[derive(Debug, Clone, PartialEq)]
pub struct DragInfo {
    pub payload: DragPayload,
    /// Position in window coordinates.
    pub position: Point,
}

impl DragInfo {
    /// A file drag at the given position.
    pub fn files(files: Vec<PathBuf>, position: Point) -> Self {
        Self {
            payload: DragPayload::Files(files),
            position,
        }
    }

    /// A text drag at the given position.
    pub fn text(text: impl Into<String>, position: Point) -> Self {
        Self {
            payload: DragPayload::Text(text.into()),
            position,
        }
    }

    /// Whether this drag carries one or more files.
    pub fn contains_files(&self) -> bool {
        matches!(&self.payload, DragPayload::Files(files) if !files.is_empty())
    }

    /// Same payload at a different position.
    pub fn at(&self, position: Point) -> Self {
        Self {
            payload: self.payload.clone(),
            position,
        }
    }
}

/// Receiver of file drags.
pub trait FileDropTarget {
    /// Whether this target wants the dragged files. Queried when the
    /// target search runs, not on every move.
    fn is_interested_in_file_drag(&self, files: &[PathBuf]) -> bool;

    /// The drag moved onto this target.
    fn file_drag_enter(&mut self, files: &[PathBuf], position: Point) {
        let _ = (files, position);
    }

    /// The drag moved while over this target.
    fn file_drag_move(&mut self, files: &[PathBuf], position: Point) {
        let _ = (files, position);
    }

    /// The drag left this target (or was cancelled).
    fn file_drag_exit(&mut self, files: &[PathBuf]) {
        let _ = files;
    }

    /// The files were dropped here. Delivered deferred, never from inside
    /// the platform's drop callback.
    fn files_dropped(&mut self, files: &[PathBuf], position: Point);
}

/// Receiver of text drags.
pub trait TextDropTarget {
    /// Whether this target wants the dragged text.
    fn is_interested_in_text_drag(&self, text: &str) -> bool;

    fn text_drag_enter(&mut self, text: &str, position: Point) {
        let _ = (text, position);
    }

    fn text_drag_move(&mut self, text: &str, position: Point) {
        let _ = (text, position);
    }

    fn text_drag_exit(&mut self, text: &str) {
        let _ = text;
    }

    /// The text was dropped here. Delivered deferred.
    fn text_dropped(&mut self, text: &str, position: Point);
}

/// Whether the widget has the capability matching the drag's payload kind.
pub(crate) fn is_suitable_target<S: WidgetAccess + ?Sized>(
    storage: &mut S,
    id: ObjectId,
    info: &DragInfo,
) -> bool {
    let Some(widget) = storage.get_widget_mut(id) else {
        return false;
    };
    if info.contains_files() {
        widget.as_file_drop_target().is_some()
    } else {
        widget.as_text_drop_target().is_some()
    }
}

fn is_interested<S: WidgetAccess + ?Sized>(
    storage: &mut S,
    id: ObjectId,
    info: &DragInfo,
) -> bool {
    let Some(widget) = storage.get_widget_mut(id) else {
        return false;
    };
    match &info.payload {
        DragPayload::Files(files) => widget
            .as_file_drop_target()
            .map(|t| t.is_interested_in_file_drag(files))
            .unwrap_or(false),
        DragPayload::Text(text) => widget
            .as_text_drop_target()
            .map(|t| t.is_interested_in_text_drag(text))
            .unwrap_or(false),
    }
}

/// Walk from the hit widget up through its ancestors and pick the first
/// suitable target that either is the previously locked target or reports
/// interest in the payload.
pub(crate) fn find_drop_target<S: WidgetAccess + ?Sized>(
    storage: &mut S,
    hit: Option<ObjectId>,
    info: &DragInfo,
    last_target: Option<ObjectId>,
) -> Option<ObjectId> {
    let mut cursor = hit;
    while let Some(id) = cursor {
        if is_suitable_target(storage, id, info)
            && (Some(id) == last_target || is_interested(storage, id, info))
        {
            return Some(id);
        }
        cursor = global_registry().parent_of(id);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::base::WidgetBase;
    use crate::widget::store::WidgetStore;
    use crate::widget::Widget;
    use trellis_core::object::init_global_registry;

    struct FileSink {
        base: WidgetBase,
        interested: bool,
    }

    impl Widget for FileSink {
        fn widget_base(&self) -> &WidgetBase {
            &self.base
        }

        fn widget_base_mut(&mut self) -> &mut WidgetBase {
            &mut self.base
        }

        fn as_file_drop_target(&mut self) -> Option<&mut dyn FileDropTarget> {
            Some(self)
        }
    }

    impl FileDropTarget for FileSink {
        fn is_interested_in_file_drag(&self, _files: &[PathBuf]) -> bool {
            self.interested
        }

        fn files_dropped(&mut self, _files: &[PathBuf], _position: Point) {}
    }

    struct Plain {
        base: WidgetBase,
    }

    impl Widget for Plain {
        fn widget_base(&self) -> &WidgetBase {
            &self.base
        }

        fn widget_base_mut(&mut self) -> &mut WidgetBase {
            &mut self.base
        }
    }

    fn file_info() -> DragInfo {
        DragInfo::files(vec![PathBuf::from("/tmp/a.txt")], Point::ZERO)
    }

    #[test]
    fn contains_files_requires_nonempty_list() {
        assert!(file_info().contains_files());
        assert!(!DragInfo::files(Vec::new(), Point::ZERO).contains_files());
        assert!(!DragInfo::text("hello", Point::ZERO).contains_files());
    }

    #[test]
    fn search_walks_ancestors_to_interested_target() {
        init_global_registry();
        let mut store = WidgetStore::new();

        let sink = store.insert(FileSink {
            base: WidgetBase::new(),
            interested: true,
        });
        let middle = store.insert(Plain {
            base: WidgetBase::new_child(sink),
        });
        let leaf = store.insert(Plain {
            base: WidgetBase::new_child(middle),
        });

        let target = find_drop_target(&mut store, Some(leaf), &file_info(), None);
        assert_eq!(target, Some(sink));
    }

    #[test]
    fn uninterested_target_is_skipped_unless_locked() {
        init_global_registry();
        let mut store = WidgetStore::new();

        let outer = store.insert(FileSink {
            base: WidgetBase::new(),
            interested: true,
        });
        let inner = store.insert(FileSink {
            base: WidgetBase::new_child(outer),
            interested: false,
        });

        // Not interested and not the locked target: the walk passes it by.
        assert_eq!(
            find_drop_target(&mut store, Some(inner), &file_info(), None),
            Some(outer)
        );
        // As the locked target it keeps the drag without being re-queried.
        assert_eq!(
            find_drop_target(&mut store, Some(inner), &file_info(), Some(inner)),
            Some(inner)
        );
    }

    #[test]
    fn text_drag_ignores_file_targets() {
        init_global_registry();
        let mut store = WidgetStore::new();
        let sink = store.insert(FileSink {
            base: WidgetBase::new(),
            interested: true,
        });

        let info = DragInfo::text("snippet", Point::ZERO);
        assert_eq!(find_drop_target(&mut store, Some(sink), &info, None), None);
    }
}
