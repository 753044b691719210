//! Trellis - a retained-mode widget toolkit core.
//!
//! Platform glue reports raw window events (pointer, key, drag, paint)
//! to a [`Desktop`](window::Desktop); the desktop routes them through
//! the widget tree with focus, modality, and drag-and-drop rules
//! applied. Widgets are plain structs implementing
//! [`Widget`](widget::Widget), stored in a
//! [`WidgetStore`](widget::WidgetStore) and identified by
//! [`ObjectId`](trellis_core::ObjectId)s that stay valid to inspect
//! after the widget dies.
//!
//! # Example
//!
//! ```
//! use trellis::widget::widgets::{Slider, SliderStyle};
//! use trellis_core::init_global_registry;
//!
//! init_global_registry();
//! let mut slider = Slider::new(SliderStyle::LinearHorizontal)
//!     .with_range(0.0, 10.0, 1.0);
//! slider.value_changed.connect(|value| {
//!     println!("slider moved to {value}");
//! });
//! slider.set_value(7.2); // snaps to 7.0
//! assert_eq!(slider.value(), 7.0);
//! ```

pub mod style;
pub mod widget;
pub mod window;

pub use trellis_core as core;

pub use style::{Canvas, DefaultLookAndFeel, LookAndFeel, NullCanvas, PaintContext};
pub use widget::{
    FocusManager, FocusPolicy, ModalManager, Orientation, Widget, WidgetAccess, WidgetStore,
};
pub use window::{Desktop, PeerId, StyleFlags, WindowPeer};
