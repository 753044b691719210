//! Built-in interactive widgets.

pub mod scroll_bar;
pub mod slider;

pub use scroll_bar::ScrollBar;
pub use slider::{Slider, SliderMenuAction, SliderStyle};
