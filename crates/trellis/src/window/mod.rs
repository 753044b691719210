//! Window layer: peers, the desktop, and pointer input sources.

pub mod desktop;
pub mod input_source;
pub mod peer;

pub use desktop::{DeferredAction, Desktop};
pub use input_source::{DefaultMouseSource, MouseInputSource, PointerEvent, PointerEventKind};
pub use peer::{BoundsConstrainer, PeerId, StyleFlags, WindowPeer};
