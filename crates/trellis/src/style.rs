//! Drawing delegation.
//!
//! The toolkit never rasterizes anything itself. Widgets draw through a
//! [`Canvas`] (an opaque surface supplied by the host) and delegate their
//! actual appearance to a [`LookAndFeel`], so hosts can restyle every
//! widget by swapping one object.

use trellis_core::geometry::{Color, Point, Rect};

use crate::widget::Orientation;
use crate::widget::widgets::slider::SliderStyle;

/// Minimal drawing surface supplied by the host.
pub trait Canvas {
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn draw_line(&mut self, from: Point, to: Point, color: Color, thickness: f32);

    /// Push a translation for child painting.
    fn push_translation(&mut self, offset: Point);

    /// Pop the most recent translation.
    fn pop_translation(&mut self);
}

/// A canvas that discards everything. Useful in tests and for headless
/// paint passes.
#[derive(Debug, Default)]
pub struct NullCanvas;

impl Canvas for NullCanvas {
    fn fill_rect(&mut self, _rect: Rect, _color: Color) {}
    fn draw_line(&mut self, _from: Point, _to: Point, _color: Color, _thickness: f32) {}
    fn push_translation(&mut self, _offset: Point) {}
    fn pop_translation(&mut self) {}
}

/// Everything a widget needs during its paint pass.
pub struct PaintContext<'a> {
    pub canvas: &'a mut dyn Canvas,
    pub look_and_feel: &'a dyn LookAndFeel,
    /// The widget's bounds with origin at (0, 0).
    pub rect: Rect,
}

/// Pluggable widget appearance.
///
/// Geometry arguments are in the widget's local space. Implementations
/// must not call back into the widget tree.
pub trait LookAndFeel: Send {
    /// Draw a linear slider track and thumb(s).
    ///
    /// `slider_pos` is the current thumb position in pixels along the
    /// slider's axis; `min_pos`/`max_pos` carry the extra thumbs of
    /// two/three-value styles (equal to `slider_pos` otherwise).
    fn draw_linear_slider(
        &self,
        canvas: &mut dyn Canvas,
        bounds: Rect,
        slider_pos: f32,
        min_pos: f32,
        max_pos: f32,
        style: SliderStyle,
    );

    /// Draw a rotary slider at the given angle (radians).
    fn draw_rotary_slider(
        &self,
        canvas: &mut dyn Canvas,
        bounds: Rect,
        rotary_start_angle: f32,
        rotary_end_angle: f32,
        angle: f32,
    );

    /// Draw a scrollbar track and thumb.
    fn draw_scroll_bar(
        &self,
        canvas: &mut dyn Canvas,
        bounds: Rect,
        orientation: Orientation,
        thumb_start: f32,
        thumb_size: f32,
        is_mouse_down: bool,
    );

    /// Smallest thumb the scrollbar may shrink to, in pixels.
    fn minimum_scroll_bar_thumb_size(&self) -> f32 {
        18.0
    }

    /// Length of the step buttons at each end of a scrollbar track, in
    /// pixels. Zero means no buttons (the flat default draws none).
    fn scroll_bar_button_size(&self) -> f32 {
        0.0
    }

    /// Radius of a linear slider's thumb, in pixels.
    fn slider_thumb_radius(&self) -> f32 {
        8.0
    }
}

/// Flat, single-color default appearance.
pub struct DefaultLookAndFeel {
    track_color: Color,
    thumb_color: Color,
    pressed_color: Color,
}

impl DefaultLookAndFeel {
    pub fn new() -> Self {
        Self {
            track_color: Color::rgb(60, 60, 60),
            thumb_color: Color::rgb(160, 160, 160),
            pressed_color: Color::rgb(200, 200, 200),
        }
    }
}

impl Default for DefaultLookAndFeel {
    fn default() -> Self {
        Self::new()
    }
}

impl LookAndFeel for DefaultLookAndFeel {
    fn draw_linear_slider(
        &self,
        canvas: &mut dyn Canvas,
        bounds: Rect,
        slider_pos: f32,
        min_pos: f32,
        max_pos: f32,
        style: SliderStyle,
    ) {
        canvas.fill_rect(bounds, self.track_color);
        let radius = self.slider_thumb_radius();
        let thumb = |pos: f32| {
            if style.is_vertical() {
                Rect::new(bounds.left(), pos - radius, bounds.width(), radius * 2.0)
            } else {
                Rect::new(pos - radius, bounds.top(), radius * 2.0, bounds.height())
            }
        };
        if style.is_two_value() || style.is_three_value() {
            canvas.fill_rect(thumb(min_pos), self.thumb_color);
            canvas.fill_rect(thumb(max_pos), self.thumb_color);
        }
        if !style.is_two_value() {
            canvas.fill_rect(thumb(slider_pos), self.pressed_color);
        }
    }

    fn draw_rotary_slider(
        &self,
        canvas: &mut dyn Canvas,
        bounds: Rect,
        _rotary_start_angle: f32,
        _rotary_end_angle: f32,
        angle: f32,
    ) {
        canvas.fill_rect(bounds, self.track_color);
        let center = bounds.center();
        let radius = bounds.width().min(bounds.height()) / 2.0;
        let tip = Point::new(
            center.x + angle.sin() * radius,
            center.y - angle.cos() * radius,
        );
        canvas.draw_line(center, tip, self.pressed_color, 2.0);
    }

    fn draw_scroll_bar(
        &self,
        canvas: &mut dyn Canvas,
        bounds: Rect,
        orientation: Orientation,
        thumb_start: f32,
        thumb_size: f32,
        is_mouse_down: bool,
    ) {
        canvas.fill_rect(bounds, self.track_color);
        let color = if is_mouse_down {
            self.pressed_color
        } else {
            self.thumb_color
        };
        let thumb = match orientation {
            Orientation::Vertical => {
                Rect::new(bounds.left(), thumb_start, bounds.width(), thumb_size)
            }
            Orientation::Horizontal => {
                Rect::new(thumb_start, bounds.top(), thumb_size, bounds.height())
            }
        };
        canvas.fill_rect(thumb, color);
    }
}
