//! Slider widget.
//!
//! Maps a bounded, optionally stepped, optionally skewed value (or a
//! two/three-value tuple) to a 1-D pixel position and back, updating from
//! pointer, wheel, and modifier input.
//!
//! # Signals
//!
//! - `value_changed`: the current value changed
//! - `min_value_changed` / `max_value_changed`: the extra thumbs of
//!   two/three-value styles moved
//! - `drag_started` / `drag_ended`: a pointer gesture began or finished
//! - `menu_requested`: right-click with the popup menu enabled; hosts
//!   show the menu and apply the result through a deferred
//!   [`SliderMenuAction`]
//!
//! # Example
//!
//! ```ignore
//! let mut slider = Slider::new(SliderStyle::LinearHorizontal)
//!     .with_range(0.0, 10.0, 1.0);
//! slider.value_changed.connect(|v| println!("value: {v}"));
//! slider.set_value(3.4); // stores 3.0, the nearest step
//! ```

use std::f64::consts::PI;

use trellis_core::geometry::{Point, Rect};
use trellis_core::signal::Signal;

use crate::style::PaintContext;
use crate::widget::base::WidgetBase;
use crate::widget::events::{
    KeyboardModifiers, MouseButton, MouseDoubleClickEvent, MousePressEvent, MouseReleaseEvent,
    WheelEvent, WidgetEvent,
};
use crate::widget::Widget;

/// Visual and interaction style of a slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliderStyle {
    /// Horizontal track with one thumb.
    LinearHorizontal,
    /// Vertical track with one thumb.
    LinearVertical,
    /// Horizontal filled bar.
    LinearBar,
    /// Knob controlled by circular dragging.
    Rotary,
    /// Knob controlled by horizontal dragging.
    RotaryHorizontalDrag,
    /// Knob controlled by vertical dragging.
    RotaryVerticalDrag,
    /// Increment/decrement buttons with drag support.
    IncDecButtons,
    /// Horizontal track with min and max thumbs.
    TwoValueHorizontal,
    /// Vertical track with min and max thumbs.
    TwoValueVertical,
    /// Horizontal track with min, max, and current thumbs.
    ThreeValueHorizontal,
    /// Vertical track with min, max, and current thumbs.
    ThreeValueVertical,
}

impl SliderStyle {
    pub fn is_horizontal(&self) -> bool {
        matches!(
            self,
            Self::LinearHorizontal
                | Self::LinearBar
                | Self::TwoValueHorizontal
                | Self::ThreeValueHorizontal
        )
    }

    pub fn is_vertical(&self) -> bool {
        matches!(
            self,
            Self::LinearVertical | Self::TwoValueVertical | Self::ThreeValueVertical
        )
    }

    pub fn is_rotary(&self) -> bool {
        matches!(
            self,
            Self::Rotary | Self::RotaryHorizontalDrag | Self::RotaryVerticalDrag
        )
    }

    pub fn is_two_value(&self) -> bool {
        matches!(self, Self::TwoValueHorizontal | Self::TwoValueVertical)
    }

    pub fn is_three_value(&self) -> bool {
        matches!(self, Self::ThreeValueHorizontal | Self::ThreeValueVertical)
    }
}

/// Which thumb a pointer gesture is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DraggedThumb {
    Current,
    Min,
    Max,
}

/// Result of a slider popup menu, applied via a deferred custom event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliderMenuAction {
    /// Turn velocity-sensitive dragging on or off.
    SetVelocityMode(bool),
    /// Switch the rotary interaction style.
    SetStyle(SliderStyle),
}

/// A bounded-value widget with linear, rotary, and multi-thumb styles.
pub struct Slider {
    base: WidgetBase,
    style: SliderStyle,

    minimum: f64,
    maximum: f64,
    interval: f64,
    skew_factor: f64,
    num_decimal_places: i32,
    text_suffix: String,

    current_value: f64,
    value_min: f64,
    value_max: f64,

    // Pixel geometry along the drag axis, derived from the bounds.
    region_start: f64,
    region_size: f64,
    thumb_radius: f32,

    rotary_start: f64,
    rotary_end: f64,
    rotary_stop_at_end: bool,

    velocity_based: bool,
    velocity_sensitivity: f64,
    velocity_threshold: i32,
    velocity_offset: f64,
    user_key_overrides_velocity: bool,
    pixels_for_full_drag_extent: i32,

    snaps_to_mouse: bool,
    send_change_only_on_release: bool,
    menu_enabled: bool,
    scroll_wheel_enabled: bool,
    double_click_to_value: bool,
    double_click_return_value: f64,

    // Gesture state.
    dragged_thumb: Option<DraggedThumb>,
    use_drag_events: bool,
    has_dragged: bool,
    inc_dec_dragged: bool,
    menu_shown: bool,
    mouse_was_hidden: bool,
    wants_unbounded_mouse: bool,
    value_when_last_dragged: f64,
    value_on_mouse_down: f64,
    min_max_diff: f64,
    last_angle: f64,
    mouse_drag_start: Point,
    mouse_pos_last_drag: Point,

    /// Signal emitted when the current value changes.
    pub value_changed: Signal<f64>,
    /// Signal emitted when the min thumb value changes.
    pub min_value_changed: Signal<f64>,
    /// Signal emitted when the max thumb value changes.
    pub max_value_changed: Signal<f64>,
    /// Signal emitted when a pointer gesture begins.
    pub drag_started: Signal<()>,
    /// Signal emitted when a pointer gesture ends.
    pub drag_ended: Signal<()>,
    /// Signal emitted on right-click when the popup menu is enabled.
    pub menu_requested: Signal<Point>,
}

impl Slider {
    /// Create a slider with range [0, 10] and no stepping.
    pub fn new(style: SliderStyle) -> Self {
        Self {
            base: WidgetBase::new(),
            style,
            minimum: 0.0,
            maximum: 10.0,
            interval: 0.0,
            skew_factor: 1.0,
            num_decimal_places: 7,
            text_suffix: String::new(),
            current_value: 0.0,
            value_min: 0.0,
            value_max: 10.0,
            region_start: 0.0,
            region_size: 1.0,
            thumb_radius: 8.0,
            rotary_start: 1.2 * PI,
            rotary_end: 2.8 * PI,
            rotary_stop_at_end: true,
            velocity_based: false,
            velocity_sensitivity: 1.0,
            velocity_threshold: 1,
            velocity_offset: 0.0,
            user_key_overrides_velocity: true,
            pixels_for_full_drag_extent: 250,
            snaps_to_mouse: true,
            send_change_only_on_release: false,
            menu_enabled: false,
            scroll_wheel_enabled: true,
            double_click_to_value: false,
            double_click_return_value: 0.0,
            dragged_thumb: None,
            use_drag_events: false,
            has_dragged: false,
            inc_dec_dragged: false,
            menu_shown: false,
            mouse_was_hidden: false,
            wants_unbounded_mouse: false,
            value_when_last_dragged: 0.0,
            value_on_mouse_down: 0.0,
            min_max_diff: 0.0,
            last_angle: 0.0,
            mouse_drag_start: Point::ZERO,
            mouse_pos_last_drag: Point::ZERO,
            value_changed: Signal::new(),
            min_value_changed: Signal::new(),
            max_value_changed: Signal::new(),
            drag_started: Signal::new(),
            drag_ended: Signal::new(),
            menu_requested: Signal::new(),
        }
    }

    /// Builder: set range and interval.
    pub fn with_range(mut self, minimum: f64, maximum: f64, interval: f64) -> Self {
        self.set_range(minimum, maximum, interval);
        self
    }

    /// Builder: set the initial value without notification.
    pub fn with_value(mut self, value: f64) -> Self {
        self.current_value = self.constrained_value(value);
        self
    }

    /// Builder: set the skew factor.
    pub fn with_skew_factor(mut self, skew: f64) -> Self {
        self.set_skew_factor(skew);
        self
    }

    /// Builder: set the widget bounds.
    pub fn with_bounds(mut self, rect: Rect) -> Self {
        self.set_bounds(rect);
        self
    }

    // ===== Range and value =====

    pub fn minimum(&self) -> f64 {
        self.minimum
    }

    pub fn maximum(&self) -> f64 {
        self.maximum
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn style(&self) -> SliderStyle {
        self.style
    }

    /// Change the interaction style.
    pub fn set_style(&mut self, style: SliderStyle) {
        self.style = style;
        self.update_geometry();
    }

    /// Set the value range and step interval.
    ///
    /// Stored values are silently re-clamped; no notifications fire.
    pub fn set_range(&mut self, minimum: f64, maximum: f64, interval: f64) {
        if self.minimum == minimum && self.maximum == maximum && self.interval == interval {
            return;
        }
        self.minimum = minimum;
        self.maximum = maximum;
        self.interval = interval;

        self.num_decimal_places = 7;
        if interval != 0.0 {
            let mut v = (interval * 10_000_000.0).abs() as i64;
            while v % 10 == 0 && self.num_decimal_places > 0 {
                self.num_decimal_places -= 1;
                v /= 10;
            }
        }

        self.current_value = self.constrained_value(self.current_value);
        if self.style.is_two_value() || self.style.is_three_value() {
            self.value_min = self.constrained_value(self.value_min);
            self.value_max = self.constrained_value(self.value_max);
        }
    }

    /// Current value.
    pub fn value(&self) -> f64 {
        self.current_value
    }

    /// Min thumb value (two/three-value styles).
    pub fn min_value(&self) -> f64 {
        self.value_min
    }

    /// Max thumb value (two/three-value styles).
    pub fn max_value(&self) -> f64 {
        self.value_max
    }

    /// Set the current value, notifying on change.
    pub fn set_value(&mut self, value: f64) {
        self.update_value(value, true);
    }

    fn update_value(&mut self, value: f64, notify: bool) {
        let mut value = value;
        if self.style.is_three_value() {
            value = value.clamp(self.value_min, self.value_max);
        }
        value = self.constrained_value(value);
        if value != self.current_value {
            self.current_value = value;
            if notify {
                self.value_changed.emit(value);
            }
        }
    }

    /// Set the min thumb value.
    ///
    /// With `allow_nudging`, pushing past the other bound drags it along;
    /// otherwise the value clamps at the other bound.
    pub fn set_min_value(&mut self, value: f64, allow_nudging: bool) {
        self.update_min_value(value, true, allow_nudging);
    }

    fn update_min_value(&mut self, value: f64, notify: bool, allow_nudging: bool) {
        let mut value = self.constrained_value(value);
        if self.style.is_two_value() {
            if allow_nudging && value > self.value_max {
                self.update_max_value(value, notify, false);
            }
            value = value.min(self.value_max);
        } else {
            if allow_nudging && value > self.current_value {
                self.update_value(value, notify);
            }
            value = value.min(self.current_value);
        }
        if value != self.value_min {
            self.value_min = value;
            if notify {
                self.min_value_changed.emit(value);
            }
        }
    }

    /// Set the max thumb value. See [`set_min_value`](Self::set_min_value).
    pub fn set_max_value(&mut self, value: f64, allow_nudging: bool) {
        self.update_max_value(value, true, allow_nudging);
    }

    fn update_max_value(&mut self, value: f64, notify: bool, allow_nudging: bool) {
        let mut value = self.constrained_value(value);
        if self.style.is_two_value() {
            if allow_nudging && value < self.value_min {
                self.update_min_value(value, notify, false);
            }
            value = value.max(self.value_min);
        } else {
            if allow_nudging && value < self.current_value {
                self.update_value(value, notify);
            }
            value = value.max(self.current_value);
        }
        if value != self.value_max {
            self.value_max = value;
            if notify {
                self.max_value_changed.emit(value);
            }
        }
    }

    /// Set both extra thumbs at once, ordering the pair first.
    pub fn set_min_and_max_values(&mut self, min: f64, max: f64) {
        let (min, max) = if max < min { (max, min) } else { (min, max) };
        let min = self.constrained_value(min);
        let max = self.constrained_value(max);
        if min != self.value_min {
            self.value_min = min;
            self.min_value_changed.emit(min);
        }
        if max != self.value_max {
            self.value_max = max;
            self.max_value_changed.emit(max);
        }
    }

    /// Snap to the nearest interval step, then clamp into range.
    ///
    /// Values at or below the minimum collapse to the minimum, values at
    /// or above the maximum collapse to the maximum, and an empty range
    /// collapses everything to the minimum. Idempotent.
    pub fn constrained_value(&self, value: f64) -> f64 {
        let mut value = value;
        if self.interval > 0.0 {
            value = self.minimum + self.interval * ((value - self.minimum) / self.interval + 0.5).floor();
        }
        if value <= self.minimum || self.maximum <= self.minimum {
            self.minimum
        } else if value >= self.maximum {
            self.maximum
        } else {
            value
        }
    }

    // ===== Skew =====

    /// Power-law skew factor; 1.0 is linear.
    pub fn skew_factor(&self) -> f64 {
        self.skew_factor
    }

    pub fn set_skew_factor(&mut self, skew: f64) {
        self.skew_factor = skew;
    }

    /// Derive a skew factor so `mid_point` maps to proportion 0.5.
    pub fn set_skew_factor_from_mid_point(&mut self, mid_point: f64) {
        if self.maximum > self.minimum {
            self.skew_factor =
                0.5f64.ln() / ((mid_point - self.minimum) / (self.maximum - self.minimum)).ln();
        }
    }

    /// Map a value into the skewed [0, 1] proportion of the track.
    pub fn value_to_proportion_of_length(&self, value: f64) -> f64 {
        let n = (value - self.minimum) / (self.maximum - self.minimum);
        if self.skew_factor == 1.0 {
            n
        } else {
            n.powf(self.skew_factor)
        }
    }

    /// Inverse of [`value_to_proportion_of_length`](Self::value_to_proportion_of_length).
    pub fn proportion_of_length_to_value(&self, proportion: f64) -> f64 {
        let mut proportion = proportion;
        if self.skew_factor != 1.0 && proportion > 0.0 {
            proportion = (proportion.ln() / self.skew_factor).exp();
        }
        self.minimum + (self.maximum - self.minimum) * proportion
    }

    // ===== Behavior configuration =====

    /// Enable velocity-sensitive dragging.
    pub fn set_velocity_based_mode(&mut self, velocity_based: bool) {
        self.velocity_based = velocity_based;
    }

    pub fn is_velocity_based(&self) -> bool {
        self.velocity_based
    }

    /// Tune velocity dragging and whether modifier keys flip the mode.
    pub fn set_velocity_mode_parameters(
        &mut self,
        sensitivity: f64,
        threshold: i32,
        offset: f64,
        user_can_override: bool,
    ) {
        self.velocity_sensitivity = sensitivity;
        self.velocity_threshold = threshold;
        self.velocity_offset = offset;
        self.user_key_overrides_velocity = user_can_override;
    }

    /// Set the rotary angle range (radians, clockwise from 12 o'clock)
    /// and whether dragging stops at the ends instead of wrapping.
    pub fn set_rotary_parameters(&mut self, start_angle: f64, end_angle: f64, stop_at_end: bool) {
        self.rotary_start = start_angle;
        self.rotary_end = end_angle;
        self.rotary_stop_at_end = stop_at_end;
    }

    /// Pixels of offset-relative drag that span the whole range.
    pub fn set_mouse_drag_sensitivity(&mut self, pixels_for_full_extent: i32) {
        self.pixels_for_full_drag_extent = pixels_for_full_extent.max(1);
    }

    /// Whether a linear-slider click jumps the thumb to the pointer.
    pub fn set_snaps_to_mouse_position(&mut self, snaps: bool) {
        self.snaps_to_mouse = snaps;
    }

    /// Suppress change notifications until the drag ends.
    pub fn set_change_notification_only_on_release(&mut self, only_on_release: bool) {
        self.send_change_only_on_release = only_on_release;
    }

    /// Enable the right-click popup menu.
    pub fn set_popup_menu_enabled(&mut self, enabled: bool) {
        self.menu_enabled = enabled;
    }

    /// Enable scroll-wheel value changes.
    pub fn set_scroll_wheel_enabled(&mut self, enabled: bool) {
        self.scroll_wheel_enabled = enabled;
    }

    /// Reset to `return_value` on double click.
    pub fn set_double_click_return_value(&mut self, enabled: bool, return_value: f64) {
        self.double_click_to_value = enabled;
        self.double_click_return_value = return_value;
    }

    /// Suffix appended by [`text_from_value`](Self::text_from_value).
    pub fn set_text_value_suffix(&mut self, suffix: impl Into<String>) {
        self.text_suffix = suffix.into();
    }

    /// Format a value for display, honoring the interval's precision.
    pub fn text_from_value(&self, value: f64) -> String {
        if self.num_decimal_places > 0 {
            format!("{:.*}{}", self.num_decimal_places as usize, value, self.text_suffix)
        } else {
            format!("{}{}", value.round() as i64, self.text_suffix)
        }
    }

    /// Whether a velocity drag wants unbounded pointer movement.
    ///
    /// The host's mouse-source collaborator polls this to hide the cursor
    /// and lift screen-edge clamping during the drag.
    pub fn wants_unbounded_mouse(&self) -> bool {
        self.wants_unbounded_mouse
    }

    /// Set the widget bounds and recompute track geometry.
    pub fn set_bounds(&mut self, rect: Rect) {
        self.base.set_rect(rect);
        self.update_geometry();
    }

    // ===== Geometry =====

    fn update_geometry(&mut self) {
        let rect = self.base.rect();
        let (length, margin) = if self.style.is_vertical() {
            (rect.height() as f64, self.thumb_radius as f64)
        } else {
            (rect.width() as f64, self.thumb_radius as f64)
        };
        if self.style.is_rotary() {
            self.region_start = 0.0;
            self.region_size = length.max(1.0);
        } else {
            self.region_start = margin;
            self.region_size = (length - 2.0 * margin).max(1.0);
        }
    }

    /// Pixel position of a value along the drag axis.
    pub fn linear_slider_pos(&self, value: f64) -> f32 {
        let mut proportion = self.value_to_proportion_of_length(value);
        if self.style.is_vertical() {
            proportion = 1.0 - proportion;
        }
        (self.region_start + proportion * self.region_size) as f32
    }

    // ===== Gesture handling =====

    fn is_absolute_drag_mode(&self, modifiers: KeyboardModifiers) -> bool {
        self.velocity_based
            == (self.user_key_overrides_velocity && modifiers.any_command_modifier())
    }

    fn mouse_down(&mut self, event: &MousePressEvent) -> bool {
        self.has_dragged = false;
        self.inc_dec_dragged = false;
        self.mouse_pos_last_drag = event.local_pos;

        if event.button == MouseButton::Right {
            if self.menu_enabled {
                self.menu_shown = true;
                self.menu_requested.emit(event.local_pos);
                return true;
            }
            return false;
        }

        if self.maximum <= self.minimum {
            return false;
        }

        self.dragged_thumb = Some(self.thumb_at(event.local_pos));
        self.use_drag_events = true;
        self.min_max_diff = self.value_max - self.value_min;
        self.last_angle = self.rotary_start
            + (self.rotary_end - self.rotary_start)
                * self.value_to_proportion_of_length(self.current_value);
        self.value_when_last_dragged = match self.dragged_thumb {
            Some(DraggedThumb::Min) => self.value_min,
            Some(DraggedThumb::Max) => self.value_max,
            _ => self.current_value,
        };
        self.value_on_mouse_down = self.value_when_last_dragged;
        self.mouse_drag_start = event.local_pos;
        self.drag_started.emit(());
        self.drag_to(event.local_pos, event.modifiers);
        true
    }

    /// Pick the thumb nearest the press, with a small bias toward the
    /// min/max thumbs so they stay reachable at small gaps.
    fn thumb_at(&self, pos: Point) -> DraggedThumb {
        if !self.style.is_two_value() && !self.style.is_three_value() {
            return DraggedThumb::Current;
        }
        let mouse_pos = if self.style.is_vertical() {
            pos.y
        } else {
            pos.x
        };
        let normal_dist = (self.linear_slider_pos(self.current_value) - mouse_pos).abs();
        let min_dist = (self.linear_slider_pos(self.value_min) - 0.1 - mouse_pos).abs();
        let max_dist = (self.linear_slider_pos(self.value_max) + 0.1 - mouse_pos).abs();

        if self.style.is_two_value() {
            if max_dist <= min_dist {
                DraggedThumb::Max
            } else {
                DraggedThumb::Min
            }
        } else if normal_dist >= min_dist && max_dist >= normal_dist {
            DraggedThumb::Min
        } else if normal_dist >= max_dist {
            DraggedThumb::Max
        } else {
            DraggedThumb::Current
        }
    }

    fn drag_to(&mut self, pos: Point, modifiers: KeyboardModifiers) -> bool {
        if !self.use_drag_events || self.maximum <= self.minimum || self.menu_shown {
            return false;
        }
        if !self.has_dragged && self.mouse_drag_start.distance_to(pos) > 4.0 {
            self.has_dragged = true;
        }

        if self.style == SliderStyle::Rotary {
            self.handle_rotary_drag(pos);
        } else {
            if self.style == SliderStyle::IncDecButtons && !self.inc_dec_dragged {
                if self.mouse_drag_start.distance_to(pos) < 10.0 {
                    self.mouse_pos_last_drag = pos;
                    return true;
                }
                self.inc_dec_dragged = true;
                self.mouse_drag_start = pos;
            }
            if self.is_absolute_drag_mode(modifiers)
                || (self.maximum - self.minimum) / self.region_size < self.interval
            {
                self.handle_absolute_drag(pos);
            } else {
                self.handle_velocity_drag(pos);
            }
        }

        self.value_when_last_dragged =
            self.value_when_last_dragged.clamp(self.minimum, self.maximum);
        let notify = !self.send_change_only_on_release;
        match self.dragged_thumb {
            Some(DraggedThumb::Min) => {
                self.update_min_value(self.value_when_last_dragged, notify, true);
                if modifiers.shift {
                    self.update_max_value(self.value_min + self.min_max_diff, notify, false);
                } else {
                    self.min_max_diff = self.value_max - self.value_min;
                }
            }
            Some(DraggedThumb::Max) => {
                self.update_max_value(self.value_when_last_dragged, notify, true);
                if modifiers.shift {
                    self.update_min_value(self.value_max - self.min_max_diff, notify, false);
                } else {
                    self.min_max_diff = self.value_max - self.value_min;
                }
            }
            _ => {
                self.update_value(self.value_when_last_dragged, notify);
            }
        }
        self.mouse_pos_last_drag = pos;
        true
    }

    fn handle_absolute_drag(&mut self, pos: Point) {
        let mouse_pos = if self.style.is_horizontal() || self.style == SliderStyle::RotaryHorizontalDrag
        {
            pos.x as f64
        } else {
            pos.y as f64
        };
        let mut scaled = (mouse_pos - self.region_start) / self.region_size;

        let offset_relative = matches!(
            self.style,
            SliderStyle::RotaryHorizontalDrag
                | SliderStyle::RotaryVerticalDrag
                | SliderStyle::IncDecButtons
        ) || (matches!(
            self.style,
            SliderStyle::LinearHorizontal | SliderStyle::LinearVertical | SliderStyle::LinearBar
        ) && !self.snaps_to_mouse);

        if offset_relative {
            let horizontal_drag =
                self.style == SliderStyle::RotaryHorizontalDrag || self.style.is_horizontal();
            let mouse_diff = if horizontal_drag {
                (pos.x - self.mouse_drag_start.x) as f64
            } else {
                (self.mouse_drag_start.y - pos.y) as f64
            };
            let new_pos = self.value_to_proportion_of_length(self.value_on_mouse_down)
                + mouse_diff / self.pixels_for_full_drag_extent as f64;
            self.value_when_last_dragged =
                self.proportion_of_length_to_value(new_pos.clamp(0.0, 1.0));
        } else {
            if self.style.is_vertical() {
                scaled = 1.0 - scaled;
            }
            self.value_when_last_dragged =
                self.proportion_of_length_to_value(scaled.clamp(0.0, 1.0));
        }
    }

    fn handle_velocity_drag(&mut self, pos: Point) {
        let horizontal_drag = self.style.is_horizontal()
            || self.style == SliderStyle::RotaryHorizontalDrag
            || self.style == SliderStyle::IncDecButtons;
        let mouse_diff = if horizontal_drag {
            (pos.x - self.mouse_pos_last_drag.x) as f64
        } else {
            (pos.y - self.mouse_pos_last_drag.y) as f64
        };

        let max_speed = (self.region_size.max(200.0)).max(1.0);
        let mut speed = mouse_diff.abs().clamp(0.0, max_speed);
        if speed != 0.0 {
            // Easing curve: slow near the threshold, accelerating toward
            // half the max speed.
            speed = 0.2
                * self.velocity_sensitivity
                * (1.0
                    + (PI
                        * (1.5
                            + (self.velocity_offset
                                + (speed - self.velocity_threshold as f64).max(0.0) / max_speed)
                                .min(0.5)))
                        .sin());
            if mouse_diff < 0.0 {
                speed = -speed;
            }
            if self.style.is_vertical() || self.style == SliderStyle::RotaryVerticalDrag {
                speed = -speed;
            }

            let current_pos = self.value_to_proportion_of_length(self.value_when_last_dragged);
            self.value_when_last_dragged =
                self.proportion_of_length_to_value((current_pos + speed).clamp(0.0, 1.0));

            self.wants_unbounded_mouse = true;
            self.mouse_was_hidden = true;
        }
    }

    fn handle_rotary_drag(&mut self, pos: Point) {
        let center = self.base.rect().with_origin(Point::ZERO).center();
        let dx = (pos.x - center.x) as f64;
        let dy = (pos.y - center.y) as f64;

        if dx * dx + dy * dy <= 25.0 {
            return;
        }
        let mut angle = dx.atan2(-dy);
        while angle < 0.0 {
            angle += 2.0 * PI;
        }

        if self.rotary_stop_at_end && self.has_dragged {
            // Prevent wrap jumps once a drag is engaged.
            if (angle - self.last_angle).abs() > PI {
                if angle >= self.last_angle {
                    angle -= 2.0 * PI;
                } else {
                    angle += 2.0 * PI;
                }
            }
            if angle >= self.last_angle {
                angle = angle.min(self.rotary_start.max(self.rotary_end));
            } else {
                angle = angle.max(self.rotary_start.min(self.rotary_end));
            }
        } else {
            while angle < self.rotary_start {
                angle += 2.0 * PI;
            }
            if angle > self.rotary_end {
                if smallest_angle_between(angle, self.rotary_start)
                    <= smallest_angle_between(angle, self.rotary_end)
                {
                    angle = self.rotary_start;
                } else {
                    angle = self.rotary_end;
                }
            }
        }

        let proportion = (angle - self.rotary_start) / (self.rotary_end - self.rotary_start);
        self.value_when_last_dragged =
            self.proportion_of_length_to_value(proportion.clamp(0.0, 1.0));
        self.last_angle = angle;
    }

    fn mouse_up(&mut self, _event: &MouseReleaseEvent) -> bool {
        if self.menu_shown {
            self.menu_shown = false;
            self.use_drag_events = false;
            self.dragged_thumb = None;
            return true;
        }
        if self.use_drag_events && self.maximum > self.minimum {
            self.restore_mouse_if_hidden();
            if self.send_change_only_on_release && self.value_on_mouse_down != self.current_value {
                self.value_changed.emit(self.current_value);
            }
            self.drag_ended.emit(());
            self.dragged_thumb = None;
            self.use_drag_events = false;
            return true;
        }
        false
    }

    fn mouse_double_click(&mut self, _event: &MouseDoubleClickEvent) -> bool {
        if self.double_click_to_value
            && self.style != SliderStyle::IncDecButtons
            && self.minimum <= self.double_click_return_value
            && self.maximum >= self.double_click_return_value
        {
            self.drag_started.emit(());
            self.set_value(self.double_click_return_value);
            self.drag_ended.emit(());
            return true;
        }
        false
    }

    fn wheel_move(&mut self, event: &WheelEvent) -> bool {
        if !self.scroll_wheel_enabled
            || self.style.is_two_value()
            || self.style.is_three_value()
        {
            return false;
        }
        if self.maximum > self.minimum && self.dragged_thumb.is_none() {
            let mut amount = if event.delta_x != 0.0 {
                -event.delta_x as f64
            } else {
                event.delta_y as f64
            };
            if event.is_reversed {
                amount = -amount;
            }
            let proportion_delta = amount * 0.15;
            let current_pos = self.value_to_proportion_of_length(self.current_value);
            let new_value =
                self.proportion_of_length_to_value((current_pos + proportion_delta).clamp(0.0, 1.0));

            // Never step by less than one interval.
            let mut delta = if new_value != self.current_value {
                (new_value - self.current_value).abs().max(self.interval)
            } else {
                0.0
            };
            if self.current_value > new_value {
                delta = -delta;
            }
            if delta != 0.0 {
                self.drag_started.emit(());
                self.update_value(self.current_value + delta, true);
                self.drag_ended.emit(());
            }
        }
        true
    }

    fn modifier_keys_changed(&mut self, modifiers: KeyboardModifiers) {
        if self.style != SliderStyle::IncDecButtons
            && self.style != SliderStyle::Rotary
            && self.velocity_based == modifiers.any()
        {
            self.restore_mouse_if_hidden();
        }
    }

    fn restore_mouse_if_hidden(&mut self) {
        self.mouse_was_hidden = false;
        self.wants_unbounded_mouse = false;
    }

    fn apply_menu_action(&mut self, action: SliderMenuAction) {
        match action {
            SliderMenuAction::SetVelocityMode(velocity) => self.set_velocity_based_mode(velocity),
            SliderMenuAction::SetStyle(style) => self.set_style(style),
        }
    }
}

/// Shortest angular distance between two angles.
fn smallest_angle_between(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs();
    diff.min(2.0 * PI - diff)
}

impl Widget for Slider {
    fn widget_base(&self) -> &WidgetBase {
        &self.base
    }

    fn widget_base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }

    fn event(&mut self, event: &mut WidgetEvent) -> bool {
        if !self.base.is_enabled() {
            return false;
        }
        match event {
            WidgetEvent::MousePress(e) => {
                let e = *e;
                self.mouse_down(&e)
            }
            WidgetEvent::MouseMove(e) => {
                let (pos, modifiers) = (e.local_pos, e.modifiers);
                self.drag_to(pos, modifiers)
            }
            WidgetEvent::MouseRelease(e) => {
                let e = *e;
                self.mouse_up(&e)
            }
            WidgetEvent::MouseDoubleClick(e) => {
                let e = *e;
                self.mouse_double_click(&e)
            }
            WidgetEvent::Wheel(e) => {
                let e = *e;
                self.wheel_move(&e)
            }
            WidgetEvent::ModifiersChange(e) => {
                let modifiers = e.modifiers;
                self.modifier_keys_changed(modifiers);
                false
            }
            WidgetEvent::Resize(_) => {
                self.update_geometry();
                true
            }
            WidgetEvent::Custom(e) => match e.payload_as::<SliderMenuAction>() {
                Some(action) => {
                    let action = *action;
                    self.apply_menu_action(action);
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    fn paint(&mut self, ctx: &mut PaintContext<'_>) {
        let rect = ctx.rect;
        if self.style.is_rotary() {
            let angle = self.rotary_start
                + (self.rotary_end - self.rotary_start)
                    * self.value_to_proportion_of_length(self.current_value);
            ctx.look_and_feel.draw_rotary_slider(
                ctx.canvas,
                rect,
                self.rotary_start as f32,
                self.rotary_end as f32,
                angle as f32,
            );
        } else {
            ctx.look_and_feel.draw_linear_slider(
                ctx.canvas,
                rect,
                self.linear_slider_pos(self.current_value),
                self.linear_slider_pos(self.value_min),
                self.linear_slider_pos(self.value_max),
                self.style,
            );
        }
    }
}

static_assertions::assert_impl_all!(Slider: Send, Sync);
