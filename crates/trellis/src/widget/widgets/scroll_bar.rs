//! Scroll bar widget.
//!
//! Tracks a visible window into a total range and keeps a proportional
//! thumb in sync. Paging, stepping, thumb dragging, wheel, and keyboard
//! navigation all funnel through [`ScrollBar::set_current_range`], which
//! is the single place the `range_moved` signal fires from.

use std::sync::Arc;
use std::time::Duration;

use trellis_core::geometry::{Point, Rect, Span};
use trellis_core::signal::Signal;
use trellis_core::timer::{TimerId, TimerService};

use crate::style::PaintContext;
use crate::widget::base::WidgetBase;
use crate::widget::events::{Key, MousePressEvent, TimerEvent, WheelEvent, WidgetEvent};
use crate::widget::{Orientation, Widget};

/// A proportional-thumb scroll bar.
pub struct ScrollBar {
    base: WidgetBase,
    orientation: Orientation,

    total_range: Span,
    visible_range: Span,
    single_step: f64,

    // Pixel geometry along the scroll axis.
    thumb_area_start: f32,
    thumb_area_size: f32,
    thumb_start: f32,
    thumb_size: f32,
    min_thumb_size: f32,
    button_size: f32,

    autohides: bool,

    initial_repeat_delay: Duration,
    repeat_interval: Duration,
    timer_service: Option<Arc<TimerService>>,
    repeat_timer: Option<TimerId>,

    // Gesture state.
    is_mouse_down: bool,
    dragging_thumb: bool,
    last_mouse_pos: f32,
    drag_start_mouse_pos: f32,
    drag_start_range: f64,

    /// Signal emitted with the new range start whenever the visible
    /// range moves.
    pub range_moved: Signal<f64>,
}

impl ScrollBar {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            base: WidgetBase::new(),
            orientation,
            total_range: Span::new(0.0, 1.0),
            visible_range: Span::new(0.0, 1.0),
            single_step: 0.1,
            thumb_area_start: 0.0,
            thumb_area_size: 1.0,
            thumb_start: 0.0,
            thumb_size: 0.0,
            min_thumb_size: 18.0,
            button_size: 0.0,
            autohides: true,
            initial_repeat_delay: Duration::from_millis(400),
            repeat_interval: Duration::from_millis(40),
            timer_service: None,
            repeat_timer: None,
            is_mouse_down: false,
            dragging_thumb: false,
            last_mouse_pos: 0.0,
            drag_start_mouse_pos: 0.0,
            drag_start_range: 0.0,
            range_moved: Signal::new(),
        }
    }

    /// Builder: set the widget bounds.
    pub fn with_bounds(mut self, rect: Rect) -> Self {
        self.set_bounds(rect);
        self
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
        self.update_layout();
    }

    /// Timer service used for press-and-hold paging. Without one, track
    /// presses still page once but do not auto-repeat.
    pub fn set_timer_service(&mut self, service: Arc<TimerService>) {
        self.timer_service = Some(service);
    }

    /// Delay before auto-repeat paging starts and its repeat cadence.
    pub fn set_repeat_speeds(&mut self, initial_delay: Duration, interval: Duration) {
        self.initial_repeat_delay = initial_delay;
        self.repeat_interval = interval;
    }

    /// Reserve step-button zones at each track end. Hosts usually pass
    /// the look-and-feel's `scroll_bar_button_size` here.
    pub fn set_button_size(&mut self, size: f32) {
        self.button_size = size.max(0.0);
        self.update_layout();
    }

    /// Smallest pixel size the thumb may shrink to. Hosts usually pass
    /// the look-and-feel's `minimum_scroll_bar_thumb_size` here.
    pub fn set_minimum_thumb_size(&mut self, size: f32) {
        self.min_thumb_size = size.max(0.0);
        self.update_thumb_position();
    }

    // ===== Range =====

    pub fn total_range(&self) -> Span {
        self.total_range
    }

    pub fn current_range(&self) -> Span {
        self.visible_range
    }

    pub fn current_range_start(&self) -> f64 {
        self.visible_range.start()
    }

    pub fn single_step_size(&self) -> f64 {
        self.single_step
    }

    pub fn set_single_step_size(&mut self, step: f64) {
        self.single_step = step;
    }

    /// Set the scrollable extent, re-clipping the visible range into it.
    pub fn set_range_limits(&mut self, limits: Span) {
        self.total_range = limits;
        self.set_current_range(self.visible_range);
        self.update_thumb_position();
    }

    /// Move or resize the visible window, returning whether it changed.
    pub fn set_current_range(&mut self, range: Span) -> bool {
        let constrained = self.total_range.constrain_range(range);
        if constrained == self.visible_range {
            return false;
        }
        self.visible_range = constrained;
        self.update_thumb_position();
        self.range_moved.emit(self.visible_range.start());
        true
    }

    /// Move the visible window, keeping its length.
    pub fn set_current_range_start(&mut self, start: f64) -> bool {
        let length = self.visible_range.length();
        self.set_current_range(Span::new(start, start + length))
    }

    pub fn move_in_steps(&mut self, steps: i32) -> bool {
        self.set_current_range_start(
            self.visible_range.start() + steps as f64 * self.single_step,
        )
    }

    pub fn move_in_pages(&mut self, pages: i32) -> bool {
        self.set_current_range_start(
            self.visible_range.start() + pages as f64 * self.visible_range.length(),
        )
    }

    pub fn scroll_to_top(&mut self) -> bool {
        self.set_current_range_start(self.total_range.start())
    }

    pub fn scroll_to_bottom(&mut self) -> bool {
        self.set_current_range_start(self.total_range.end() - self.visible_range.length())
    }

    // ===== Auto-hide =====

    /// When enabled (the default), the bar hides itself whenever the
    /// visible range covers the whole total range.
    pub fn set_auto_hide(&mut self, autohides: bool) {
        self.autohides = autohides;
        self.update_thumb_position();
    }

    pub fn auto_hides(&self) -> bool {
        self.autohides
    }

    // ===== Geometry =====

    /// Set the widget bounds and recompute track geometry.
    pub fn set_bounds(&mut self, rect: Rect) {
        self.base.set_rect(rect);
        self.update_layout();
    }

    pub fn thumb_bounds(&self) -> (f32, f32) {
        (self.thumb_start, self.thumb_size)
    }

    fn axis_length(&self) -> f32 {
        let rect = self.base.rect();
        match self.orientation {
            Orientation::Vertical => rect.height(),
            Orientation::Horizontal => rect.width(),
        }
    }

    fn axis_pos(&self, pos: Point) -> f32 {
        match self.orientation {
            Orientation::Vertical => pos.y,
            Orientation::Horizontal => pos.x,
        }
    }

    fn update_layout(&mut self) {
        let length = self.axis_length();
        let button = self.button_size.min(length / 2.0);
        self.thumb_area_start = button;
        self.thumb_area_size = length - 2.0 * button;
        self.update_thumb_position();
    }

    fn update_thumb_position(&mut self) {
        let total_len = self.total_range.length();
        let visible_len = self.visible_range.length();

        let mut thumb_size = if total_len > 0.0 {
            (visible_len * self.thumb_area_size as f64 / total_len).round() as f32
        } else {
            self.thumb_area_size
        };
        if thumb_size < self.min_thumb_size {
            thumb_size = self.min_thumb_size.min(self.thumb_area_size - 1.0);
        }
        thumb_size = thumb_size.min(self.thumb_area_size);
        self.thumb_size = thumb_size;

        self.thumb_start = if total_len > visible_len {
            self.thumb_area_start
                + ((self.visible_range.start() - self.total_range.start())
                    * (self.thumb_area_size - thumb_size) as f64
                    / (total_len - visible_len))
                    .round() as f32
        } else {
            self.thumb_area_start
        };

        self.base
            .set_visible(!self.autohides || total_len > visible_len);
    }

    // ===== Gestures =====

    fn mouse_down(&mut self, event: &MousePressEvent) -> bool {
        self.is_mouse_down = true;
        self.dragging_thumb = false;
        let pos = self.axis_pos(event.local_pos);
        self.last_mouse_pos = pos;
        self.drag_start_mouse_pos = pos;
        self.drag_start_range = self.visible_range.start();

        if pos < self.thumb_area_start {
            self.move_in_steps(-1);
            self.start_repeat_timer();
        } else if pos >= self.thumb_area_start + self.thumb_area_size {
            self.move_in_steps(1);
            self.start_repeat_timer();
        } else if pos < self.thumb_start {
            self.move_in_pages(-1);
            self.start_repeat_timer();
        } else if pos >= self.thumb_start + self.thumb_size {
            self.move_in_pages(1);
            self.start_repeat_timer();
        } else {
            self.dragging_thumb = self.thumb_area_size > self.thumb_size;
        }
        true
    }

    fn mouse_drag(&mut self, pos: Point) -> bool {
        let pos = self.axis_pos(pos);
        self.last_mouse_pos = pos;
        if self.dragging_thumb && self.thumb_area_size > self.thumb_size {
            let delta = (pos - self.drag_start_mouse_pos) as f64;
            self.set_current_range_start(
                self.drag_start_range
                    + delta * (self.total_range.length() - self.visible_range.length())
                        / (self.thumb_area_size - self.thumb_size) as f64,
            );
            return true;
        }
        self.is_mouse_down
    }

    fn mouse_up(&mut self) -> bool {
        self.is_mouse_down = false;
        self.dragging_thumb = false;
        self.stop_repeat_timer();
        true
    }

    fn start_repeat_timer(&mut self) {
        self.stop_repeat_timer();
        if let Some(service) = self.timer_service.clone() {
            self.repeat_timer = Some(service.start_repeating(
                self.base.id(),
                self.initial_repeat_delay,
                self.repeat_interval,
                std::time::Instant::now(),
            ));
        }
    }

    fn stop_repeat_timer(&mut self) {
        if let (Some(service), Some(timer)) = (&self.timer_service, self.repeat_timer.take()) {
            service.stop(timer);
        }
    }

    fn timer_fired(&mut self, event: &TimerEvent) -> bool {
        if Some(event.timer_id) != self.repeat_timer {
            return false;
        }
        if !self.is_mouse_down {
            self.stop_repeat_timer();
            return true;
        }
        // Keep stepping or paging toward the held pointer; paging stops
        // once the thumb reaches it.
        let pos = self.last_mouse_pos;
        if pos < self.thumb_area_start {
            self.move_in_steps(-1);
        } else if pos >= self.thumb_area_start + self.thumb_area_size {
            self.move_in_steps(1);
        } else if pos < self.thumb_start {
            self.move_in_pages(-1);
        } else if pos >= self.thumb_start + self.thumb_size {
            self.move_in_pages(1);
        }
        true
    }

    fn wheel_move(&mut self, event: &WheelEvent) -> bool {
        let mut amount = if event.delta_x != 0.0 {
            event.delta_x as f64
        } else {
            event.delta_y as f64
        };
        if event.is_reversed {
            amount = -amount;
        }
        self.set_current_range_start(self.visible_range.start() - amount * self.single_step);
        true
    }

    fn key_pressed(&mut self, key: Key) -> bool {
        match key {
            Key::ArrowUp | Key::ArrowLeft => self.move_in_steps(-1),
            Key::ArrowDown | Key::ArrowRight => self.move_in_steps(1),
            Key::PageUp => self.move_in_pages(-1),
            Key::PageDown => self.move_in_pages(1),
            Key::Home => self.scroll_to_top(),
            Key::End => self.scroll_to_bottom(),
            _ => false,
        }
    }
}

impl Widget for ScrollBar {
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
                let pos = e.local_pos;
                self.mouse_drag(pos)
            }
            WidgetEvent::MouseRelease(_) => self.mouse_up(),
            WidgetEvent::Wheel(e) => {
                let e = *e;
                self.wheel_move(&e)
            }
            WidgetEvent::KeyPress(e) => {
                let key = e.key;
                self.key_pressed(key)
            }
            WidgetEvent::Timer(e) => {
                let e = *e;
                self.timer_fired(&e)
            }
            WidgetEvent::Resize(_) => {
                self.update_layout();
                true
            }
            _ => false,
        }
    }

    fn paint(&mut self, ctx: &mut PaintContext<'_>) {
        ctx.look_and_feel.draw_scroll_bar(
            ctx.canvas,
            ctx.rect,
            self.orientation,
            self.thumb_start,
            self.thumb_size,
            self.is_mouse_down,
        );
    }
}

static_assertions::assert_impl_all!(ScrollBar: Send, Sync);
