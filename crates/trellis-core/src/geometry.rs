//! Geometry primitives shared by the widget and window layers.
//!
//! Pixel-space types (`Point`, `Size`, `Rect`) are `f32`; the numeric
//! range type used by value widgets (`Span`) is `f64` so sliders and
//! scrollbars do not lose precision over large ranges.

use std::fmt;

/// A 2D point in logical pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// The origin point (0, 0).
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a new point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: Point) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Return this point offset by the given deltas.
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A 2D size in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    /// A size of zero width and height.
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    /// Create a new size.
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero or negative.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// An axis-aligned rectangle defined by origin and size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    /// An empty rectangle at the origin.
    pub const ZERO: Self = Self {
        origin: Point::ZERO,
        size: Size::ZERO,
    };

    /// Create a rectangle from origin coordinates and dimensions.
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// Left edge x coordinate.
    pub fn left(&self) -> f32 {
        self.origin.x
    }

    /// Top edge y coordinate.
    pub fn top(&self) -> f32 {
        self.origin.y
    }

    /// Right edge x coordinate (exclusive).
    pub fn right(&self) -> f32 {
        self.origin.x + self.size.width
    }

    /// Bottom edge y coordinate (exclusive).
    pub fn bottom(&self) -> f32 {
        self.origin.y + self.size.height
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f32 {
        self.size.width
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f32 {
        self.size.height
    }

    /// Center point of the rectangle.
    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }

    /// Whether the given point lies inside this rectangle.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left()
            && point.x < self.right()
            && point.y >= self.top()
            && point.y < self.bottom()
    }

    /// Whether this rectangle overlaps another.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Return this rectangle offset by the given deltas.
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self {
            origin: self.origin.translated(dx, dy),
            size: self.size,
        }
    }

    /// Return this rectangle with a different origin.
    pub fn with_origin(&self, origin: Point) -> Self {
        Self {
            origin,
            size: self.size,
        }
    }

    /// Return this rectangle with a different size.
    pub fn with_size(&self, size: Size) -> Self {
        Self {
            origin: self.origin,
            size,
        }
    }
}

/// An RGBA color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// Create an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Create a color with explicit alpha.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// A continuous numeric range, `start..end`, in `f64`.
///
/// Used for slider value ranges and scrollbar total/visible ranges.
/// `start` is always kept <= `end`; constructors and mutators normalize.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Span {
    start: f64,
    end: f64,
}

impl Span {
    /// An empty range at zero.
    pub const ZERO: Self = Self {
        start: 0.0,
        end: 0.0,
    };

    /// Create a range, swapping the bounds if given in reverse order.
    pub fn new(start: f64, end: f64) -> Self {
        if end < start {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    /// Create a range from a start position and a non-negative length.
    pub fn with_length(start: f64, length: f64) -> Self {
        Self::new(start, start + length.max(0.0))
    }

    /// Start of the range.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// End of the range.
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Length of the range.
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// Whether the range has zero length.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether the value lies within `[start, end)`.
    ///
    /// An empty range contains nothing.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.start && value < self.end
    }

    /// Clamp a value into `[start, end]`.
    pub fn clip_value(&self, value: f64) -> f64 {
        value.clamp(self.start, self.end)
    }

    /// Return this range moved so it starts at the given position.
    pub fn moved_to_start_at(&self, new_start: f64) -> Self {
        Self {
            start: new_start,
            end: new_start + self.length(),
        }
    }

    /// Return this range moved so it ends at the given position.
    pub fn moved_to_end_at(&self, new_end: f64) -> Self {
        Self {
            start: new_end - self.length(),
            end: new_end,
        }
    }

    /// Constrain another range to fit within this one.
    ///
    /// The other range's length is preserved where possible (it is capped
    /// at this range's length), and its position is shifted so it lies
    /// entirely inside `self`.
    pub fn constrain_range(&self, other: Span) -> Span {
        let length = other.length().min(self.length());
        let start = other.start.clamp(self.start, self.end - length);
        Span {
            start,
            end: start + length,
        }
    }

    /// Return the union of this range and another.
    pub fn union(&self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_and_edges() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(r.right(), 110.0);
        assert_eq!(r.bottom(), 70.0);
        assert!(r.contains(Point::new(10.0, 20.0)));
        assert!(r.contains(Point::new(109.9, 69.9)));
        assert!(!r.contains(Point::new(110.0, 20.0)));
        assert!(!r.contains(Point::new(9.9, 30.0)));
    }

    #[test]
    fn rect_intersects() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        let c = Rect::new(20.0, 20.0, 5.0, 5.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn span_normalizes_reversed_bounds() {
        let s = Span::new(10.0, 2.0);
        assert_eq!(s.start(), 2.0);
        assert_eq!(s.end(), 10.0);
        assert_eq!(s.length(), 8.0);
    }

    #[test]
    fn span_clip_value() {
        let s = Span::new(0.0, 100.0);
        assert_eq!(s.clip_value(-5.0), 0.0);
        assert_eq!(s.clip_value(50.0), 50.0);
        assert_eq!(s.clip_value(200.0), 100.0);
    }

    #[test]
    fn span_constrain_range_shifts_and_caps() {
        let total = Span::new(0.0, 100.0);

        // Overhanging the end shifts back.
        let v = total.constrain_range(Span::new(95.0, 105.0));
        assert_eq!(v, Span::new(90.0, 100.0));

        // Overhanging the start shifts forward.
        let v = total.constrain_range(Span::new(-5.0, 5.0));
        assert_eq!(v, Span::new(0.0, 10.0));

        // Longer than total is capped to total.
        let v = total.constrain_range(Span::new(-50.0, 200.0));
        assert_eq!(v, total);
    }

    #[test]
    fn span_moves_preserve_length() {
        let s = Span::new(10.0, 30.0);
        assert_eq!(s.moved_to_start_at(50.0), Span::new(50.0, 70.0));
        assert_eq!(s.moved_to_end_at(15.0), Span::new(-5.0, 15.0));
    }
}
