//! Screen-space geometry.
//!
//! [`Point`] and [`Size`] are the embedded-graphics types; [`Rect`] is an
//! edge-based rectangle (left/top inclusive, right/bottom exclusive) because
//! clipping and damage tracking are expressed as edge intersections.

use core::ops::{BitAnd, BitOr};

use embedded_graphics::primitives::Rectangle;

pub use embedded_graphics::geometry::{Point, Size};

/// Axis-aligned rectangle in screen units.
///
/// Always normalized: `right >= left` and `bottom >= top`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl Rect {
    /// The canonical empty rectangle, returned by disjoint intersections.
    pub const EMPTY: Rect = Rect {
        left: 0,
        top: 0,
        right: 0,
        bottom: 0,
    };

    /// Create a rectangle from its edges, swapping edges given in reverse.
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        let (left, right) = if right < left {
            (right, left)
        } else {
            (left, right)
        };
        let (top, bottom) = if bottom < top {
            (bottom, top)
        } else {
            (top, bottom)
        };
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Create a rectangle from its top-left corner and size.
    pub const fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(
            origin.x,
            origin.y,
            origin.x + size.width as i32,
            origin.y + size.height as i32,
        )
    }

    /// Rectangle covering a whole screen of the given size.
    pub const fn screen(size: Size) -> Self {
        Self::from_origin_size(Point::zero(), size)
    }

    pub const fn left(&self) -> i32 {
        self.left
    }

    pub const fn top(&self) -> i32 {
        self.top
    }

    pub const fn right(&self) -> i32 {
        self.right
    }

    pub const fn bottom(&self) -> i32 {
        self.bottom
    }

    pub const fn width(&self) -> u32 {
        (self.right - self.left) as u32
    }

    pub const fn height(&self) -> u32 {
        (self.bottom - self.top) as u32
    }

    pub const fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub const fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    pub const fn is_empty(&self) -> bool {
        self.right == self.left || self.bottom == self.top
    }

    /// Center point, rounded toward the top-left.
    pub const fn center(&self) -> Point {
        Point::new(
            self.left + (self.right - self.left) / 2,
            self.top + (self.bottom - self.top) / 2,
        )
    }

    pub const fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
    }

    /// Whether `other` lies completely inside this rectangle.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.is_empty()
            || (other.left >= self.left
                && other.top >= self.top
                && other.right <= self.right
                && other.bottom <= self.bottom)
    }

    /// Same rectangle moved by `offset`.
    pub const fn translate(&self, offset: Point) -> Self {
        Self {
            left: self.left + offset.x,
            top: self.top + offset.y,
            right: self.right + offset.x,
            bottom: self.bottom + offset.y,
        }
    }

    /// Shrink each edge by `amount` (clamped so the result stays normalized).
    pub fn inset(&self, amount: i32) -> Self {
        let w = (self.right - self.left) / 2;
        let h = (self.bottom - self.top) / 2;
        let dx = amount.min(w);
        let dy = amount.min(h);
        Self {
            left: self.left + dx,
            top: self.top + dy,
            right: self.right - dx,
            bottom: self.bottom - dy,
        }
    }

    /// Intersection with `other`; [`Rect::EMPTY`] when they do not overlap.
    pub fn intersection(&self, other: &Rect) -> Self {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);
        if left >= right || top >= bottom {
            Self::EMPTY
        } else {
            Self {
                left,
                top,
                right,
                bottom,
            }
        }
    }

    /// Smallest rectangle covering both. Empty operands are ignored.
    pub fn union(&self, other: &Rect) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Iterate over the points inside the rectangle, row by row.
    pub fn points(&self) -> impl Iterator<Item = Point> + use<> {
        let rect = *self;
        (rect.top..rect.bottom).flat_map(move |y| (rect.left..rect.right).map(move |x| Point::new(x, y)))
    }
}

impl BitAnd for Rect {
    type Output = Rect;

    fn bitand(self, rhs: Rect) -> Rect {
        self.intersection(&rhs)
    }
}

impl BitOr for Rect {
    type Output = Rect;

    fn bitor(self, rhs: Rect) -> Rect {
        self.union(&rhs)
    }
}

impl From<Rectangle> for Rect {
    fn from(rect: Rectangle) -> Self {
        Rect::from_origin_size(rect.top_left, rect.size)
    }
}

impl From<Rect> for Rectangle {
    fn from(rect: Rect) -> Self {
        Rectangle::new(rect.origin(), rect.size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersection_overlap() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 20, 20);
        assert_eq!(a & b, Rect::new(5, 5, 10, 10));
    }

    #[test]
    fn test_intersection_disjoint_is_empty() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 20, 10);
        let c = Rect::new(30, 30, 40, 40);
        assert!((a & b).is_empty());
        assert_eq!(a & c, Rect::EMPTY);
    }

    #[test]
    fn test_new_normalizes_edges() {
        let r = Rect::new(10, 20, 0, 5);
        assert_eq!(r.left(), 0);
        assert_eq!(r.top(), 5);
        assert_eq!(r.right(), 10);
        assert_eq!(r.bottom(), 20);
        assert_eq!(r.size(), Size::new(10, 15));
    }

    #[test]
    fn test_union_ignores_empty() {
        let a = Rect::new(2, 2, 4, 4);
        assert_eq!(a | Rect::EMPTY, a);
        assert_eq!(a | Rect::new(8, 0, 9, 3), Rect::new(2, 0, 9, 4));
    }

    #[test]
    fn test_contains_is_half_open() {
        let r = Rect::new(0, 0, 10, 10);
        assert!(r.contains(Point::new(0, 0)));
        assert!(r.contains(Point::new(9, 9)));
        assert!(!r.contains(Point::new(10, 5)));
    }

    #[test]
    fn test_rectangle_conversion() {
        let r = Rect::new(3, 4, 13, 24);
        let eg: Rectangle = r.into();
        assert_eq!(eg.top_left, Point::new(3, 4));
        assert_eq!(eg.size, Size::new(10, 20));
        assert_eq!(Rect::from(eg), r);
    }

    #[test]
    fn test_translate_and_inset() {
        let r = Rect::new(0, 0, 10, 10).translate(Point::new(5, -5));
        assert_eq!(r, Rect::new(5, -5, 15, 5));
        assert_eq!(r.inset(2), Rect::new(7, -3, 13, 3));
        assert_eq!(Rect::new(0, 0, 2, 2).inset(5), Rect::new(1, 1, 1, 1));
    }
}
