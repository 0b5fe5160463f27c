//! # Screen Geometry
//!
//! Integer pixel points and rectangles used for control placement, overlap
//! tests and dirty-region tracking.
//!
//! Rectangles follow the usual raster convention: `(x, y)` is the top-left
//! corner, the right and bottom edges are exclusive.

use serde::Deserialize;

/// A pixel position on the display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "[i32; 2]")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns this point shifted by `(dx, dy)`.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl From<[i32; 2]> for Point {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    /// Creates a rectangle. Negative sizes are treated as empty.
    #[must_use]
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            x,
            y,
            w: w.max(0),
            h: h.max(0),
        }
    }

    /// Creates a rectangle of the given size anchored at the origin.
    #[must_use]
    pub fn from_size(w: i32, h: i32) -> Self {
        Self::new(0, 0, w, h)
    }

    /// Creates a `w` x `h` rectangle whose center is `center`.
    ///
    /// Odd sizes put the extra pixel on the right/bottom side.
    ///
    /// # Examples
    ///
    /// ```
    /// use padview::render::geometry::{Point, Rect};
    ///
    /// let rect = Rect::centered_at(Point::new(50, 50), 20, 10);
    /// assert_eq!(rect, Rect::new(40, 45, 20, 10));
    /// ```
    #[must_use]
    pub fn centered_at(center: Point, w: i32, h: i32) -> Self {
        Self::new(center.x - w / 2, center.y - h / 2, w, h)
    }

    #[must_use]
    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[must_use]
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    #[must_use]
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Returns the rectangle moved by `(dx, dy)`.
    #[must_use]
    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    /// Grows the rectangle by `dx` horizontally and `dy` vertically while
    /// keeping its center fixed.
    #[must_use]
    pub fn inflate(&self, dx: i32, dy: i32) -> Self {
        Self::new(
            self.x - dx.div_euclid(2),
            self.y - dy.div_euclid(2),
            self.w + dx,
            self.h + dy,
        )
    }

    /// Returns the part of `self` that lies inside `bounds`.
    ///
    /// When the two do not overlap the result is an empty rectangle at
    /// `self`'s top-left corner.
    #[must_use]
    pub fn clip(&self, bounds: &Rect) -> Self {
        let left = self.x.max(bounds.x);
        let top = self.y.max(bounds.y);
        let right = self.right().min(bounds.right());
        let bottom = self.bottom().min(bounds.bottom());
        if right <= left || bottom <= top {
            return Self::new(self.x, self.y, 0, 0);
        }
        Self::new(left, top, right - left, bottom - top)
    }

    /// Returns true when both rectangles share at least one pixel.
    ///
    /// Empty rectangles never intersect anything.
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Returns the smallest rectangle containing both.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        Self::new(
            left,
            top,
            self.right().max(other.right()) - left,
            self.bottom().max(other.bottom()) - top,
        )
    }
}
