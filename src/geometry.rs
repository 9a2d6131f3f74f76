//! Bounds geometry for glyph layout
//!
//! Coordinates are in pixels with the origin on the text baseline:
//! positive X extends in the direction of layout, positive Y extends
//! downward. Glyph bounds above the baseline therefore have a negative
//! `top`.

use std::fmt;

/// An axis-aligned rectangle stored as its four edges.
///
/// Used for glyph bounds and the aggregate bounding box of a layout.
/// A rectangle whose left/right and top/bottom edges coincide is *empty*:
/// it draws nothing and is the identity element of [`Rect::union`].
///
/// # Examples
///
/// ```
/// use glyphrun::Rect;
///
/// let mut bounds = Rect::EMPTY;
/// bounds.union(&Rect::new(0.0, -8.0, 6.0, 0.0));
/// bounds.union(&Rect::new(6.0, -10.0, 12.0, 2.0));
///
/// assert_eq!(bounds, Rect::new(0.0, -10.0, 12.0, 2.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Smallest X edge.
    pub left: f32,
    /// Smallest Y edge (most negative is furthest above the baseline).
    pub top: f32,
    /// Largest X edge.
    pub right: f32,
    /// Largest Y edge.
    pub bottom: f32,
}

impl Rect {
    /// The empty rectangle at the origin.
    pub const EMPTY: Self = Self {
        left: 0.0,
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
    };

    /// Creates a rectangle from its four edges.
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Returns true if this rectangle encloses no area in either axis.
    ///
    /// Mirrors the drawing convention: a degenerate rectangle contributes
    /// nothing to a union and renders nothing.
    pub fn is_empty(&self) -> bool {
        self.left == self.right && self.top == self.bottom
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Grows this rectangle to cover `other`.
    ///
    /// Empty rectangles are ignored; the union of an empty rectangle with
    /// anything is the other operand.
    pub fn union(&mut self, other: &Rect) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = *other;
        } else {
            self.left = self.left.min(other.left);
            self.top = self.top.min(other.top);
            self.right = self.right.max(other.right);
            self.bottom = self.bottom.max(other.bottom);
        }
    }

    /// Returns this rectangle translated by `(dx, dy)`.
    pub fn offset(&self, dx: f32, dy: f32) -> Rect {
        Rect {
            left: self.left + dx,
            top: self.top + dy,
            right: self.right + dx,
            bottom: self.bottom + dy,
        }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.left, self.top, self.right, self.bottom
        )
    }
}
