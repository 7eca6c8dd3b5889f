//! Page-space geometry reported by the rendering engine.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// An axis-aligned rectangle in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (`x + width`).
    #[must_use]
    pub fn right(self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (`y + height`).
    #[must_use]
    pub fn bottom(self) -> f64 {
        self.y + self.height
    }

    /// Dimensions of this rectangle.
    #[must_use]
    pub const fn size(self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }

    /// Point used to ask the renderer which text offset a line rectangle starts at:
    /// one pixel inside the left edge, vertically centered.
    #[must_use]
    pub fn caret_probe_point(self) -> Point {
        Point {
            x: self.x + 1.0,
            y: self.y + self.height / 2.0,
        }
    }

    /// Minimal rectangle enclosing every rectangle of `rects`.
    ///
    /// Returns `None` for an empty slice.
    #[must_use]
    pub fn enclosing(rects: &[Self]) -> Option<Self> {
        let (first, rest) = rects.split_first()?;
        let mut left = first.x;
        let mut top = first.y;
        let mut right = first.right();
        let mut bottom = first.bottom();
        for rect in rest {
            left = left.min(rect.x);
            top = top.min(rect.y);
            right = right.max(rect.right());
            bottom = bottom.max(rect.bottom());
        }
        Some(Self::new(left, top, right - left, bottom - top))
    }
}

/// A point in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Measured dimensions of a rendered element.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when both dimensions are zero.
    #[must_use]
    #[allow(clippy::float_cmp, reason = "offset sizes are reported as exact integers")]
    pub fn is_empty(self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }
}

/// Splits `rects` into runs of consecutive rectangles on the same row.
///
/// A new run starts whenever a rectangle's top edge differs from the one
/// immediately before it. Returned ranges index into `rects`.
#[allow(clippy::float_cmp, reason = "rows are identified by the exact reported top edge")]
pub fn row_runs(rects: &[Rect]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = 0;
    for idx in 1..rects.len() {
        if rects[idx].y != rects[idx - 1].y {
            runs.push(start..idx);
            start = idx;
        }
    }
    if start < rects.len() {
        runs.push(start..rects.len());
    }
    runs
}
