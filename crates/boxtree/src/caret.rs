//! Caret lookup capability used to find where visual lines start.

use crate::dom::NodeId;
use crate::geometry::Point;
use std::collections::HashMap;

/// Text position under a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaretPosition {
    /// Text node the caret landed in.
    pub node: NodeId,
    /// Offset in UTF-16 code units, as the DOM counts them.
    pub offset: usize,
}

/// Maps a page point to the text position rendered there.
pub trait CaretLocator {
    /// Returns `None` when the renderer cannot map the point to text.
    fn caret_at(&self, point: Point) -> Option<CaretPosition>;
}

/// Quantization applied to probe points before lookup (1/64 px).
const POINT_SCALE: f64 = 64.0;

fn point_key(point: Point) -> (i64, i64) {
    (
        (point.x * POINT_SCALE).round() as i64,
        (point.y * POINT_SCALE).round() as i64,
    )
}

/// Caret lookups recorded ahead of time by the page collector.
#[derive(Debug, Clone, Default)]
pub struct RecordedCarets {
    positions: HashMap<(i64, i64), CaretPosition>,
}

impl RecordedCarets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the caret found at `point`. A later record for the same point wins.
    pub fn insert(&mut self, point: Point, position: CaretPosition) {
        self.positions.insert(point_key(point), position);
    }

    #[must_use]
    pub fn with(mut self, point: Point, position: CaretPosition) -> Self {
        self.insert(point, position);
        self
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl CaretLocator for RecordedCarets {
    fn caret_at(&self, point: Point) -> Option<CaretPosition> {
        self.positions.get(&point_key(point)).copied()
    }
}
