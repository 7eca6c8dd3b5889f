//! Portable box trees from a browser's computed layout.
//!
//! The crate works on a [`Document`] captured from a rendering engine: every
//! element with its resolved style, rendering container and client
//! rectangles. Extraction runs in three stages:
//!
//! ```text
//! Snapshot (wire format)
//!     ↓ into_document
//! Document ──normalize──▶ Document with isolated text lines
//!     ↓ BuildContext::walk
//! boxes + requested fonts + image references
//!     ↓ FontProber::resolve
//! Extraction
//! ```
//!
//! The two renderer measurements the algorithm needs, caret lookups and
//! font probes, are the [`CaretLocator`] and [`FontMeasure`] capabilities, so
//! everything here runs against synthetic geometry as well as a live page.

#![allow(
    clippy::module_name_repetitions,
    reason = "Types like SnapshotNode read better than Node across modules"
)]

pub mod builder;
pub mod caret;
pub mod classify;
pub mod dom;
pub mod extract;
pub mod fonts;
pub mod geometry;
pub mod model;
pub mod normalize;
pub mod snapshot;
pub mod style;

// Re-exports
pub use builder::{BuildContext, BuildOutput};
pub use caret::{CaretLocator, CaretPosition, RecordedCarets};
pub use dom::{Document, ElementData, NodeId, PageInfo, RenderContainer};
pub use extract::{extract, extract_snapshot};
pub use fonts::{FontMeasure, FontProbe, FontProber, FontSet};
pub use geometry::{Point, Rect, Size};
pub use model::{BoxData, BoxId, Extraction, ExportedBox, ImageRef};
pub use snapshot::Snapshot;
pub use style::ComputedStyle;
