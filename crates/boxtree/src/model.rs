//! Exported box tree.

use crate::dom::{Attribute, NodeId, PageInfo};
use crate::geometry::Rect;
use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// Identifier of an emitted box, unique within one extraction.
///
/// Ids are assigned in creation order starting at zero, so they double as
/// indices into the box list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoxId(usize);

impl BoxId {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Text decoration lines in effect for a box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Decoration {
    pub underline: bool,
    pub line_through: bool,
}

impl Decoration {
    /// Decoration requested by a `text-decoration-line` value.
    pub fn from_line_value(value: &str) -> Self {
        Self {
            underline: value.contains("underline"),
            line_through: value.contains("line-through"),
        }
    }

    /// Export code: `U` for underline, `T` for line-through; `None` when neither.
    pub fn code(self) -> Option<String> {
        let mut code = String::new();
        if self.underline {
            code.push('U');
        }
        if self.line_through {
            code.push('T');
        }
        (!code.is_empty()).then_some(code)
    }
}

impl BitOr for Decoration {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            underline: self.underline || rhs.underline,
            line_through: self.line_through || rhs.line_through,
        }
    }
}

#[allow(clippy::trivially_copy_pass_by_ref, reason = "serde passes fields by reference")]
fn is_false(value: &bool) -> bool {
    !*value
}

/// One emitted box, without its parent links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxData {
    pub id: BoxId,
    pub tag_name: String,
    /// Union of the rectangles this box covers.
    #[serde(flatten)]
    pub bounds: Rect,
    /// Rendered text, for boxes of text-only elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decoration: Option<String>,
    /// Exported style declarations, see [`crate::style::EXPORTED_PROPERTIES`].
    pub css: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Vec<Attribute>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub replaced: bool,
    pub has_bg_image: bool,
    /// First rectangle covered, counted in the parent's numbering.
    pub istart: usize,
    /// One past the last rectangle covered.
    pub iend: usize,
    /// Document node the box was created for.
    #[serde(skip)]
    pub node: Option<NodeId>,
}

/// Parent links over the box id space, one entry per box.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentTable {
    entries: Vec<Option<BoxId>>,
}

impl ParentTable {
    /// Record the parent of the next box.
    pub fn push(&mut self, parent: Option<BoxId>) {
        self.entries.push(parent);
    }

    pub fn get(&self, id: BoxId) -> Option<BoxId> {
        self.entries.get(id.index()).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Boxes together with their two parent hierarchies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoxTree {
    pub boxes: Vec<BoxData>,
    /// Box of the rendering container.
    pub parents: ParentTable,
    /// Box of the document parent.
    pub dom_parents: ParentTable,
}

impl BoxTree {
    pub fn get(&self, id: BoxId) -> Option<&BoxData> {
        self.boxes.get(id.index())
    }

    pub fn get_mut(&mut self, id: BoxId) -> Option<&mut BoxData> {
        self.boxes.get_mut(id.index())
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Flatten into the exported form with parent links inlined.
    pub fn export(self) -> Vec<ExportedBox> {
        let Self {
            boxes,
            parents,
            dom_parents,
        } = self;
        boxes
            .into_iter()
            .map(|data| ExportedBox {
                parent: parents.get(data.id),
                dom_parent: dom_parents.get(data.id),
                data,
            })
            .collect()
    }
}

/// A box as it appears in the exported result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedBox {
    #[serde(flatten)]
    pub data: BoxData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<BoxId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dom_parent: Option<BoxId>,
}

/// A box whose pixels are worth capturing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub id: BoxId,
    /// `true` when the box only has a background image, `false` for image elements.
    pub bg: bool,
    /// Captured PNG, base64 encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Captured page node the box came from.
    #[serde(skip)]
    pub source: Option<NodeId>,
}

/// Everything extracted from one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub page: PageInfo,
    /// Referenced font families confirmed to render.
    pub fonts: Vec<String>,
    pub boxes: Vec<ExportedBox>,
    pub images: Vec<ImageRef>,
}
