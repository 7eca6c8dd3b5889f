//! Wire format of a captured page.
//!
//! The browser side serializes the rendered body into a flat node list in
//! document order, together with the caret lookups the normalizer will ask
//! for. Everything the extraction needs is in here, so a snapshot can be
//! stored and replayed without a browser.

use crate::caret::{CaretPosition, RecordedCarets};
use crate::dom::{Attribute, Document, ElementData, Node, NodeId, PageInfo, RenderContainer};
use crate::geometry::{Point, Rect, Size};
use crate::style::ComputedStyle;
use anyhow::{Context as _, Result, bail, ensure};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// A captured page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub page: PageInfo,
    /// Nodes in document order; the first one is the body.
    pub nodes: Vec<SnapshotNode>,
    #[serde(default)]
    pub carets: Vec<RecordedCaret>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SnapshotNode {
    Element(SnapshotElement),
    Text(SnapshotText),
}

impl SnapshotNode {
    fn parent(&self) -> Option<usize> {
        match self {
            Self::Element(element) => element.parent,
            Self::Text(text) => text.parent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
    pub tag_name: String,
    #[serde(default)]
    pub attrs: Vec<Attribute>,
    #[serde(default)]
    pub style: ComputedStyle,
    pub container: SnapshotContainer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_text: Option<String>,
    #[serde(default)]
    pub rects: Vec<Rect>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotText {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
    pub text: String,
    #[serde(default)]
    pub rects: Vec<Rect>,
}

/// `offsetParent` as the collector saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SnapshotContainer {
    Node { index: usize },
    None,
    Unsupported,
}

/// Result of one caret lookup made by the collector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecordedCaret {
    pub x: f64,
    pub y: f64,
    /// Index of the text node the caret landed in.
    pub node: usize,
    /// UTF-16 offset inside that node.
    pub offset: usize,
}

impl Snapshot {
    /// Decode a snapshot from the collector's JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not match the wire format.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("malformed page snapshot")
    }

    /// Build the document and caret table described by this snapshot.
    ///
    /// Node `i` of the snapshot becomes `NodeId` `i`. Carets pointing at
    /// anything but a text node are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is not a parentless element, a parent
    /// does not precede its child or is not an element, or a container index
    /// is out of range.
    pub fn into_document(self) -> Result<(Document, RecordedCarets)> {
        let Self { page, nodes, carets } = self;
        let mut nodes = nodes.into_iter().enumerate();
        let Some((_, SnapshotNode::Element(root))) = nodes.next() else {
            bail!("snapshot root must be an element");
        };
        ensure!(root.parent.is_none(), "snapshot root has a parent");
        let root_rects = root.rects.clone();
        let mut document = Document::new(page, element_data(root, 0, 0)?, root_rects);
        document.set_origin(document.root(), NodeId::from_index(0));

        for (index, node) in nodes {
            let parent = node
                .parent()
                .with_context(|| format!("snapshot node {index} has no parent"))?;
            ensure!(
                parent < index,
                "snapshot node {index} refers to parent {parent} that does not precede it"
            );
            let parent_id = NodeId::from_index(parent);
            ensure!(
                document.element(parent_id).is_some(),
                "snapshot node {index} has text node {parent} as parent"
            );
            let id = match node {
                SnapshotNode::Element(element) => {
                    let rects = element.rects.clone();
                    let data = element_data(element, index, index)?;
                    document.append_element(parent_id, data, rects)
                }
                SnapshotNode::Text(text) => document.append_text(parent_id, &text.text, text.rects),
            };
            document.set_origin(id, NodeId::from_index(index));
        }

        let mut recorded = RecordedCarets::new();
        for caret in carets {
            let node = NodeId::from_index(caret.node);
            if document.get(node).and_then(Node::text).is_none() {
                trace!("dropping caret at ({}, {}): node {} is not text", caret.x, caret.y, caret.node);
                continue;
            }
            recorded.insert(
                Point::new(caret.x, caret.y),
                CaretPosition {
                    node,
                    offset: caret.offset,
                },
            );
        }
        debug!(
            "snapshot decoded: {} nodes, {} carets",
            document.len(),
            recorded.len()
        );
        Ok((document, recorded))
    }
}

/// Element data for snapshot node `index`; `known` nodes precede it.
fn element_data(element: SnapshotElement, index: usize, known: usize) -> Result<ElementData> {
    let container = match element.container {
        SnapshotContainer::Node { index: container } => {
            ensure!(
                container < known,
                "snapshot node {index} has container {container} outside the captured nodes"
            );
            RenderContainer::Node(NodeId::from_index(container))
        }
        SnapshotContainer::None => RenderContainer::None,
        SnapshotContainer::Unsupported => RenderContainer::Unsupported,
    };
    let offset_size = match (element.offset_width, element.offset_height) {
        (Some(width), Some(height)) => Some(Size::new(width, height)),
        _ => None,
    };
    Ok(ElementData {
        tag_name: element.tag_name,
        attributes: element.attrs,
        style: element.style,
        container,
        offset_size,
        inner_text: element.inner_text,
    })
}
