//! Document tree the extraction walks.
//!
//! Nodes live in an arena indexed by [`NodeId`]; parent and children links are
//! plain ids. Every node carries the client rectangles the renderer reported
//! for it, so the whole extraction can run without a live renderer.

use crate::geometry::{Rect, Size};
use crate::style::ComputedStyle;
use serde::{Deserialize, Serialize};

/// Stable index of a node inside one [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One `name="value"` pair of a source element, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_owned(),
            value: value.to_owned(),
        }
    }
}

/// The element whose positioning context an element is laid out in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderContainer {
    /// Laid out relative to this element.
    Node(NodeId),
    /// The engine reports no container (fixed positioning, the root, hidden content).
    None,
    /// The element has no notion of a container at all (SVG content).
    Unsupported,
}

/// Element-specific node data.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Tag name as the DOM reports it (upper case for HTML).
    pub tag_name: String,
    pub attributes: Vec<Attribute>,
    pub style: ComputedStyle,
    pub container: RenderContainer,
    /// Offset dimensions; `None` when the element does not support them.
    pub offset_size: Option<Size>,
    /// Rendered text, reported for elements whose only child is a text node.
    pub inner_text: Option<String>,
}

impl ElementData {
    /// A static inline element with no attributes and no container.
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_owned(),
            attributes: Vec::new(),
            style: ComputedStyle::initial(),
            container: RenderContainer::None,
            offset_size: Some(Size::default()),
            inner_text: None,
        }
    }

    #[must_use]
    pub fn with_style(mut self, style: ComputedStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn with_container(mut self, container: RenderContainer) -> Self {
        self.container = container;
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    #[must_use]
    pub fn with_offset_size(mut self, size: Option<Size>) -> Self {
        self.offset_size = size;
        self
    }

    #[must_use]
    pub fn with_inner_text(mut self, text: &str) -> Self {
        self.inner_text = Some(text.to_owned());
        self
    }

    /// Case-insensitive tag comparison.
    pub fn is_tag(&self, name: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|attr| attr.name == name)
    }
}

/// Data stored for each node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Client rectangles in rendering order.
    pub rects: Vec<Rect>,
    /// Node of the captured page this node was copied from; `None` for nodes
    /// inserted by the normalizer.
    pub origin: Option<NodeId>,
}

impl Node {
    pub fn element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(element) => Some(element),
            NodeData::Text(_) => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(text) => Some(text),
            NodeData::Element(_) => None,
        }
    }
}

/// Document-level state captured alongside the tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Scroll width of the document body.
    pub width: f64,
    /// Scroll height of the document body.
    pub height: f64,
    pub title: String,
    pub url: String,
}

/// An arena document rooted at the page body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    nodes: Vec<Node>,
    page: PageInfo,
}

impl Document {
    /// Create a document whose root element is `root`.
    pub fn new(page: PageInfo, root: ElementData, rects: Vec<Rect>) -> Self {
        let mut document = Self {
            nodes: Vec::new(),
            page,
        };
        document.push(None, NodeData::Element(root), rects);
        document
    }

    /// The root element (the page body).
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn page(&self) -> &PageInfo {
        &self.page
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(Node::element)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |node| node.children.as_slice())
    }

    pub fn rects(&self, id: NodeId) -> &[Rect] {
        self.get(id).map_or(&[], |node| node.rects.as_slice())
    }

    /// Append an element as the last child of `parent`.
    pub fn append_element(&mut self, parent: NodeId, element: ElementData, rects: Vec<Rect>) -> NodeId {
        self.push(Some(parent), NodeData::Element(element), rects)
    }

    /// Append a text node as the last child of `parent`.
    pub fn append_text(&mut self, parent: NodeId, text: &str, rects: Vec<Rect>) -> NodeId {
        self.push(Some(parent), NodeData::Text(text.to_owned()), rects)
    }

    pub fn set_origin(&mut self, id: NodeId, origin: NodeId) {
        if let Some(node) = self.nodes.get_mut(id.index()) {
            node.origin = Some(origin);
        }
    }

    /// Ids of the subtree rooted at `id` in pre-order, `id` first.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        order
    }

    fn push(&mut self, parent: Option<NodeId>, data: NodeData, rects: Vec<Rect>) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent,
            children: Vec::new(),
            rects,
            origin: None,
        });
        if let Some(parent_node) = parent.and_then(|pid| self.nodes.get_mut(pid.index())) {
            parent_node.children.push(id);
        }
        id
    }
}
