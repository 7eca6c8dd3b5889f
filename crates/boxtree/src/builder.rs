//! Box tree construction over a normalized document.
//!
//! The walk is pre-order: a node's boxes are created before any of its
//! children are visited, so parent links always point backwards. All
//! per-node bookkeeping (box ids per rectangle, propagated decoration) lives
//! in the [`BuildContext`] rather than on the document.

use crate::classify::{is_image, is_replaced, is_text_only, is_visible};
use crate::dom::{Document, ElementData, NodeId, RenderContainer};
use crate::fonts::FontSet;
use crate::geometry::{Rect, row_runs};
use crate::model::{BoxData, BoxId, BoxTree, Decoration, ImageRef};
use crate::normalize::rendered_text;
use log::trace;
use std::collections::HashMap;
use std::iter;
use std::ops::Range;

/// Result of a finished walk.
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    pub tree: BoxTree,
    /// Font families requested by the visited elements.
    pub requested_fonts: FontSet,
    pub images: Vec<ImageRef>,
}

/// Traversal state threaded through the box walk.
pub struct BuildContext<'doc> {
    doc: &'doc Document,
    next_id: usize,
    /// Box id covering each client rectangle of every processed node.
    rect_boxes: HashMap<NodeId, Vec<BoxId>>,
    /// Decoration in effect for every processed node, ancestors included.
    decorations: HashMap<NodeId, Decoration>,
    output: BuildOutput,
}

impl<'doc> BuildContext<'doc> {
    pub fn new(doc: &'doc Document) -> Self {
        Self {
            doc,
            next_id: 0,
            rect_boxes: HashMap::new(),
            decorations: HashMap::new(),
            output: BuildOutput::default(),
        }
    }

    /// Emit boxes for `node` and, unless it is replaced, its descendants.
    ///
    /// `offset` is the index of the first rectangle attributed to this node
    /// in its parent's numbering. Returns the number of boxes created for
    /// `node` itself.
    pub fn walk(&mut self, node: NodeId, offset: usize) -> usize {
        let doc = self.doc;
        if !is_visible(doc, node) {
            return 0;
        }
        let Some(element) = doc.element(node) else {
            return 0;
        };
        self.output.requested_fonts.extend(element.style.font_families());

        let ids = self.build_boxes_for(node, offset);
        if is_text_only(doc, node) {
            let text = self.text_of(node, element);
            if let Some(first) = ids.first().and_then(|id| self.output.tree.get_mut(*id)) {
                first.text = text;
            }
        }
        self.record_images(element, &ids);

        if !is_replaced(element) {
            // children of a multi-rect node are numbered across siblings
            let multiple = doc.rects(node).len() > 1;
            let mut child_offset = 0;
            for &child in doc.children(node) {
                let created = self.walk(child, child_offset);
                if multiple {
                    child_offset += created;
                }
            }
        }
        ids.len()
    }

    /// Emit one box per row of `node`'s rectangles.
    pub fn build_boxes_for(&mut self, node: NodeId, offset: usize) -> Vec<BoxId> {
        let doc = self.doc;
        let Some(element) = doc.element(node) else {
            return Vec::new();
        };
        let rects = doc.rects(node);
        let decoration = self.decoration_for(node, element);

        let mut ids = Vec::new();
        let mut per_rect = Vec::with_capacity(rects.len());
        for run in row_runs(rects) {
            let id = self.create_box(node, element, &rects[run.clone()], run.clone(), offset, decoration);
            per_rect.extend(iter::repeat_n(id, run.len()));
            ids.push(id);
        }
        trace!("{} {node:?}: {} rects, {} boxes", element.tag_name, rects.len(), ids.len());
        self.rect_boxes.insert(node, per_rect);
        ids
    }

    pub fn finish(self) -> BuildOutput {
        self.output
    }

    fn create_box(
        &mut self,
        node: NodeId,
        element: &ElementData,
        rects: &[Rect],
        run: Range<usize>,
        offset: usize,
        decoration: Decoration,
    ) -> BoxId {
        let id = BoxId::new(self.next_id);
        self.next_id += 1;

        let index = run.start + offset;
        let dom_parent = self.doc.parent(node).and_then(|parent| self.box_at(parent, index));
        let parent = match element.container {
            RenderContainer::Node(container) => self.box_at(container, index),
            RenderContainer::Unsupported => dom_parent,
            RenderContainer::None => None,
        };

        let tree = &mut self.output.tree;
        tree.parents.push(parent);
        tree.dom_parents.push(dom_parent);
        tree.boxes.push(BoxData {
            id,
            tag_name: element.tag_name.clone(),
            bounds: Rect::enclosing(rects).unwrap_or_default(),
            text: None,
            decoration: decoration.code(),
            css: element.style.exported_declarations(),
            attrs: (!element.attributes.is_empty()).then(|| element.attributes.clone()),
            replaced: is_replaced(element),
            has_bg_image: element.style.has_background_image(),
            istart: index,
            iend: run.end + offset,
            node: Some(node),
        });
        id
    }

    /// Box of `container` covering rectangle `index`.
    ///
    /// A single-box container owns every index; a line-wrapped one is
    /// indexed per rectangle.
    fn box_at(&self, container: NodeId, index: usize) -> Option<BoxId> {
        let ids = self.rect_boxes.get(&container)?;
        if let [only] = ids.as_slice() {
            return Some(*only);
        }
        ids.get(index).copied()
    }

    /// Own decoration combined with the document parent's, cached for descendants.
    fn decoration_for(&mut self, node: NodeId, element: &ElementData) -> Decoration {
        let own = Decoration::from_line_value(element.style.get("text-decoration-line"));
        let inherited = self
            .doc
            .parent(node)
            .and_then(|parent| self.decorations.get(&parent).copied())
            .unwrap_or_default();
        let decoration = own | inherited;
        self.decorations.insert(node, decoration);
        decoration
    }

    fn text_of(&self, node: NodeId, element: &ElementData) -> Option<String> {
        if element.inner_text.is_some() {
            return element.inner_text.clone();
        }
        let child = self.doc.children(node).first()?;
        let text = self.doc.get(*child)?.text()?;
        Some(rendered_text(text, &element.style))
    }

    fn record_images(&mut self, element: &ElementData, ids: &[BoxId]) {
        let image = is_image(element);
        let background = element.style.has_background_image();
        if !image && !background {
            return;
        }
        for &id in ids {
            let source = self
                .output
                .tree
                .get(id)
                .and_then(|data| data.node)
                .and_then(|node| self.doc.get(node))
                .and_then(|node| node.origin);
            self.output.images.push(ImageRef {
                id,
                bg: !image,
                data: None,
                source,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::PageInfo;
    use crate::geometry::Size;
    use crate::style::ComputedStyle;

    fn block(tag: &str, container: NodeId) -> ElementData {
        ElementData::new(tag)
            .with_style(ComputedStyle::initial().with("display", "block"))
            .with_container(RenderContainer::Node(container))
            .with_offset_size(Some(Size::new(100.0, 20.0)))
    }

    fn body() -> Document {
        Document::new(
            PageInfo::default(),
            ElementData::new("BODY")
                .with_style(ComputedStyle::initial().with("display", "block"))
                .with_offset_size(Some(Size::new(800.0, 600.0))),
            vec![Rect::new(0.0, 0.0, 800.0, 600.0)],
        )
    }

    /// A single-rect node gets one box at the caller's offset.
    ///
    /// # Panics
    /// Panics if the box range is not offset.
    #[test]
    fn single_rect_uses_offset() {
        let mut doc = body();
        let root = doc.root();
        let div = doc.append_element(root, block("DIV", root), vec![Rect::new(0.0, 0.0, 100.0, 20.0)]);
        let mut context = BuildContext::new(&doc);
        let root_ids = context.build_boxes_for(root, 0);
        let ids = context.build_boxes_for(div, 4);
        let tree = context.finish().tree;
        assert_eq!(root_ids.len(), 1);
        assert_eq!(ids.len(), 1);
        let data = tree.get(ids[0]).cloned();
        assert_eq!(data.as_ref().map(|data| (data.istart, data.iend)), Some((4, 5)));
        assert_eq!(tree.parents.get(ids[0]), Some(root_ids[0]));
        assert_eq!(tree.dom_parents.get(ids[0]), Some(root_ids[0]));
    }

    /// A wrapped inline produces one box per row with unioned bounds.
    ///
    /// # Panics
    /// Panics if rows or bounds are wrong.
    #[test]
    fn wrapped_inline_boxes_per_row() {
        let mut doc = body();
        let root = doc.root();
        let span = doc.append_element(
            root,
            ElementData::new("SPAN").with_container(RenderContainer::Node(root)),
            vec![
                Rect::new(50.0, 0.0, 30.0, 18.0),
                Rect::new(80.0, 0.0, 20.0, 16.0),
                Rect::new(0.0, 20.0, 60.0, 18.0),
            ],
        );
        let mut context = BuildContext::new(&doc);
        context.build_boxes_for(root, 0);
        let ids = context.build_boxes_for(span, 0);
        let tree = context.finish().tree;
        assert_eq!(ids.len(), 2);
        let first = tree.get(ids[0]).map(|data| (data.bounds, data.istart, data.iend));
        let second = tree.get(ids[1]).map(|data| (data.bounds, data.istart, data.iend));
        assert_eq!(first, Some((Rect::new(50.0, 0.0, 50.0, 18.0), 0, 2)));
        assert_eq!(second, Some((Rect::new(0.0, 20.0, 60.0, 18.0), 2, 3)));
    }

    /// Children of a multi-box parent attach to the box at their running index.
    ///
    /// # Panics
    /// Panics if children attach to the wrong line.
    #[test]
    fn children_follow_parent_lines() {
        let mut doc = body();
        let root = doc.root();
        let span = doc.append_element(
            root,
            ElementData::new("SPAN").with_container(RenderContainer::Node(root)),
            vec![Rect::new(0.0, 0.0, 100.0, 18.0), Rect::new(0.0, 20.0, 100.0, 18.0)],
        );
        let line = |text: &str| {
            ElementData::new("XL")
                .with_container(RenderContainer::Node(root))
                .with_offset_size(Some(Size::new(100.0, 18.0)))
                .with_inner_text(text)
        };
        let first = doc.append_element(span, line("first"), vec![Rect::new(0.0, 0.0, 100.0, 18.0)]);
        doc.append_text(first, "first", vec![Rect::new(0.0, 0.0, 100.0, 18.0)]);
        let second = doc.append_element(span, line("second"), vec![Rect::new(0.0, 20.0, 100.0, 18.0)]);
        doc.append_text(second, "second", vec![Rect::new(0.0, 20.0, 100.0, 18.0)]);

        let mut context = BuildContext::new(&doc);
        context.walk(root, 0);
        let tree = context.finish().tree;
        assert_eq!(tree.len(), 5);
        let span_boxes = [BoxId::new(1), BoxId::new(2)];
        assert_eq!(tree.dom_parents.get(BoxId::new(3)), Some(span_boxes[0]));
        assert_eq!(tree.dom_parents.get(BoxId::new(4)), Some(span_boxes[1]));
        assert_eq!(tree.parents.get(BoxId::new(4)), Some(BoxId::new(0)));
        assert_eq!(tree.get(BoxId::new(4)).and_then(|data| data.text.clone()).as_deref(), Some("second"));
        assert_eq!(tree.get(BoxId::new(4)).map(|data| data.istart), Some(1));
    }

    /// Decoration accumulates down the document chain.
    ///
    /// # Panics
    /// Panics if decoration is not inherited.
    #[test]
    fn decoration_is_inherited() {
        let mut doc = body();
        let root = doc.root();
        let mut underlined = block("A", root);
        underlined.style.set("text-decoration-line", "underline");
        let link = doc.append_element(root, underlined, vec![Rect::new(0.0, 0.0, 100.0, 20.0)]);
        let mut struck = block("S", root);
        struck.style.set("text-decoration-line", "line-through");
        let inner = doc.append_element(link, struck, vec![Rect::new(0.0, 0.0, 50.0, 20.0)]);
        let plain = doc.append_element(inner, block("B", root), vec![Rect::new(0.0, 0.0, 20.0, 20.0)]);

        let mut context = BuildContext::new(&doc);
        context.walk(root, 0);
        let tree = context.finish().tree;
        let codes: Vec<_> = tree.boxes.iter().map(|data| data.decoration.clone()).collect();
        assert_eq!(
            codes,
            vec![None, Some("U".to_owned()), Some("UT".to_owned()), Some("UT".to_owned())]
        );
        assert_eq!(tree.get(BoxId::new(3)).and_then(|data| data.node), Some(plain));
    }

    /// Fixed elements without a container have no rendering parent.
    ///
    /// # Panics
    /// Panics if a parent is invented.
    #[test]
    fn missing_container_means_no_parent() {
        let mut doc = body();
        let root = doc.root();
        let fixed = doc.append_element(
            root,
            block("DIV", root).with_container(RenderContainer::None),
            vec![Rect::new(0.0, 0.0, 100.0, 20.0)],
        );
        let mut context = BuildContext::new(&doc);
        context.walk(root, 0);
        let tree = context.finish().tree;
        assert_eq!(tree.get(BoxId::new(1)).and_then(|data| data.node), Some(fixed));
        assert_eq!(tree.parents.get(BoxId::new(1)), None);
        assert_eq!(tree.dom_parents.get(BoxId::new(1)), Some(BoxId::new(0)));
    }

    /// Content without an offset parent concept hangs off its document parent.
    ///
    /// # Panics
    /// Panics if the rendering parent differs from the document parent.
    #[test]
    fn unsupported_container_uses_document_parent() {
        let mut doc = body();
        let root = doc.root();
        let div = doc.append_element(root, block("DIV", root), vec![Rect::new(0.0, 40.0, 100.0, 20.0)]);
        let svg = doc.append_element(
            div,
            ElementData::new("svg")
                .with_container(RenderContainer::Unsupported)
                .with_offset_size(None),
            vec![Rect::new(10.0, 40.0, 16.0, 16.0)],
        );

        let mut context = BuildContext::new(&doc);
        context.walk(root, 0);
        let tree = context.finish().tree;
        let svg_box = BoxId::new(2);
        assert_eq!(tree.get(svg_box).and_then(|data| data.node), Some(svg));
        assert_eq!(tree.dom_parents.get(svg_box), Some(BoxId::new(1)));
        assert_eq!(tree.parents.get(svg_box), tree.dom_parents.get(svg_box));
        assert!(tree.get(svg_box).is_some_and(|data| data.replaced));
    }

    /// Children of a wrapped positioned inline attach to its box on their own row.
    ///
    /// # Panics
    /// Panics if a child's rendering parent is on the wrong row.
    #[test]
    fn positioned_container_rows_parent_children() {
        let mut doc = body();
        let root = doc.root();
        let span = doc.append_element(
            root,
            ElementData::new("SPAN")
                .with_style(ComputedStyle::initial().with("position", "relative"))
                .with_container(RenderContainer::Node(root)),
            vec![Rect::new(300.0, 0.0, 200.0, 18.0), Rect::new(0.0, 20.0, 120.0, 18.0)],
        );
        let top = doc.append_element(
            span,
            ElementData::new("B").with_container(RenderContainer::Node(span)),
            vec![Rect::new(300.0, 0.0, 200.0, 18.0)],
        );
        let bottom = doc.append_element(
            span,
            ElementData::new("I").with_container(RenderContainer::Node(span)),
            vec![Rect::new(0.0, 20.0, 120.0, 18.0)],
        );

        let mut context = BuildContext::new(&doc);
        context.walk(root, 0);
        let tree = context.finish().tree;
        assert_eq!(tree.len(), 5);
        let (top_box, bottom_box) = (BoxId::new(3), BoxId::new(4));
        assert_eq!(tree.get(top_box).and_then(|data| data.node), Some(top));
        assert_eq!(tree.get(bottom_box).and_then(|data| data.node), Some(bottom));
        assert_eq!(tree.parents.get(top_box), Some(BoxId::new(1)));
        assert_eq!(tree.parents.get(bottom_box), Some(BoxId::new(2)));
        assert_eq!(tree.parents.get(BoxId::new(2)), Some(BoxId::new(0)));
    }

    /// Image elements and background images are both recorded.
    ///
    /// # Panics
    /// Panics if images are misclassified.
    #[test]
    fn records_images() {
        let mut doc = body();
        let root = doc.root();
        doc.append_element(
            root,
            block("IMG", root).with_attribute("src", "a.png"),
            vec![Rect::new(0.0, 0.0, 10.0, 10.0)],
        );
        let mut with_bg = block("DIV", root);
        with_bg.style.set("background-image", "url(\"bg.png\")");
        doc.append_element(root, with_bg, vec![Rect::new(0.0, 10.0, 10.0, 10.0)]);
        doc.append_element(root, block("IMG", root), vec![Rect::new(0.0, 20.0, 10.0, 10.0)]);

        let mut context = BuildContext::new(&doc);
        context.walk(root, 0);
        let output = context.finish();
        let images: Vec<_> = output.images.iter().map(|image| (image.id.index(), image.bg)).collect();
        assert_eq!(images, vec![(1, false), (2, true)]);
    }
}
