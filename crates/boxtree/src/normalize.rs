//! Text normalization: isolates text runs and splits them into visual lines.
//!
//! The rewrite produces a new [`Document`] and leaves the captured one
//! untouched. Two things happen on the way:
//!
//! 1. Every text child that matters is wrapped in its own marker element
//!    ([`MARKER_TAG`]), so no element mixes text with element children.
//! 2. A marker rendering more than one rectangle is replaced by one line
//!    element ([`LINE_TAG`]) per visual line. Line starts are found by asking
//!    the [`CaretLocator`] which text offset sits at the left edge of each new
//!    row of rectangles.
//!
//! Splitting a marker only depends on its own text and rectangles, so both
//! steps run in the same pre-order pass.

use crate::caret::CaretLocator;
use crate::classify::renders_rects;
use crate::dom::{Document, ElementData, NodeData, NodeId, RenderContainer};
use crate::geometry::{Rect, Size};
use crate::style::ComputedStyle;
use log::{debug, trace};

/// Tag of the element wrapping an isolated text run.
pub const MARKER_TAG: &str = "XX";

/// Tag of the element holding the text of one visual line.
pub const LINE_TAG: &str = "XL";

/// Rewrite `source` so every text run is isolated and split into lines.
pub fn normalize<C: CaretLocator + ?Sized>(source: &Document, carets: &C) -> Document {
    let mut normalizer = Normalizer::new(source, carets);
    let out_root = normalizer.out.root();
    normalizer.unmix(source.root(), out_root);
    debug!(
        "normalized {} nodes into {}: {} markers, {} lines, {} caret probes unresolved",
        source.len(),
        normalizer.out.len(),
        normalizer.markers,
        normalizer.lines,
        normalizer.unresolved
    );
    normalizer.out
}

/// One visual line of a text run.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    /// Rectangles of the text run rendered on this line.
    pub rects: Vec<Rect>,
}

/// Split the text of node `text_node` into visual lines.
///
/// The first rectangle always opens a line. Every later rectangle whose row
/// differs from the last line start opens a new line at the caret offset the
/// locator reports for it; rectangles the locator cannot resolve never open
/// a line. Returns the number of unresolved probes alongside the lines.
pub fn split_lines<C: CaretLocator + ?Sized>(
    carets: &C,
    text_node: NodeId,
    text: &str,
    rects: &[Rect],
) -> (Vec<Line>, usize) {
    if rects.len() <= 1 {
        let line = Line {
            text: text.to_owned(),
            rects: rects.to_vec(),
        };
        return (vec![line], 0);
    }

    // (first rectangle, text offset) of every line
    let mut breaks: Vec<(usize, usize)> = Vec::new();
    let mut last_y = None;
    let mut unresolved = 0;
    for (idx, rect) in rects.iter().enumerate() {
        let caret = carets
            .caret_at(rect.caret_probe_point())
            .filter(|position| position.node == text_node);
        let Some(position) = caret else {
            trace!("no caret at rect {idx} of {text_node:?}");
            unresolved += 1;
            if idx == 0 {
                breaks.push((0, 0));
                last_y = Some(rect.y);
            }
            continue;
        };
        if idx == 0 || last_y != Some(rect.y) {
            breaks.push((idx, position.offset));
            last_y = Some(rect.y);
        }
    }

    let text_len = text.encode_utf16().count();
    let lines = breaks
        .iter()
        .enumerate()
        .map(|(idx, &(first_rect, start))| {
            let (end_rect, end) = breaks
                .get(idx + 1)
                .copied()
                .unwrap_or((rects.len(), text_len));
            Line {
                text: utf16_slice(text, start, end).to_owned(),
                rects: rects[first_rect..end_rect].to_vec(),
            }
        })
        .collect();
    (lines, unresolved)
}

/// Substring between two UTF-16 offsets.
///
/// Offsets past the end are clamped; a reversed range is empty. An offset
/// inside a surrogate pair moves to the next character boundary.
pub fn utf16_slice(text: &str, start: usize, end: usize) -> &str {
    if end <= start {
        return "";
    }
    let from = utf16_to_byte(text, start);
    let to = utf16_to_byte(text, end);
    &text[from..to]
}

fn utf16_to_byte(text: &str, offset: usize) -> usize {
    let mut units = 0;
    for (byte, ch) in text.char_indices() {
        if units >= offset {
            return byte;
        }
        units += ch.len_utf16();
    }
    text.len()
}

/// Text as rendered: collapsible whitespace runs become one space, trimmed.
pub fn rendered_text(text: &str, style: &ComputedStyle) -> String {
    if style.preserves_whitespace() {
        return text.to_owned();
    }
    text.split(|ch: char| matches!(ch, ' ' | '\t' | '\n' | '\r' | '\u{c}'))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

struct Normalizer<'src, C: ?Sized> {
    source: &'src Document,
    carets: &'src C,
    out: Document,
    /// Source node id to copied node id.
    mapped: Vec<Option<NodeId>>,
    markers: usize,
    lines: usize,
    unresolved: usize,
}

impl<'src, C: CaretLocator + ?Sized> Normalizer<'src, C> {
    fn new(source: &'src Document, carets: &'src C) -> Self {
        let root = source.root();
        let root_element = source
            .element(root)
            .cloned()
            .unwrap_or_else(|| ElementData::new("BODY"));
        let mut out = Document::new(
            source.page().clone(),
            root_element,
            source.rects(root).to_vec(),
        );
        let out_root = out.root();
        out.set_origin(out_root, root);
        let mut mapped = vec![None; source.len()];
        mapped[root.index()] = Some(out_root);
        Self {
            source,
            carets,
            out,
            mapped,
            markers: 0,
            lines: 0,
            unresolved: 0,
        }
    }

    fn unmix(&mut self, src: NodeId, dst: NodeId) {
        let source = self.source;
        // whitespace between the fragments of a multi-rect element is significant
        let multi = source.rects(src).len() > 1;
        for &child in source.children(src) {
            let Some(node) = source.get(child) else {
                continue;
            };
            match &node.data {
                NodeData::Text(text) if multi || !text.trim().is_empty() => {
                    if multi && node.rects.is_empty() {
                        continue;
                    }
                    self.wrap_text(child, text, &node.rects, dst);
                }
                NodeData::Text(text) => {
                    let copy = self.out.append_text(dst, text, node.rects.clone());
                    self.out.set_origin(copy, child);
                }
                NodeData::Element(element) => {
                    let copy = self.copy_element(child, element, &node.rects, dst);
                    if renders_rects(source, child) {
                        self.unmix(child, copy);
                    } else {
                        self.copy_children(child, copy);
                    }
                }
            }
        }
    }

    fn wrap_text(&mut self, text_node: NodeId, text: &str, rects: &[Rect], parent: NodeId) {
        let parent_style = self
            .out
            .element(parent)
            .map(|element| element.style.clone())
            .unwrap_or_default();
        let style = ComputedStyle::anonymous_inline(&parent_style);
        let container = self.wrapper_container(parent);
        self.markers += 1;

        if rects.len() <= 1 {
            self.append_wrapper(MARKER_TAG, parent, &style, container, text, rects, text_node);
            return;
        }
        let (lines, unresolved) = split_lines(self.carets, text_node, text, rects);
        self.unresolved += unresolved;
        self.lines += lines.len();
        for line in lines {
            self.append_wrapper(LINE_TAG, parent, &style, container, &line.text, &line.rects, text_node);
        }
    }

    #[allow(clippy::too_many_arguments, reason = "wrapper construction needs all parts")]
    fn append_wrapper(
        &mut self,
        tag: &str,
        parent: NodeId,
        style: &ComputedStyle,
        container: RenderContainer,
        text: &str,
        rects: &[Rect],
        text_node: NodeId,
    ) {
        let offset_size = Rect::enclosing(rects).map_or_else(Size::default, Rect::size);
        let element = ElementData::new(tag)
            .with_style(style.clone())
            .with_container(container)
            .with_offset_size(Some(offset_size))
            .with_inner_text(&rendered_text(text, style));
        let wrapper = self.out.append_element(parent, element, rects.to_vec());
        let text_copy = self.out.append_text(wrapper, text, rects.to_vec());
        self.out.set_origin(text_copy, text_node);
    }

    /// Offset parent of an inline wrapper placed under `parent`.
    fn wrapper_container(&self, parent: NodeId) -> RenderContainer {
        let Some(element) = self.out.element(parent) else {
            return RenderContainer::None;
        };
        let positioned = !matches!(element.style.position(), "static" | "");
        let table_part = ["td", "th", "table"].iter().any(|tag| element.is_tag(tag));
        if parent == self.out.root() || positioned || table_part {
            RenderContainer::Node(parent)
        } else {
            element.container
        }
    }

    fn copy_element(
        &mut self,
        src: NodeId,
        element: &ElementData,
        rects: &[Rect],
        parent: NodeId,
    ) -> NodeId {
        let mut copy = element.clone();
        copy.container = match element.container {
            RenderContainer::Node(container) => self
                .mapped
                .get(container.index())
                .copied()
                .flatten()
                .map_or(RenderContainer::None, RenderContainer::Node),
            other => other,
        };
        let id = self.out.append_element(parent, copy, rects.to_vec());
        self.out.set_origin(id, src);
        if let Some(slot) = self.mapped.get_mut(src.index()) {
            *slot = Some(id);
        }
        id
    }

    /// Copy the subtree below `src` unchanged.
    fn copy_children(&mut self, src: NodeId, dst: NodeId) {
        let source = self.source;
        for &child in source.children(src) {
            let Some(node) = source.get(child) else {
                continue;
            };
            match &node.data {
                NodeData::Text(text) => {
                    let copy = self.out.append_text(dst, text, node.rects.clone());
                    self.out.set_origin(copy, child);
                }
                NodeData::Element(element) => {
                    let copy = self.copy_element(child, element, &node.rects, dst);
                    self.copy_children(child, copy);
                }
            }
        }
    }
}
