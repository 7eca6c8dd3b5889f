#![allow(dead_code, reason = "each test binary uses a subset of the helpers")]

use anyhow::Result;
use boxtree::{
    CaretPosition, ComputedStyle, Document, ElementData, FontMeasure, FontProbe, NodeId, PageInfo, RecordedCarets, Rect,
    RenderContainer, Size,
};

/// Assembles a synthetic rendered page.
///
/// Elements get the body as rendering container unless told otherwise, and
/// an offset size equal to the union of their rectangles.
pub struct PageBuilder {
    doc: Document,
    carets: RecordedCarets,
}

impl PageBuilder {
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_body_style(width, height, block_style())
    }

    pub fn with_body_style(width: f64, height: f64, style: ComputedStyle) -> Self {
        let body = ElementData::new("BODY")
            .with_style(style)
            .with_offset_size(Some(Size::new(width, height)));
        let page = PageInfo {
            width,
            height,
            title: "Fixture".to_owned(),
            url: "file:///fixture.html".to_owned(),
        };
        let mut doc = Document::new(page, body, vec![Rect::new(0.0, 0.0, width, height)]);
        let root = doc.root();
        doc.set_origin(root, root);
        Self {
            doc,
            carets: RecordedCarets::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.doc.root()
    }

    pub fn block(&mut self, parent: NodeId, tag: &str, rect: Rect) -> NodeId {
        self.element(parent, ElementData::new(tag).with_style(block_style()), vec![rect])
    }

    pub fn inline(&mut self, parent: NodeId, tag: &str, rects: Vec<Rect>) -> NodeId {
        self.element(parent, ElementData::new(tag), rects)
    }

    /// Append `element`, filling in container and offset size when unset.
    pub fn element(&mut self, parent: NodeId, element: ElementData, rects: Vec<Rect>) -> NodeId {
        let mut element = element;
        if element.container == RenderContainer::None {
            element.container = RenderContainer::Node(self.doc.root());
        }
        if element.offset_size == Some(Size::default()) {
            element.offset_size = Some(Rect::enclosing(&rects).map_or_else(Size::default, Rect::size));
        }
        let id = self.doc.append_element(parent, element, rects);
        self.doc.set_origin(id, id);
        id
    }

    /// Append an element exactly as given.
    pub fn raw_element(&mut self, parent: NodeId, element: ElementData, rects: Vec<Rect>) -> NodeId {
        let id = self.doc.append_element(parent, element, rects);
        self.doc.set_origin(id, id);
        id
    }

    pub fn text(&mut self, parent: NodeId, text: &str, rects: Vec<Rect>) -> NodeId {
        let id = self.doc.append_text(parent, text, rects);
        self.doc.set_origin(id, id);
        id
    }

    /// Record where each line of `text_node` starts, one offset per rectangle.
    pub fn carets(&mut self, text_node: NodeId, rects: &[Rect], offsets: &[usize]) {
        for (rect, offset) in rects.iter().zip(offsets) {
            self.carets.insert(
                rect.caret_probe_point(),
                CaretPosition {
                    node: text_node,
                    offset: *offset,
                },
            );
        }
    }

    pub fn finish(self) -> (Document, RecordedCarets) {
        (self.doc, self.carets)
    }
}

pub fn block_style() -> ComputedStyle {
    ComputedStyle::initial().with("display", "block")
}

/// Rectangles of a text wrapped onto one 20px row per entry of `widths`.
pub fn wrapped_rows(x: f64, y: f64, widths: &[f64]) -> Vec<Rect> {
    widths
        .iter()
        .enumerate()
        .map(|(row, width)| Rect::new(x, y + 20.0 * row as f64, *width, 18.0))
        .collect()
}

/// Font renderer with a fixed set of installed families.
///
/// A probe renders in the first installed family of its list; unknown
/// families fall through like in a browser.
pub struct FakeFonts {
    installed: Vec<(String, Size)>,
    pub probes: usize,
}

impl FakeFonts {
    /// Generic and reference families plus `extra`.
    pub fn with(extra: &[(&str, f64)]) -> Self {
        let mut installed = vec![
            ("monospace".to_owned(), Size::new(902.0, 37.0)),
            ("Arial".to_owned(), Size::new(811.0, 37.0)),
        ];
        installed.extend(
            extra
                .iter()
                .map(|(name, width)| ((*name).to_owned(), Size::new(*width, 37.0))),
        );
        Self { installed, probes: 0 }
    }
}

impl FontMeasure for FakeFonts {
    fn measure(&mut self, probe: &FontProbe) -> Result<Size> {
        self.probes += 1;
        for family in probe.font_family.split(',').map(str::trim) {
            if let Some((_, size)) = self.installed.iter().find(|(name, _)| name == family) {
                return Ok(*size);
            }
        }
        Ok(Size::new(700.0, 36.0))
    }
}
