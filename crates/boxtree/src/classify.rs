//! Node classification used by the box walk.

use crate::dom::{Document, ElementData, NodeId, RenderContainer};
use crate::geometry::Size;

/// Tags whose content is opaque to extraction; they become leaf boxes.
pub const REPLACED_TAGS: [&str; 4] = ["img", "svg", "object", "iframe"];

/// Replaced tags carrying actual image content.
pub const IMAGE_TAGS: [&str; 2] = ["img", "svg"];

/// Whether the box walk should produce boxes for `id`.
///
/// Only elements qualify. Elements without any notion of a rendering
/// container qualify only when replaced; elements with no container and no
/// size are not rendered at all; `display: none` always hides.
pub fn is_visible(doc: &Document, id: NodeId) -> bool {
    let Some(element) = doc.element(id) else {
        return false;
    };
    if element.container == RenderContainer::Unsupported {
        return is_replaced(element);
    }
    if element.container == RenderContainer::None
        && element.offset_size.is_none_or(Size::is_empty)
    {
        return false;
    }
    element.style.display() != "none"
}

pub fn is_replaced(element: &ElementData) -> bool {
    REPLACED_TAGS.iter().any(|tag| element.is_tag(tag))
}

/// Whether the element is image content worth capturing.
///
/// Bitmap images only count when they reference a source.
pub fn is_image(element: &ElementData) -> bool {
    if element.is_tag("img") {
        return element.has_attribute("src");
    }
    IMAGE_TAGS.iter().any(|tag| element.is_tag(tag))
}

/// Whether `id` has exactly one child and that child is text.
pub fn is_text_only(doc: &Document, id: NodeId) -> bool {
    match doc.children(id) {
        [only] => doc.get(*only).is_some_and(|node| node.text().is_some()),
        _ => false,
    }
}

/// Visibility test used while normalizing: any element that renders a rectangle.
pub(crate) fn renders_rects(doc: &Document, id: NodeId) -> bool {
    doc.element(id).is_some() && !doc.rects(id).is_empty()
}
