//! Resolved style values as reported by the rendering engine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Properties exported with every box, in export order.
///
/// The order never changes so exported declarations can be diffed line by line.
pub const EXPORTED_PROPERTIES: [&str; 13] = [
    "display",
    "position",
    "color",
    "background-color",
    "font",
    "border-top",
    "border-right",
    "border-bottom",
    "border-left",
    "overflow",
    "transform",
    "visibility",
    "opacity",
];

/// Properties read by the extraction itself besides the exported ones.
pub const EXTRACTION_PROPERTIES: [&str; 4] = [
    "font-family",
    "text-decoration-line",
    "background-image",
    "white-space",
];

/// Inherited properties copied onto anonymous inline wrappers.
const INHERITED_PROPERTIES: [&str; 5] = ["color", "font", "font-family", "visibility", "white-space"];

/// Resolved (computed) style of one element, keyed by CSS property name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComputedStyle {
    values: HashMap<String, String>,
}

impl ComputedStyle {
    /// Empty style; every lookup yields an empty string.
    pub fn new() -> Self {
        Self::default()
    }

    /// Style holding the initial value of every property the extraction reads.
    pub fn initial() -> Self {
        Self::new()
            .with("display", "inline")
            .with("position", "static")
            .with("color", "rgb(0, 0, 0)")
            .with("background-color", "rgba(0, 0, 0, 0)")
            .with("font", "16px \"Times New Roman\"")
            .with("font-family", "\"Times New Roman\"")
            .with("border-top", "0px none rgb(0, 0, 0)")
            .with("border-right", "0px none rgb(0, 0, 0)")
            .with("border-bottom", "0px none rgb(0, 0, 0)")
            .with("border-left", "0px none rgb(0, 0, 0)")
            .with("overflow", "visible")
            .with("transform", "none")
            .with("visibility", "visible")
            .with("opacity", "1")
            .with("text-decoration-line", "none")
            .with("background-image", "none")
            .with("white-space", "normal")
    }

    /// Style of an anonymous inline element inserted under an element styled `parent`.
    ///
    /// Inherited properties come from `parent`; everything else takes its
    /// initial value, with borders drawn in the inherited color.
    pub fn anonymous_inline(parent: &Self) -> Self {
        let mut style = Self::initial();
        for name in INHERITED_PROPERTIES {
            if let Some(value) = parent.values.get(name) {
                style.values.insert(name.to_owned(), value.clone());
            }
        }
        let border = format!("0px none {}", style.get("color"));
        for side in ["border-top", "border-right", "border-bottom", "border-left"] {
            style.values.insert(side.to_owned(), border.clone());
        }
        style
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_owned(), value.to_owned());
    }

    /// Value of `name`, or an empty string when the engine did not report it.
    pub fn get(&self, name: &str) -> &str {
        self.values.get(name).map_or("", String::as_str)
    }

    pub fn display(&self) -> &str {
        self.get("display")
    }

    pub fn position(&self) -> &str {
        self.get("position")
    }

    pub fn has_background_image(&self) -> bool {
        let value = self.get("background-image");
        !value.is_empty() && value != "none"
    }

    /// Whether whitespace is rendered as written rather than collapsed.
    pub fn preserves_whitespace(&self) -> bool {
        matches!(
            self.get("white-space"),
            "pre" | "pre-wrap" | "break-spaces"
        )
    }

    /// Family names from `font-family`, unquoted and trimmed, in declaration order.
    pub fn font_families(&self) -> impl Iterator<Item = String> + '_ {
        self.get("font-family")
            .split(',')
            .map(|name| name.trim().replace(['"', '\''], ""))
            .filter(|name| !name.is_empty())
    }

    /// Exported properties serialized as `name:value;` pairs in export order.
    pub fn exported_declarations(&self) -> String {
        let mut css = String::new();
        for name in EXPORTED_PROPERTIES {
            css.push_str(name);
            css.push(':');
            css.push_str(self.get(name));
            css.push(';');
        }
        css
    }
}
