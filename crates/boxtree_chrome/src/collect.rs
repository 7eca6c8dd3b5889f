//! In-page collection of the rendered document.
//!
//! One script evaluation serializes `document.body` into a
//! [`Snapshot`]: every node in document order with its client rectangles,
//! the resolved style properties the extraction reads, the offset parent and
//! the caret lookups needed to split wrapped text. Collected elements are
//! remembered in `window.__boxtreeNodes` by snapshot index so later steps can
//! address them again.

use anyhow::{Result, anyhow};
use boxtree::Snapshot;
use boxtree::style::{EXPORTED_PROPERTIES, EXTRACTION_PROPERTIES};
use chromiumoxide::page::Page;
use log::{debug, info};

/// Collector body; `props` is the list of style properties to read.
const COLLECTOR_BODY: &str = "
var nodes = [];
var probes = [];
var indexOf = new Map();
window.__boxtreeNodes = [];

function rectList(list) {
    return Array.from(list, function(rect) {
        return { x: rect.x, y: rect.y, width: rect.width, height: rect.height };
    });
}

function containerOf(el) {
    if (!('offsetParent' in el)) return { kind: 'unsupported' };
    var parent = el.offsetParent;
    if (parent === null) return { kind: 'none' };
    var index = indexOf.get(parent);
    if (index === undefined) return { kind: 'none' };
    return { kind: 'node', index: index };
}

function visit(node, parent) {
    var index = nodes.length;
    if (node.nodeType === Node.TEXT_NODE) {
        var range = document.createRange();
        range.selectNodeContents(node);
        var rects = rectList(range.getClientRects());
        nodes.push({ kind: 'text', parent: parent, text: node.nodeValue, rects: rects });
        indexOf.set(node, index);
        if (rects.length > 1) {
            rects.forEach(function(rect) {
                probes.push({ x: rect.x + 1, y: rect.y + rect.height / 2 });
            });
        }
        return;
    }
    if (node.nodeType !== Node.ELEMENT_NODE) return;

    var cs = window.getComputedStyle(node, null);
    var style = {};
    props.forEach(function(name) { style[name] = cs.getPropertyValue(name); });
    var entry = {
        kind: 'element',
        tagName: node.tagName,
        attrs: Array.from(node.attributes, function(attr) {
            return { name: attr.name, value: attr.value };
        }),
        style: style,
        container: containerOf(node),
        rects: rectList(node.getClientRects())
    };
    if (parent !== undefined) entry.parent = parent;
    if ('offsetWidth' in node) {
        entry.offsetWidth = node.offsetWidth;
        entry.offsetHeight = node.offsetHeight;
    }
    if (node.childNodes.length === 1 && node.firstChild.nodeType === Node.TEXT_NODE
            && typeof node.innerText === 'string') {
        entry.innerText = node.innerText;
    }
    nodes.push(entry);
    indexOf.set(node, index);
    window.__boxtreeNodes[index] = node;
    // hidden subtrees produce no boxes
    if (style.display === 'none') return;
    for (var i = 0; i < node.childNodes.length; i++) {
        visit(node.childNodes[i], index);
    }
}

visit(document.body, undefined);

var carets = [];
probes.forEach(function(probe) {
    var range = document.caretRangeFromPoint(probe.x, probe.y);
    if (!range) return;
    var index = indexOf.get(range.startContainer);
    if (index === undefined || nodes[index].kind !== 'text') return;
    carets.push({ x: probe.x, y: probe.y, node: index, offset: range.startOffset });
});

return JSON.stringify({
    page: {
        width: document.body.scrollWidth,
        height: document.body.scrollHeight,
        title: document.title,
        url: location.href
    },
    nodes: nodes,
    carets: carets
});
";

/// Disables stylesheets served by a web font service.
const DISABLE_WEB_FONTS_SCRIPT: &str = "(function() {
    var disabled = 0;
    for (var i = 0; i < document.styleSheets.length; i++) {
        var sheet = document.styleSheets[i];
        if (typeof sheet.href === 'string' && sheet.href.indexOf('fonts.googleapis.com') !== -1) {
            sheet.disabled = true;
            disabled++;
        }
    }
    return disabled;
})()";

/// Build the collector script.
///
/// # Errors
///
/// Returns an error if the property list cannot be encoded.
pub fn collector_script() -> Result<String> {
    let props: Vec<&str> = EXPORTED_PROPERTIES
        .iter()
        .chain(EXTRACTION_PROPERTIES.iter())
        .copied()
        .collect();
    let props_json = serde_json::to_string(&props)?;
    Ok(format!("(function(props) {{ {COLLECTOR_BODY} }})({props_json})"))
}

/// Serialize the rendered page.
///
/// # Errors
///
/// Returns an error if script evaluation fails or returns malformed JSON.
pub async fn collect_snapshot(page: &Page) -> Result<Snapshot> {
    let result = page.evaluate(collector_script()?).await?;
    let value = result
        .value()
        .ok_or_else(|| anyhow!("No value returned from the snapshot script"))?;
    let json_string = value
        .as_str()
        .ok_or_else(|| anyhow!("Chromium returned non-string JSON for the page snapshot"))?;
    let snapshot = Snapshot::from_json(json_string)?;
    info!(
        "collected {} nodes and {} carets from {}",
        snapshot.nodes.len(),
        snapshot.carets.len(),
        snapshot.page.url
    );
    Ok(snapshot)
}

/// Disable web font stylesheets so text renders in locally installed fonts.
///
/// # Errors
///
/// Returns an error if script evaluation fails.
pub async fn disable_web_fonts(page: &Page) -> Result<usize> {
    let disabled: usize = page.evaluate(DISABLE_WEB_FONTS_SCRIPT).await?.into_value()?;
    debug!("disabled {disabled} web font stylesheets");
    Ok(disabled)
}
