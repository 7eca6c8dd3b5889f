#![allow(clippy::tests_outside_test_module, reason = "integration tests live at file level")]

mod common;

use anyhow::Result;
use boxtree::{BoxId, Extraction, Snapshot, extract_snapshot};
use common::FakeFonts;

/// Body with a paragraph wrapping over three rows and the carets the
/// collector recorded for them.
const WRAPPED: &str = r#"{
    "page": {"width": 200, "height": 60, "title": "Wrapped", "url": "https://example.com/"},
    "nodes": [
        {"kind": "element", "tagName": "BODY", "style": {"display": "block"},
         "container": {"kind": "none"}, "offsetWidth": 200, "offsetHeight": 60,
         "rects": [{"x": 0, "y": 0, "width": 200, "height": 60}]},
        {"kind": "element", "parent": 0, "tagName": "P", "attrs": [{"name": "id", "value": "intro"}],
         "style": {"display": "block", "position": "static", "text-decoration-line": "line-through"},
         "container": {"kind": "node", "index": 0}, "offsetWidth": 60, "offsetHeight": 60,
         "innerText": "one two three",
         "rects": [{"x": 0, "y": 0, "width": 60, "height": 60}]},
        {"kind": "text", "parent": 1, "text": "one two three",
         "rects": [{"x": 0, "y": 0, "width": 30, "height": 18},
                   {"x": 0, "y": 20, "width": 30, "height": 18},
                   {"x": 0, "y": 40, "width": 40, "height": 18}]}
    ],
    "carets": [
        {"x": 1, "y": 9, "node": 2, "offset": 0},
        {"x": 1, "y": 29, "node": 2, "offset": 4},
        {"x": 1, "y": 49, "node": 2, "offset": 8}
    ]
}"#;

/// A stored snapshot replays into line boxes without a browser.
///
/// # Errors
/// Returns an error if the snapshot does not decode.
#[test]
fn replays_wrapped_paragraph() -> Result<()> {
    let snapshot = Snapshot::from_json(WRAPPED)?;
    let extraction = extract_snapshot(snapshot, &mut FakeFonts::with(&[]))?;

    let lines: Vec<_> = extraction
        .boxes
        .iter()
        .filter(|exported| exported.data.tag_name == "XL")
        .map(|exported| {
            (
                exported.data.text.as_deref(),
                exported.data.decoration.as_deref(),
                exported.dom_parent.map(BoxId::index),
            )
        })
        .collect();
    assert_eq!(
        lines,
        vec![
            (Some("one"), Some("T"), Some(1)),
            (Some("two"), Some("T"), Some(1)),
            (Some("three"), Some("T"), Some(1)),
        ]
    );
    assert_eq!(extraction.boxes.len(), 5);
    assert_eq!(extraction.page.url, "https://example.com/");
    assert!(extraction.fonts.is_empty());
    Ok(())
}

/// Paragraph starting well past a 300px viewport, recorded with the viewport
/// grown over the whole page.
const BELOW_FOLD: &str = r#"{
    "page": {"width": 400, "height": 1000, "title": "Tall", "url": "https://example.com/tall"},
    "nodes": [
        {"kind": "element", "tagName": "BODY", "style": {"display": "block"},
         "container": {"kind": "none"}, "offsetWidth": 400, "offsetHeight": 1000,
         "rects": [{"x": 0, "y": 0, "width": 400, "height": 1000}]},
        {"kind": "element", "parent": 0, "tagName": "P",
         "style": {"display": "block", "position": "static"},
         "container": {"kind": "node", "index": 0}, "offsetWidth": 90, "offsetHeight": 60,
         "innerText": "far below fold",
         "rects": [{"x": 0, "y": 900, "width": 90, "height": 60}]},
        {"kind": "text", "parent": 1, "text": "far below fold",
         "rects": [{"x": 0, "y": 900, "width": 30, "height": 18},
                   {"x": 0, "y": 920, "width": 50, "height": 18},
                   {"x": 0, "y": 940, "width": 40, "height": 18}]}
    ],
    "carets": [
        {"x": 1, "y": 909, "node": 2, "offset": 0},
        {"x": 1, "y": 929, "node": 2, "offset": 4},
        {"x": 1, "y": 949, "node": 2, "offset": 10}
    ]
}"#;

/// Rows below the initial viewport split into one line box each.
///
/// # Errors
/// Returns an error if the snapshot does not decode.
#[test]
fn splits_rows_below_fold() -> Result<()> {
    let snapshot = Snapshot::from_json(BELOW_FOLD)?;
    let extraction = extract_snapshot(snapshot, &mut FakeFonts::with(&[]))?;

    let lines: Vec<_> = extraction
        .boxes
        .iter()
        .filter(|exported| exported.data.tag_name == "XL")
        .map(|exported| (exported.data.text.as_deref(), exported.data.bounds.y))
        .collect();
    assert_eq!(
        lines,
        vec![
            (Some("far"), 900.0),
            (Some("below"), 920.0),
            (Some("fold"), 940.0),
        ]
    );
    Ok(())
}

/// Snapshots referencing nodes out of order are rejected.
///
/// # Panics
/// Panics if an invalid container index is accepted.
#[test]
fn rejects_dangling_container() {
    let json = r#"{
        "page": {"width": 0, "height": 0, "title": "", "url": ""},
        "nodes": [
            {"kind": "element", "tagName": "BODY", "container": {"kind": "none"}},
            {"kind": "element", "parent": 0, "tagName": "DIV", "container": {"kind": "node", "index": 7}}
        ]
    }"#;
    let result = Snapshot::from_json(json).and_then(extract_snapshot_with_fakes);
    assert!(result.is_err());
}

fn extract_snapshot_with_fakes(snapshot: Snapshot) -> Result<Extraction> {
    extract_snapshot(snapshot, &mut FakeFonts::with(&[]))
}
