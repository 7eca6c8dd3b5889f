//! Whole-page extraction: normalize, walk, resolve fonts.

use crate::builder::{BuildContext, BuildOutput};
use crate::caret::CaretLocator;
use crate::dom::Document;
use crate::fonts::{FontMeasure, FontProber};
use crate::model::Extraction;
use crate::normalize::normalize;
use crate::snapshot::Snapshot;
use anyhow::Result;
use log::info;

/// Extract the box tree of `document`.
///
/// The document is normalized first; `carets` answers the line-break
/// lookups and `measure` the font probes. Boxes, fonts and images all come
/// from the same walk, so their ids agree.
pub fn extract<C, M>(document: &Document, carets: &C, measure: &mut M) -> Extraction
where
    C: CaretLocator + ?Sized,
    M: FontMeasure + ?Sized,
{
    let normalized = normalize(document, carets);
    let mut context = BuildContext::new(&normalized);
    context.walk(normalized.root(), 0);
    let BuildOutput {
        tree,
        requested_fonts,
        images,
    } = context.finish();

    let fonts = FontProber::new(measure).resolve(&requested_fonts);
    info!(
        "extracted {} boxes, {} images, {} fonts from {}",
        tree.len(),
        images.len(),
        fonts.len(),
        document.page().url
    );
    Extraction {
        page: document.page().clone(),
        fonts,
        boxes: tree.export(),
        images,
    }
}

/// Decode `snapshot` and extract it, using the carets recorded with it.
///
/// # Errors
///
/// Returns an error if the snapshot does not describe a valid document.
pub fn extract_snapshot<M>(snapshot: Snapshot, measure: &mut M) -> Result<Extraction>
where
    M: FontMeasure + ?Sized,
{
    let (document, carets) = snapshot.into_document()?;
    Ok(extract(&document, &carets, measure))
}
