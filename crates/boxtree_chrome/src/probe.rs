//! Font probes rendered in the live page.

use anyhow::Result;
use boxtree::{FontMeasure, FontProbe, Size};
use chromiumoxide::page::Page;
use tokio::runtime::Handle;

/// Appends an invisible span, reads its offset size and removes it again.
const PROBE_SCRIPT: &str = "(function(family, text, size) {
    var span = document.createElement('span');
    span.textContent = text;
    span.style.margin = '0';
    span.style.padding = '0';
    span.style.fontSize = size;
    span.style.position = 'absolute';
    span.style.zIndex = '-1';
    span.style.fontFamily = family;
    (document.body || document.documentElement).appendChild(span);
    var measured = { width: span.offsetWidth, height: span.offsetHeight };
    span.remove();
    return measured;
})";

/// [`FontMeasure`] backed by a Chrome page.
///
/// Extraction is synchronous, so every probe blocks on `runtime`. Use it
/// from a blocking thread such as one started by `spawn_blocking`, never
/// from inside an async task.
pub struct PageFontMeasure {
    page: Page,
    runtime: Handle,
}

impl PageFontMeasure {
    pub const fn new(page: Page, runtime: Handle) -> Self {
        Self { page, runtime }
    }
}

/// Script rendering `probe` and returning its size.
///
/// # Errors
///
/// Returns an error if the probe values cannot be encoded.
pub fn probe_script(probe: &FontProbe) -> Result<String> {
    Ok(format!(
        "{PROBE_SCRIPT}({}, {}, {})",
        serde_json::to_string(&probe.font_family)?,
        serde_json::to_string(probe.text)?,
        serde_json::to_string(probe.font_size)?
    ))
}

impl FontMeasure for PageFontMeasure {
    fn measure(&mut self, probe: &FontProbe) -> Result<Size> {
        let script = probe_script(probe)?;
        let result = self.runtime.block_on(self.page.evaluate(script))?;
        Ok(result.into_value::<Size>()?)
    }
}
