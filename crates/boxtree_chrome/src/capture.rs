//! Screenshots of the whole page and of image boxes.

use anyhow::{Context as _, Result, ensure};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use boxtree::ImageRef;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use log::{debug, info};

/// Hides the content of an element flagged for a background capture.
const HIDE_CONTENT_SCRIPT: &str = "(function() {
    var style = document.createElement('style');
    style.textContent = '[data-boxtree-bg=\"1\"] * { display: none; }';
    (document.head || document.documentElement).appendChild(style);
})()";

/// Full-page PNG, base64 encoded.
///
/// # Errors
///
/// Returns an error if Chrome fails to capture the page.
pub async fn capture_full_page(page: &Page) -> Result<String> {
    let params = ScreenshotParams::builder()
        .format(CaptureScreenshotFormat::Png)
        .full_page(true)
        .build();
    let png = page.screenshot(params).await?;
    debug!("full page screenshot: {} bytes", png.len());
    Ok(STANDARD.encode(png))
}

/// Capture every image box, filling in [`ImageRef::data`].
///
/// Boxes that cannot be captured keep no data; the failure is only logged.
pub async fn capture_images(page: &Page, images: &mut [ImageRef]) {
    if images.is_empty() {
        return;
    }
    if let Err(err) = page.evaluate(HIDE_CONTENT_SCRIPT).await {
        debug!("could not install background capture style: {err}");
    }
    let mut captured = 0usize;
    for image in images.iter_mut() {
        match capture_image(page, image).await {
            Ok(data) => {
                image.data = Some(data);
                captured += 1;
            }
            Err(err) => debug!("image box {} not captured: {err:#}", image.id.index()),
        }
    }
    info!("captured {captured} of {} images", images.len());
}

async fn capture_image(page: &Page, image: &ImageRef) -> Result<String> {
    let source = image.source.context("image box has no page node")?;
    let id = image.id.index();
    let tag = format!(
        "(function() {{
            var el = window.__boxtreeNodes && window.__boxtreeNodes[{}];
            if (!el) return false;
            el.setAttribute('data-boxtree-id', '{id}');
            return true;
        }})()",
        source.index()
    );
    let tagged: bool = page.evaluate(tag).await?.into_value()?;
    ensure!(tagged, "page node {} is gone", source.index());

    let selector = format!("*[data-boxtree-id=\"{id}\"]");
    if image.bg {
        set_background_flag(page, &selector, true).await?;
    }
    let shot = async {
        let element = page.find_element(selector.as_str()).await?;
        element.screenshot(CaptureScreenshotFormat::Png).await
    }
    .await;
    if image.bg {
        set_background_flag(page, &selector, false).await?;
    }
    Ok(STANDARD.encode(shot?))
}

async fn set_background_flag(page: &Page, selector: &str, on: bool) -> Result<()> {
    let script = format!(
        "(function() {{
            var el = document.querySelector({});
            if (el) el.setAttribute('data-boxtree-bg', '{}');
        }})()",
        serde_json::to_string(selector)?,
        u8::from(on)
    );
    page.evaluate(script).await?;
    Ok(())
}
