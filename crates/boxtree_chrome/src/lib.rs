//! Headless Chrome driver for [`boxtree`].
//!
//! A run launches Chrome, loads the target at the configured viewport and
//! persistence, serializes the rendered page with an injected collector
//! script and hands the snapshot to [`boxtree::extract_snapshot`]. Font
//! probes are answered by the same page; image boxes are optionally
//! screenshotted afterwards.

pub mod browser;
pub mod capture;
pub mod collect;
pub mod config;
pub mod navigation;
pub mod probe;

pub use browser::ChromeBrowser;
pub use config::{DriverConfig, Persistence, parse_target};

use anyhow::Result;
use boxtree::{Extraction, extract_snapshot};
use chromiumoxide::page::Page;
use log::warn;
use probe::PageFontMeasure;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::spawn_blocking;

/// Output of one run: the extraction plus the optional page screenshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(flatten)]
    pub extraction: Extraction,
    /// Full-page PNG, base64 encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
}

/// Extract the box tree of `config.url`.
///
/// # Errors
///
/// Returns an error if Chrome cannot be started or the page cannot be
/// serialized. Slow navigation is not an error.
pub async fn run(config: &DriverConfig) -> Result<Report> {
    let browser = ChromeBrowser::launch(config).await?;
    let report = extract_page(&browser, config).await;
    if let Err(err) = browser.close().await {
        warn!("closing Chrome failed: {err}");
    }
    report
}

async fn extract_page(browser: &ChromeBrowser, config: &DriverConfig) -> Result<Report> {
    let page = browser.new_page(config).await?;
    navigation::navigate(&page, &config.url, config.persistence).await;

    let screenshot = match capture::capture_full_page(&page).await {
        Ok(png) => Some(png),
        Err(err) => {
            warn!("full page screenshot failed: {err}");
            None
        }
    };
    if config.disable_web_fonts
        && let Err(err) = collect::disable_web_fonts(&page).await
    {
        warn!("could not disable web fonts: {err}");
    }

    // caret lookups only resolve inside the viewport
    if let Err(err) = browser::fit_to_content(&page, config).await {
        warn!("could not grow the viewport over the page: {err}");
    }
    let extraction = extract_fitted(&page, config).await;
    if let Err(err) = browser::set_viewport(&page, config.width, config.height).await {
        warn!("could not restore the viewport: {err}");
    }
    Ok(Report {
        extraction: extraction?,
        screenshot: screenshot.filter(|_| config.screenshot),
    })
}

/// Collect, extract and capture images while the viewport spans the page.
async fn extract_fitted(page: &Page, config: &DriverConfig) -> Result<Extraction> {
    let snapshot = collect::collect_snapshot(page).await?;
    let mut measure = PageFontMeasure::new(page.clone(), Handle::current());
    let mut extraction = spawn_blocking(move || extract_snapshot(snapshot, &mut measure)).await??;

    if config.download_images {
        capture::capture_images(page, &mut extraction.images).await;
    }
    Ok(extraction)
}
