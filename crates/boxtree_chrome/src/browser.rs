//! Headless Chrome process and page setup.

use crate::config::DriverConfig;
use anyhow::{Result, anyhow};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::page::Page;
use futures::StreamExt as _;
use log::{debug, info};
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use tokio::spawn;
use tokio::task::JoinHandle;

/// Executable names tried on `PATH` when no binary is configured.
const PATH_CANDIDATES: [&str; 4] = ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"];

/// Well-known install locations.
const FILE_CANDIDATES: [&str; 3] = [
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
];

/// Browser instance with its background event handler.
pub struct ChromeBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl ChromeBrowser {
    /// Launch headless Chrome with a window matching the configured viewport.
    ///
    /// # Errors
    ///
    /// Returns an error if Chrome cannot be found or fails to start.
    pub async fn launch(config: &DriverConfig) -> Result<Self> {
        let chrome = find_chrome_executable(config.chrome.as_deref())?;
        info!("launching {}", chrome.display());
        let browser_config = BrowserConfig::builder()
            .chrome_executable(chrome)
            .no_sandbox()
            .viewport(None)
            .window_size(config.width, config.height)
            .arg("--force-device-scale-factor=1")
            .arg("--hide-scrollbars")
            .arg("--disable-gpu")
            .arg("--allow-file-access-from-files")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--mute-audio")
            .build()
            .map_err(|err| anyhow!("Browser config error: {err}"))?;

        let (browser, mut events) = Browser::launch(browser_config)
            .await
            .map_err(|err| anyhow!("Failed to launch Chrome: {err}"))?;
        let handler = spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(err) = event {
                    debug!("Browser handler error: {err}");
                }
            }
        });
        Ok(Self { browser, handler })
    }

    /// Open a blank tab emulating the configured viewport.
    ///
    /// # Errors
    ///
    /// Returns an error if the tab cannot be created.
    pub async fn new_page(&self, config: &DriverConfig) -> Result<Page> {
        let page = self.browser.new_page("about:blank").await?;
        set_viewport(&page, config.width, config.height).await?;
        Ok(page)
    }

    /// Shut the browser down and stop the event handler.
    ///
    /// # Errors
    ///
    /// Returns an error if Chrome does not acknowledge the close request.
    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await?;
        let _exit = self.browser.wait().await?;
        self.handler.abort();
        Ok(())
    }
}

/// Emulate a `width` x `height` viewport at scale factor 1.
///
/// # Errors
///
/// Returns an error if Chrome rejects the override.
pub async fn set_viewport(page: &Page, width: u32, height: u32) -> Result<()> {
    let metrics = SetDeviceMetricsOverrideParams::builder()
        .width(i64::from(width))
        .height(i64::from(height))
        .device_scale_factor(1.0)
        .mobile(false)
        .build()
        .map_err(|err| anyhow!("Failed to build viewport params: {err}"))?;
    page.execute(metrics).await?;
    Ok(())
}

/// Grow the viewport over the whole document so caret lookups reach every
/// text row. Returns the applied size.
///
/// # Errors
///
/// Returns an error if the layout metrics cannot be read or applied.
pub async fn fit_to_content(page: &Page, config: &DriverConfig) -> Result<(u32, u32)> {
    let metrics = page.layout_metrics().await?;
    let content = metrics.css_content_size;
    let (width, height) = content_viewport((config.width, config.height), (content.width, content.height));
    set_viewport(page, width, height).await?;
    debug!("viewport grown to {width}x{height} for extraction");
    Ok((width, height))
}

/// Viewport covering `content`, never smaller than `viewport`.
pub fn content_viewport(viewport: (u32, u32), content: (f64, f64)) -> (u32, u32) {
    let cover = |configured: u32, extent: f64| {
        if extent.is_finite() && extent > f64::from(configured) {
            extent.ceil() as u32
        } else {
            configured
        }
    };
    (cover(viewport.0, content.0), cover(viewport.1, content.1))
}

/// Locate a Chrome binary: `explicit`, then `CHROME_BIN`, then `PATH`, then
/// well-known install locations.
///
/// # Errors
///
/// Returns an error if no candidate exists.
pub fn find_chrome_executable(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Ok(chrome_bin) = env::var("CHROME_BIN") {
        let path = PathBuf::from(&chrome_bin);
        if path.exists() {
            return Ok(path);
        }
    }
    for candidate in PATH_CANDIDATES {
        if let Ok(output) = Command::new(candidate).arg("--version").output() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            // snap stubs print no version
            if (stdout.contains("Chrome") || stdout.contains("Chromium")) && !stderr.contains("snap") {
                return Ok(PathBuf::from(candidate));
            }
        }
    }
    FILE_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
        .ok_or_else(|| {
            anyhow!("Chrome/Chromium executable not found. Install Chrome, pass --chrome or set CHROME_BIN.")
        })
}
