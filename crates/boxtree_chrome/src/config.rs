//! Driver configuration.

use anyhow::{Result, anyhow};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// How long to wait for page content before extracting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Persistence {
    /// DOM parsed.
    Quick,
    /// `load` fired.
    #[default]
    Standard,
    /// At most two network connections left for 500 ms.
    Patient,
    /// No network activity for 500 ms.
    Exhaustive,
}

impl Persistence {
    /// Tier for a numeric level; levels above 3 mean [`Persistence::Exhaustive`].
    pub const fn from_level(level: u8) -> Self {
        match level {
            0 => Self::Quick,
            1 => Self::Standard,
            2 => Self::Patient,
            _ => Self::Exhaustive,
        }
    }

    /// Page lifecycle event ending the wait.
    pub const fn lifecycle_event(self) -> &'static str {
        match self {
            Self::Quick => "DOMContentLoaded",
            Self::Standard => "load",
            Self::Patient => "networkAlmostIdle",
            Self::Exhaustive => "networkIdle",
        }
    }

    pub const fn timeout(self) -> Duration {
        match self {
            Self::Quick => Duration::from_secs(10),
            Self::Standard | Self::Patient => Duration::from_secs(15),
            Self::Exhaustive => Duration::from_secs(50),
        }
    }
}

/// Everything one extraction run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    pub url: Url,
    /// Viewport width in CSS pixels.
    pub width: u32,
    /// Viewport height in CSS pixels.
    pub height: u32,
    pub persistence: Persistence,
    /// Attach the full-page screenshot to the result.
    pub screenshot: bool,
    /// Capture the pixels of every image box.
    pub download_images: bool,
    /// Chrome binary; searched for when unset.
    pub chrome: Option<PathBuf>,
    /// Disable web font stylesheets before extracting.
    pub disable_web_fonts: bool,
}

impl DriverConfig {
    /// Defaults for `url`: a 1200x800 viewport at standard persistence.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            width: 1200,
            height: 800,
            persistence: Persistence::Standard,
            screenshot: false,
            download_images: false,
            chrome: None,
            disable_web_fonts: false,
        }
    }
}

/// Parse a command line target: an absolute URL, or a path to a local file.
///
/// # Errors
///
/// Returns an error if `target` is neither a URL nor an existing file.
pub fn parse_target(target: &str) -> Result<Url> {
    if let Ok(url) = Url::parse(target) {
        // single letters are Windows drive prefixes, not schemes
        if url.scheme().len() > 1 {
            return Ok(url);
        }
    }
    let path = Path::new(target);
    if !path.exists() {
        return Err(anyhow!("{target} is neither a URL nor an existing file"));
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    };
    let canonical = absolute.canonicalize().unwrap_or(absolute);
    Url::from_file_path(&canonical).map_err(|()| anyhow!("Invalid file path for URL: {}", canonical.display()))
}
