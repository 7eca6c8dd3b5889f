//! Detection of font families the renderer actually uses.
//!
//! A family is probed by rendering the same filler text twice, once in
//! `family, fallback` and once in the fallback alone. Different dimensions
//! mean the family rendered. Matching dimensions against `monospace` are
//! ambiguous (the family could be a monospace font), so the check is
//! repeated against a reference family before giving up.

use crate::geometry::Size;
use anyhow::Result;
use log::{debug, warn};
use std::collections::HashSet;

/// Text rendered by every probe.
pub const PROBE_TEXT: &str = "random_words_#_!@#$^&*()_+mdvejreu_RANDOM_WORDS";

/// Font size of the probe text.
pub const PROBE_FONT_SIZE: &str = "32px";

/// First fallback compared against.
pub const FALLBACK_FAMILY: &str = "monospace";

/// Family assumed installed everywhere, used to settle ambiguous probes.
pub const REFERENCE_FAMILY: &str = "Arial";

/// CSS generic family keywords; they name no concrete font.
pub const GENERIC_FAMILIES: [&str; 13] = [
    "serif",
    "sans-serif",
    "monospace",
    "cursive",
    "fantasy",
    "system-ui",
    "ui-serif",
    "ui-sans-serif",
    "ui-monospace",
    "ui-rounded",
    "math",
    "emoji",
    "fangsong",
];

/// Characters removed from family names before probing.
const STRIPPED_CHARS: &str = ",./;'[]`<>\\?:\"{}|~!@#$%^&*()-=_+";

/// An invisible text probe to be rendered and measured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontProbe {
    /// Value for the `font-family` property.
    pub font_family: String,
    pub text: &'static str,
    pub font_size: &'static str,
}

impl FontProbe {
    pub fn new(font_family: String) -> Self {
        Self {
            font_family,
            text: PROBE_TEXT,
            font_size: PROBE_FONT_SIZE,
        }
    }
}

/// Renders a probe off screen and reports its size.
///
/// Implementations must remove whatever they rendered before returning.
pub trait FontMeasure {
    /// # Errors
    ///
    /// Returns an error if the probe could not be rendered or measured.
    fn measure(&mut self, probe: &FontProbe) -> Result<Size>;
}

impl<M: FontMeasure + ?Sized> FontMeasure for &mut M {
    fn measure(&mut self, probe: &FontProbe) -> Result<Size> {
        (**self).measure(probe)
    }
}

/// Family name with punctuation and quotes removed and whitespace trimmed.
pub fn sanitize_family(name: &str) -> String {
    name.chars()
        .filter(|ch| !STRIPPED_CHARS.contains(*ch))
        .collect::<String>()
        .trim()
        .to_owned()
}

pub fn is_generic_family(name: &str) -> bool {
    let name = name.trim();
    GENERIC_FAMILIES
        .iter()
        .any(|generic| generic.eq_ignore_ascii_case(name))
}

/// Font family names in first-seen order without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontSet {
    names: Vec<String>,
    seen: HashSet<String>,
}

impl FontSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `name`; returns `false` if it was already present.
    pub fn insert(&mut self, name: String) -> bool {
        if self.seen.contains(&name) {
            return false;
        }
        self.seen.insert(name.clone());
        self.names.push(name);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Extend<String> for FontSet {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        for name in iter {
            self.insert(name);
        }
    }
}

/// Checks font families against a [`FontMeasure`].
pub struct FontProber<M> {
    measure: M,
}

impl<M: FontMeasure> FontProber<M> {
    pub fn new(measure: M) -> Self {
        Self { measure }
    }

    /// Whether `family` renders differently from the fallbacks.
    ///
    /// Generic keywords and names that sanitize to nothing are never
    /// available. A failed measurement counts as unavailable.
    pub fn is_available(&mut self, family: &str) -> bool {
        if is_generic_family(family) {
            return false;
        }
        let name = sanitize_family(family);
        if name.is_empty() {
            return false;
        }
        match self.check(&name) {
            Ok(available) => available,
            Err(err) => {
                warn!("font probe for {name:?} failed: {err}");
                false
            }
        }
    }

    /// Families of `requested` that render, in request order.
    pub fn resolve(&mut self, requested: &FontSet) -> Vec<String> {
        let available: Vec<String> = requested
            .iter()
            .filter(|family| self.is_available(family))
            .map(str::to_owned)
            .collect();
        debug!(
            "{} of {} requested font families available",
            available.len(),
            requested.len()
        );
        available
    }

    fn check(&mut self, name: &str) -> Result<bool> {
        if self.differs(name, FALLBACK_FAMILY)? {
            return Ok(true);
        }
        self.differs(name, REFERENCE_FAMILY)
    }

    fn differs(&mut self, name: &str, fallback: &str) -> Result<bool> {
        let candidate = self.measure.measure(&FontProbe::new(format!("{name},{fallback}")))?;
        let baseline = self.measure.measure(&FontProbe::new(fallback.to_owned()))?;
        Ok(candidate != baseline)
    }
}
