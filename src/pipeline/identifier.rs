//! Process-number recognition: pull the case identifier out of page text.
//!
//! Recognition is a prioritised list of [`PatternTier`]s, each tried in order
//! until one matches:
//!
//! | Tier | Shape | Example |
//! |------|-------|---------|
//! | [`PatternTier::Labelled`] | label + `D{4,8}/DD.<alnum.->` | `Processo: 1234567/23.ABC` |
//! | [`PatternTier::Loose`] | same value, no label | `7654321/22.XYZ` |
//! | [`PatternTier::Broad`] | court format or numeric token | `0001234-56.2023.8.26.0100` |
//!
//! A label next to the value is far stronger evidence than a bare number, so
//! a labelled value anywhere on the page beats an unlabelled one that appears
//! earlier. The broad tier accepts almost any long number and only runs when
//! the stricter tiers found nothing.
//!
//! Everything here is pure: no I/O and no state beyond the compiled regexes.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Value shape shared by the labelled and loose tiers:
/// 4–8 digits, `/`, 2 digits, `.`, then a run of alphanumerics, `.` or `-`.
const VALUE: &str = r"([0-9]{4,8}/[0-9]{2}\.[0-9A-Za-z.\-]+)";

// Labels are case-insensitive; the captured value keeps its case.
static RE_LABELLED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i:(?:n[ºo°.\-]*\s*)?(?:d[eo])?\s*processo[:\-\s]*(?:n[.\s]*[º°o]\.?[:.\-\s]*)?|n[.\s]*[º°][:.\-\s]*){VALUE}"
    ))
    .unwrap()
});

static RE_LOOSE: Lazy<Regex> = Lazy::new(|| Regex::new(VALUE).unwrap());

static RE_BROAD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"([0-9]{7}-[0-9]{2}\.[0-9]{4}\.[0-9]\.[0-9]{2}\.[0-9]{4})|(\b[0-9]{4,}(?:[.\-/][0-9]{2,}){0,3}\b)",
    )
    .unwrap()
});

/// One recognition strategy in the tier list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternTier {
    /// `nº` / `processo` / `de processo` / `do processo` before the value.
    Labelled,
    /// The labelled value shape without any label.
    Loose,
    /// Fully-qualified court format, or a generic numeric token with
    /// separators.
    Broad,
}

impl PatternTier {
    fn regex(self) -> &'static Regex {
        match self {
            PatternTier::Labelled => &RE_LABELLED,
            PatternTier::Loose => &RE_LOOSE,
            PatternTier::Broad => &RE_BROAD,
        }
    }

    /// Run this tier alone against `text`.
    pub fn find(self, text: &str) -> Option<String> {
        let caps = self.regex().captures(text)?;
        let raw = caps
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str())
            .find(|s| !s.is_empty())
            .or_else(|| caps.get(0).map(|m| m.as_str()))?;
        let value = normalize(raw);
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

/// Named tier lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternPreset {
    /// Labelled, then loose.
    Strict,
    /// Broad only.
    Legacy,
    /// Labelled, loose, then broad. (default)
    #[default]
    Combined,
}

impl PatternPreset {
    /// Expand the preset into its ordered tier list.
    pub fn tiers(self) -> Vec<PatternTier> {
        match self {
            PatternPreset::Strict => vec![PatternTier::Labelled, PatternTier::Loose],
            PatternPreset::Legacy => vec![PatternTier::Broad],
            PatternPreset::Combined => vec![
                PatternTier::Labelled,
                PatternTier::Loose,
                PatternTier::Broad,
            ],
        }
    }
}

/// A recovered identifier and the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierMatch {
    pub value: String,
    pub tier: PatternTier,
}

/// Identifier extractor over an ordered tier list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierMatcher {
    tiers: Vec<PatternTier>,
}

impl Default for IdentifierMatcher {
    fn default() -> Self {
        Self::from_preset(PatternPreset::default())
    }
}

impl IdentifierMatcher {
    pub fn new(tiers: Vec<PatternTier>) -> Self {
        Self { tiers }
    }

    pub fn from_preset(preset: PatternPreset) -> Self {
        Self::new(preset.tiers())
    }

    pub fn tiers(&self) -> &[PatternTier] {
        &self.tiers
    }

    /// First tier (in order) that matches, with its normalized value.
    pub fn find(&self, text: &str) -> Option<IdentifierMatch> {
        if text.trim().is_empty() {
            return None;
        }
        self.tiers.iter().find_map(|&tier| {
            tier.find(text)
                .map(|value| IdentifierMatch { value, tier })
        })
    }

    /// Identifier string only; see [`IdentifierMatcher::find`].
    pub fn extract(&self, text: &str) -> Option<String> {
        self.find(text).map(|m| m.value)
    }
}

/// Extract a process number using the default (combined) tier list.
pub fn extract_identifier(text: &str) -> Option<String> {
    static DEFAULT: Lazy<IdentifierMatcher> = Lazy::new(IdentifierMatcher::default);
    DEFAULT.extract(text)
}

/// Trim, then drop every whitespace character.
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace().collect()
}
