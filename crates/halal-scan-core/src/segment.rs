//! Ingredients-block segmenter.
//!
//! Isolates the ingredients declaration from the full text read off a
//! label. The block starts right after the first case-insensitive
//! occurrence of the lexicon anchor (default `"ingredients"`) and runs up to
//! the nearest stop token (`"warning"`, `"contains"`, `"best before"`, …) or
//! the end of the text.
//!
//! Matching uses Unicode case folding, so a custom anchor such as
//! `"ingrédients"` also finds `"INGRÉDIENTS"`.
//!
//! # Example
//!
//! ```rust
//! use halal_scan_core::lexicon::Lexicon;
//! use halal_scan_core::segment::{AnchorPolicy, Segmenter};
//!
//! let segmenter = Segmenter::new(&Lexicon::default(), AnchorPolicy::Permissive).unwrap();
//! let text = "Nutrition facts\nIngredients: Sugar, Cocoa. Best before: 2027";
//! assert_eq!(segmenter.segment(text), "Sugar, Cocoa.");
//! ```

use anyhow::Context;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::lexicon::Lexicon;

/// What to do when the anchor token is not present in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorPolicy {
    /// Treat the entire text as the ingredients block.
    #[default]
    Permissive,
    /// Return an empty block.
    Strict,
}

/// Anchor and stop-token matchers compiled from a [`Lexicon`].
#[derive(Debug, Clone)]
pub struct Segmenter {
    anchor: Regex,
    stop: Option<Regex>,
    policy: AnchorPolicy,
}

impl Segmenter {
    pub fn new(lexicon: &Lexicon, policy: AnchorPolicy) -> anyhow::Result<Self> {
        let anchor = literal_matcher(&regex::escape(&lexicon.anchor))
            .with_context(|| format!("invalid ingredients anchor {:?}", lexicon.anchor))?;

        let alternatives: Vec<String> = lexicon
            .stop_tokens
            .iter()
            .filter(|token| !token.is_empty())
            .map(|token| regex::escape(token))
            .collect();
        let stop = if alternatives.is_empty() {
            None
        } else {
            Some(literal_matcher(&alternatives.join("|")).context("invalid stop tokens")?)
        };

        Ok(Self {
            anchor,
            stop,
            policy,
        })
    }

    /// Returns the trimmed ingredients block of `text`.
    pub fn segment<'a>(&self, text: &'a str) -> &'a str {
        let start = match self.anchor.find(text) {
            Some(m) => m.end(),
            None => {
                return match self.policy {
                    AnchorPolicy::Permissive => text.trim(),
                    AnchorPolicy::Strict => "",
                }
            }
        };

        let end = self
            .stop
            .as_ref()
            .and_then(|stop| stop.find_at(text, start))
            .map(|m| m.start())
            .unwrap_or(text.len());

        text[start..end]
            .trim_start_matches(|c: char| c.is_whitespace() || c == ':' || c == '-')
            .trim()
    }
}

fn literal_matcher(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}
