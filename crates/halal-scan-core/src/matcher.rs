//! Reference matching.
//!
//! Looks up a candidate in the curated reference collection so a human
//! verdict can be reused. Two stages:
//!
//! 1. **E-code lookup**: a candidate such as `e471` or `E 150a` is matched
//!    against [`ReferenceIngredient::code`].
//! 2. **Name lookup**: each reference name is tested with the configured
//!    [`MatchStrategy`] in collection order; the first hit wins.
//!
//! First-match rather than best-match is a known precision limit of the
//! default [`SubstringMatch`]: a short reference name can claim a longer
//! candidate that another entry describes better. The stricter strategies
//! exist so precision can be tuned without changing the pipeline.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::models::ReferenceIngredient;

static E_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(e)?\s*-?\s*(\d{3,4}[a-z]?)$").unwrap());

/// Decides whether a candidate name refers to a reference name.
///
/// Both arguments are lower-cased and trimmed before the call.
pub trait MatchStrategy: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;
    fn matches(&self, candidate: &str, reference: &str) -> bool;
}

/// Case-insensitive equality or containment in either direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatch;

impl MatchStrategy for SubstringMatch {
    fn name(&self) -> &'static str {
        "substring"
    }

    fn matches(&self, candidate: &str, reference: &str) -> bool {
        candidate == reference || candidate.contains(reference) || reference.contains(candidate)
    }
}

/// Case-insensitive equality only.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl MatchStrategy for ExactMatch {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn matches(&self, candidate: &str, reference: &str) -> bool {
        candidate == reference
    }
}

/// Same set of words, ignoring order, repetition, and punctuation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenSetMatch;

fn token_set(s: &str) -> HashSet<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

impl MatchStrategy for TokenSetMatch {
    fn name(&self) -> &'static str {
        "token-set"
    }

    fn matches(&self, candidate: &str, reference: &str) -> bool {
        let a = token_set(candidate);
        !a.is_empty() && a == token_set(reference)
    }
}

/// Levenshtein distance within `max_distance`.
#[derive(Debug, Clone, Copy)]
pub struct EditDistanceMatch {
    pub max_distance: usize,
}

impl MatchStrategy for EditDistanceMatch {
    fn name(&self) -> &'static str {
        "edit-distance"
    }

    fn matches(&self, candidate: &str, reference: &str) -> bool {
        strsim::levenshtein(candidate, reference) <= self.max_distance
    }
}

/// Strategy selector as written in config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategyKind {
    #[default]
    Substring,
    Exact,
    TokenSet,
    EditDistance,
}

pub fn create_strategy(kind: MatchStrategyKind, max_edit_distance: usize) -> Box<dyn MatchStrategy> {
    match kind {
        MatchStrategyKind::Substring => Box::new(SubstringMatch),
        MatchStrategyKind::Exact => Box::new(ExactMatch),
        MatchStrategyKind::TokenSet => Box::new(TokenSetMatch),
        MatchStrategyKind::EditDistance => Box::new(EditDistanceMatch {
            max_distance: max_edit_distance,
        }),
    }
}

/// Normalizes an additive code to `e<digits><letter?>`.
///
/// With `require_prefix`, bare numbers are refused so a candidate like
/// `"100"` is never treated as an E-code. Reference codes may omit the `E`.
pub fn normalize_e_code(raw: &str, require_prefix: bool) -> Option<String> {
    let lowered = raw.trim().to_lowercase();
    let caps = E_CODE.captures(&lowered)?;
    if require_prefix && caps.get(1).is_none() {
        return None;
    }
    caps.get(2).map(|m| format!("e{}", m.as_str()))
}

struct PreparedReference<'a> {
    name: String,
    code: Option<String>,
    entry: &'a ReferenceIngredient,
}

/// Reference collection prepared for repeated lookups within one scan.
pub struct ReferenceMatcher<'a> {
    references: Vec<PreparedReference<'a>>,
    strategy: &'a dyn MatchStrategy,
}

impl<'a> ReferenceMatcher<'a> {
    pub fn new(references: &'a [ReferenceIngredient], strategy: &'a dyn MatchStrategy) -> Self {
        let references = references
            .iter()
            .map(|entry| PreparedReference {
                name: entry.name.trim().to_lowercase(),
                code: entry
                    .code
                    .as_deref()
                    .and_then(|c| normalize_e_code(c, false)),
                entry,
            })
            .collect();
        Self {
            references,
            strategy,
        }
    }

    /// Returns the first reference entry matching `candidate`, if any.
    pub fn find(&self, candidate: &str) -> Option<&'a ReferenceIngredient> {
        let candidate = candidate.trim().to_lowercase();
        if candidate.is_empty() {
            return None;
        }

        if let Some(code) = normalize_e_code(&candidate, true) {
            if let Some(hit) = self
                .references
                .iter()
                .find(|r| r.code.as_deref() == Some(code.as_str()))
            {
                return Some(hit.entry);
            }
        }

        self.references
            .iter()
            .filter(|r| !r.name.is_empty())
            .find(|r| self.strategy.matches(&candidate, &r.name))
            .map(|r| r.entry)
    }
}
