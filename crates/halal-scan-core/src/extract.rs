//! Ingredient candidate extraction.
//!
//! Splits an ingredients block into discrete [`IngredientCandidate`]s using
//! two passes over the same block:
//!
//! - **Nested pass**: every parenthesized group `(...)`, at any depth, is
//!   split on commas, `and`, and `&`. An inner group acts as a separator
//!   inside its parent. Results are flagged `nested = true`.
//! - **Flat pass**: parenthesized groups are removed, the remaining text is
//!   reduced to `[a-zA-Z0-9,.&\s]`, `and` becomes a comma, and the text is
//!   split on commas and `&`. Each token is lower-cased, stripped of
//!   trailing periods, and has repeated words collapsed (OCR often doubles
//!   words when it re-reads a line).
//!
//! Both passes share one depth-tracking scan, so the flat pass drops exactly
//! the text the nested pass consumed. An unclosed `(` runs to the end of the
//! block and a stray `)` at the top level is dropped.
//!
//! The output is the union of both passes without duplicates: flat
//! candidates first in label order, then nested ones. A name found by both
//! passes keeps the flat flag.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::IngredientCandidate;

static NESTED_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i),|&|\band\b").unwrap());
static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9,.&\s]").unwrap());
static AND_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\band\b").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Extracts the de-duplicated candidate list from an ingredients block.
pub fn extract_candidates(block: &str) -> Vec<IngredientCandidate> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    let flat = flat_pass(block).into_iter().map(IngredientCandidate::flat);
    let nested = nested_pass(block).into_iter().map(IngredientCandidate::nested);

    for candidate in flat.chain(nested) {
        if seen.insert(candidate.name.clone()) {
            out.push(candidate);
        }
    }
    out
}

/// Sub-ingredients listed inside parentheses.
pub fn nested_pass(block: &str) -> Vec<String> {
    split_groups(block)
        .groups
        .iter()
        .flat_map(|inner| {
            NESTED_SEPARATOR
                .split(inner)
                .map(|part| part.trim().to_lowercase())
                .collect::<Vec<_>>()
        })
        .filter(|name| !name.is_empty())
        .collect()
}

/// Top-level ingredients with parenthesized groups removed.
pub fn flat_pass(block: &str) -> Vec<String> {
    let top_level = split_groups(block).top_level;
    let single_line = top_level.replace(['\n', '\r'], " ");
    let cleaned = DISALLOWED.replace_all(&single_line, "");
    let comma_joined = AND_WORD.replace_all(&cleaned, ",");
    let collapsed = WHITESPACE.replace_all(&comma_joined, " ");

    collapsed
        .split([',', '&'])
        .map(|token| {
            let lowered = token.trim().to_lowercase();
            collapse_repeated_words(lowered.trim_end_matches('.').trim())
        })
        .filter(|name| !name.is_empty())
        .collect()
}

/// A block split by parenthesis depth.
#[derive(Debug, Default)]
struct GroupSplit {
    /// Text outside every group.
    top_level: String,
    /// Direct text of each group, in order of its opening parenthesis.
    groups: Vec<String>,
}

fn split_groups(block: &str) -> GroupSplit {
    let mut split = GroupSplit::default();
    let mut open: Vec<usize> = Vec::new();

    for ch in block.chars() {
        match ch {
            '(' => {
                if let Some(&parent) = open.last() {
                    split.groups[parent].push(',');
                }
                open.push(split.groups.len());
                split.groups.push(String::new());
            }
            ')' => {
                if open.pop().is_some() {
                    if let Some(&parent) = open.last() {
                        split.groups[parent].push(',');
                    }
                }
            }
            _ => match open.last() {
                Some(&current) => split.groups[current].push(ch),
                None => split.top_level.push(ch),
            },
        }
    }
    split
}

/// Keeps the first occurrence of each word, e.g. `"palm palm oil"` →
/// `"palm oil"`.
fn collapse_repeated_words(token: &str) -> String {
    let mut seen = HashSet::new();
    token
        .split_whitespace()
        .filter(|word| seen.insert(*word))
        .collect::<Vec<_>>()
        .join(" ")
}
