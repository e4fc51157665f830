//! OCR noise detection.
//!
//! A candidate is *gibberish* when any of these hold:
//!
//! | Check | Default |
//! |-------|---------|
//! | longer than `max_chars` characters | 60 |
//! | more than `max_words` space-separated words | 6 |
//! | has a character outside `[a-z0-9\s\-.,()]` and no letter `e` | n/a |
//! | two runs of `min_letter_run`+ letters joined by one stray symbol or digit | 5 |
//!
//! The last check catches tokens OCR merged together (`sugar1flour`). A
//! single long word such as `hydrogenated` is not flagged.
//!
//! The filter is used twice: per candidate, to keep noise out of the
//! learner, and in aggregate through [`QualityFilter::gibberish_ratio`],
//! which the pipeline compares against `reject_ratio` to refuse unreadable
//! scans.

use anyhow::Context;
use regex::Regex;
use serde::Deserialize;

use crate::models::IngredientCandidate;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    pub max_chars: usize,
    pub max_words: usize,
    pub min_letter_run: usize,
    /// Scans whose gibberish ratio is strictly above this are rejected.
    pub reject_ratio: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            max_chars: 60,
            max_words: 6,
            min_letter_run: 5,
            reject_ratio: 0.4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct QualityFilter {
    thresholds: QualityThresholds,
    merged_runs: Regex,
}

impl QualityFilter {
    pub fn new(thresholds: QualityThresholds) -> anyhow::Result<Self> {
        let run = thresholds.min_letter_run.max(1);
        let merged_runs = Regex::new(&format!(r"(?i)[a-z]{{{run},}}[^a-z\s\-][a-z]{{{run},}}"))
            .with_context(|| format!("invalid min_letter_run {}", thresholds.min_letter_run))?;
        Ok(Self {
            thresholds,
            merged_runs,
        })
    }

    pub fn thresholds(&self) -> &QualityThresholds {
        &self.thresholds
    }

    pub fn is_gibberish(&self, candidate: &str) -> bool {
        let t = &self.thresholds;

        if candidate.chars().count() > t.max_chars {
            return true;
        }
        if candidate.split_whitespace().count() > t.max_words {
            return true;
        }

        let has_foreign_char = candidate.chars().any(|c| {
            !(c.is_ascii_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '.' | ',' | '(' | ')'))
        });
        let has_e = candidate.chars().any(|c| c.eq_ignore_ascii_case(&'e'));
        if has_foreign_char && !has_e {
            return true;
        }

        self.merged_runs.is_match(candidate)
    }

    /// Fraction of `candidates` judged gibberish; `0.0` for an empty list.
    pub fn gibberish_ratio(&self, candidates: &[IngredientCandidate]) -> f64 {
        if candidates.is_empty() {
            return 0.0;
        }
        let noisy = candidates
            .iter()
            .filter(|c| self.is_gibberish(&c.name))
            .count();
        noisy as f64 / candidates.len() as f64
    }

    pub fn rejects(&self, ratio: f64) -> bool {
        ratio > self.thresholds.reject_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> QualityFilter {
        QualityFilter::new(QualityThresholds::default()).unwrap()
    }

    #[test]
    fn test_long_repeated_letters_is_gibberish() {
        assert!(filter().is_gibberish(&"a".repeat(80)));
    }

    #[test]
    fn test_normal_phrase_is_clean() {
        assert!(!filter().is_gibberish("partially hydrogenated soybean"));
        assert!(!filter().is_gibberish("sunflower-lecithin"));
        assert!(!filter().is_gibberish("vitamin b12"));
    }

    #[test]
    fn test_too_many_words() {
        assert!(filter().is_gibberish("a b c d e f g"));
        assert!(!filter().is_gibberish("a b c d e f"));
    }

    #[test]
    fn test_foreign_chars_without_e() {
        assert!(filter().is_gibberish("%$#@!"));
        assert!(filter().is_gibberish("ãõú"));
        // The letter `e` keeps accented but English-looking text.
        assert!(!filter().is_gibberish("crème"));
    }

    #[test]
    fn test_merged_tokens() {
        assert!(filter().is_gibberish("sugar1flour"));
        assert!(filter().is_gibberish("wheat|flour"));
        assert!(!filter().is_gibberish("maltodextrin"));
    }

    #[test]
    fn test_oversized_letter_run_is_an_error() {
        let thresholds = QualityThresholds {
            min_letter_run: 1_000_000,
            ..QualityThresholds::default()
        };
        assert!(QualityFilter::new(thresholds).is_err());
    }

    #[test]
    fn test_ratio() {
        let candidates = vec![
            IngredientCandidate::flat("sugar"),
            IngredientCandidate::flat("x".repeat(70)),
            IngredientCandidate::flat("salt"),
            IngredientCandidate::flat("%%%"),
        ];
        let f = filter();
        assert!((f.gibberish_ratio(&candidates) - 0.5).abs() < 1e-9);
        assert!(f.rejects(0.5));
        assert!(!f.rejects(0.4));
        assert_eq!(f.gibberish_ratio(&[]), 0.0);
    }
}
