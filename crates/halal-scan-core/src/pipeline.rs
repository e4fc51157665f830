//! The classification pipeline.
//!
//! ```text
//! raw text ─▶ segment ─▶ extract ─▶ quality gate ─▶ match / rules ─▶ aggregate
//!                                        │                              │
//!                                   LowQuality                    ProductVerdict
//!                                  (terminal)                  + novel names for
//!                                                                   the learner
//! ```
//!
//! The quality gate is terminal: a rejected scan never reaches reference
//! matching, classification, or the learner.

use serde::Deserialize;
use thiserror::Error;

use crate::classify::classify_by_rules;
use crate::extract::extract_candidates;
use crate::learner::novel_names;
use crate::lexicon::Lexicon;
use crate::matcher::{create_strategy, MatchStrategy, MatchStrategyKind, ReferenceMatcher};
use crate::models::{ClassifiedIngredient, IngredientCandidate, ProductVerdict, ReferenceIngredient};
use crate::quality::{QualityFilter, QualityThresholds};
use crate::segment::{AnchorPolicy, Segmenter};
use crate::store::ReferenceStore;
use crate::verdict::overall_status;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("label text is too noisy: gibberish ratio {ratio:.2} exceeds {threshold:.2}")]
    LowQuality { ratio: f64, threshold: f64 },

    #[error("reference store query failed: {0}")]
    ReferenceStore(#[source] anyhow::Error),
}

/// Tunables read from the `[pipeline]` config section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub anchor_policy: AnchorPolicy,
    pub match_strategy: MatchStrategyKind,
    pub max_edit_distance: usize,
    pub quality: QualityThresholds,
    pub lexicon: Lexicon,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            anchor_policy: AnchorPolicy::default(),
            match_strategy: MatchStrategyKind::default(),
            max_edit_distance: 2,
            quality: QualityThresholds::default(),
            lexicon: Lexicon::default(),
        }
    }
}

/// Result of a successful classification run.
#[derive(Debug, Clone)]
pub struct Classification {
    pub verdict: ProductVerdict,
    /// Unknown, non-generic, clean names for the learner.
    pub novel: Vec<String>,
    pub gibberish_ratio: f64,
}

pub struct Pipeline {
    lexicon: Lexicon,
    segmenter: Segmenter,
    quality: QualityFilter,
    strategy: Box<dyn MatchStrategy>,
}

impl Pipeline {
    pub fn new(settings: PipelineSettings) -> anyhow::Result<Self> {
        settings.lexicon.validate()?;
        if !(settings.quality.reject_ratio > 0.0 && settings.quality.reject_ratio <= 1.0) {
            anyhow::bail!("pipeline.quality.reject_ratio must be in (0.0, 1.0]");
        }
        let lexicon = settings.lexicon.normalized();
        Ok(Self {
            segmenter: Segmenter::new(&lexicon, settings.anchor_policy)?,
            quality: QualityFilter::new(settings.quality)?,
            lexicon,
            strategy: create_strategy(settings.match_strategy, settings.max_edit_distance),
        })
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn quality(&self) -> &QualityFilter {
        &self.quality
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Segments and extracts candidates, then applies the quality gate.
    ///
    /// A block with readable symbols but no candidate at all counts as fully
    /// gibberish.
    pub fn prepare(&self, raw_text: &str) -> Result<Vec<IngredientCandidate>, PipelineError> {
        let block = self.segmenter.segment(raw_text);
        let candidates = extract_candidates(block);
        let ratio = if candidates.is_empty() && has_content(block) {
            1.0
        } else {
            self.quality.gibberish_ratio(&candidates)
        };

        tracing::debug!(
            block_chars = block.len(),
            candidates = candidates.len(),
            gibberish_ratio = ratio,
            "label text segmented"
        );

        if self.quality.rejects(ratio) {
            return Err(PipelineError::LowQuality {
                ratio,
                threshold: self.quality.thresholds().reject_ratio,
            });
        }
        Ok(candidates)
    }

    /// Classifies already-gated candidates against `references`.
    pub fn classify_candidates(
        &self,
        candidates: &[IngredientCandidate],
        references: &[ReferenceIngredient],
    ) -> Classification {
        let matcher = ReferenceMatcher::new(references, self.strategy.as_ref());

        let ingredients: Vec<ClassifiedIngredient> = candidates
            .iter()
            .map(|c| match matcher.find(&c.name) {
                Some(hit) => ClassifiedIngredient {
                    name: c.name.clone(),
                    status: hit.status,
                    description: hit.description.clone(),
                },
                None => classify_by_rules(&c.name, &self.lexicon),
            })
            .collect();

        let overall = overall_status(&ingredients);
        let novel = novel_names(&ingredients, &self.lexicon, &self.quality);

        Classification {
            gibberish_ratio: self.quality.gibberish_ratio(candidates),
            verdict: ProductVerdict {
                ingredients,
                overall_status: overall,
            },
            novel,
        }
    }

    /// Full pipeline over an in-memory reference list.
    pub fn classify(
        &self,
        raw_text: &str,
        references: &[ReferenceIngredient],
    ) -> Result<Classification, PipelineError> {
        let candidates = self.prepare(raw_text)?;
        Ok(self.classify_candidates(&candidates, references))
    }

    /// Full pipeline, loading references from `store` only after the
    /// quality gate passes.
    pub async fn run(
        &self,
        raw_text: &str,
        store: &dyn ReferenceStore,
    ) -> Result<Classification, PipelineError> {
        let candidates = self.prepare(raw_text)?;
        let references = store
            .list_references()
            .await
            .map_err(PipelineError::ReferenceStore)?;
        Ok(self.classify_candidates(&candidates, &references))
    }
}

/// True when `block` holds anything besides whitespace and list punctuation.
fn has_content(block: &str) -> bool {
    block
        .chars()
        .any(|c| !(c.is_whitespace() || matches!(c, ',' | '.' | '&')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HalalStatus;
    use crate::store::memory::InMemoryStore;

    fn pipeline() -> Pipeline {
        Pipeline::new(PipelineSettings::default()).unwrap()
    }

    fn status_of<'a>(c: &'a Classification, name: &str) -> &'a ClassifiedIngredient {
        c.verdict
            .ingredients
            .iter()
            .find(|i| i.name == name)
            .unwrap_or_else(|| panic!("{} missing from verdict", name))
    }

    #[test]
    fn test_label_scenario_without_references() {
        let text = "Ingredients: Sugar, Palm Oil, Gelatin (Bovine), Warning: contains nuts";
        let c = pipeline().classify(text, &[]).unwrap();

        let names: Vec<&str> = c.verdict.ingredients.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["sugar", "palm oil", "gelatin", "bovine"]);
        assert_eq!(status_of(&c, "gelatin").status, HalalStatus::Caution);
        assert_eq!(status_of(&c, "sugar").status, HalalStatus::Unknown);
        assert_eq!(status_of(&c, "bovine").status, HalalStatus::Unknown);
        assert_eq!(c.verdict.overall_status, HalalStatus::Caution);
        assert_eq!(c.novel, vec!["sugar", "palm oil", "bovine"]);
    }

    #[test]
    fn test_reference_match_bypasses_rules() {
        let refs = vec![ReferenceIngredient {
            name: "sodium benzoate".to_string(),
            code: Some("E211".to_string()),
            category: "preservative".to_string(),
            status: HalalStatus::Caution,
            description: "Synthetic preservative; check carrier.".to_string(),
        }];
        let c = pipeline()
            .classify("Ingredients: water, sodium benzoate", &refs)
            .unwrap();
        let hit = status_of(&c, "sodium benzoate");
        assert_eq!(hit.status, HalalStatus::Caution);
        assert_eq!(hit.description, "Synthetic preservative; check carrier.");
        assert!(!c.novel.contains(&"sodium benzoate".to_string()));
    }

    #[test]
    fn test_reference_overrides_rule_verdict() {
        let refs = vec![ReferenceIngredient {
            name: "gelatin".to_string(),
            code: None,
            category: String::new(),
            status: HalalStatus::Ok,
            description: "Certified fish gelatin.".to_string(),
        }];
        let c = pipeline().classify("Ingredients: gelatin", &refs).unwrap();
        assert_eq!(status_of(&c, "gelatin").status, HalalStatus::Ok);
        assert_eq!(c.verdict.overall_status, HalalStatus::Ok);
    }

    #[test]
    fn test_noisy_scan_is_rejected() {
        let text = "Ingredients: xkcdq1wrtzp, vbnmq7lkjhg, t r w q z x v b, salt";
        match pipeline().classify(text, &[]) {
            Err(PipelineError::LowQuality { ratio, threshold }) => {
                assert!(ratio > threshold);
            }
            other => panic!("expected LowQuality, got {:?}", other.map(|c| c.verdict)),
        }
    }

    #[test]
    fn test_symbol_only_scan_is_rejected() {
        let text = "Ingredients: #@!~ $%^ *&^%$ @@@ ;;;";
        match pipeline().classify(text, &[]) {
            Err(PipelineError::LowQuality { ratio, .. }) => assert_eq!(ratio, 1.0),
            other => panic!("expected LowQuality, got {:?}", other.map(|c| c.verdict)),
        }
    }

    #[test]
    fn test_empty_block_is_unknown_not_rejected() {
        let c = pipeline().classify("Ingredients: , , .", &[]).unwrap();
        assert!(c.verdict.ingredients.is_empty());
        assert_eq!(c.verdict.overall_status, HalalStatus::Unknown);
        assert_eq!(c.gibberish_ratio, 0.0);
    }

    #[test]
    fn test_ingredient_inside_nested_group_is_classified() {
        let text = "Ingredients: Filling (Pork (Cured), Salt), Sugar";
        let c = pipeline().classify(text, &[]).unwrap();
        assert_eq!(status_of(&c, "pork").status, HalalStatus::Avoid);
        assert!(c.verdict.ingredients.iter().any(|i| i.name == "cured"));
        assert_eq!(c.verdict.overall_status, HalalStatus::Avoid);
    }

    #[test]
    fn test_unclosed_group_keeps_sub_ingredients() {
        let c = pipeline()
            .classify("Ingredients: Sugar, Gelatin (Pork, Beef", &[])
            .unwrap();
        assert_eq!(status_of(&c, "pork").status, HalalStatus::Avoid);
        assert!(c.verdict.ingredients.iter().any(|i| i.name == "beef"));
    }

    #[test]
    fn test_classification_is_deterministic() {
        let text = "INGREDIENTS: Wheat flour, pork fat, E471, yeast (dried). Store dry.";
        let p = pipeline();
        let a = serde_json::to_string(&p.classify(text, &[]).unwrap().verdict).unwrap();
        let b = serde_json::to_string(&p.classify(text, &[]).unwrap().verdict).unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_run_loads_references_from_store() {
        let store = InMemoryStore::with_references(vec![ReferenceIngredient {
            name: "cochineal".to_string(),
            code: Some("E120".to_string()),
            category: "colour".to_string(),
            status: HalalStatus::Avoid,
            description: "Insect-derived colour.".to_string(),
        }]);
        let c = pipeline()
            .run("Ingredients: sugar, colour (e120)", &store)
            .await
            .unwrap();
        assert_eq!(status_of(&c, "e120").status, HalalStatus::Avoid);
        assert_eq!(c.verdict.overall_status, HalalStatus::Avoid);
    }

    #[test]
    fn test_invalid_reject_ratio() {
        let mut settings = PipelineSettings::default();
        settings.quality.reject_ratio = 0.0;
        assert!(Pipeline::new(settings).is_err());
    }
}
