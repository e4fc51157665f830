//! Knowledge learner.
//!
//! Records ingredient names the pipeline could not classify so a curator
//! can review them later. A name qualifies when its final status is
//! `Unknown`, it is not a generic term from the lexicon, and the quality
//! filter does not flag it as noise.
//!
//! Writes fan out concurrently, one [`CandidateStore::insert_if_absent`]
//! per name. Failures are logged and counted but never propagated: a
//! verdict is valid whether or not the learner succeeds.

use futures_util::future::join_all;
use serde::Serialize;

use crate::lexicon::Lexicon;
use crate::models::{CandidateEntry, ClassifiedIngredient, HalalStatus};
use crate::quality::QualityFilter;
use crate::store::CandidateStore;

/// Source tag stored on learner-created candidate entries.
pub const DEFAULT_SOURCE: &str = "auto-upload";

/// Outcome counts for one learner run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LearnReport {
    pub inserted: usize,
    pub already_known: usize,
    pub failed: usize,
}

/// Names from `classified` that are worth sending to the candidate store.
pub fn novel_names(
    classified: &[ClassifiedIngredient],
    lexicon: &Lexicon,
    quality: &QualityFilter,
) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for item in classified {
        if item.status != HalalStatus::Unknown
            || lexicon.is_generic(&item.name)
            || quality.is_gibberish(&item.name)
            || names.contains(&item.name)
        {
            continue;
        }
        names.push(item.name.clone());
    }
    names
}

/// Inserts every name not already present in `store`.
pub async fn learn(store: &dyn CandidateStore, names: &[String], source: &str) -> LearnReport {
    let writes = names.iter().map(|name| async move {
        let entry = CandidateEntry::new(name.as_str(), source);
        (name, store.insert_if_absent(&entry).await)
    });

    let mut report = LearnReport::default();
    for (name, outcome) in join_all(writes).await {
        match outcome {
            Ok(true) => report.inserted += 1,
            Ok(false) => report.already_known += 1,
            Err(e) => {
                tracing::warn!(candidate = %name, error = %e, "candidate insert failed");
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        inserted = report.inserted,
        already_known = report.already_known,
        failed = report.failed,
        "learner finished"
    );
    report
}
