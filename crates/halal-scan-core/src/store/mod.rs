//! Storage abstraction for Halal Scan.
//!
//! Two collections back the pipeline:
//!
//! | Trait | Collection | Access from the pipeline |
//! |-------|------------|--------------------------|
//! | [`ReferenceStore`] | curated ingredients | read-only |
//! | [`CandidateStore`] | newly observed names awaiting curation | insert-if-absent |
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CandidateEntry, ReferenceIngredient};

/// Curated reference ingredients.
///
/// [`list_references`](ReferenceStore::list_references) must return entries
/// in a stable order (insertion order for the bundled stores) so that
/// first-match lookups are reproducible.
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    async fn list_references(&self) -> Result<Vec<ReferenceIngredient>>;

    /// Adds a curated entry. Used by curation tooling, never by a scan.
    async fn add_reference(&self, entry: &ReferenceIngredient) -> Result<()>;
}

/// Append-only store of candidate ingredient names.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    async fn find_candidate(&self, name: &str) -> Result<Option<CandidateEntry>>;

    /// Atomically inserts `entry` unless a candidate with the same name
    /// exists. Returns `true` when a row was written.
    ///
    /// Concurrent calls with the same name must write at most one row.
    async fn insert_if_absent(&self, entry: &CandidateEntry) -> Result<bool>;

    async fn list_candidates(&self) -> Result<Vec<CandidateEntry>>;
}
