//! Curation commands: loading reference data and reviewing learner output.
//!
//! `reference import` reads a JSON array of reference entries:
//!
//! ```json
//! [
//!   { "name": "gelatin", "category": "gelling agent", "status": "Caution",
//!     "description": "Source animal and slaughter method must be verified." },
//!   { "name": "cochineal", "code": "E120", "status": "Avoid" }
//! ]
//! ```
//!
//! The whole file is validated before anything is written.

use anyhow::{bail, Context, Result};
use std::path::Path;

use halal_scan_core::models::ReferenceIngredient;
use halal_scan_core::store::{CandidateStore, ReferenceStore};

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

async fn open_store(config: &Config) -> Result<SqliteStore> {
    Ok(SqliteStore::new(db::connect(config).await?))
}

pub async fn run_reference_import(config: &Config, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read reference file: {}", path.display()))?;
    let entries: Vec<ReferenceIngredient> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid reference file: {}", path.display()))?;

    for (i, entry) in entries.iter().enumerate() {
        if entry.name.trim().is_empty() {
            bail!("entry {}: name must not be empty", i);
        }
        if !entry.status.is_curated() {
            bail!(
                "entry {} ('{}'): status must be OK, Caution, or Avoid",
                i,
                entry.name
            );
        }
    }

    let store = open_store(config).await?;
    for entry in &entries {
        store.add_reference(entry).await?;
    }

    tracing::info!(count = entries.len(), file = %path.display(), "references imported");
    println!("Imported {} reference ingredients.", entries.len());
    Ok(())
}

pub async fn run_reference_list(config: &Config) -> Result<()> {
    let references = open_store(config).await?.list_references().await?;

    if references.is_empty() {
        println!("No reference ingredients. Import some with `halal-scan reference import`.");
        return Ok(());
    }

    println!("{:<28} {:<8} {:<8} CATEGORY", "NAME", "CODE", "STATUS");
    for r in &references {
        println!(
            "{:<28} {:<8} {:<8} {}",
            r.name,
            r.code.as_deref().unwrap_or("-"),
            r.status.as_str(),
            r.category
        );
    }
    println!();
    println!("{} reference ingredients", references.len());
    Ok(())
}

pub async fn run_candidates_list(config: &Config) -> Result<()> {
    let candidates = open_store(config).await?.list_candidates().await?;

    if candidates.is_empty() {
        println!("No candidate ingredients awaiting review.");
        return Ok(());
    }

    println!("{:<28} {:<8} {:<14} FIRST SEEN", "NAME", "STATUS", "SOURCE");
    for c in &candidates {
        println!(
            "{:<28} {:<8} {:<14} {}",
            c.name,
            c.status.as_str(),
            c.source,
            c.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    println!();
    println!("{} candidates awaiting review", candidates.len());
    Ok(())
}
