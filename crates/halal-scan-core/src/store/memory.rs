//! In-memory store implementation for testing and embedding.
//!
//! Uses `Vec` behind `std::sync::RwLock`. The candidate existence check and
//! the insert happen under one write lock, which makes
//! [`CandidateStore::insert_if_absent`] atomic.

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::{CandidateEntry, ReferenceIngredient};

use super::{CandidateStore, ReferenceStore};

/// In-memory reference and candidate store.
pub struct InMemoryStore {
    references: RwLock<Vec<ReferenceIngredient>>,
    candidates: RwLock<Vec<CandidateEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            references: RwLock::new(Vec::new()),
            candidates: RwLock::new(Vec::new()),
        }
    }

    pub fn with_references(references: Vec<ReferenceIngredient>) -> Self {
        Self {
            references: RwLock::new(references),
            candidates: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

#[async_trait]
impl ReferenceStore for InMemoryStore {
    async fn list_references(&self) -> Result<Vec<ReferenceIngredient>> {
        Ok(self.references.read().map_err(poisoned)?.clone())
    }

    async fn add_reference(&self, entry: &ReferenceIngredient) -> Result<()> {
        self.references.write().map_err(poisoned)?.push(entry.clone());
        Ok(())
    }
}

#[async_trait]
impl CandidateStore for InMemoryStore {
    async fn find_candidate(&self, name: &str) -> Result<Option<CandidateEntry>> {
        let candidates = self.candidates.read().map_err(poisoned)?;
        Ok(candidates.iter().find(|c| c.name == name).cloned())
    }

    async fn insert_if_absent(&self, entry: &CandidateEntry) -> Result<bool> {
        let mut candidates = self.candidates.write().map_err(poisoned)?;
        if candidates.iter().any(|c| c.name == entry.name) {
            return Ok(false);
        }
        candidates.push(entry.clone());
        Ok(true)
    }

    async fn list_candidates(&self) -> Result<Vec<CandidateEntry>> {
        Ok(self.candidates.read().map_err(poisoned)?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_insert_if_absent_is_idempotent() {
        let store = InMemoryStore::new();
        let entry = CandidateEntry::new("bovine", "auto-upload");
        assert!(store.insert_if_absent(&entry).await.unwrap());
        assert!(!store.insert_if_absent(&entry).await.unwrap());
        assert_eq!(store.list_candidates().await.unwrap().len(), 1);
        assert!(store.find_candidate("bovine").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_inserts_write_once() {
        let store = Arc::new(InMemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .insert_if_absent(&CandidateEntry::new("carmine", "auto-upload"))
                    .await
                    .unwrap()
            }));
        }
        let mut inserted = 0;
        for h in handles {
            if h.await.unwrap() {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);
        assert_eq!(store.list_candidates().await.unwrap().len(), 1);
    }
}
