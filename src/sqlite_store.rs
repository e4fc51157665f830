//! SQLite-backed store implementations.
//!
//! [`SqliteStore`] implements both [`ReferenceStore`] and [`CandidateStore`]
//! over the `reference_ingredients` and `candidate_ingredients` tables
//! created by [`migrate`](crate::migrate).

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use halal_scan_core::models::{CandidateEntry, HalalStatus, ReferenceIngredient};
use halal_scan_core::store::{CandidateStore, ReferenceStore};

/// SQLite implementation of the store traits.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_to_candidate(row: &SqliteRow) -> Result<CandidateEntry> {
    let status: String = row.get("status");
    let created_at: i64 = row.get("created_at");
    Ok(CandidateEntry {
        name: row.get("name"),
        status: status.parse()?,
        source: row.get("source"),
        created_at: DateTime::<Utc>::from_timestamp(created_at, 0).unwrap_or_default(),
    })
}

#[async_trait]
impl ReferenceStore for SqliteStore {
    async fn list_references(&self) -> Result<Vec<ReferenceIngredient>> {
        let rows = sqlx::query(
            "SELECT name, code, category, status, description FROM reference_ingredients ORDER BY rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let status: String = row.get("status");
                Ok(ReferenceIngredient {
                    name: row.get("name"),
                    code: row.get("code"),
                    category: row.get("category"),
                    status: status.parse()?,
                    description: row.get("description"),
                })
            })
            .collect()
    }

    async fn add_reference(&self, entry: &ReferenceIngredient) -> Result<()> {
        if entry.name.trim().is_empty() {
            bail!("reference name must not be empty");
        }
        if !entry.status.is_curated() {
            bail!(
                "reference '{}' has status {}: curated entries must be OK, Caution, or Avoid",
                entry.name,
                entry.status
            );
        }

        sqlx::query(
            r#"
            INSERT INTO reference_ingredients (id, name, code, category, status, description)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(entry.name.trim())
        .bind(&entry.code)
        .bind(&entry.category)
        .bind(entry.status.as_str())
        .bind(&entry.description)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl CandidateStore for SqliteStore {
    async fn find_candidate(&self, name: &str) -> Result<Option<CandidateEntry>> {
        let row = sqlx::query(
            "SELECT name, status, source, created_at FROM candidate_ingredients WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_candidate).transpose()
    }

    async fn insert_if_absent(&self, entry: &CandidateEntry) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO candidate_ingredients (id, name, status, source, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&entry.name)
        .bind(HalalStatus::Unknown.as_str())
        .bind(&entry.source)
        .bind(entry.created_at.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_candidates(&self) -> Result<Vec<CandidateEntry>> {
        let rows = sqlx::query(
            "SELECT name, status, source, created_at FROM candidate_ingredients ORDER BY created_at ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_candidate).collect()
    }
}
