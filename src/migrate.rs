use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    // Curated entries; names are not unique and lookups rely on rowid order.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reference_ingredients (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            code TEXT,
            category TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL CHECK (status IN ('OK', 'Caution', 'Avoid')),
            description TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Learner output; UNIQUE(name) backs insert-if-absent.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS candidate_ingredients (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL DEFAULT 'Unknown',
            source TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_reference_code ON reference_ingredients(code)")
        .execute(&pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_candidate_created_at ON candidate_ingredients(created_at)",
    )
    .execute(&pool)
    .await?;

    pool.close().await;
    Ok(())
}
