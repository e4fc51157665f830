//! SQLite connection pool.
//!
//! The database file and its parent directory are created on first use.
//! WAL mode lets scans read references while the learner writes
//! candidates; the busy timeout absorbs short write-lock waits before
//! they surface as errors.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::time::Duration;

use crate::config::Config;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db_path = &config.db.path;

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.db.max_connections)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbConfig;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_connect_creates_missing_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/halal-scan.sqlite");
        let config = Config {
            db: DbConfig {
                path: path.clone(),
                max_connections: 2,
            },
            ..Config::minimal()
        };

        let pool = connect(&config).await.unwrap();
        let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await.unwrap();
        assert_eq!(one, 1);
        assert!(path.exists());
    }
}
