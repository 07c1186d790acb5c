//! Database initialization
//!
//! Opens the shared SQLite database, applies connection pragmas and
//! creates any missing tables. Every statement here is idempotent, so
//! all services call this unconditionally at startup.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    // WAL keeps readers unblocked while an ingest transaction writes
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes (idempotent, safe to call repeatedly)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_users_table(pool).await?;
    create_texts_table(pool).await?;
    create_comments_table(pool).await?;
    create_logs_table(pool).await?;
    create_tags_table(pool).await?;
    create_issues_table(pool).await?;

    // Corpus tables
    create_tokens_table(pool).await?;
    create_units_table(pool).await?;
    create_strings_table(pool).await?;

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            tier INTEGER NOT NULL DEFAULT 7 CHECK (tier IN (1, 5, 7)),
            activated INTEGER NOT NULL DEFAULT 1,
            password_hash TEXT NOT NULL DEFAULT '',
            password_salt TEXT NOT NULL DEFAULT '',
            created INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create the bootstrap administrator if it doesn't exist
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO users (id, name, tier, activated, created)
        VALUES (1, 'admin', 1, 1, ?)
        "#,
    )
    .bind(crate::db::models::now_ms())
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_texts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS texts (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            lang TEXT NOT NULL,
            scheme TEXT NOT NULL DEFAULT '[]',
            created INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_comments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY,
            text_id INTEGER NOT NULL REFERENCES texts(id),
            title TEXT NOT NULL,
            published INTEGER NOT NULL DEFAULT 0,
            priority REAL NOT NULL DEFAULT 0,
            tags TEXT NOT NULL DEFAULT '[]',
            issues TEXT NOT NULL DEFAULT '[]',
            entry TEXT NOT NULL DEFAULT '{}',
            created INTEGER NOT NULL,
            updated INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_text_id ON comments(text_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_logs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS logs (
            id INTEGER PRIMARY KEY,
            created INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            table_name TEXT NOT NULL,
            record_id INTEGER NOT NULL,
            data0 TEXT NOT NULL DEFAULT '{}',
            data1 TEXT NOT NULL DEFAULT '{}'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_logs_record ON logs(table_name, record_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_logs_created ON logs(created)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_tags_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_issues_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS issues (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL UNIQUE,
            color TEXT NOT NULL DEFAULT '#888888'
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_tokens_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tokens (
            id INTEGER PRIMARY KEY,
            token TEXT NOT NULL,
            lang TEXT NOT NULL,
            meta TEXT,
            UNIQUE (token, lang)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_units_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS units (
            id INTEGER PRIMARY KEY,
            token_id INTEGER NOT NULL REFERENCES tokens(id),
            pos TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_strings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS strings (
            id INTEGER PRIMARY KEY,
            text_id INTEGER NOT NULL REFERENCES texts(id),
            p INTEGER NOT NULL,
            s INTEGER NOT NULL,
            line INTEGER NOT NULL,
            form TEXT NOT NULL,
            repr TEXT NOT NULL,
            fmt TEXT NOT NULL DEFAULT '[]',
            token_id INTEGER REFERENCES tokens(id),
            unit_id INTEGER REFERENCES units(id),
            comments TEXT NOT NULL DEFAULT '[]'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_strings_text_id ON strings(text_id, p, s, line)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_strings_form ON strings(form)")
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        create_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let pool = memory_pool().await;
        create_schema(&pool).await.unwrap();
        create_schema(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_bootstrap_admin_seeded_once() {
        let pool = memory_pool().await;
        create_schema(&pool).await.unwrap();

        let (count, tier): (i64, i64) =
            sqlx::query_as("SELECT COUNT(*), MIN(tier) FROM users WHERE name = 'admin'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 1);
        assert_eq!(tier, 1);
    }

    #[tokio::test]
    async fn test_token_uniqueness_covers_lang() {
        let pool = memory_pool().await;

        sqlx::query("INSERT INTO tokens (token, lang) VALUES ('cat', 'en')")
            .execute(&pool)
            .await
            .unwrap();
        // Same surface form, other language: distinct row
        sqlx::query("INSERT INTO tokens (token, lang) VALUES ('cat', 'nl')")
            .execute(&pool)
            .await
            .unwrap();
        // Exact duplicate: refused by the constraint
        let dup = sqlx::query("INSERT INTO tokens (token, lang) VALUES ('cat', 'en')")
            .execute(&pool)
            .await;
        assert!(dup.is_err());
    }
}
