//! Text administration
//!
//! Texts carry the per-text annotation scheme consumed by the differ.
//! Creation validates the scheme (unique field ids) before any write.

use crate::store::revlog;
use scholia_common::access::{authorize, Action};
use scholia_common::db::models::{now_ms, Text, User};
use scholia_common::entry::TextScheme;
use scholia_common::error::{Error, Result};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;

/// Parameters for creating a text
#[derive(Debug, Clone, Deserialize)]
pub struct TextParams {
    pub title: String,
    pub lang: String,
    #[serde(default)]
    pub scheme: TextScheme,
}

/// Create one text with its revision log entry, returning the new id.
pub async fn create(pool: &SqlitePool, actor: &User, params: &TextParams) -> Result<i64> {
    if params.title.trim().is_empty() {
        return Err(Error::Validation("text title must not be empty".to_string()));
    }
    if params.lang.trim().is_empty() {
        return Err(Error::Validation("text language must not be empty".to_string()));
    }
    params.scheme.validate()?;
    if !authorize(actor, Action::EditContent) {
        return Err(Error::Authorization(format!(
            "user {} may not create texts",
            actor.name
        )));
    }

    let scheme_json = serde_json::to_string(&params.scheme)?;

    let mut tx = pool.begin().await?;

    let result = sqlx::query("INSERT INTO texts (title, lang, scheme, created) VALUES (?, ?, ?, ?)")
        .bind(&params.title)
        .bind(&params.lang)
        .bind(&scheme_json)
        .bind(now_ms())
        .execute(&mut *tx)
        .await?;
    let text_id = result.last_insert_rowid();

    let data1 = json!({
        "text_id": text_id,
        "title": params.title,
        "lang": params.lang,
        "scheme": params.scheme,
    });
    revlog::append(&mut tx, actor.id, "texts", text_id, &json!({}), &data1).await?;

    tx.commit().await?;

    Ok(text_id)
}

/// Load one text with its decoded scheme
pub async fn get(pool: &SqlitePool, id: i64) -> Result<Text> {
    let row = sqlx::query("SELECT id, title, lang, scheme, created FROM texts WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    match row {
        Some(row) => Text::from_row(&row),
        None => Err(Error::NotFound(format!("text {}", id))),
    }
}

/// List all texts, newest first
pub async fn list(pool: &SqlitePool) -> Result<Vec<Text>> {
    let rows = sqlx::query("SELECT id, title, lang, scheme, created FROM texts ORDER BY id DESC")
        .fetch_all(pool)
        .await?;
    rows.iter().map(Text::from_row).collect()
}
