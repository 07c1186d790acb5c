//! Tag and issue vocabulary administration
//!
//! Comment rows reference vocabulary by id inside their JSON columns, so
//! there is no storage-level foreign key. Deletions scan for references
//! at delete time inside the transaction and refuse with a conflict while
//! any comment still points at the row.

use crate::store::revlog;
use scholia_common::access::{authorize, Action};
use scholia_common::db::models::User;
use scholia_common::error::{Error, Result};
use serde_json::json;
use sqlx::{Row, SqlitePool};

/// Create one tag, returning the new id. Duplicate titles are conflicts.
pub async fn create_tag(pool: &SqlitePool, actor: &User, title: &str) -> Result<i64> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::Validation("tag title must not be empty".to_string()));
    }
    if !authorize(actor, Action::EditContent) {
        return Err(Error::Authorization(format!(
            "user {} may not edit vocabulary",
            actor.name
        )));
    }

    let mut tx = pool.begin().await?;

    let result = sqlx::query("INSERT INTO tags (title) VALUES (?)")
        .bind(title)
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::conflict_on_unique(e, &format!("tag title already exists: {}", title)))?;
    let tag_id = result.last_insert_rowid();

    revlog::append(
        &mut tx,
        actor.id,
        "tags",
        tag_id,
        &json!({}),
        &json!({ "title": title }),
    )
    .await?;

    tx.commit().await?;
    Ok(tag_id)
}

/// Delete one tag unless a comment still references it.
pub async fn delete_tag(pool: &SqlitePool, actor: &User, tag_id: i64) -> Result<()> {
    if !authorize(actor, Action::EditContent) {
        return Err(Error::Authorization(format!(
            "user {} may not edit vocabulary",
            actor.name
        )));
    }

    let mut tx = pool.begin().await?;

    let row = sqlx::query("SELECT title FROM tags WHERE id = ?")
        .bind(tag_id)
        .fetch_optional(&mut *tx)
        .await?;
    let Some(row) = row else {
        return Err(Error::NotFound(format!("tag {}", tag_id)));
    };
    let title: String = row.try_get("title")?;

    let referenced: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM comments c, json_each(c.tags) AS je WHERE je.value = ?)",
    )
    .bind(tag_id)
    .fetch_one(&mut *tx)
    .await?;
    if referenced {
        return Err(Error::Conflict(format!(
            "tag {} is still referenced by comments",
            tag_id
        )));
    }

    sqlx::query("DELETE FROM tags WHERE id = ?")
        .bind(tag_id)
        .execute(&mut *tx)
        .await?;

    revlog::append(
        &mut tx,
        actor.id,
        "tags",
        tag_id,
        &json!({ "title": title }),
        &json!({}),
    )
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Create one issue, returning the new id. Duplicate titles are conflicts.
pub async fn create_issue(
    pool: &SqlitePool,
    actor: &User,
    title: &str,
    color: Option<&str>,
) -> Result<i64> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::Validation("issue title must not be empty".to_string()));
    }
    if !authorize(actor, Action::EditContent) {
        return Err(Error::Authorization(format!(
            "user {} may not edit vocabulary",
            actor.name
        )));
    }

    let mut tx = pool.begin().await?;

    let result = match color {
        Some(color) => {
            sqlx::query("INSERT INTO issues (title, color) VALUES (?, ?)")
                .bind(title)
                .bind(color)
                .execute(&mut *tx)
                .await
        }
        None => {
            sqlx::query("INSERT INTO issues (title) VALUES (?)")
                .bind(title)
                .execute(&mut *tx)
                .await
        }
    }
    .map_err(|e| Error::conflict_on_unique(e, &format!("issue title already exists: {}", title)))?;
    let issue_id = result.last_insert_rowid();

    revlog::append(
        &mut tx,
        actor.id,
        "issues",
        issue_id,
        &json!({}),
        &json!({ "title": title, "color": color }),
    )
    .await?;

    tx.commit().await?;
    Ok(issue_id)
}

/// Delete one issue unless a comment still references it.
///
/// Issue references sit in nested position lists, so the scan walks the
/// whole JSON tree rather than only the first level.
pub async fn delete_issue(pool: &SqlitePool, actor: &User, issue_id: i64) -> Result<()> {
    if !authorize(actor, Action::EditContent) {
        return Err(Error::Authorization(format!(
            "user {} may not edit vocabulary",
            actor.name
        )));
    }

    let mut tx = pool.begin().await?;

    let row = sqlx::query("SELECT title, color FROM issues WHERE id = ?")
        .bind(issue_id)
        .fetch_optional(&mut *tx)
        .await?;
    let Some(row) = row else {
        return Err(Error::NotFound(format!("issue {}", issue_id)));
    };
    let title: String = row.try_get("title")?;
    let color: String = row.try_get("color")?;

    let referenced: bool = sqlx::query_scalar(
        "SELECT EXISTS(\
            SELECT 1 FROM comments c, json_tree(c.issues) AS jt \
            WHERE jt.type = 'integer' AND jt.value = ?\
         )",
    )
    .bind(issue_id)
    .fetch_one(&mut *tx)
    .await?;
    if referenced {
        return Err(Error::Conflict(format!(
            "issue {} is still referenced by comments",
            issue_id
        )));
    }

    sqlx::query("DELETE FROM issues WHERE id = ?")
        .bind(issue_id)
        .execute(&mut *tx)
        .await?;

    revlog::append(
        &mut tx,
        actor.id,
        "issues",
        issue_id,
        &json!({ "title": title, "color": color }),
        &json!({}),
    )
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Register one sense of an existing token for a part of speech.
///
/// Used when POS metadata is curated after ingestion; the token itself
/// must already exist.
pub async fn create_unit(pool: &SqlitePool, actor: &User, token_id: i64, pos: &str) -> Result<i64> {
    let pos = pos.trim();
    if pos.is_empty() {
        return Err(Error::Validation(
            "unit part of speech must not be empty".to_string(),
        ));
    }
    if !authorize(actor, Action::EditContent) {
        return Err(Error::Authorization(format!(
            "user {} may not edit vocabulary",
            actor.name
        )));
    }
    let token_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tokens WHERE id = ?)")
        .bind(token_id)
        .fetch_one(pool)
        .await?;
    if !token_exists {
        return Err(Error::Validation(format!("unknown token: {}", token_id)));
    }

    let mut tx = pool.begin().await?;

    let result = sqlx::query("INSERT INTO units (token_id, pos) VALUES (?, ?)")
        .bind(token_id)
        .bind(pos)
        .execute(&mut *tx)
        .await?;
    let unit_id = result.last_insert_rowid();

    revlog::append(
        &mut tx,
        actor.id,
        "units",
        unit_id,
        &json!({}),
        &json!({ "token_id": token_id, "pos": pos }),
    )
    .await?;

    tx.commit().await?;
    Ok(unit_id)
}
