//! Comment store: the only writer of comment rows
//!
//! An upsert validates and authorizes before any transaction opens, then
//! writes the row change and its log entry in one transaction. No code
//! path commits one without the other.

use crate::store::revlog;
use scholia_common::access::{authorize, Action};
use scholia_common::db::models::{now_ms, Comment, User};
use scholia_common::entry::{snapshot_to_value, CommentSnapshot, Entry};
use scholia_common::error::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use tracing::debug;

const COMMENT_COLUMNS: &str =
    "id, text_id, title, published, priority, tags, issues, entry, created, updated";

/// Parameters of one comment upsert
#[derive(Debug, Clone, Deserialize)]
pub struct CommentParams {
    /// Existing comment id for an update; absent for a creation
    #[serde(default)]
    pub id: Option<i64>,
    pub text_id: i64,
    pub title: String,
    #[serde(default)]
    pub priority: f64,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub tags: Vec<i64>,
    #[serde(default)]
    pub issues: Vec<Vec<i64>>,
    #[serde(default)]
    pub entry: Entry,
}

impl CommentParams {
    fn snapshot(&self) -> CommentSnapshot {
        CommentSnapshot {
            text_id: self.text_id,
            title: self.title.clone(),
            priority: self.priority,
            published: self.published,
            tags: self.tags.clone(),
            issues: self.issues.clone(),
            entry: self.entry.clone(),
        }
    }
}

/// Receipt of a committed upsert: the comment row and its log entry
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CommentReceipt {
    pub id: i64,
    pub log_id: i64,
}

/// One listed comment with its corpus binding flag
#[derive(Debug, Serialize)]
pub struct BoundComment {
    #[serde(flatten)]
    pub comment: Comment,
    /// True while any string row of the text references this comment
    pub bound: bool,
}

/// Create or update one comment together with its revision log entry.
pub async fn upsert(
    pool: &SqlitePool,
    actor: &User,
    params: &CommentParams,
) -> Result<CommentReceipt> {
    if params.title.trim().is_empty() {
        return Err(Error::Validation(
            "comment title must not be empty".to_string(),
        ));
    }
    if !authorize(actor, Action::EditContent) {
        return Err(Error::Authorization(format!(
            "user {} may not edit comments",
            actor.name
        )));
    }
    let text_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM texts WHERE id = ?)")
        .bind(params.text_id)
        .fetch_one(pool)
        .await?;
    if !text_exists {
        return Err(Error::Validation(format!(
            "unknown text: {}",
            params.text_id
        )));
    }

    let mut tx = pool.begin().await?;

    // Before-snapshot for updates; an unknown id fails before any write
    let before: Option<CommentSnapshot> = match params.id {
        Some(id) => {
            let sql = format!("SELECT {} FROM comments WHERE id = ?", COMMENT_COLUMNS);
            let row = sqlx::query(&sql).bind(id).fetch_optional(&mut *tx).await?;
            match row {
                Some(row) => Some(Comment::from_row(&row)?.snapshot()),
                None => return Err(Error::NotFound(format!("comment {}", id))),
            }
        }
        None => None,
    };

    let now = now_ms();
    let tags = serde_json::to_string(&params.tags)?;
    let issues = serde_json::to_string(&params.issues)?;
    let entry = serde_json::to_string(&params.entry)?;

    let comment_id = match params.id {
        Some(id) => {
            sqlx::query(
                r#"
                UPDATE comments
                SET text_id = ?, title = ?, published = ?, priority = ?,
                    tags = ?, issues = ?, entry = ?, updated = ?
                WHERE id = ?
                "#,
            )
            .bind(params.text_id)
            .bind(&params.title)
            .bind(params.published)
            .bind(params.priority)
            .bind(&tags)
            .bind(&issues)
            .bind(&entry)
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;
            id
        }
        None => {
            let result = sqlx::query(
                r#"
                INSERT INTO comments
                    (text_id, title, published, priority, tags, issues, entry, created, updated)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(params.text_id)
            .bind(&params.title)
            .bind(params.published)
            .bind(params.priority)
            .bind(&tags)
            .bind(&issues)
            .bind(&entry)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            result.last_insert_rowid()
        }
    };

    let data0 = snapshot_to_value(before.as_ref())?;
    let data1 = snapshot_to_value(Some(&params.snapshot()))?;
    let log_id = revlog::append(&mut tx, actor.id, "comments", comment_id, &data0, &data1).await?;

    tx.commit().await?;

    debug!(comment_id, log_id, "Comment upsert committed");

    Ok(CommentReceipt {
        id: comment_id,
        log_id,
    })
}

/// Load one comment by id
pub async fn get(pool: &SqlitePool, id: i64) -> Result<Comment> {
    let sql = format!("SELECT {} FROM comments WHERE id = ?", COMMENT_COLUMNS);
    let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;
    match row {
        Some(row) => Comment::from_row(&row),
        None => Err(Error::NotFound(format!("comment {}", id))),
    }
}

/// List a text's comments, highest priority first, each annotated with
/// whether any string row of the text currently references it.
pub async fn list_for_text(pool: &SqlitePool, text_id: i64) -> Result<Vec<BoundComment>> {
    let rows = sqlx::query(
        r#"
        SELECT c.id, c.text_id, c.title, c.published, c.priority,
               c.tags, c.issues, c.entry, c.created, c.updated,
               EXISTS(
                   SELECT 1 FROM strings s, json_each(s.comments) AS b
                   WHERE s.text_id = c.text_id AND b.value = c.id
               ) AS bound
        FROM comments c
        WHERE c.text_id = ?
        ORDER BY c.priority DESC, c.id DESC
        "#,
    )
    .bind(text_id)
    .fetch_all(pool)
    .await?;
    rows.iter()
        .map(|row| {
            Ok(BoundComment {
                comment: Comment::from_row(row)?,
                bound: row.try_get("bound")?,
            })
        })
        .collect()
}
