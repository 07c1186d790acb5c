//! Progress reporting over one text
//!
//! Everything here is read-only aggregation. The projection is a plain
//! linear extrapolation from the revision log: if `ready` of `total`
//! comments were published since work started, the remaining share is
//! assumed to take proportionally as long.

use scholia_common::db::models::now_ms;
use scholia_common::error::Result;
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Debug, Clone, Serialize)]
pub struct CompletionCounts {
    pub total: i64,
    /// Published comments
    pub ready: i64,
    /// Unpublished remainder
    pub draft: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserActivity {
    pub user_id: i64,
    pub name: Option<String>,
    pub entries: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct HistogramBucket {
    pub comment_count: i64,
    pub strings: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TagUse {
    pub tag_id: i64,
    pub title: Option<String>,
    pub uses: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub text_id: i64,
    pub completion: CompletionCounts,
    pub projected_completion: Option<DateTime<Utc>>,
    pub per_user: Vec<UserActivity>,
    pub histogram: Vec<HistogramBucket>,
    pub tag_frequency: Vec<TagUse>,
}

/// Assemble the full report for one text. Unknown texts are an error.
pub async fn report(pool: &SqlitePool, text_id: i64) -> Result<StatsReport> {
    crate::store::texts::get(pool, text_id).await?;

    let completion = completion_counts(pool, text_id).await?;
    let projected_completion = estimate_completion(pool, text_id, &completion).await?;
    let per_user = per_user_activity(pool, text_id).await?;
    let histogram = word_histogram(pool, text_id).await?;
    let tag_frequency = tag_frequency(pool, text_id).await?;

    Ok(StatsReport {
        text_id,
        completion,
        projected_completion,
        per_user,
        histogram,
        tag_frequency,
    })
}

async fn completion_counts(pool: &SqlitePool, text_id: i64) -> Result<CompletionCounts> {
    let (total, ready): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(published), 0) FROM comments WHERE text_id = ?",
    )
    .bind(text_id)
    .fetch_one(pool)
    .await?;

    Ok(CompletionCounts {
        total,
        ready,
        draft: total - ready,
    })
}

/// Extrapolate when the text will be fully published.
///
/// Returns None when nothing is published yet, when there are no
/// comments at all, or when the log holds no activity for the text.
async fn estimate_completion(
    pool: &SqlitePool,
    text_id: i64,
    completion: &CompletionCounts,
) -> Result<Option<DateTime<Utc>>> {
    if completion.total == 0 || completion.ready == 0 {
        return Ok(None);
    }

    let started: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT MIN(created) FROM logs
        WHERE table_name = 'comments'
          AND (json_extract(data0, '$.text_id') = ? OR json_extract(data1, '$.text_id') = ?)
        "#,
    )
    .bind(text_id)
    .bind(text_id)
    .fetch_one(pool)
    .await?;

    let started = match started {
        Some(ms) => ms,
        None => return Ok(None),
    };

    let elapsed = now_ms() - started;
    // Multiply before dividing so the integer ratio keeps its precision
    let projected = started + elapsed * completion.total / completion.ready;

    Ok(Utc.timestamp_millis_opt(projected).single())
}

async fn per_user_activity(pool: &SqlitePool, text_id: i64) -> Result<Vec<UserActivity>> {
    let rows = sqlx::query_as::<_, UserActivity>(
        r#"
        SELECT l.user_id, u.name, COUNT(*) AS entries
        FROM logs l
        LEFT JOIN users u ON u.id = l.user_id
        WHERE l.table_name = 'comments'
          AND (json_extract(l.data0, '$.text_id') = ? OR json_extract(l.data1, '$.text_id') = ?)
        GROUP BY l.user_id
        ORDER BY entries DESC, l.user_id ASC
        "#,
    )
    .bind(text_id)
    .bind(text_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// How many strings carry 0, 1, 2... comment references
async fn word_histogram(pool: &SqlitePool, text_id: i64) -> Result<Vec<HistogramBucket>> {
    let rows = sqlx::query_as::<_, HistogramBucket>(
        r#"
        SELECT json_array_length(comments) AS comment_count, COUNT(*) AS strings
        FROM strings
        WHERE text_id = ?
        GROUP BY json_array_length(comments)
        ORDER BY comment_count ASC
        "#,
    )
    .bind(text_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

async fn tag_frequency(pool: &SqlitePool, text_id: i64) -> Result<Vec<TagUse>> {
    let rows = sqlx::query_as::<_, TagUse>(
        r#"
        SELECT je.value AS tag_id, t.title, COUNT(*) AS uses
        FROM comments c, json_each(c.tags) AS je
        LEFT JOIN tags t ON t.id = je.value
        WHERE c.text_id = ?
        GROUP BY je.value
        ORDER BY uses DESC, tag_id ASC
        "#,
    )
    .bind(text_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
