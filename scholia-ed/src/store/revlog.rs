//! Revision log: append-only audit entries with before/after snapshots
//!
//! Every mutation in the system appends exactly one entry inside the
//! writing operation's transaction, so a visible row change and its audit
//! trail commit or roll back together. Entries are never updated or
//! deleted afterwards.

use scholia_common::db::models::{now_ms, LogEntry};
use scholia_common::error::{Error, Result};
use serde_json::Value;
use sqlx::{Sqlite, SqlitePool, Transaction};

/// Optional filters for listing log entries
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFilter {
    /// Writer table the record filter is scoped to. Record ids repeat
    /// across writer tables, so an exact record match needs both fields.
    pub table: Option<&'static str>,
    /// Exact record id within `table`
    pub record_id: Option<i64>,
    /// Text the logged snapshots belong to (matched in either snapshot)
    pub text_id: Option<i64>,
}

/// One page of log entries plus the unpaginated total for the filter
#[derive(Debug)]
pub struct LogPage {
    pub rows: Vec<LogEntry>,
    pub total: i64,
}

/// Append one log entry inside the caller's transaction.
///
/// Returns the new entry id. The caller owns commit and rollback; an
/// entry only becomes visible together with the row change it records.
/// The missing side of a creation or deletion is the empty object.
pub async fn append(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: i64,
    table_name: &str,
    record_id: i64,
    data0: &Value,
    data1: &Value,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO logs (created, user_id, table_name, record_id, data0, data1)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(now_ms())
    .bind(user_id)
    .bind(table_name)
    .bind(record_id)
    .bind(serde_json::to_string(data0)?)
    .bind(serde_json::to_string(data1)?)
    .execute(&mut **tx)
    .await?;

    Ok(result.last_insert_rowid())
}

/// One positional argument for an assembled clause
enum BindArg {
    Int(i64),
    Text(&'static str),
}

/// WHERE clause assembled from composable predicates.
///
/// The text filter matches entries whose before or after snapshot names
/// the text; creations are `{}` on the before side and deletions `{}` on
/// the after side, so either snapshot alone is not enough.
struct LogPredicates {
    clauses: Vec<&'static str>,
    binds: Vec<BindArg>,
}

impl LogPredicates {
    fn from_filter(filter: &LogFilter) -> Self {
        let mut clauses = Vec::new();
        let mut binds = Vec::new();

        if let Some(table) = filter.table {
            clauses.push("table_name = ?");
            binds.push(BindArg::Text(table));
        }
        if let Some(record_id) = filter.record_id {
            clauses.push("record_id = ?");
            binds.push(BindArg::Int(record_id));
        }
        if let Some(text_id) = filter.text_id {
            clauses.push(
                "(json_extract(data0, '$.text_id') = ? OR json_extract(data1, '$.text_id') = ?)",
            );
            binds.push(BindArg::Int(text_id));
            binds.push(BindArg::Int(text_id));
        }

        LogPredicates { clauses, binds }
    }

    fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }
}

/// List entries newest first (`created DESC, id DESC`) with the
/// unpaginated total for the same filter.
pub async fn list(
    pool: &SqlitePool,
    filter: &LogFilter,
    offset: i64,
    limit: i64,
) -> Result<LogPage> {
    let predicates = LogPredicates::from_filter(filter);
    let where_sql = predicates.where_sql();

    let count_sql = format!("SELECT COUNT(*) FROM logs{}", where_sql);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for bind in &predicates.binds {
        count_query = match bind {
            BindArg::Int(value) => count_query.bind(*value),
            BindArg::Text(value) => count_query.bind(*value),
        };
    }
    let total = count_query.fetch_one(pool).await?;

    let rows_sql = format!(
        "SELECT id, created, user_id, table_name, record_id, data0, data1 \
         FROM logs{} ORDER BY created DESC, id DESC LIMIT ? OFFSET ?",
        where_sql
    );
    let mut rows_query = sqlx::query(&rows_sql);
    for bind in &predicates.binds {
        rows_query = match bind {
            BindArg::Int(value) => rows_query.bind(*value),
            BindArg::Text(value) => rows_query.bind(*value),
        };
    }
    let rows = rows_query
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let rows = rows
        .iter()
        .map(LogEntry::from_row)
        .collect::<Result<Vec<_>>>()?;

    Ok(LogPage { rows, total })
}

/// Load one entry by id
pub async fn get(pool: &SqlitePool, id: i64) -> Result<LogEntry> {
    let row = sqlx::query(
        "SELECT id, created, user_id, table_name, record_id, data0, data1 FROM logs WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => LogEntry::from_row(&row),
        None => Err(Error::NotFound(format!("log entry {}", id))),
    }
}

/// Change history of one record, newest first, optionally capped.
pub async fn history(
    pool: &SqlitePool,
    table_name: &str,
    record_id: i64,
    limit: Option<i64>,
) -> Result<Vec<LogEntry>> {
    let mut sql = String::from(
        "SELECT id, created, user_id, table_name, record_id, data0, data1 \
         FROM logs WHERE table_name = ? AND record_id = ? ORDER BY created DESC, id DESC",
    );
    if limit.is_some() {
        sql.push_str(" LIMIT ?");
    }

    let mut query = sqlx::query(&sql).bind(table_name).bind(record_id);
    if let Some(limit) = limit {
        query = query.bind(limit);
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(LogEntry::from_row).collect()
}
