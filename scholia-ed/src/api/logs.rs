//! Revision log endpoints
//!
//! The record-history endpoint renders each comment entry's snapshot
//! pair into change labels. Annotation schemes are resolved once per
//! text for the whole response, not once per entry.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::RowsResponse;
use crate::error::{ApiError, ApiResult};
use crate::pagination::clamp_page;
use crate::store::{revlog, texts};
use crate::AppState;
use scholia_common::db::models::LogEntry;
use scholia_common::diff::diff;
use scholia_common::entry::{snapshot_from_value, TextScheme};
use scholia_common::Error;

/// Query parameters for log listing
#[derive(Debug, Deserialize)]
pub struct LogListQuery {
    /// Restrict to entries whose either snapshot belongs to this text
    pub text_id: Option<i64>,
    /// Restrict to entries for this comment record
    pub comment_id: Option<i64>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/logs
///
/// Filtered page of revision log entries, newest first. `count` is the
/// unpaginated total for the same filter.
pub async fn list_logs(
    State(state): State<AppState>,
    Query(query): Query<LogListQuery>,
) -> ApiResult<Json<RowsResponse<LogEntry>>> {
    let filter = revlog::LogFilter {
        table: query.comment_id.map(|_| "comments"),
        record_id: query.comment_id,
        text_id: query.text_id,
    };
    let page = clamp_page(query.offset, query.limit);
    let result = revlog::list(&state.db, &filter, page.offset, page.limit).await?;
    Ok(Json(RowsResponse {
        rows: result.rows,
        count: result.total,
    }))
}

/// GET /api/logs/:id
pub async fn get_log(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<LogEntry>> {
    let entry = revlog::get(&state.db, id).await?;
    Ok(Json(entry))
}

/// Query parameters for record history
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// One history entry with its rendered change labels
#[derive(Debug, Serialize)]
pub struct HistoryRow {
    #[serde(flatten)]
    pub entry: LogEntry,
    pub created_record: bool,
    pub changes: Vec<String>,
}

/// GET /api/history/:table/:record_id
///
/// Change history of one record, newest first. Comment entries carry
/// rendered change labels; other tables report snapshots only.
pub async fn record_history(
    State(state): State<AppState>,
    Path((table, record_id)): Path<(String, i64)>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<RowsResponse<HistoryRow>>> {
    let entries = revlog::history(&state.db, &table, record_id, query.limit).await?;

    let mut schemes: HashMap<i64, TextScheme> = HashMap::new();
    let mut rows = Vec::with_capacity(entries.len());
    for entry in entries {
        let changes = if entry.table_name == "comments" {
            comment_changes(&state, &mut schemes, &entry).await?
        } else {
            Vec::new()
        };
        rows.push(HistoryRow {
            created_record: entry.is_creation(),
            changes,
            entry,
        });
    }

    Ok(Json(RowsResponse::from_rows(rows)))
}

/// Render one comment entry's snapshot pair into change labels
async fn comment_changes(
    state: &AppState,
    schemes: &mut HashMap<i64, TextScheme>,
    entry: &LogEntry,
) -> Result<Vec<String>, ApiError> {
    let before = snapshot_from_value(&entry.data0)?;
    let after = match snapshot_from_value(&entry.data1)? {
        Some(after) => after,
        None => return Ok(Vec::new()),
    };

    if !schemes.contains_key(&after.text_id) {
        let scheme = match texts::get(&state.db, after.text_id).await {
            Ok(text) => text.scheme,
            // A since-removed text still has history; render without fields
            Err(Error::NotFound(_)) => TextScheme::default(),
            Err(e) => return Err(e.into()),
        };
        schemes.insert(after.text_id, scheme);
    }
    let scheme = &schemes[&after.text_id];

    let changes = diff(before.as_ref(), &after, scheme);
    Ok(changes.iter().map(|c| c.label().to_string()).collect())
}
