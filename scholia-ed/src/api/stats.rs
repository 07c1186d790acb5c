//! Per-text statistics endpoint

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::ApiResult;
use crate::store::stats::{self, StatsReport};
use crate::AppState;

/// GET /api/stats/:text_id
///
/// Completion counts, projected completion, per-user activity, the
/// comment-binding histogram and tag frequency for one text.
pub async fn text_stats(
    State(state): State<AppState>,
    Path(text_id): Path<i64>,
) -> ApiResult<Json<StatsReport>> {
    let report = stats::report(&state.db, text_id).await?;
    Ok(Json(report))
}
