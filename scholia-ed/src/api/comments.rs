//! Comment endpoints

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use crate::api::{actor, RowsResponse};
use crate::error::ApiResult;
use crate::store::comments::{self, BoundComment, CommentParams, CommentReceipt};
use crate::AppState;

/// Query parameters for comment listing
#[derive(Debug, Deserialize)]
pub struct CommentListQuery {
    pub text_id: i64,
}

/// GET /api/comments?text_id=
///
/// All comments of one text, highest priority first, each flagged with
/// whether any string of the text references it.
pub async fn list_comments(
    State(state): State<AppState>,
    Query(query): Query<CommentListQuery>,
) -> ApiResult<Json<RowsResponse<BoundComment>>> {
    let rows = comments::list_for_text(&state.db, query.text_id).await?;
    Ok(Json(RowsResponse::from_rows(rows)))
}

/// POST /api/comments
///
/// Create or update one comment. The row change and its revision log
/// entry commit atomically; the response carries both ids.
pub async fn upsert_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(params): Json<CommentParams>,
) -> ApiResult<Json<CommentReceipt>> {
    let actor = actor::require_actor(&state, &headers).await?;
    let receipt = comments::upsert(&state.db, &actor, &params).await?;
    Ok(Json(receipt))
}
