//! Text administration endpoints

use axum::{extract::State, http::HeaderMap, Json};

use crate::api::{actor, IdResponse, RowsResponse};
use crate::error::ApiResult;
use crate::store::texts::{self, TextParams};
use crate::AppState;
use scholia_common::db::models::Text;

/// GET /api/texts
///
/// All texts with their annotation schemes, newest first.
pub async fn list_texts(State(state): State<AppState>) -> ApiResult<Json<RowsResponse<Text>>> {
    let rows = texts::list(&state.db).await?;
    Ok(Json(RowsResponse::from_rows(rows)))
}

/// POST /api/texts
pub async fn create_text(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(params): Json<TextParams>,
) -> ApiResult<Json<IdResponse>> {
    let actor = actor::require_actor(&state, &headers).await?;
    let id = texts::create(&state.db, &actor, &params).await?;
    Ok(Json(IdResponse { id }))
}
