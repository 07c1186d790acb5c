//! Tag and issue vocabulary endpoints
//!
//! Deletion refuses vocabulary still referenced from comment rows; the
//! store reports that as a conflict.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use crate::api::{actor, IdResponse};
use crate::error::ApiResult;
use crate::store::vocab;
use crate::AppState;

/// Parameters for tag creation
#[derive(Debug, Deserialize)]
pub struct TagParams {
    pub title: String,
}

/// Parameters for issue creation
#[derive(Debug, Deserialize)]
pub struct IssueParams {
    pub title: String,
    /// Display color as `#rrggbb`; the stored default applies when absent
    #[serde(default)]
    pub color: Option<String>,
}

/// POST /api/tags
pub async fn create_tag(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(params): Json<TagParams>,
) -> ApiResult<Json<IdResponse>> {
    let actor = actor::require_actor(&state, &headers).await?;
    let id = vocab::create_tag(&state.db, &actor, &params.title).await?;
    Ok(Json(IdResponse { id }))
}

/// DELETE /api/tags/:id
pub async fn delete_tag(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Json<IdResponse>> {
    let actor = actor::require_actor(&state, &headers).await?;
    vocab::delete_tag(&state.db, &actor, id).await?;
    Ok(Json(IdResponse { id }))
}

/// POST /api/issues
pub async fn create_issue(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(params): Json<IssueParams>,
) -> ApiResult<Json<IdResponse>> {
    let actor = actor::require_actor(&state, &headers).await?;
    let id = vocab::create_issue(&state.db, &actor, &params.title, params.color.as_deref()).await?;
    Ok(Json(IdResponse { id }))
}

/// DELETE /api/issues/:id
pub async fn delete_issue(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Json<IdResponse>> {
    let actor = actor::require_actor(&state, &headers).await?;
    vocab::delete_issue(&state.db, &actor, id).await?;
    Ok(Json(IdResponse { id }))
}
