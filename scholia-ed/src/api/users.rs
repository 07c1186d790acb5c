//! User administration endpoints

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use crate::api::{actor, IdResponse};
use crate::error::ApiResult;
use crate::store::users::{self, NewUser};
use crate::AppState;
use scholia_common::access::Tier;
use scholia_common::Error;

/// PATCH body; absent fields stay unchanged
#[derive(Debug, Deserialize)]
pub struct UserPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tier: Option<Tier>,
    #[serde(default)]
    pub activated: Option<bool>,
}

/// Password reset body
#[derive(Debug, Deserialize)]
pub struct PasswordParams {
    pub password: String,
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(params): Json<NewUser>,
) -> ApiResult<Json<IdResponse>> {
    let actor = actor::require_actor(&state, &headers).await?;
    let id = users::create(&state.db, &actor, &params).await?;
    Ok(Json(IdResponse { id }))
}

/// PATCH /api/users/:id
///
/// Applies the provided fields one at a time; each change carries its
/// own gate check and revision log entry.
pub async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(patch): Json<UserPatch>,
) -> ApiResult<Json<IdResponse>> {
    if patch.name.is_none() && patch.tier.is_none() && patch.activated.is_none() {
        return Err(Error::Validation("no fields to update".to_string()).into());
    }
    let actor = actor::require_actor(&state, &headers).await?;

    if let Some(tier) = patch.tier {
        users::set_tier(&state.db, &actor, id, tier).await?;
    }
    if let Some(activated) = patch.activated {
        users::set_activated(&state.db, &actor, id, activated).await?;
    }
    if let Some(name) = &patch.name {
        users::rename(&state.db, &actor, id, name).await?;
    }

    Ok(Json(IdResponse { id }))
}

/// POST /api/users/:id/password
pub async fn reset_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(params): Json<PasswordParams>,
) -> ApiResult<Json<IdResponse>> {
    let actor = actor::require_actor(&state, &headers).await?;
    users::reset_password(&state.db, &actor, id, &params.password).await?;
    Ok(Json(IdResponse { id }))
}
