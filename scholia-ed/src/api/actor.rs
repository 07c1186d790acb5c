//! Acting-user resolution
//!
//! Mutating endpoints identify the acting user through the `x-actor`
//! header, a numeric user id set by the authenticating front end. The
//! user row is loaded fresh on every request so tier and activation
//! changes apply immediately; the privilege gate itself runs in the
//! store layer.

use crate::error::ApiError;
use crate::store;
use crate::AppState;
use axum::http::HeaderMap;
use scholia_common::db::models::User;
use scholia_common::Error;

/// Header carrying the acting user's id
pub const ACTOR_HEADER: &str = "x-actor";

/// Resolve the acting user or fail with 401
pub async fn require_actor(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let raw = headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthenticated("missing x-actor header".to_string()))?;

    let user_id: i64 = raw
        .parse()
        .map_err(|_| ApiError::Unauthenticated(format!("malformed x-actor header: {}", raw)))?;

    match store::users::get(&state.db, user_id).await {
        Ok(user) => Ok(user),
        Err(Error::NotFound(_)) => {
            Err(ApiError::Unauthenticated(format!("unknown actor: {}", user_id)))
        }
        Err(e) => Err(ApiError::Domain(e)),
    }
}
