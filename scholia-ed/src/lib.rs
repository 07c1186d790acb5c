//! scholia-ed library - Annotation editor backend
//!
//! HTTP service over the shared annotation database: comment editing with
//! paired revision logging, history review with rendered diffs, text and
//! vocabulary administration, user administration and per-text statistics.
//!
//! All mutating endpoints identify the acting user from the `x-actor`
//! header (set by the authenticating front end) and run the privilege
//! gate before touching the database. Read endpoints are open.

use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod pagination;
pub mod store;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Shared database pool
    pub db: SqlitePool,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{delete, get, patch, post};

    let api = Router::new()
        .route(
            "/api/texts",
            get(api::texts::list_texts).post(api::texts::create_text),
        )
        .route(
            "/api/comments",
            get(api::comments::list_comments).post(api::comments::upsert_comment),
        )
        .route("/api/logs", get(api::logs::list_logs))
        .route("/api/logs/:id", get(api::logs::get_log))
        .route("/api/history/:table/:record_id", get(api::logs::record_history))
        .route("/api/stats/:text_id", get(api::stats::text_stats))
        .route("/api/tags", post(api::vocab::create_tag))
        .route("/api/tags/:id", delete(api::vocab::delete_tag))
        .route("/api/issues", post(api::vocab::create_issue))
        .route("/api/issues/:id", delete(api::vocab::delete_issue))
        .route("/api/users", post(api::users::create_user))
        .route("/api/users/:id", patch(api::users::update_user))
        .route("/api/users/:id/password", post(api::users::reset_password));

    Router::new()
        .merge(api)
        .merge(api::health::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
