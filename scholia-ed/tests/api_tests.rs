//! Integration tests for scholia-ed API endpoints
//!
//! Black-box tests over the full router with an in-memory database.
//! The bootstrap administrator (id 1) acts in most tests; actor-less
//! and under-privileged requests check the failure surface.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot` method

use scholia_common::db::init::create_schema;
use scholia_ed::{build_router, AppState};

const ADMIN: i64 = 1;

/// Test helper: router plus the pool behind it, over a fresh schema
async fn setup_app() -> (Router, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Should open in-memory database");
    create_schema(&pool).await.expect("Should create schema");

    let state = AppState::new(pool.clone());
    (build_router(state), pool)
}

/// Test helper: bodyless request, optionally acting as a user
fn test_request(method: &str, uri: &str, actor: Option<i64>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder.header("x-actor", actor.to_string());
    }
    builder.body(Body::empty()).unwrap()
}

/// Test helper: JSON request, optionally acting as a user
fn json_request(method: &str, uri: &str, actor: Option<i64>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(actor) = actor {
        builder = builder.header("x-actor", actor.to_string());
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Test helper: send one request and parse the JSON body
async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = extract_json(response.into_body()).await;
    (status, body)
}

/// Test helper: create a text as admin, returning its id
async fn seed_text(app: &Router) -> i64 {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/texts",
            Some(ADMIN),
            &json!({"title": "Aeneid I", "lang": "la"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["id"].as_i64().unwrap()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send(&app, test_request("GET", "/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "scholia-ed");
    assert!(body["version"].is_string());
}

// =============================================================================
// Actor handling
// =============================================================================

#[tokio::test]
async fn test_mutation_without_actor_is_unauthenticated() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send(
        &app,
        json_request("POST", "/api/texts", None, &json!({"title": "T", "lang": "en"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn test_unknown_actor_is_unauthenticated() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/texts",
            Some(999),
            &json!({"title": "T", "lang": "en"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_reads_need_no_actor() {
    let (app, _pool) = setup_app().await;
    seed_text(&app).await;

    let (status, body) = send(&app, test_request("GET", "/api/texts", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
}

// =============================================================================
// Texts
// =============================================================================

#[tokio::test]
async fn test_create_and_list_texts() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/texts",
            Some(ADMIN),
            &json!({
                "title": "Metamorphoses",
                "lang": "la",
                "scheme": [{"id": "gloss", "label": "Gloss", "kind": "text"}]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let text_id = body["id"].as_i64().unwrap();

    let (status, body) = send(&app, test_request("GET", "/api/texts", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["rows"][0]["id"], text_id);
    assert_eq!(body["rows"][0]["title"], "Metamorphoses");
    assert_eq!(body["rows"][0]["scheme"][0]["id"], "gloss");
}

#[tokio::test]
async fn test_create_text_with_blank_title_fails() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/texts",
            Some(ADMIN),
            &json!({"title": "  ", "lang": "la"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION");
}

// =============================================================================
// Comments
// =============================================================================

#[tokio::test]
async fn test_comment_create_list_and_history() {
    let (app, _pool) = setup_app().await;
    let text_id = seed_text(&app).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/comments",
            Some(ADMIN),
            &json!({"text_id": text_id, "title": "Arma virumque", "priority": 2.5}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let comment_id = body["id"].as_i64().unwrap();
    assert!(body["log_id"].is_number());

    let (status, body) = send(
        &app,
        test_request("GET", &format!("/api/comments?text_id={}", text_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["rows"][0]["id"], comment_id);
    assert_eq!(body["rows"][0]["bound"], false);

    let (status, body) = send(
        &app,
        test_request("GET", &format!("/api/history/comments/{}", comment_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["rows"][0]["created_record"], true);
    assert_eq!(body["rows"][0]["changes"], json!(["created"]));
}

#[tokio::test]
async fn test_comment_update_renders_changed_fields() {
    let (app, _pool) = setup_app().await;
    let text_id = seed_text(&app).await;

    let (_, body) = send(
        &app,
        json_request(
            "POST",
            "/api/comments",
            Some(ADMIN),
            &json!({"text_id": text_id, "title": "Draft"}),
        ),
    )
    .await;
    let comment_id = body["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/comments",
            Some(ADMIN),
            &json!({
                "id": comment_id,
                "text_id": text_id,
                "title": "Final",
                "published": true
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        test_request("GET", &format!("/api/history/comments/{}", comment_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    // Newest first; the fixed rendering order puts title before published
    assert_eq!(body["rows"][0]["changes"], json!(["title", "published"]));
    assert_eq!(body["rows"][1]["changes"], json!(["created"]));
}

#[tokio::test]
async fn test_observer_cannot_post_comments() {
    let (app, _pool) = setup_app().await;
    let text_id = seed_text(&app).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/users",
            Some(ADMIN),
            &json!({"name": "watcher", "tier": 7}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let observer_id = body["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/comments",
            Some(observer_id),
            &json!({"text_id": text_id, "title": "Nope"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "AUTHORIZATION");
}

#[tokio::test]
async fn test_comment_for_unknown_text_fails_validation() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/comments",
            Some(ADMIN),
            &json!({"text_id": 55, "title": "Orphan"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION");
}

// =============================================================================
// Revision log
// =============================================================================

#[tokio::test]
async fn test_log_listing_pagination_and_total() {
    let (app, _pool) = setup_app().await;
    let text_id = seed_text(&app).await;

    for n in 0..3 {
        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/comments",
                Some(ADMIN),
                &json!({"text_id": text_id, "title": format!("c{}", n)}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &app,
        test_request(
            "GET",
            &format!("/api/logs?text_id={}&limit=2", text_id),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // Three comment entries plus the text creation entry match the filter
    assert_eq!(body["count"], 4);
    assert_eq!(body["rows"].as_array().unwrap().len(), 2);

    let first_created = body["rows"][0]["created"].as_i64().unwrap();
    let second_created = body["rows"][1]["created"].as_i64().unwrap();
    assert!(first_created >= second_created);
}

#[tokio::test]
async fn test_log_comment_filter_ignores_other_tables() {
    let (app, _pool) = setup_app().await;
    let text_id = seed_text(&app).await;

    let (_, body) = send(
        &app,
        json_request(
            "POST",
            "/api/comments",
            Some(ADMIN),
            &json!({"text_id": text_id, "title": "Only me"}),
        ),
    )
    .await;
    let comment_id = body["id"].as_i64().unwrap();
    // The text and the comment both occupy record id 1 in their tables
    assert_eq!(comment_id, text_id);

    let (status, body) = send(
        &app,
        test_request("GET", &format!("/api/logs?comment_id={}", comment_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["rows"][0]["table_name"], "comments");
    assert_eq!(body["rows"][0]["data1"]["title"], "Only me");
}

#[tokio::test]
async fn test_log_entry_fetch_and_missing() {
    let (app, _pool) = setup_app().await;
    let text_id = seed_text(&app).await;

    let (_, body) = send(
        &app,
        json_request(
            "POST",
            "/api/comments",
            Some(ADMIN),
            &json!({"text_id": text_id, "title": "Logged"}),
        ),
    )
    .await;
    let log_id = body["log_id"].as_i64().unwrap();

    let (status, body) = send(&app, test_request("GET", &format!("/api/logs/{}", log_id), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["table_name"], "comments");
    assert_eq!(body["data0"], json!({}));
    assert_eq!(body["data1"]["title"], "Logged");

    let (status, body) = send(&app, test_request("GET", "/api/logs/9999", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// =============================================================================
// Vocabulary
// =============================================================================

#[tokio::test]
async fn test_tag_lifecycle_and_conflicts() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send(
        &app,
        json_request("POST", "/api/tags", Some(ADMIN), &json!({"title": "syntax"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let tag_id = body["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        json_request("POST", "/api/tags", Some(ADMIN), &json!({"title": "syntax"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, body) = send(
        &app,
        test_request("DELETE", &format!("/api/tags/{}", tag_id), Some(ADMIN)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], tag_id);

    let (status, _) = send(
        &app,
        test_request("DELETE", &format!("/api/tags/{}", tag_id), Some(ADMIN)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_referenced_tag_delete_is_conflict() {
    let (app, _pool) = setup_app().await;
    let text_id = seed_text(&app).await;

    let (_, body) = send(
        &app,
        json_request("POST", "/api/tags", Some(ADMIN), &json!({"title": "meter"})),
    )
    .await;
    let tag_id = body["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/comments",
            Some(ADMIN),
            &json!({"text_id": text_id, "title": "Tagged", "tags": [tag_id]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        test_request("DELETE", &format!("/api/tags/{}", tag_id), Some(ADMIN)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_issue_roundtrip_with_color() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/issues",
            Some(ADMIN),
            &json!({"title": "crux", "color": "#cc0000"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let issue_id = body["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        test_request("DELETE", &format!("/api/issues/{}", issue_id), Some(ADMIN)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_user_admin_flow() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/users",
            Some(ADMIN),
            &json!({"name": "aemilia", "tier": 5, "password": "initial"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let user_id = body["id"].as_i64().unwrap();

    // Promote, then freeze
    let (status, _) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/api/users/{}", user_id),
            Some(ADMIN),
            &json!({"tier": 1}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/api/users/{}", user_id),
            Some(ADMIN),
            &json!({"activated": false}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // A frozen admin fails the gate on every mutation
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/tags",
            Some(user_id),
            &json!({"title": "blocked"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "AUTHORIZATION");
}

#[tokio::test]
async fn test_admin_cannot_deactivate_self() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/api/users/{}", ADMIN),
            Some(ADMIN),
            &json!({"activated": false}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "AUTHORIZATION");
}

#[tokio::test]
async fn test_empty_patch_is_validation_error() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send(
        &app,
        json_request("PATCH", &format!("/api/users/{}", ADMIN), Some(ADMIN), &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION");
}

#[tokio::test]
async fn test_password_reset_leaves_no_material_in_log() {
    let (app, _pool) = setup_app().await;

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/users/{}/password", ADMIN),
            Some(ADMIN),
            &json!({"password": "correct horse"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        test_request("GET", &format!("/api/history/users/{}", ADMIN), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows"][0]["data1"]["credentials_rotated"], true);
    assert!(!body.to_string().contains("correct horse"));
}

// =============================================================================
// Statistics
// =============================================================================

#[tokio::test]
async fn test_stats_report_shape() {
    let (app, _pool) = setup_app().await;
    let text_id = seed_text(&app).await;

    for (title, published) in [("one", false), ("two", true)] {
        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/comments",
                Some(ADMIN),
                &json!({"text_id": text_id, "title": title, "published": published}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &app,
        test_request("GET", &format!("/api/stats/{}", text_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text_id"], text_id);
    assert_eq!(body["completion"]["total"], 2);
    assert_eq!(body["completion"]["ready"], 1);
    assert_eq!(body["completion"]["draft"], 1);
    assert!(body["projected_completion"].is_string());
    assert_eq!(body["per_user"][0]["entries"], 2);
    assert!(body["histogram"].is_array());
    assert!(body["tag_frequency"].is_array());
}

#[tokio::test]
async fn test_stats_unknown_text_is_not_found() {
    let (app, _pool) = setup_app().await;

    let (status, body) = send(&app, test_request("GET", "/api/stats/404", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}
