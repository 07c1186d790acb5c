//! Error types for scholia-ed
//!
//! Wraps the shared error taxonomy with HTTP status mapping so handlers
//! can end with `?` and still produce a structured JSON error body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request lacked a usable actor identity (401)
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Shared domain error, mapped per taxonomy
    #[error(transparent)]
    Domain(#[from] scholia_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use scholia_common::Error;

        let (status, error_code, message) = match &self {
            ApiError::Unauthenticated(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", msg.clone())
            }
            ApiError::Domain(err) => {
                let (status, code) = match err {
                    Error::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION"),
                    Error::Authorization(_) => (StatusCode::FORBIDDEN, "AUTHORIZATION"),
                    Error::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
                    Error::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
                };
                (status, code, err.to_string())
            }
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", message);
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use scholia_common::Error;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Unauthenticated("x".into()), StatusCode::UNAUTHORIZED),
            (Error::Validation("x".into()).into(), StatusCode::BAD_REQUEST),
            (Error::Authorization("x".into()).into(), StatusCode::FORBIDDEN),
            (Error::Conflict("x".into()).into(), StatusCode::CONFLICT),
            (Error::NotFound("x".into()).into(), StatusCode::NOT_FOUND),
            (
                Error::Internal("x".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
