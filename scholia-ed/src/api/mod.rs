//! HTTP handler modules
//!
//! Handlers stay thin: resolve the acting user where required, hand off
//! to the store layer, and shape the response. All list endpoints share
//! the `{rows, count}` envelope.

use serde::Serialize;

pub mod actor;
pub mod comments;
pub mod health;
pub mod logs;
pub mod stats;
pub mod texts;
pub mod users;
pub mod vocab;

/// Body returned by mutations: the affected row id
#[derive(Debug, Serialize)]
pub struct IdResponse {
    pub id: i64,
}

/// Envelope shared by list endpoints
#[derive(Debug, Serialize)]
pub struct RowsResponse<T: Serialize> {
    pub rows: Vec<T>,
    pub count: i64,
}

impl<T: Serialize> RowsResponse<T> {
    /// Wrap rows whose total is the row count itself (unpaginated lists)
    pub fn from_rows(rows: Vec<T>) -> Self {
        let count = rows.len() as i64;
        Self { rows, count }
    }
}
