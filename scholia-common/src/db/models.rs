//! Shared row models for the annotation schema
//!
//! Array-valued columns (`tags`, `issues`, `fmt`, `comments`) and document
//! columns (`entry`, `scheme`, `data0`, `data1`) are stored as JSON text.
//! The decode helpers here are the only place that encoding is interpreted;
//! store code works with the typed models.

use crate::access::Tier;
use crate::entry::{CommentSnapshot, Entry, TextScheme};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// Current wall time as Unix milliseconds, the form stored in row timestamps
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

// ========================================
// Accounts
// ========================================

/// Account row, as loaded for gate decisions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub tier: Tier,
    pub activated: bool,
}

impl User {
    pub fn from_row(row: &SqliteRow) -> Result<User> {
        let level: i64 = row.try_get("tier")?;
        let tier = Tier::try_from(level).map_err(Error::Internal)?;
        Ok(User {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            tier,
            activated: row.try_get("activated")?,
        })
    }
}

/// Load one user row by id, `None` when absent
pub async fn load_user(pool: &sqlx::SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query("SELECT id, name, tier, activated FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(User::from_row).transpose()
}

// ========================================
// Texts and comments
// ========================================

/// Text row with its decoded annotation scheme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub id: i64,
    pub title: String,
    pub lang: String,
    pub scheme: TextScheme,
    pub created: i64,
}

impl Text {
    pub fn from_row(row: &SqliteRow) -> Result<Text> {
        let scheme_json: String = row.try_get("scheme")?;
        Ok(Text {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            lang: row.try_get("lang")?,
            scheme: serde_json::from_str(&scheme_json)?,
            created: row.try_get("created")?,
        })
    }
}

/// Comment row with decoded array and document columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub text_id: i64,
    pub title: String,
    pub published: bool,
    pub priority: f64,
    pub tags: Vec<i64>,
    pub issues: Vec<Vec<i64>>,
    pub entry: Entry,
    pub created: i64,
    pub updated: i64,
}

impl Comment {
    pub fn from_row(row: &SqliteRow) -> Result<Comment> {
        let tags: String = row.try_get("tags")?;
        let issues: String = row.try_get("issues")?;
        let entry: String = row.try_get("entry")?;
        Ok(Comment {
            id: row.try_get("id")?,
            text_id: row.try_get("text_id")?,
            title: row.try_get("title")?,
            published: row.try_get("published")?,
            priority: row.try_get("priority")?,
            tags: serde_json::from_str(&tags)?,
            issues: serde_json::from_str(&issues)?,
            entry: serde_json::from_str(&entry)?,
            created: row.try_get("created")?,
            updated: row.try_get("updated")?,
        })
    }

    /// Current state in log-snapshot form
    pub fn snapshot(&self) -> CommentSnapshot {
        CommentSnapshot {
            text_id: self.text_id,
            title: self.title.clone(),
            priority: self.priority,
            published: self.published,
            tags: self.tags.clone(),
            issues: self.issues.clone(),
            entry: self.entry.clone(),
        }
    }
}

// ========================================
// Revision log
// ========================================

/// One revision log row with decoded before/after snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub created: i64,
    pub user_id: i64,
    pub table_name: String,
    pub record_id: i64,
    pub data0: Value,
    pub data1: Value,
}

impl LogEntry {
    pub fn from_row(row: &SqliteRow) -> Result<LogEntry> {
        let data0: String = row.try_get("data0")?;
        let data1: String = row.try_get("data1")?;
        Ok(LogEntry {
            id: row.try_get("id")?,
            created: row.try_get("created")?,
            user_id: row.try_get("user_id")?,
            table_name: row.try_get("table_name")?,
            record_id: row.try_get("record_id")?,
            data0: serde_json::from_str(&data0)?,
            data1: serde_json::from_str(&data1)?,
        })
    }

    /// True when this entry recorded the record's creation
    pub fn is_creation(&self) -> bool {
        self.data0
            .as_object()
            .map(|obj| obj.is_empty())
            .unwrap_or(false)
    }
}

// ========================================
// Vocabulary
// ========================================

/// Tag row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TagRow {
    pub id: i64,
    pub title: String,
}

/// Issue row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct IssueRow {
    pub id: i64,
    pub title: String,
    pub color: String,
}

// ========================================
// Corpus
// ========================================

/// Deduplicated vocabulary token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TokenRow {
    pub id: i64,
    pub token: String,
    pub lang: String,
    pub meta: Option<String>,
}

/// Token sense for one part of speech
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UnitRow {
    pub id: i64,
    pub token_id: i64,
    pub pos: String,
}

/// One positioned word occurrence inside a text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringRow {
    pub id: i64,
    pub text_id: i64,
    pub p: i64,
    pub s: i64,
    pub line: i64,
    pub form: String,
    pub repr: String,
    pub fmt: Vec<String>,
    pub token_id: Option<i64>,
    pub unit_id: Option<i64>,
    pub comments: Vec<i64>,
}

impl StringRow {
    pub fn from_row(row: &SqliteRow) -> Result<StringRow> {
        let fmt: String = row.try_get("fmt")?;
        let comments: String = row.try_get("comments")?;
        Ok(StringRow {
            id: row.try_get("id")?,
            text_id: row.try_get("text_id")?,
            p: row.try_get("p")?,
            s: row.try_get("s")?,
            line: row.try_get("line")?,
            form: row.try_get("form")?,
            repr: row.try_get("repr")?,
            fmt: serde_json::from_str(&fmt)?,
            token_id: row.try_get("token_id")?,
            unit_id: row.try_get("unit_id")?,
            comments: serde_json::from_str(&comments)?,
        })
    }
}
