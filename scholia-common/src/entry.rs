//! Comment entry documents and per-text field schemes
//!
//! Besides its fixed columns, a comment carries a structured `entry`
//! document whose fields are defined per text by a scheme. Field values
//! form a closed sum type so history diffing can pattern-match shapes
//! instead of probing raw JSON keys.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

// ========================================
// Scheme
// ========================================

/// Shape of one scheme field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Free text
    Text,
    /// Numeric value
    Number,
    /// Named flags, order preserved
    Flags,
    /// References to other record ids
    Refs,
}

/// One field definition inside a text's scheme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeField {
    /// Stable field identifier, unique within the text
    pub id: String,
    /// Display label
    pub label: String,
    /// Value shape
    pub kind: FieldKind,
}

/// Ordered field definitions for one text
///
/// The definition order here is the order scheme-field changes appear in
/// a rendered history diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TextScheme(pub Vec<SchemeField>);

impl TextScheme {
    /// Validate that field ids are non-empty and unique within the scheme
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for field in &self.0 {
            if field.id.trim().is_empty() {
                return Err(Error::Validation(
                    "scheme field id must not be empty".to_string(),
                ));
            }
            if !seen.insert(field.id.as_str()) {
                return Err(Error::Validation(format!(
                    "duplicate scheme field id: {}",
                    field.id
                )));
            }
        }
        Ok(())
    }

    pub fn fields(&self) -> &[SchemeField] {
        &self.0
    }
}

// ========================================
// Entry documents
// ========================================

/// One value inside a comment's entry document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldValue {
    /// Free text
    Text { value: String },
    /// Numeric value
    Number { value: f64 },
    /// Named flags, order preserved
    Flags { values: Vec<String> },
    /// References to other record ids
    Refs { ids: Vec<i64> },
}

/// Structured entry document keyed by scheme field id
pub type Entry = BTreeMap<String, FieldValue>;

// ========================================
// Log snapshots
// ========================================

/// Snapshot of one comment as written to the revision log
///
/// The `data0`/`data1` log columns hold exactly this shape, or `{}` for
/// the missing side of a creation or deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentSnapshot {
    pub text_id: i64,
    pub title: String,
    pub priority: f64,
    pub published: bool,
    pub tags: Vec<i64>,
    pub issues: Vec<Vec<i64>>,
    #[serde(default)]
    pub entry: Entry,
}

/// Decode one side of a logged snapshot pair.
///
/// Returns `None` when the value does not describe a comment, detected by
/// the absence of a `title` key. The empty `{}` side of a creation reads
/// that way, as does any degenerate partial object.
pub fn snapshot_from_value(value: &Value) -> Result<Option<CommentSnapshot>> {
    let has_title = value
        .as_object()
        .map(|obj| obj.contains_key("title"))
        .unwrap_or(false);
    if !has_title {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(value.clone())?))
}

/// Encode one side of a snapshot pair; the missing side is `{}`.
pub fn snapshot_to_value(snapshot: Option<&CommentSnapshot>) -> Result<Value> {
    match snapshot {
        Some(snap) => Ok(serde_json::to_value(snap)?),
        None => Ok(Value::Object(serde_json::Map::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_snapshot() -> CommentSnapshot {
        CommentSnapshot {
            text_id: 3,
            title: "First stanza".to_string(),
            priority: 2.5,
            published: false,
            tags: vec![1, 4],
            issues: vec![vec![2, 7], vec![5]],
            entry: Entry::from([(
                "gloss".to_string(),
                FieldValue::Text {
                    value: "marginal note".to_string(),
                },
            )]),
        }
    }

    #[test]
    fn test_scheme_rejects_duplicate_ids() {
        let scheme = TextScheme(vec![
            SchemeField {
                id: "gloss".to_string(),
                label: "Gloss".to_string(),
                kind: FieldKind::Text,
            },
            SchemeField {
                id: "gloss".to_string(),
                label: "Gloss again".to_string(),
                kind: FieldKind::Number,
            },
        ]);
        assert!(matches!(
            scheme.validate(),
            Err(Error::Validation(msg)) if msg.contains("gloss")
        ));
    }

    #[test]
    fn test_scheme_rejects_blank_id() {
        let scheme = TextScheme(vec![SchemeField {
            id: "  ".to_string(),
            label: "Blank".to_string(),
            kind: FieldKind::Text,
        }]);
        assert!(scheme.validate().is_err());
    }

    #[test]
    fn test_empty_scheme_is_valid() {
        assert!(TextScheme::default().validate().is_ok());
    }

    #[test]
    fn test_field_value_tagged_encoding() {
        let value = serde_json::to_value(FieldValue::Refs { ids: vec![9, 12] }).unwrap();
        assert_eq!(value, json!({"kind": "refs", "ids": [9, 12]}));

        let back: FieldValue =
            serde_json::from_value(json!({"kind": "number", "value": 1.5})).unwrap();
        assert_eq!(back, FieldValue::Number { value: 1.5 });
    }

    #[test]
    fn test_snapshot_round_trip() {
        let snap = sample_snapshot();
        let value = snapshot_to_value(Some(&snap)).unwrap();
        let back = snapshot_from_value(&value).unwrap();
        assert_eq!(back, Some(snap));
    }

    #[test]
    fn test_empty_object_reads_as_no_snapshot() {
        assert_eq!(snapshot_from_value(&json!({})).unwrap(), None);
    }

    #[test]
    fn test_titleless_object_reads_as_no_snapshot() {
        // Degenerate before-images without a title count as creations
        let value = json!({"text_id": 3, "priority": 1.0});
        assert_eq!(snapshot_from_value(&value).unwrap(), None);
    }

    #[test]
    fn test_missing_side_encodes_as_empty_object() {
        assert_eq!(snapshot_to_value(None).unwrap(), json!({}));
    }
}
