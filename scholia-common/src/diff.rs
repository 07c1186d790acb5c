//! Snapshot differ for comment history review
//!
//! Compares two snapshots of the same comment and reports which fields
//! changed. The output order is fixed so rendered histories are stable:
//! title, priority, published, tags, issues, then scheme-defined entry
//! fields in scheme order.

use crate::entry::{CommentSnapshot, TextScheme};
use std::collections::BTreeSet;

/// One reported change between two comment snapshots
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Creation sentinel, the only change reported for a first revision
    Created,
    Title,
    Priority,
    Published,
    Tags,
    Issues,
    /// Scheme-defined entry field, identified by its field id
    Field(String),
}

impl Change {
    /// Stable label used by history rendering
    pub fn label(&self) -> &str {
        match self {
            Change::Created => "created",
            Change::Title => "title",
            Change::Priority => "priority",
            Change::Published => "published",
            Change::Tags => "tags",
            Change::Issues => "issues",
            Change::Field(id) => id,
        }
    }
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Diff two snapshots of one comment.
///
/// `before` is `None` for a creation, in which case the single
/// [`Change::Created`] sentinel is returned. For everything else the
/// result lists changed fields in the fixed rendering order; identical
/// snapshots produce an empty list.
///
/// Comparison rules:
/// - `title` compares after trimming surrounding whitespace
/// - `priority` and `published` compare for identity
/// - `tags` compares as a set (order and duplicates are display artifacts)
/// - `issues` compares deeply, order included (rows are positional)
/// - entry fields compare structurally, walked in scheme order; fields
///   absent from the scheme are ignored
pub fn diff(
    before: Option<&CommentSnapshot>,
    after: &CommentSnapshot,
    scheme: &TextScheme,
) -> Vec<Change> {
    let Some(before) = before else {
        return vec![Change::Created];
    };

    let mut changes = Vec::new();

    if before.title.trim() != after.title.trim() {
        changes.push(Change::Title);
    }
    if before.priority != after.priority {
        changes.push(Change::Priority);
    }
    if before.published != after.published {
        changes.push(Change::Published);
    }
    if !same_tag_set(&before.tags, &after.tags) {
        changes.push(Change::Tags);
    }
    if before.issues != after.issues {
        changes.push(Change::Issues);
    }
    for field in scheme.fields() {
        if before.entry.get(&field.id) != after.entry.get(&field.id) {
            changes.push(Change::Field(field.id.clone()));
        }
    }

    changes
}

fn same_tag_set(a: &[i64], b: &[i64]) -> bool {
    let a: BTreeSet<i64> = a.iter().copied().collect();
    let b: BTreeSet<i64> = b.iter().copied().collect();
    a == b
}
