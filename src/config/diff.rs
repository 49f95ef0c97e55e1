//! Structural diff of two configuration values.
//!
//! Both sides are flattened and every leaf present in `before` is compared
//! with the leaf at the same path in `after`. Paths missing from `after` are
//! not reported as removals.

use serde::Serialize;

use crate::config::field::{Scalar, Snapshot};
use crate::config::introspect::flatten;
use crate::error::ConfigError;

/// A leaf whose value changed between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffEntry {
    pub path: String,
    pub old: Scalar,
    pub new: Scalar,
}

/// Changed leaves keyed by path, in declaration order of the `before` value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChangeSet {
    entries: Vec<DiffEntry>,
}

impl ChangeSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&DiffEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.path.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DiffEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a DiffEntry;
    type IntoIter = std::slice::Iter<'a, DiffEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Diff two values of the same record type.
pub fn diff<T: Serialize + ?Sized>(before: &T, after: &T) -> Result<ChangeSet, ConfigError> {
    let before = flatten(before)?;
    let after = flatten(after)?;
    Ok(diff_snapshots(&before, &after))
}

/// Diff two already flattened snapshots.
pub fn diff_snapshots(before: &Snapshot, after: &Snapshot) -> ChangeSet {
    let before_index = before.index();
    let after_index = after.index();

    let mut entries = Vec::new();
    for field in before {
        // Duplicate paths are reported once, with the last value.
        if entries.iter().any(|e: &DiffEntry| e.path == field.path) {
            continue;
        }
        let (Some(old), Some(new)) = (
            before_index.get(field.path.as_str()),
            after_index.get(field.path.as_str()),
        ) else {
            continue;
        };
        if old != new {
            entries.push(DiffEntry {
                path: field.path.clone(),
                old: (*old).clone(),
                new: (*new).clone(),
            });
        }
    }

    ChangeSet { entries }
}
