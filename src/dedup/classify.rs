//! Duplicate classification by identifier and normalized-text keys.

use std::collections::HashMap;

use super::identity::{resolve_keys, RowKeys};
use crate::models::Table;

/// Kind of key a match was made on, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKey {
    Identifier,
    Text,
}

impl MatchKey {
    const PRIORITY: [MatchKey; 2] = [MatchKey::Identifier, MatchKey::Text];

    fn of(self, keys: &RowKeys) -> Option<&str> {
        match self {
            MatchKey::Identifier => keys.identifier.as_deref(),
            MatchKey::Text => keys.text.as_deref(),
        }
    }
}

/// Maps every seen key to the canonical row of its cluster.
///
/// Lookups try the identifier key first and fall back to the text key.
#[derive(Debug, Default)]
pub struct ClusterIndex {
    seen: HashMap<MatchKey, HashMap<String, usize>>,
}

impl ClusterIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical row an earlier row registered for any of these keys
    pub fn lookup(&self, keys: &RowKeys) -> Option<(usize, MatchKey)> {
        MatchKey::PRIORITY.into_iter().find_map(|kind| {
            let key = kind.of(keys)?;
            self.seen.get(&kind)?.get(key).map(|&row| (row, kind))
        })
    }

    /// Register the keys of a row. Keys already claimed keep their cluster.
    pub fn insert(&mut self, keys: &RowKeys, canonical: usize) {
        for kind in MatchKey::PRIORITY {
            if let Some(key) = kind.of(keys) {
                self.seen
                    .entry(kind)
                    .or_default()
                    .entry(key.to_string())
                    .or_insert(canonical);
            }
        }
    }
}

/// Result of classifying a table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// `true` for subsequent occurrences of an already-seen key
    pub duplicate: Vec<bool>,
    /// Row index of each row's canonical record (itself for canonical rows)
    pub canonical_of: Vec<usize>,
}

impl Classification {
    pub fn duplicate_count(&self) -> usize {
        self.duplicate.iter().filter(|d| **d).count()
    }

    /// `(duplicate row, canonical row)` pairs in row order
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.duplicate
            .iter()
            .enumerate()
            .filter(|(_, dup)| **dup)
            .map(|(row, _)| (row, self.canonical_of[row]))
    }

    /// Rows grouped by cluster, canonical row first, clusters in row order
    pub fn clusters(&self) -> Vec<Vec<usize>> {
        let mut position: HashMap<usize, usize> = HashMap::new();
        let mut clusters: Vec<Vec<usize>> = Vec::new();
        for (row, &canonical) in self.canonical_of.iter().enumerate() {
            let slot = *position.entry(canonical).or_insert_with(|| {
                clusters.push(Vec::new());
                clusters.len() - 1
            });
            clusters[slot].push(row);
        }
        clusters
    }
}

/// Classify rows in order.
///
/// A row is a duplicate if its identifier key or its text key was already
/// seen on an earlier row; the first row carrying a key is canonical. Keys of
/// duplicate rows are registered too, pointing at their cluster's canonical
/// row, so clusters chain through either key. Rows with no key at all are
/// always canonical.
pub fn classify(keys: &[RowKeys]) -> Classification {
    let mut index = ClusterIndex::new();
    let mut classification = Classification {
        duplicate: Vec::with_capacity(keys.len()),
        canonical_of: Vec::with_capacity(keys.len()),
    };

    for (row, row_keys) in keys.iter().enumerate() {
        let canonical = match index.lookup(row_keys) {
            Some((canonical, kind)) => {
                tracing::trace!("Row {} duplicates row {} by {:?}", row, canonical, kind);
                classification.duplicate.push(true);
                canonical
            }
            None => {
                classification.duplicate.push(false);
                row
            }
        };
        classification.canonical_of.push(canonical);
        index.insert(row_keys, canonical);
    }

    classification
}

/// Duplicate flag per row of a table
pub fn duplicated(table: &Table, pid: &str, text_fields: &[String]) -> Vec<bool> {
    classify(&resolve_keys(table, pid, text_fields)).duplicate
}
