//! Log page aggregation
//!
//! Pages arrive newest-first: page 1 is the most recent slice, later pages
//! walk backward in time. The stored buffer keeps arrival order (older pages
//! prepended); display order is derived in [`flatten`].

use std::collections::HashSet;

use serde::Serialize;

use crate::models::log_entry::{LogEntry, LogPage};

/// What the viewport should do after a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollIntent {
    /// Jump to the newest entry
    StickToNewest,
    /// Keep the row the user was looking at in place
    PreserveAnchor,
    /// Nothing was applied
    Unchanged,
}

/// Result of merging one page
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    pub entries: Vec<LogEntry>,
    pub added: usize,
    pub scroll: ScrollIntent,
}

/// Merge `page` into `existing`.
///
/// An empty page leaves the buffer as it was.
pub fn merge(existing: &[LogEntry], page: &LogPage) -> Merged {
    if page.entries.is_empty() {
        return Merged {
            entries: existing.to_vec(),
            added: 0,
            scroll: ScrollIntent::Unchanged,
        };
    }

    if page.is_fresh() {
        let entries = unique_by_id(&page.entries, &HashSet::new());
        return Merged {
            added: entries.len(),
            entries,
            scroll: ScrollIntent::StickToNewest,
        };
    }

    let known: HashSet<&str> = existing.iter().map(|e| e.id.as_str()).collect();
    let older = unique_by_id(&page.entries, &known);
    if older.is_empty() {
        return Merged {
            entries: existing.to_vec(),
            added: 0,
            scroll: ScrollIntent::Unchanged,
        };
    }

    let added = older.len();
    let mut entries = older;
    entries.extend_from_slice(existing);
    Merged {
        entries,
        added,
        scroll: ScrollIntent::PreserveAnchor,
    }
}

fn unique_by_id(entries: &[LogEntry], known: &HashSet<&str>) -> Vec<LogEntry> {
    let mut seen: HashSet<&str> = HashSet::new();
    entries
        .iter()
        .filter(|e| !known.contains(e.id.as_str()) && seen.insert(e.id.as_str()))
        .cloned()
        .collect()
}

/// Entries in display order: ascending `created_at`, ties broken by id
pub fn display_order(entries: &[LogEntry]) -> Vec<&LogEntry> {
    let mut ordered: Vec<&LogEntry> = entries.iter().collect();
    ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    ordered
}

/// One rendered row of the flattened log text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatLine {
    pub entry_id: String,
    pub text: String,
}

/// Flatten entries into rendered rows. Multi-line payloads span several
/// rows; every entry yields at least one.
pub fn flatten(entries: &[LogEntry]) -> Vec<FlatLine> {
    let mut lines = Vec::with_capacity(entries.len());
    for entry in display_order(entries) {
        let mut rendered = entry.payload_text();
        if rendered.is_empty() {
            rendered = entry.message.clone().unwrap_or_default();
        }

        let before = lines.len();
        lines.extend(rendered.lines().map(|text| FlatLine {
            entry_id: entry.id.clone(),
            text: text.to_string(),
        }));
        if lines.len() == before {
            lines.push(FlatLine {
                entry_id: entry.id.clone(),
                text: String::new(),
            });
        }
    }
    lines
}

/// Versioned log buffer owned by a single log view
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    entries: Vec<LogEntry>,
    version: u64,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Bumped on every change; used as a memoization key downstream
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge a page in place
    pub fn merge(&mut self, page: &LogPage) -> ScrollIntent {
        let merged = merge(&self.entries, page);
        if merged.scroll != ScrollIntent::Unchanged {
            self.entries = merged.entries;
            self.version += 1;
        }
        merged.scroll
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.version += 1;
        }
    }
}
