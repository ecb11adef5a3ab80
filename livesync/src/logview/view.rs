//! Log view state: buffer, search and derived presentation

use serde::Serialize;

use crate::logview::aggregator::{display_order, flatten, FlatLine, LogBuffer, ScrollIntent};
use crate::logview::format::{format, FormattedLog};
use crate::logview::search::{SearchMatch, SearchState};
use crate::models::log_entry::LogPage;

/// Everything one log viewer needs, with derivations memoized per buffer
/// version
#[derive(Debug, Clone)]
pub struct LogView {
    buffer: LogBuffer,
    search: SearchState,
    auto_scroll: bool,
    lines: Option<(u64, Vec<FlatLine>)>,
    formatted: Option<(u64, Vec<FormattedLog>)>,
}

/// Serializable summary of the search cursor
#[derive(Debug, Clone, Serialize)]
pub struct SearchSummary {
    pub query: String,
    pub status: String,
    pub current: Option<SearchMatch>,
    pub matches: Vec<SearchMatch>,
}

impl Default for LogView {
    fn default() -> Self {
        Self::new(true)
    }
}

impl LogView {
    pub fn new(auto_scroll: bool) -> Self {
        Self {
            buffer: LogBuffer::new(),
            search: SearchState::new(),
            auto_scroll,
            lines: None,
            formatted: None,
        }
    }

    pub fn buffer(&self) -> &LogBuffer {
        &self.buffer
    }

    pub fn auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    pub fn set_auto_scroll(&mut self, enabled: bool) {
        self.auto_scroll = enabled;
    }

    /// Fold a fetched page into the buffer. A fresh page resets the search
    /// cursor; an older page keeps it on the same occurrence.
    pub fn merge_page(&mut self, page: &LogPage) -> ScrollIntent {
        self.reindex();
        let intent = self.buffer.merge(page);
        match intent {
            ScrollIntent::StickToNewest if self.search.is_active() => {
                let query = self.search.query().to_string();
                self.search.clear();
                self.search.set_query(&query);
            }
            ScrollIntent::PreserveAnchor => self.reindex(),
            _ => {}
        }
        intent
    }

    /// Drop all entries and search state
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.search.clear();
    }

    /// Flattened rows in display order
    pub fn lines(&mut self) -> &[FlatLine] {
        let version = self.buffer.version();
        if !matches!(&self.lines, Some((v, _)) if *v == version) {
            self.lines = Some((version, flatten(self.buffer.entries())));
        }
        self.lines.as_ref().map(|(_, lines)| lines.as_slice()).unwrap_or(&[])
    }

    /// Presentation records in display order
    pub fn formatted(&mut self) -> &[FormattedLog] {
        let version = self.buffer.version();
        if !matches!(&self.formatted, Some((v, _)) if *v == version) {
            let records = display_order(self.buffer.entries())
                .into_iter()
                .map(format)
                .collect();
            self.formatted = Some((version, records));
        }
        self.formatted
            .as_ref()
            .map(|(_, records)| records.as_slice())
            .unwrap_or(&[])
    }

    pub fn query(&self) -> &str {
        self.search.query()
    }

    /// Set the search query and index the current buffer
    pub fn set_query(&mut self, query: &str) -> &[SearchMatch] {
        if query.is_empty() {
            self.clear_query();
            return &[];
        }
        self.search.set_query(query);
        self.reindex();
        self.search.matches()
    }

    /// Clear the search. With auto-scroll enabled the viewport goes back to
    /// the newest entry.
    pub fn clear_query(&mut self) -> ScrollIntent {
        self.search.clear();
        if self.auto_scroll {
            ScrollIntent::StickToNewest
        } else {
            ScrollIntent::Unchanged
        }
    }

    /// Current matches, recomputed if the buffer moved since last time
    pub fn matches(&mut self) -> &[SearchMatch] {
        self.reindex();
        self.search.matches()
    }

    pub fn next_match(&mut self) -> Option<SearchMatch> {
        self.reindex();
        self.search.next_match().cloned()
    }

    pub fn prev_match(&mut self) -> Option<SearchMatch> {
        self.reindex();
        self.search.prev_match().cloned()
    }

    /// "i of n" for the active query
    pub fn search_status(&mut self) -> String {
        self.reindex();
        self.search.status()
    }

    pub fn search_summary(&mut self) -> SearchSummary {
        self.reindex();
        SearchSummary {
            query: self.search.query().to_string(),
            status: self.search.status(),
            current: self.search.current_match().cloned(),
            matches: self.search.matches().to_vec(),
        }
    }

    /// Recompute matches for the current buffer. The cursor stays on the
    /// same occurrence when it is still present.
    fn reindex(&mut self) {
        if !self.search.is_active() {
            return;
        }

        let anchor = match (&self.lines, self.search.current_match()) {
            (Some((lines_version, lines)), Some(current))
                if self.search.indexed_version() == Some(*lines_version) =>
            {
                MatchAnchor::locate(lines, current)
            }
            _ => None,
        };

        let version = self.buffer.version();
        self.lines();
        if let Some((_, lines)) = &self.lines {
            if !self.search.refresh(version, lines.as_slice()) {
                return;
            }
            if let Some(anchor) = anchor {
                let position = self
                    .search
                    .matches()
                    .iter()
                    .position(|m| anchor.is_at(lines, m));
                self.search.set_current(position.unwrap_or(0));
            }
        }
    }
}

/// Position of a match that survives re-flattening: the entry, the row
/// within that entry and the column
#[derive(Debug, PartialEq, Eq)]
struct MatchAnchor {
    entry_id: String,
    entry_row: usize,
    start_column: usize,
}

impl MatchAnchor {
    fn locate(lines: &[FlatLine], m: &SearchMatch) -> Option<Self> {
        let line = lines.get(m.row)?;
        let entry_row = lines[..m.row]
            .iter()
            .rev()
            .take_while(|l| l.entry_id == line.entry_id)
            .count();
        Some(Self {
            entry_id: line.entry_id.clone(),
            entry_row,
            start_column: m.start_column,
        })
    }

    fn is_at(&self, lines: &[FlatLine], m: &SearchMatch) -> bool {
        m.start_column == self.start_column
            && lines.get(m.row).is_some_and(|l| l.entry_id == self.entry_id)
            && Self::locate(lines, m).as_ref() == Some(self)
    }
}
