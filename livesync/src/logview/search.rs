//! Search over flattened log text

use regex::RegexBuilder;
use serde::Serialize;

use crate::logview::aggregator::FlatLine;

impl AsRef<str> for FlatLine {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// One occurrence of the query. Columns are byte offsets into the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    pub row: usize,
    pub start_column: usize,
    pub end_column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

/// Case-insensitive literal search, all non-overlapping matches per line
pub fn index<S: AsRef<str>>(lines: &[S], query: &str) -> Vec<SearchMatch> {
    if query.is_empty() {
        return Vec::new();
    }

    let Ok(regex) = RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
    else {
        return Vec::new();
    };

    lines
        .iter()
        .enumerate()
        .flat_map(|(row, line)| {
            regex
                .find_iter(line.as_ref())
                .map(move |m| SearchMatch {
                    row,
                    start_column: m.start(),
                    end_column: m.end(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Cyclic navigation. With no matches the index is returned untouched.
pub fn navigate(match_count: usize, current: usize, direction: Direction) -> usize {
    if match_count == 0 {
        return current;
    }
    match direction {
        Direction::Next => (current + 1) % match_count,
        Direction::Prev => (current % match_count + match_count - 1) % match_count,
    }
}

/// Query, matches and cursor for one log view.
///
/// Matches are memoized by `(buffer_version, query)`; call [`SearchState::refresh`]
/// whenever either may have changed.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    query: String,
    matches: Vec<SearchMatch>,
    current: usize,
    indexed: Option<(u64, String)>,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    /// Set the query. Returns true if it changed.
    pub fn set_query(&mut self, query: &str) -> bool {
        if self.query == query {
            return false;
        }
        self.query = query.to_string();
        self.current = 0;
        if query.is_empty() {
            self.matches.clear();
        }
        true
    }

    /// Drop query and matches
    pub fn clear(&mut self) {
        self.query.clear();
        self.matches.clear();
        self.current = 0;
        self.indexed = None;
    }

    /// Recompute matches if the buffer version or query moved since the
    /// last indexing. Returns true if a recomputation happened.
    pub fn refresh<S: AsRef<str>>(&mut self, buffer_version: u64, lines: &[S]) -> bool {
        let up_to_date = matches!(
            &self.indexed,
            Some((version, query)) if *version == buffer_version && *query == self.query
        );
        if up_to_date {
            return false;
        }

        self.matches = index(lines, &self.query);
        if self.current >= self.matches.len() {
            self.current = 0;
        }
        self.indexed = Some((buffer_version, self.query.clone()));
        true
    }

    /// Buffer version the matches were computed against, if they belong
    /// to the current query
    pub fn indexed_version(&self) -> Option<u64> {
        match &self.indexed {
            Some((version, query)) if *query == self.query => Some(*version),
            _ => None,
        }
    }

    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Zero-based cursor into the match list
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Move the cursor, falling back to the first match when out of range
    pub fn set_current(&mut self, index: usize) {
        self.current = if index < self.matches.len() { index } else { 0 };
    }

    pub fn current_match(&self) -> Option<&SearchMatch> {
        self.matches.get(self.current)
    }

    pub fn next_match(&mut self) -> Option<&SearchMatch> {
        self.current = navigate(self.matches.len(), self.current, Direction::Next);
        self.current_match()
    }

    pub fn prev_match(&mut self) -> Option<&SearchMatch> {
        self.current = navigate(self.matches.len(), self.current, Direction::Prev);
        self.current_match()
    }

    /// "i of n", or "0 of 0" when nothing matched
    pub fn status(&self) -> String {
        if self.matches.is_empty() {
            return "0 of 0".to_string();
        }
        format!("{} of {}", self.current + 1, self.matches.len())
    }
}
