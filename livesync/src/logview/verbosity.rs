//! Verbosity classification of log payloads

use serde::Serialize;

use crate::logview::progress::extract_progress;
use crate::utils::truncate_chars;

/// Payloads longer than this many characters are collapsed
pub const VERBOSE_THRESHOLD: usize = 5000;

/// Inline previews are cut to this many characters
pub const PREVIEW_LENGTH: usize = 200;

/// Appended to previews that were cut
pub const ELLIPSIS: &str = "...";

/// How a payload should be displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Shown inline
    Inline,
    /// Hidden behind an expander by default
    Collapsible,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verbosity {
    pub visibility: Visibility,
    pub preview: String,
}

impl Verbosity {
    pub fn is_verbose(&self) -> bool {
        self.visibility == Visibility::Collapsible
    }
}

/// Classify a serialized payload
pub fn classify(payload: &str) -> Verbosity {
    classify_scanned(payload, extract_progress(payload).is_some())
}

/// Classify a payload whose progress scan already ran
pub fn classify_scanned(payload: &str, has_progress: bool) -> Verbosity {
    let verbose = has_progress || payload.chars().count() > VERBOSE_THRESHOLD;

    Verbosity {
        visibility: if verbose {
            Visibility::Collapsible
        } else {
            Visibility::Inline
        },
        preview: preview(payload),
    }
}

/// Short single-stretch preview of a payload
pub fn preview(payload: &str) -> String {
    truncate_chars(payload, PREVIEW_LENGTH, ELLIPSIS)
}
