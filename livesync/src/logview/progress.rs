//! Progress extraction from pull/download style log payloads

use serde::{Deserialize, Serialize};

/// Status keywords that identify a progress record
const PROGRESS_KEYWORDS: [&str; 3] = ["download", "extract", "pull"];

/// Most recent progress reported by a payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressInfo {
    pub status: String,
    pub progress: String,
}

#[derive(Deserialize)]
struct ProgressRecord {
    status: String,
    #[serde(default)]
    progress: Option<String>,
}

/// Scan `payload` from its last line backward and return the first record
/// carrying both a recognized status and a progress field.
///
/// Lines that are not JSON, or not the right shape, are skipped.
pub fn extract_progress(payload: &str) -> Option<ProgressInfo> {
    payload.lines().rev().find_map(parse_progress_line)
}

/// Parse a single line as a progress record
pub fn parse_progress_line(line: &str) -> Option<ProgressInfo> {
    let line = line.trim();
    if !line.starts_with('{') {
        return None;
    }

    let record: ProgressRecord = serde_json::from_str(line).ok()?;
    if !is_progress_status(&record.status) {
        return None;
    }

    let progress = record.progress.filter(|p| !p.trim().is_empty())?;
    Some(ProgressInfo {
        status: record.status,
        progress,
    })
}

fn is_progress_status(status: &str) -> bool {
    let status = status.to_lowercase();
    PROGRESS_KEYWORDS.iter().any(|keyword| status.contains(keyword))
}
