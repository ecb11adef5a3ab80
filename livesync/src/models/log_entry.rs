//! Log entry models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single log row produced by a deployment or application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique log ID
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,

    pub created_at: DateTime<Utc>,

    /// Declared level: 'info', 'warn', 'error', 'debug'
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Well-known event token, e.g. `step_started`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Raw payload, either a string or a structured value
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl LogEntry {
    /// Payload as display text. Strings are returned verbatim, anything
    /// else is serialized as compact JSON.
    pub fn payload_text(&self) -> String {
        match &self.payload {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// One fetched page of log entries
#[derive(Debug, Clone, PartialEq)]
pub struct LogPage {
    pub page_number: u32,
    pub entries: Vec<LogEntry>,
}

impl LogPage {
    pub fn new(page_number: u32, entries: Vec<LogEntry>) -> Self {
        Self {
            page_number,
            entries,
        }
    }

    /// Page 1 replaces the buffer; later pages walk backward in time
    pub fn is_fresh(&self) -> bool {
        self.page_number <= 1
    }
}
