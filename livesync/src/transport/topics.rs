//! Topic definitions

/// Event identifier sent with every subscribe request
pub const MONITOR_EVENT: &str = "monitor";

/// Topic patterns
pub struct Topics;

impl Topics {
    /// Deployment changes for one application
    pub fn application_deployments(application_id: &str) -> String {
        format!("application/{}/deployments", application_id)
    }

    /// Parse a topic to extract the application ID
    pub fn parse_application_id(topic: &str) -> Option<String> {
        let parts: Vec<&str> = topic.split('/').collect();
        if parts.len() >= 3 && parts[0] == "application" && !parts[1].is_empty() {
            Some(parts[1].to_string())
        } else {
            None
        }
    }

    /// Check if topic carries deployment changes
    pub fn is_deployments_topic(topic: &str) -> bool {
        topic.starts_with("application/") && topic.ends_with("/deployments")
    }
}
