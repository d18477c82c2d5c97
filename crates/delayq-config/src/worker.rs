// ============================================================================
// Worker Configuration
// ============================================================================

use crate::constants::DEFAULT_WORKER_TOPICS;

/// Settings for the standalone queue-worker process
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Topics to consume, one Consumer per topic
    pub topics: Vec<String>,
}

impl WorkerConfig {
    pub(crate) fn from_env() -> Self {
        let raw = std::env::var("QUEUE_WORKER_TOPICS")
            .unwrap_or_else(|_| DEFAULT_WORKER_TOPICS.to_string());
        Self {
            topics: parse_topics(&raw),
        }
    }
}

/// Split a comma-separated topic list, dropping blanks and duplicates
pub(crate) fn parse_topics(raw: &str) -> Vec<String> {
    let mut topics: Vec<String> = Vec::new();
    for topic in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !topics.iter().any(|t| t == topic) {
            topics.push(topic.to_string());
        }
    }
    if topics.is_empty() {
        topics.push(DEFAULT_WORKER_TOPICS.to_string());
    }
    topics
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_topics() {
        assert_eq!(
            parse_topics("orders, emails ,,orders"),
            vec!["orders".to_string(), "emails".to_string()]
        );
    }

    #[test]
    fn test_parse_topics_blank_falls_back() {
        assert_eq!(parse_topics(" , "), vec!["default".to_string()]);
    }
}
