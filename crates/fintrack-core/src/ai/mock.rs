//! Mock backend for testing
//!
//! Answers with keyword rules by default, or with a fixed label, or fails
//! every call. Useful for unit tests and development without an API key.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::classify::classify_by_rules;
use crate::error::{Error, Result};

use super::AIBackend;

#[derive(Clone, Debug)]
enum Reply {
    Rules,
    Fixed(String),
    Fail,
}

/// Mock AI backend for testing
///
/// Clones share one call counter, so a test can hand a clone to the code
/// under test and still observe how often it was asked.
#[derive(Clone)]
pub struct MockBackend {
    reply: Reply,
    /// Whether health_check should return true
    pub healthy: bool,
    calls: Arc<AtomicUsize>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a mock that answers like the keyword rules (healthy)
    pub fn new() -> Self {
        Self {
            reply: Reply::Rules,
            healthy: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock that always answers with `label`, valid or not
    pub fn answering(label: &str) -> Self {
        Self {
            reply: Reply::Fixed(label.to_string()),
            ..Self::new()
        }
    }

    /// Create a mock whose every call fails like an unreachable service
    pub fn failing() -> Self {
        Self {
            reply: Reply::Fail,
            healthy: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of classification calls received so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn classify_vendor(&self, vendor: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Reply::Rules => Ok(classify_by_rules(vendor).as_str().to_string()),
            Reply::Fixed(label) => Ok(label.clone()),
            Reply::Fail => Err(Error::External("mock backend unavailable".into())),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_counts_calls_across_clones() {
        let mock = MockBackend::answering("교통");
        let clone = mock.clone();
        assert_eq!(clone.classify_vendor("anything").await.unwrap(), "교통");
        assert_eq!(clone.classify_vendor("again").await.unwrap(), "교통");
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_failing_mock() {
        let mock = MockBackend::failing();
        assert!(mock.classify_vendor("스타벅스").await.is_err());
        assert!(!mock.health_check().await);
    }
}
