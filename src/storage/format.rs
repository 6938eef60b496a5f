//! Fixture file structures

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::hosts::HostIndex;
use crate::{Result, StubtapeError};

/// Request or response payload as captured at the network boundary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Payload {
    /// Body, stored verbatim; absent bodies read back as `null`
    #[serde(default)]
    pub body: Value,
}

impl Payload {
    /// Wrap a body
    #[must_use]
    pub fn new(body: Value) -> Self {
        Self { body }
    }
}

/// One recorded request/response pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordedExchange {
    /// URL with the matched host removed, or the full URL when unmatched
    pub url: String,
    /// HTTP method
    pub method: String,
    /// Request payload
    #[serde(default)]
    pub request: Payload,
    /// Response payload
    #[serde(default)]
    pub response: Payload,
    /// Registry position of the matched host, `-1` when unmatched
    #[serde(rename = "matchHostIndex")]
    pub match_host_index: HostIndex,
}

/// Everything recorded for one test case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestCaseSnapshot {
    /// When the snapshot was recorded
    pub timestamp: String,
    /// Exchanges in observation order
    pub records: Vec<RecordedExchange>,
}

/// Contents of one fixture file: test case title to snapshot, in file order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotFile {
    entries: IndexMap<String, TestCaseSnapshot>,
}

impl SnapshotFile {
    /// Create an empty fixture
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot for a test case title
    #[must_use]
    pub fn get(&self, title: &str) -> Option<&TestCaseSnapshot> {
        self.entries.get(title)
    }

    /// Set or replace the snapshot for a title; a replaced entry keeps its position
    pub fn insert(&mut self, title: impl Into<String>, snapshot: TestCaseSnapshot) {
        self.entries.insert(title.into(), snapshot);
    }

    /// Number of test cases in the fixture
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the fixture holds no test cases
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(title, snapshot)` in file order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TestCaseSnapshot)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Check values serde cannot check on its own
    ///
    /// # Errors
    ///
    /// Returns error naming the first offending test case and record
    pub fn validate(&self) -> Result<()> {
        for (title, snapshot) in &self.entries {
            for (i, record) in snapshot.records.iter().enumerate() {
                if !is_http_token(&record.method) {
                    return Err(StubtapeError::InvalidSnapshot(format!(
                        "'{title}' record {i}: invalid method '{}'",
                        record.method
                    )));
                }
            }
        }
        Ok(())
    }
}

/// RFC 9110 method token
fn is_http_token(method: &str) -> bool {
    !method.is_empty()
        && method
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}
