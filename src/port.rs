//! Execution port: the capabilities the find engine needs from a backend.
//!
//! Implementations decide how a request document reaches the database. The
//! engine only ever issues one call at a time per find, and holds no state
//! shared with the port between calls.

use async_trait::async_trait;
use selector_core::{FindRequest, IndexRequest};
use serde::Deserialize;
use serde_json::Value;

use crate::error::FindResult;

/// Default maximum rows per round.
pub const DEFAULT_MAX_PAGE_SIZE: usize = 100;

/// Default upper bound on rows collected by an exhausting find.
pub const DEFAULT_FETCH_CEILING: usize = 10_000;

/// Per-port bounds for pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindLimits {
    /// Maximum rows the backend returns in one round
    pub max_page_size: usize,
    /// Maximum rows a single find collects when no limit is given
    pub fetch_ceiling: usize,
}

impl Default for FindLimits {
    fn default() -> Self {
        Self {
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            fetch_ceiling: DEFAULT_FETCH_CEILING,
        }
    }
}

impl FindLimits {
    pub fn new(max_page_size: usize, fetch_ceiling: usize) -> Self {
        Self {
            max_page_size: max_page_size.max(1),
            fetch_ceiling,
        }
    }
}

/// One round-trip's response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub docs: Vec<Value>,
    #[serde(default)]
    pub bookmark: Option<String>,
    #[serde(default)]
    pub warning: Option<String>,
}

impl Page {
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexResult {
    Created,
    Exists,
}

/// Response of the index endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IndexOutcome {
    pub result: IndexResult,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[async_trait]
pub trait ExecutionPort: Send + Sync {
    /// Run one find round against `database`.
    async fn execute(&self, database: &str, request: &FindRequest) -> FindResult<Page>;

    /// Submit an index-creation request.
    async fn create_index(&self, database: &str, index: &IndexRequest)
        -> FindResult<IndexOutcome>;

    fn limits(&self) -> FindLimits {
        FindLimits::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_from_response() {
        let page: Page = serde_json::from_value(json!({
            "docs": [{"_id": "a"}, {"_id": "b"}],
            "bookmark": "g1AAAA",
            "warning": "no matching index found, create an index to optimize query time"
        }))
        .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page.bookmark.as_deref(), Some("g1AAAA"));
        assert!(page.warning.is_some());

        let page: Page = serde_json::from_value(json!({"docs": []})).unwrap();
        assert!(page.is_empty());
        assert!(page.bookmark.is_none());
    }

    #[test]
    fn test_index_outcome() {
        let outcome: IndexOutcome = serde_json::from_value(json!({
            "result": "exists",
            "id": "_design/a5f4711fc9448864a13c81dc71e660b524d7410c",
            "name": "a5f4711fc9448864a13c81dc71e660b524d7410c"
        }))
        .unwrap();
        assert_eq!(outcome.result, IndexResult::Exists);
    }

    #[test]
    fn test_limits() {
        assert_eq!(FindLimits::default().max_page_size, DEFAULT_MAX_PAGE_SIZE);
        assert_eq!(FindLimits::new(0, 5).max_page_size, 1);
    }
}
