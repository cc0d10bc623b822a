//! Mock file search backend for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::credentials::OperatorCredentials;
use crate::searcher::{FileSearch, SearchResponse};

/// A recorded search for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSearch {
    /// The query that was searched.
    pub query: String,
    /// Operator username the search was made with.
    pub username: String,
    /// When the search was made (follows a paused test clock).
    pub timestamp: Instant,
}

/// A query handler that produces a response dynamically.
type QueryHandler = Box<dyn Fn(&str) -> Option<SearchResponse> + Send + Sync>;

/// Mock implementation of the FileSearch trait.
///
/// Provides controllable behavior for testing:
/// - Per-query responses, or a handler for dynamic ones
/// - Simulated failures (`None`) and delays
/// - Recording of every query for assertions
///
/// Queries with no configured response get an empty result set.
pub struct MockFileSearch {
    responses: Arc<RwLock<HashMap<String, Option<SearchResponse>>>>,
    query_handler: Arc<RwLock<Option<QueryHandler>>>,
    searches: Arc<RwLock<Vec<RecordedSearch>>>,
    delay: Arc<RwLock<Option<Duration>>>,
}

impl std::fmt::Debug for MockFileSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockFileSearch")
            .field("responses", &"<responses>")
            .field("query_handler", &"<handler>")
            .field("searches", &"<searches>")
            .finish()
    }
}

impl Default for MockFileSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFileSearch {
    /// Create a new mock that answers every query with an empty result set.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(RwLock::new(HashMap::new())),
            query_handler: Arc::new(RwLock::new(None)),
            searches: Arc::new(RwLock::new(Vec::new())),
            delay: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the response for an exact query.
    pub async fn set_response(&self, query: &str, response: SearchResponse) {
        self.responses
            .write()
            .await
            .insert(query.to_string(), Some(response));
    }

    /// Make an exact query fail.
    pub async fn set_failure(&self, query: &str) {
        self.responses.write().await.insert(query.to_string(), None);
    }

    /// Set a handler consulted before the per-query responses.
    ///
    /// Returning `None` from the handler simulates a failed search.
    pub async fn set_query_handler<F>(&self, handler: F)
    where
        F: Fn(&str) -> Option<SearchResponse> + Send + Sync + 'static,
    {
        *self.query_handler.write().await = Some(Box::new(handler));
    }

    /// Delay every search by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Get recorded searches.
    pub async fn recorded_searches(&self) -> Vec<RecordedSearch> {
        self.searches.read().await.clone()
    }

    /// Get the number of searches performed.
    pub async fn search_count(&self) -> usize {
        self.searches.read().await.len()
    }
}

#[async_trait]
impl FileSearch for MockFileSearch {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(
        &self,
        credentials: &OperatorCredentials,
        query: &str,
    ) -> Option<SearchResponse> {
        self.searches.write().await.push(RecordedSearch {
            query: query.to_string(),
            username: credentials.username().to_string(),
            timestamp: Instant::now(),
        });

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(ref handler) = *self.query_handler.read().await {
            return handler(query);
        }

        match self.responses.read().await.get(query) {
            Some(configured) => configured.clone(),
            None => Some(SearchResponse::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_configured_and_default_responses() {
        let search = MockFileSearch::new();
        let creds = OperatorCredentials::new("op", "secret");
        search
            .set_response(
                "Studio.24.03.15",
                fixtures::search_response(vec![fixtures::raw_row("h1", "Studio.24.03.15.A", 1080)]),
            )
            .await;
        search.set_failure("Broken.24.01.01").await;

        let hit = search.search(&creds, "Studio.24.03.15").await.unwrap();
        assert_eq!(hit.rows().len(), 1);
        assert!(search.search(&creds, "Broken.24.01.01").await.is_none());
        assert!(search.search(&creds, "Other.24.01.01").await.unwrap().is_empty());

        let recorded = search.recorded_searches().await;
        assert_eq!(recorded.len(), 3);
        assert_eq!(recorded[0].username, "op");
    }

    #[tokio::test]
    async fn test_query_handler_overrides_responses() {
        let search = MockFileSearch::new();
        let creds = OperatorCredentials::new("op", "secret");
        search.set_failure("A.24.01.01").await;
        search
            .set_query_handler(|_| Some(fixtures::search_response(vec![])))
            .await;

        assert!(search.search(&creds, "A.24.01.01").await.is_some());
        assert_eq!(search.search_count().await, 1);
    }
}
