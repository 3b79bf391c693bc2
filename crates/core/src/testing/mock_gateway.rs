//! Mock indexer gateway for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::config::IndexerConfig;
use crate::indexer::{IndexerError, IndexerGateway, IndexerQuery, RawRelease};

/// A query the mock received.
#[derive(Debug, Clone)]
pub struct RecordedQuery {
    pub indexer: String,
    pub query: IndexerQuery,
}

/// Produces a response for a query; `None` falls back to the configured results.
type QueryHandler =
    Box<dyn Fn(&str, &IndexerQuery) -> Option<Result<Vec<RawRelease>, IndexerError>> + Send + Sync>;

/// Mock implementation of the IndexerGateway trait.
///
/// Provides controllable behavior for testing:
/// - Configurable results or errors per indexer
/// - A handler for query-dependent responses
/// - Per-indexer delays, to exercise timeouts and concurrency
/// - Recorded queries and peak concurrency for assertions
pub struct MockIndexerGateway {
    results: Arc<RwLock<HashMap<String, Vec<RawRelease>>>>,
    errors: Arc<RwLock<HashMap<String, IndexerError>>>,
    delays: Arc<RwLock<HashMap<String, Duration>>>,
    handler: Arc<RwLock<Option<QueryHandler>>>,
    queries: Arc<RwLock<Vec<RecordedQuery>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl std::fmt::Debug for MockIndexerGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockIndexerGateway")
            .field("results", &"<results>")
            .field("errors", &"<errors>")
            .field("handler", &"<handler>")
            .finish()
    }
}

impl Default for MockIndexerGateway {
    fn default() -> Self {
        Self::new()
    }
}

fn key(indexer: &str) -> String {
    indexer.to_lowercase()
}

impl MockIndexerGateway {
    pub fn new() -> Self {
        Self {
            results: Arc::new(RwLock::new(HashMap::new())),
            errors: Arc::new(RwLock::new(HashMap::new())),
            delays: Arc::new(RwLock::new(HashMap::new())),
            handler: Arc::new(RwLock::new(None)),
            queries: Arc::new(RwLock::new(Vec::new())),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Results returned for every query to this indexer.
    pub async fn set_results(&self, indexer: &str, results: Vec<RawRelease>) {
        self.results.write().await.insert(key(indexer), results);
    }

    /// Make every query to this indexer fail.
    pub async fn set_error(&self, indexer: &str, error: IndexerError) {
        self.errors.write().await.insert(key(indexer), error);
    }

    pub async fn clear_error(&self, indexer: &str) {
        self.errors.write().await.remove(&key(indexer));
    }

    /// Delay responses from this indexer.
    pub async fn set_delay(&self, indexer: &str, delay: Duration) {
        self.delays.write().await.insert(key(indexer), delay);
    }

    /// Answer queries dynamically.
    pub async fn set_handler<F>(&self, handler: F)
    where
        F: Fn(&str, &IndexerQuery) -> Option<Result<Vec<RawRelease>, IndexerError>>
            + Send
            + Sync
            + 'static,
    {
        *self.handler.write().await = Some(Box::new(handler));
    }

    pub async fn recorded_queries(&self) -> Vec<RecordedQuery> {
        self.queries.read().await.clone()
    }

    pub async fn queries_for(&self, indexer: &str) -> Vec<IndexerQuery> {
        self.queries
            .read()
            .await
            .iter()
            .filter(|q| q.indexer.eq_ignore_ascii_case(indexer))
            .map(|q| q.query.clone())
            .collect()
    }

    pub async fn clear_queries(&self) {
        self.queries.write().await.clear();
    }

    /// Highest number of queries that were running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn respond(
        &self,
        indexer: &str,
        query: &IndexerQuery,
    ) -> Result<Vec<RawRelease>, IndexerError> {
        let delay = self.delays.read().await.get(&key(indexer)).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.errors.read().await.get(&key(indexer)) {
            return Err(error.clone());
        }

        if let Some(handler) = self.handler.read().await.as_ref() {
            if let Some(response) = handler(indexer, query) {
                return response;
            }
        }

        Ok(self
            .results
            .read()
            .await
            .get(&key(indexer))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl IndexerGateway for MockIndexerGateway {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(
        &self,
        indexer: &IndexerConfig,
        query: &IndexerQuery,
    ) -> Result<Vec<RawRelease>, IndexerError> {
        self.queries.write().await.push(RecordedQuery {
            indexer: indexer.name.clone(),
            query: query.clone(),
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let response = self.respond(&indexer.name, query).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }
}
