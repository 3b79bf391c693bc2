//! Per-indexer circuit breaker.
//!
//! An indexer that failed recently is skipped until its block window has
//! passed. Every failure moves the window forward, so concurrent searches
//! that all see the same broken indexer keep it blocked.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Tracks recent indexer failures.
#[async_trait]
pub trait CircuitBreaker: Send + Sync {
    /// True iff the indexer failed within the block window before `now`.
    async fn should_skip(&self, indexer: &str, now: DateTime<Utc>) -> bool;

    /// Record a failure. Keeps the most recent timestamp.
    async fn record_failure(&self, indexer: &str, at: DateTime<Utc>);

    /// Last recorded failure for an indexer.
    async fn last_failure(&self, indexer: &str) -> Option<DateTime<Utc>>;
}

fn key(indexer: &str) -> String {
    indexer.to_lowercase()
}

/// Circuit breaker backed by an in-process map. Indexer names are
/// case-insensitive.
pub struct InMemoryCircuitBreaker {
    window: Duration,
    failures: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryCircuitBreaker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            failures: RwLock::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Indexers currently blocked, with the time they become available again.
    pub async fn blocked(&self, now: DateTime<Utc>) -> Vec<(String, DateTime<Utc>)> {
        let failures = self.failures.read().await;
        let mut blocked: Vec<_> = failures
            .iter()
            .filter(|(_, at)| now - **at < self.window)
            .map(|(name, at)| (name.clone(), *at + self.window))
            .collect();
        blocked.sort_by(|a, b| a.0.cmp(&b.0));
        blocked
    }

    /// Forget a failure (e.g. after an operator fixed the indexer).
    pub async fn reset(&self, indexer: &str) -> bool {
        self.failures.write().await.remove(&key(indexer)).is_some()
    }
}

#[async_trait]
impl CircuitBreaker for InMemoryCircuitBreaker {
    async fn should_skip(&self, indexer: &str, now: DateTime<Utc>) -> bool {
        let failures = self.failures.read().await;
        match failures.get(&key(indexer)) {
            Some(at) => now - *at < self.window,
            None => false,
        }
    }

    async fn record_failure(&self, indexer: &str, at: DateTime<Utc>) {
        let mut failures = self.failures.write().await;
        failures
            .entry(key(indexer))
            .and_modify(|existing| {
                if at > *existing {
                    *existing = at;
                }
            })
            .or_insert(at);
    }

    async fn last_failure(&self, indexer: &str) -> Option<DateTime<Utc>> {
        self.failures.read().await.get(&key(indexer)).copied()
    }
}
