//! Per-indexer request throttling (token bucket).

use std::collections::HashMap;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::config::IndexerConfig;

use super::IndexerError;

/// Token bucket for a single indexer.
///
/// Tokens refill continuously at `requests_per_minute / 60` per second and
/// the bucket starts full.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f32,
    tokens: f32,
    refill_per_sec: f32,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(requests_per_minute: u32) -> Self {
        let capacity = requests_per_minute as f32;
        Self {
            capacity,
            tokens: capacity,
            refill_per_sec: capacity / 60.0,
            last_refill: Instant::now(),
        }
    }

    /// Take one token, or return how long until one is available.
    pub fn try_take(&mut self) -> Result<(), Duration> {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            return Ok(());
        }
        let missing = 1.0 - self.tokens;
        Err(Duration::from_secs_f32(missing / self.refill_per_sec))
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f32();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }
}

/// Token buckets for every rate-limited indexer.
///
/// Indexers with `rate_limit_rpm = 0`, or not registered at all, are never
/// throttled.
pub struct IndexerThrottle {
    buckets: Mutex<HashMap<String, TokenBucket>>,
}

impl IndexerThrottle {
    pub fn from_indexers(indexers: &[IndexerConfig]) -> Self {
        let buckets = indexers
            .iter()
            .filter(|i| i.rate_limit_rpm > 0)
            .map(|i| (i.name.clone(), TokenBucket::new(i.rate_limit_rpm)))
            .collect();
        Self {
            buckets: Mutex::new(buckets),
        }
    }

    pub fn unlimited() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Take a request slot for `indexer`.
    pub async fn try_acquire(&self, indexer: &str) -> Result<(), IndexerError> {
        let mut buckets = self.buckets.lock().await;
        match buckets.get_mut(indexer) {
            Some(bucket) => bucket.try_take().map_err(|wait| IndexerError::RateLimited {
                indexer: indexer.to_string(),
                retry_after_ms: wait.as_millis() as u64,
            }),
            None => Ok(()),
        }
    }

    pub async fn is_limited(&self, indexer: &str) -> bool {
        self.buckets.lock().await.contains_key(indexer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_starts_full() {
        let mut bucket = TokenBucket::new(3);
        assert!(bucket.try_take().is_ok());
        assert!(bucket.try_take().is_ok());
        assert!(bucket.try_take().is_ok());
        assert!(bucket.try_take().is_err());
    }

    #[test]
    fn test_bucket_reports_wait() {
        let mut bucket = TokenBucket::new(6);
        for _ in 0..6 {
            bucket.try_take().unwrap();
        }
        let wait = bucket.try_take().unwrap_err();
        // 6 rpm refills one token every 10 seconds
        assert!(wait.as_secs() <= 10);
        assert!(wait.as_millis() > 0);
    }

    #[tokio::test]
    async fn test_throttle_limits_configured_indexer() {
        let mut limited = IndexerConfig::new("slow");
        limited.rate_limit_rpm = 1;
        let throttle = IndexerThrottle::from_indexers(&[limited, IndexerConfig::new("fast")]);

        assert!(throttle.is_limited("slow").await);
        assert!(!throttle.is_limited("fast").await);

        assert!(throttle.try_acquire("slow").await.is_ok());
        match throttle.try_acquire("slow").await.unwrap_err() {
            IndexerError::RateLimited { indexer, .. } => assert_eq!(indexer, "slow"),
            other => panic!("Expected RateLimited, got {:?}", other),
        }

        for _ in 0..10 {
            assert!(throttle.try_acquire("fast").await.is_ok());
        }
    }

    #[tokio::test]
    async fn test_unknown_indexer_is_unthrottled() {
        let throttle = IndexerThrottle::unlimited();
        assert!(throttle.try_acquire("anything").await.is_ok());
    }
}
