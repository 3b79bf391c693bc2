//! Types for talking to release indexers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::IndexerConfig;

/// A raw result returned by one indexer, before any decision is made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRelease {
    pub title: String,
    pub download_url: String,
    pub size_bytes: u64,
    /// Which indexer returned this result.
    pub indexer: String,
    /// IMDB id as reported by the indexer (e.g. "tt0133093").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_movie_id: Option<String>,
    /// TVDB series id as reported by the indexer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_series_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    /// Feed item identifier (guid), used for RSS cursors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<DateTime<Utc>>,
}

impl RawRelease {
    pub fn new(
        title: impl Into<String>,
        download_url: impl Into<String>,
        size_bytes: u64,
        indexer: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            download_url: download_url.into(),
            size_bytes,
            indexer: indexer.into(),
            external_movie_id: None,
            external_series_id: None,
            season: None,
            episode: None,
            item_id: None,
            publish_date: None,
        }
    }
}

/// What an indexer is asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryKind {
    /// Free-text query.
    Text { query: String },
    /// Movie lookup by IMDB id.
    Movie { imdb_id: String },
    /// Episode lookup by TVDB id.
    Episode {
        tvdb_id: String,
        season: u32,
        episode: u32,
    },
    /// Latest items of the indexer feed.
    Feed,
}

/// Query parameters for a single indexer request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerQuery {
    pub kind: QueryKind,
    /// Newznab/Torznab category ids.
    pub categories: Vec<u32>,
    /// Maximum results to return.
    pub limit: u32,
}

/// Errors that can occur while querying an indexer.
#[derive(Debug, Clone, Error)]
pub enum IndexerError {
    #[error("Indexer connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Indexer API error: {0}")]
    ApiError(String),

    #[error("Malformed indexer response: {0}")]
    MalformedResponse(String),

    #[error("Rate limited for indexer {indexer}, retry in {retry_after_ms}ms")]
    RateLimited {
        indexer: String,
        retry_after_ms: u64,
    },

    #[error("Indexer not found: {0}")]
    IndexerNotFound(String),

    #[error("Request timeout after {0}s")]
    Timeout(u64),
}

impl IndexerError {
    /// Whether this error means the indexer itself is unhealthy and
    /// should be blocked for a while.
    pub fn is_indexer_failure(&self) -> bool {
        matches!(
            self,
            IndexerError::ConnectionFailed(_)
                | IndexerError::ApiError(_)
                | IndexerError::MalformedResponse(_)
                | IndexerError::Timeout(_)
        )
    }
}

/// Wire client for release indexers.
///
/// Implementations own the protocol details; the engine only hands over the
/// indexer configuration and a protocol-neutral query.
#[async_trait]
pub trait IndexerGateway: Send + Sync {
    /// Gateway name for logging.
    fn name(&self) -> &str;

    /// Issue one query against one indexer.
    async fn search(
        &self,
        indexer: &IndexerConfig,
        query: &IndexerQuery,
    ) -> Result<Vec<RawRelease>, IndexerError>;
}
