//! Prometheus metrics for the search engine.
//!
//! This module provides metrics for:
//! - Indexer requests and skipped indexers
//! - Candidate decisions per filter stage
//! - Search duration and result counts

use once_cell::sync::Lazy;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

// =============================================================================
// Indexers
// =============================================================================

/// Indexer requests by outcome.
pub static INDEXER_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("scoutarr_indexer_requests_total", "Total indexer requests"),
        &["indexer", "status"], // "success", "error", "timeout", "rate_limited"
    )
    .unwrap()
});

/// Indexers left out of a search.
pub static INDEXER_SKIPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "scoutarr_indexer_skipped_total",
            "Indexers skipped before querying",
        ),
        &["reason"], // "blocked", "rate_limited", "disabled", "misconfigured"
    )
    .unwrap()
});

// =============================================================================
// Decisions
// =============================================================================

/// Final decision per candidate, labelled by rejecting stage or "accepted".
pub static CANDIDATE_DECISIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "scoutarr_candidate_decisions_total",
            "Candidate decisions by stage",
        ),
        &["stage"],
    )
    .unwrap()
});

// =============================================================================
// Searches
// =============================================================================

/// Search duration in seconds.
pub static SEARCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "scoutarr_search_duration_seconds",
            "Duration of a search across all indexers",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["mode"],
    )
    .unwrap()
});

/// Accepted candidates per search.
pub static SEARCH_RESULTS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "scoutarr_search_results",
            "Number of accepted candidates per search",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0]),
        &[],
    )
    .unwrap()
});

/// All metrics, for registration with a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(INDEXER_REQUESTS.clone()),
        Box::new(INDEXER_SKIPPED.clone()),
        Box::new(CANDIDATE_DECISIONS.clone()),
        Box::new(SEARCH_DURATION.clone()),
        Box::new(SEARCH_RESULTS.clone()),
    ]
}

/// A fresh registry holding every engine metric.
pub fn registry() -> Result<Registry, prometheus::Error> {
    let registry = Registry::new();
    for metric in all_metrics() {
        registry.register(metric)?;
    }
    Ok(registry)
}

/// Encode a registry in the Prometheus text format.
pub fn encode(registry: &Registry) -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
