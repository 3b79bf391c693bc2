//! Merging per-indexer results into one outcome.

use serde::Serialize;

use crate::decision::{Candidate, FilterResult};

/// What happened to one indexer during a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum IndexerStatus {
    Searched { accepted: usize, rejected: usize },
    /// Some strategies answered before a later one failed or was throttled.
    Partial {
        accepted: usize,
        rejected: usize,
        stopped: String,
    },
    /// Query failed or timed out; the failure was recorded.
    Failed(String),
    /// Skipped by the circuit breaker.
    Blocked,
    RateLimited,
    Disabled,
    /// Referenced by the profile but not configured.
    Misconfigured(String),
    /// No strategy applied to this target and indexer.
    NoQuery,
    Cancelled,
}

impl std::fmt::Display for IndexerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexerStatus::Searched { accepted, rejected } => {
                write!(f, "searched ({} accepted, {} rejected)", accepted, rejected)
            }
            IndexerStatus::Partial {
                accepted,
                rejected,
                stopped,
            } => write!(
                f,
                "partial ({} accepted, {} rejected; stopped: {})",
                accepted, rejected, stopped
            ),
            IndexerStatus::Failed(e) => write!(f, "failed: {}", e),
            IndexerStatus::Blocked => write!(f, "blocked"),
            IndexerStatus::RateLimited => write!(f, "rate limited"),
            IndexerStatus::Disabled => write!(f, "disabled"),
            IndexerStatus::Misconfigured(e) => write!(f, "misconfigured: {}", e),
            IndexerStatus::NoQuery => write!(f, "no query"),
            IndexerStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexerReport {
    pub indexer: String,
    pub status: IndexerStatus,
}

/// Result of one indexer task, owned by the task until the join.
#[derive(Debug)]
pub struct TaskResult {
    pub indexer: String,
    pub status: IndexerStatus,
    pub accepted: Vec<Candidate>,
    pub rejected: Vec<Candidate>,
}

impl TaskResult {
    pub fn searched(indexer: impl Into<String>, result: FilterResult) -> Self {
        Self {
            indexer: indexer.into(),
            status: IndexerStatus::Searched {
                accepted: result.accepted.len(),
                rejected: result.rejected.len(),
            },
            accepted: result.accepted,
            rejected: result.rejected,
        }
    }

    /// A task whose strategy chain was cut short by `stopped` after at least
    /// one query was answered. Its candidates are kept.
    pub fn partial(
        indexer: impl Into<String>,
        result: FilterResult,
        stopped: IndexerStatus,
    ) -> Self {
        Self {
            indexer: indexer.into(),
            status: IndexerStatus::Partial {
                accepted: result.accepted.len(),
                rejected: result.rejected.len(),
                stopped: stopped.to_string(),
            },
            accepted: result.accepted,
            rejected: result.rejected,
        }
    }

    /// A task that contributes no candidates.
    pub fn skipped(indexer: impl Into<String>, status: IndexerStatus) -> Self {
        Self {
            indexer: indexer.into(),
            status,
            accepted: Vec::new(),
            rejected: Vec::new(),
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(
            self.status,
            IndexerStatus::Searched { .. } | IndexerStatus::Partial { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Completed,
    /// Stopped early; candidates may be partial.
    Cancelled,
}

/// Result of a search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub status: OutcomeStatus,
    /// Highest priority first; ties keep discovery order.
    pub accepted: Vec<Candidate>,
    pub rejected: Vec<Candidate>,
    pub indexers: Vec<IndexerReport>,
}

impl SearchOutcome {
    pub fn empty(status: OutcomeStatus) -> Self {
        Self {
            status,
            accepted: Vec::new(),
            rejected: Vec::new(),
            indexers: Vec::new(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == OutcomeStatus::Cancelled
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.accepted.first()
    }

    pub fn report(&self, indexer: &str) -> Option<&IndexerReport> {
        self.indexers
            .iter()
            .find(|r| r.indexer.eq_ignore_ascii_case(indexer))
    }
}

/// Joins task results after the barrier.
pub struct ResultAggregator;

impl ResultAggregator {
    /// Concatenate in task order, then stable-sort accepted by priority.
    pub fn aggregate(tasks: Vec<TaskResult>, cancelled: bool) -> SearchOutcome {
        let mut outcome = SearchOutcome::empty(if cancelled {
            OutcomeStatus::Cancelled
        } else {
            OutcomeStatus::Completed
        });

        for task in tasks {
            outcome.accepted.extend(task.accepted);
            outcome.rejected.extend(task.rejected);
            outcome.indexers.push(IndexerReport {
                indexer: task.indexer,
                status: task.status,
            });
        }

        outcome.accepted.sort_by(|a, b| b.priority.cmp(&a.priority));
        outcome
    }
}
