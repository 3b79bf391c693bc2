//! Searching indexers for a wanted movie or episode.
//!
//! `SearchOrchestrator` fans out over the indexers of the target's quality
//! profile, walks the `SearchStrategy` chain per indexer, runs every hit
//! through the filter pipeline and merges the results with
//! `ResultAggregator`. Feed (RSS) searches resolve their targets per item
//! through `TargetResolver`.

mod aggregate;
mod orchestrator;
mod resolver;
mod strategy;
mod target;

pub use aggregate::{
    IndexerReport, IndexerStatus, OutcomeStatus, ResultAggregator, SearchOutcome, TaskResult,
};
pub use orchestrator::{RssSearchRequest, SearchOptions, SearchOrchestrator, SearchRequest};
pub use resolver::TargetResolver;
pub use strategy::{build_chain, SearchStrategy};
pub use target::{EpisodeTarget, MediaKind, MovieTarget, SearchMode, SearchTarget};
