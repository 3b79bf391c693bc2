pub mod catalog;
pub mod config;
pub mod decision;
pub mod indexer;
pub mod metrics;
pub mod parser;
pub mod search;
pub mod telemetry;
pub mod testing;

pub use catalog::{CatalogError, DownloadHistory, MediaCatalog, PriorityScorer, RankTableScorer};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, QualityProfile,
};
pub use decision::{Candidate, CandidateStatus, FilterPipeline, RejectReason};
pub use indexer::{
    CircuitBreaker, InMemoryCircuitBreaker, IndexerError, IndexerGateway, IndexerQuery,
    RawRelease, RssCursorStore, SqliteRssCursorStore,
};
pub use parser::{HeuristicReleaseParser, ParsedRelease, ReleaseParser};
pub use search::{
    EpisodeTarget, MediaKind, MovieTarget, OutcomeStatus, RssSearchRequest, SearchMode,
    SearchOptions, SearchOrchestrator, SearchOutcome, SearchRequest, SearchTarget,
};
