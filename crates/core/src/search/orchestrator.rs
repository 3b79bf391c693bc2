//! Fan-out search across the indexers of a quality profile.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::{DownloadHistory, MediaCatalog, PriorityScorer, RankTableScorer};
use crate::config::{Config, IndexerConfig, PathConfig, QualityIndexer, QualityProfile};
use crate::decision::{
    CandidateNormalizer, CompiledRegexProfile, FilterContext, FilterPipeline,
    FilterResult, RejectReason,
};
use crate::indexer::{
    build_query, CircuitBreaker, InMemoryCircuitBreaker, InMemoryRssCursorStore, IndexerError,
    IndexerGateway, IndexerQuery, IndexerThrottle, QueryKind, RawRelease, RssCursorStore,
};
use crate::metrics;
use crate::parser::{HeuristicReleaseParser, ReleaseParser};

use super::aggregate::{IndexerStatus, ResultAggregator, SearchOutcome, TaskResult};
use super::resolver::TargetResolver;
use super::strategy::{build_chain, SearchStrategy};
use super::{MediaKind, OutcomeStatus, SearchMode, SearchTarget};

/// Per-search switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    /// Allow free-text title searches after (or instead of) id searches.
    pub title_fallback: bool,
}

impl SearchOptions {
    pub fn with_title_fallback() -> Self {
        Self {
            title_fallback: true,
        }
    }
}

/// One entry of a batch search.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub target: SearchTarget,
    pub mode: SearchMode,
    pub options: SearchOptions,
}

impl SearchRequest {
    pub fn new(target: impl Into<SearchTarget>, mode: SearchMode) -> Self {
        Self {
            target: target.into(),
            mode,
            options: SearchOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }
}

/// Feed polling for one quality profile.
#[derive(Debug, Clone)]
pub struct RssSearchRequest {
    pub quality_profile: String,
    pub kind: MediaKind,
    /// Import unknown movies instead of discarding their items.
    pub add_if_not_found: bool,
}

impl RssSearchRequest {
    pub fn new(quality_profile: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            quality_profile: quality_profile.into(),
            kind,
            add_if_not_found: false,
        }
    }
}

/// Runs searches against every indexer of a target's quality profile and
/// decides on the results.
///
/// Indexers are queried concurrently, at most `search.worker_indexer` at a
/// time. Each indexer task owns its candidates until all tasks are joined.
/// The circuit breaker, throttle and RSS cursors are the only shared state.
pub struct SearchOrchestrator {
    config: Arc<Config>,
    gateway: Arc<dyn IndexerGateway>,
    breaker: Arc<dyn CircuitBreaker>,
    throttle: Arc<IndexerThrottle>,
    cursors: Arc<dyn RssCursorStore>,
    catalog: Arc<dyn MediaCatalog>,
    history: Arc<dyn DownloadHistory>,
    parser: Arc<dyn ReleaseParser>,
    scorer: Arc<dyn PriorityScorer>,
    pipeline: FilterPipeline,
    regexes: HashMap<String, CompiledRegexProfile>,
}

type EntryRules<'a> = (Option<&'a PathConfig>, Option<&'a CompiledRegexProfile>);

enum QueryError {
    Status(IndexerStatus),
    Cancelled,
}

impl SearchOrchestrator {
    /// Create an orchestrator with in-memory breaker and cursor state, the
    /// heuristic parser and the rank-table scorer.
    pub fn new(
        config: Config,
        gateway: Arc<dyn IndexerGateway>,
        catalog: Arc<dyn MediaCatalog>,
        history: Arc<dyn DownloadHistory>,
    ) -> Self {
        let mut regexes = HashMap::new();
        for profile in &config.regex_profiles {
            match CompiledRegexProfile::compile(profile) {
                Ok(compiled) => {
                    regexes.insert(profile.name.to_lowercase(), compiled);
                }
                Err(e) => warn!(profile = %profile.name, error = %e, "Invalid regex profile"),
            }
        }

        Self {
            breaker: Arc::new(InMemoryCircuitBreaker::new(config.search.block_window())),
            throttle: Arc::new(IndexerThrottle::from_indexers(&config.indexers)),
            cursors: Arc::new(InMemoryRssCursorStore::new()),
            parser: Arc::new(HeuristicReleaseParser::new()),
            scorer: Arc::new(RankTableScorer::new()),
            pipeline: FilterPipeline::standard(),
            config: Arc::new(config),
            gateway,
            catalog,
            history,
            regexes,
        }
    }

    pub fn with_circuit_breaker(mut self, breaker: Arc<dyn CircuitBreaker>) -> Self {
        self.breaker = breaker;
        self
    }

    pub fn with_cursor_store(mut self, cursors: Arc<dyn RssCursorStore>) -> Self {
        self.cursors = cursors;
        self
    }

    pub fn with_throttle(mut self, throttle: Arc<IndexerThrottle>) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_parser(mut self, parser: Arc<dyn ReleaseParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn PriorityScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_pipeline(mut self, pipeline: FilterPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn circuit_breaker(&self) -> &Arc<dyn CircuitBreaker> {
        &self.breaker
    }

    /// Search every indexer of the target's profile and decide on the hits.
    pub async fn search(
        &self,
        target: &SearchTarget,
        mode: SearchMode,
        options: SearchOptions,
        cancel: &CancellationToken,
    ) -> SearchOutcome {
        let start = Instant::now();

        let Some(profile) = self.config.quality_profile(target.quality_profile()) else {
            warn!(
                target = %target,
                profile = %target.quality_profile(),
                "Quality profile not configured, skipping search"
            );
            return SearchOutcome::empty(OutcomeStatus::Completed);
        };

        debug!(
            target = %target,
            mode = %mode,
            indexers = profile.indexers.len(),
            "Starting search"
        );

        let semaphore = Semaphore::new(self.config.search.indexer_workers());
        let tasks = profile.indexers.iter().map(|entry| {
            let semaphore = &semaphore;
            async move {
                let _permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        return TaskResult::skipped(&entry.indexer, IndexerStatus::Cancelled);
                    }
                    permit = semaphore.acquire() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return TaskResult::skipped(&entry.indexer, IndexerStatus::Cancelled),
                    },
                };
                self.search_indexer(target, profile, entry, mode, options, cancel)
                    .await
            }
        });
        let results = join_all(tasks).await;

        let cancelled = cancel.is_cancelled();
        let any_succeeded = results.iter().any(TaskResult::succeeded);
        let outcome = ResultAggregator::aggregate(results, cancelled);

        if !cancelled && any_succeeded {
            if let Err(e) =
                self.catalog
                    .update_last_scan(target.media_kind(), target.catalog_id(), Utc::now())
            {
                warn!(target = %target, error = %e, "Failed to update last scan time");
            }
        }

        metrics::SEARCH_DURATION
            .with_label_values(&[mode.as_str()])
            .observe(start.elapsed().as_secs_f64());
        metrics::SEARCH_RESULTS
            .with_label_values(&[])
            .observe(outcome.accepted.len() as f64);

        info!(
            target = %target,
            mode = %mode,
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected.len(),
            cancelled,
            duration_ms = start.elapsed().as_millis() as u64,
            "Search complete"
        );

        outcome
    }

    /// Run many target searches, at most `search.worker_search` at a time.
    /// Outcomes are returned in request order.
    pub async fn search_batch(
        &self,
        requests: &[SearchRequest],
        cancel: &CancellationToken,
    ) -> Vec<SearchOutcome> {
        let semaphore = Semaphore::new(self.config.search.search_workers());
        let searches = requests.iter().map(|request| {
            let semaphore = &semaphore;
            async move {
                let _permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return SearchOutcome::empty(OutcomeStatus::Cancelled),
                    permit = semaphore.acquire() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return SearchOutcome::empty(OutcomeStatus::Cancelled),
                    },
                };
                self.search(&request.target, request.mode, request.options, cancel)
                    .await
            }
        });
        join_all(searches).await
    }

    /// Poll the feeds of a profile's indexers and decide on the new items.
    pub async fn search_rss(
        &self,
        request: &RssSearchRequest,
        cancel: &CancellationToken,
    ) -> SearchOutcome {
        let start = Instant::now();

        let Some(profile) = self.config.quality_profile(&request.quality_profile) else {
            warn!(
                profile = %request.quality_profile,
                "Quality profile not configured, skipping feed search"
            );
            return SearchOutcome::empty(OutcomeStatus::Completed);
        };

        let resolver = TargetResolver::new(self.catalog.clone(), self.parser.clone());
        let semaphore = Semaphore::new(self.config.search.indexer_workers());
        let tasks = profile.indexers.iter().map(|entry| {
            let semaphore = &semaphore;
            let resolver = &resolver;
            async move {
                let _permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        return TaskResult::skipped(&entry.indexer, IndexerStatus::Cancelled);
                    }
                    permit = semaphore.acquire() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return TaskResult::skipped(&entry.indexer, IndexerStatus::Cancelled),
                    },
                };
                self.poll_feed(request, profile, entry, resolver, cancel)
                    .await
            }
        });
        let results = join_all(tasks).await;
        let outcome = ResultAggregator::aggregate(results, cancel.is_cancelled());

        metrics::SEARCH_DURATION
            .with_label_values(&[SearchMode::Rss.as_str()])
            .observe(start.elapsed().as_secs_f64());
        metrics::SEARCH_RESULTS
            .with_label_values(&[])
            .observe(outcome.accepted.len() as f64);

        info!(
            profile = %profile.name,
            kind = %request.kind,
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Feed search complete"
        );

        outcome
    }

    /// Look up an indexer and check it may be queried right now.
    async fn admit<'a>(&'a self, entry: &QualityIndexer) -> Result<&'a IndexerConfig, IndexerStatus> {
        let name = entry.indexer.as_str();

        let Some(indexer) = self.config.indexer(name) else {
            warn!(indexer = %name, "Indexer not configured, skipping");
            metrics::INDEXER_SKIPPED
                .with_label_values(&["misconfigured"])
                .inc();
            return Err(IndexerStatus::Misconfigured(format!(
                "indexer '{}' is not configured",
                name
            )));
        };

        if !indexer.enabled {
            debug!(indexer = %name, "Indexer disabled, skipping");
            metrics::INDEXER_SKIPPED.with_label_values(&["disabled"]).inc();
            return Err(IndexerStatus::Disabled);
        }

        if self.breaker.should_skip(name, Utc::now()).await {
            debug!(indexer = %name, "Indexer blocked after recent failure, skipping");
            metrics::INDEXER_SKIPPED.with_label_values(&["blocked"]).inc();
            return Err(IndexerStatus::Blocked);
        }

        Ok(indexer)
    }

    /// Issue one query under the throttle, the deadline and the cancel token.
    ///
    /// Indexer failures and timeouts are recorded with the circuit breaker.
    async fn query(
        &self,
        indexer: &IndexerConfig,
        query: &IndexerQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<RawRelease>, QueryError> {
        let name = indexer.name.as_str();

        if let Err(e) = self.throttle.try_acquire(name).await {
            debug!(indexer = %name, error = %e, "Indexer throttled, skipping");
            metrics::INDEXER_SKIPPED
                .with_label_values(&["rate_limited"])
                .inc();
            return Err(QueryError::Status(IndexerStatus::RateLimited));
        }

        debug!(indexer = %name, query = ?query.kind, categories = ?query.categories, "Querying indexer");

        let deadline = self.config.search.indexer_timeout();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(QueryError::Cancelled),
            response = tokio::time::timeout(deadline, self.gateway.search(indexer, query)) => response,
        };

        let error = match response {
            Ok(Ok(releases)) => {
                metrics::INDEXER_REQUESTS
                    .with_label_values(&[name, "success"])
                    .inc();
                debug!(indexer = %name, results = releases.len(), "Indexer query complete");
                return Ok(releases);
            }
            Ok(Err(e)) => e,
            Err(_) => IndexerError::Timeout(deadline.as_secs()),
        };

        let status = match &error {
            IndexerError::Timeout(_) => "timeout",
            IndexerError::RateLimited { .. } => "rate_limited",
            _ => "error",
        };
        metrics::INDEXER_REQUESTS
            .with_label_values(&[name, status])
            .inc();

        if error.is_indexer_failure() {
            warn!(indexer = %name, error = %error, "Indexer search failed");
            self.breaker.record_failure(name, Utc::now()).await;
            Err(QueryError::Status(IndexerStatus::Failed(error.to_string())))
        } else if let IndexerError::RateLimited { .. } = error {
            warn!(indexer = %name, error = %error, "Indexer rate limited the request");
            Err(QueryError::Status(IndexerStatus::RateLimited))
        } else {
            warn!(indexer = %name, error = %error, "Indexer rejected the request");
            Err(QueryError::Status(IndexerStatus::Misconfigured(error.to_string())))
        }
    }

    /// Path and regex profiles an indexer entry refers to.
    fn entry_rules<'a>(
        &'a self,
        entry: &QualityIndexer,
    ) -> Result<EntryRules<'a>, IndexerStatus> {
        let path = match entry.path.as_deref() {
            Some(name) => match self.config.path(name) {
                Some(path) => Some(path),
                None => {
                    warn!(indexer = %entry.indexer, path = %name, "Path profile not configured, skipping");
                    return Err(IndexerStatus::Misconfigured(format!(
                        "path '{}' is not configured",
                        name
                    )));
                }
            },
            None => None,
        };

        let regex = match entry.regex.as_deref() {
            Some(name) => match self.regexes.get(&name.to_lowercase()) {
                Some(regex) => Some(regex),
                None => {
                    warn!(indexer = %entry.indexer, regex = %name, "Regex profile not usable, skipping");
                    return Err(IndexerStatus::Misconfigured(format!(
                        "regex profile '{}' is not usable",
                        name
                    )));
                }
            },
            None => None,
        };

        Ok((path, regex))
    }

    /// One indexer task of a target search: walk the strategy chain.
    async fn search_indexer(
        &self,
        target: &SearchTarget,
        profile: &QualityProfile,
        entry: &QualityIndexer,
        mode: SearchMode,
        options: SearchOptions,
        cancel: &CancellationToken,
    ) -> TaskResult {
        let name = entry.indexer.as_str();

        let indexer = match self.admit(entry).await {
            Ok(indexer) => indexer,
            Err(status) => return TaskResult::skipped(name, status),
        };
        let (path, regex) = match self.entry_rules(entry) {
            Ok(rules) => rules,
            Err(status) => return TaskResult::skipped(name, status),
        };

        let strategies = build_chain(target, profile, indexer, &options);
        if strategies.is_empty() {
            debug!(indexer = %name, target = %target, "No applicable search strategy");
            return TaskResult::skipped(name, IndexerStatus::NoQuery);
        }

        let ctx = FilterContext::new(
            target,
            profile,
            indexer,
            mode,
            self.history.as_ref(),
            self.parser.as_ref(),
            self.scorer.as_ref(),
        )
        .with_path(path)
        .with_regex(regex);

        let mut normalizer = CandidateNormalizer::new();
        let mut result = FilterResult::default();
        let mut answered = false;

        for strategy in &strategies {
            if profile.check_until_first_found && !result.accepted.is_empty() {
                break;
            }
            let Some(kind) = strategy.query_kind(target) else {
                continue;
            };
            let query = build_query(kind, target.media_kind(), indexer, entry);

            let releases = match self.query(indexer, &query, cancel).await {
                Ok(releases) => releases,
                Err(QueryError::Cancelled) => {
                    return TaskResult::skipped(name, IndexerStatus::Cancelled)
                }
                // Earlier strategies already got answers: keep them and stop here.
                Err(QueryError::Status(status)) if answered => {
                    debug!(
                        indexer = %name,
                        strategy = strategy.label(),
                        status = %status,
                        "Strategy chain stopped early"
                    );
                    return TaskResult::partial(name, result, status);
                }
                Err(QueryError::Status(status)) => return TaskResult::skipped(name, status),
            };
            answered = true;

            let candidates = normalizer.normalize(releases, strategy.label());
            let decided = self.pipeline.run(candidates, &ctx);
            debug!(
                indexer = %name,
                strategy = strategy.label(),
                accepted = decided.accepted.len(),
                rejected = decided.rejected.len(),
                "Strategy complete"
            );
            result.accepted.extend(decided.accepted);
            result.rejected.extend(decided.rejected);
        }

        TaskResult::searched(name, result)
    }

    /// One indexer task of a feed search.
    ///
    /// Items newer than the stored cursor are resolved to catalog targets
    /// one by one and filtered against the target they resolve to.
    async fn poll_feed(
        &self,
        request: &RssSearchRequest,
        profile: &QualityProfile,
        entry: &QualityIndexer,
        resolver: &TargetResolver,
        cancel: &CancellationToken,
    ) -> TaskResult {
        let name = entry.indexer.as_str();

        let indexer = match self.admit(entry).await {
            Ok(indexer) => indexer,
            Err(status) => return TaskResult::skipped(name, status),
        };
        let (path, regex) = match self.entry_rules(entry) {
            Ok(rules) => rules,
            Err(status) => return TaskResult::skipped(name, status),
        };

        let query = build_query(QueryKind::Feed, request.kind, indexer, entry);
        let items = match self.query(indexer, &query, cancel).await {
            Ok(items) => items,
            Err(QueryError::Cancelled) => return TaskResult::skipped(name, IndexerStatus::Cancelled),
            Err(QueryError::Status(status)) => return TaskResult::skipped(name, status),
        };

        let cursor = match self.cursors.get_cursor(&profile.name, name) {
            Ok(cursor) => cursor,
            Err(e) => {
                warn!(indexer = %name, profile = %profile.name, error = %e, "Failed to read feed cursor");
                None
            }
        };
        let newest = items.iter().find_map(|item| item.item_id.clone());

        // Feeds list newest first; everything before the cursor item is new.
        let fresh: Vec<RawRelease> = items
            .into_iter()
            .take_while(|item| cursor.is_none() || item.item_id != cursor)
            .collect();
        debug!(indexer = %name, new_items = fresh.len(), cursor = ?cursor, "Feed fetched");

        let mut normalizer = CandidateNormalizer::new();
        let mut result = FilterResult::default();
        for mut candidate in normalizer.normalize(fresh, SearchStrategy::Feed.label()) {
            if cancel.is_cancelled() {
                return TaskResult::skipped(name, IndexerStatus::Cancelled);
            }

            let resolved = resolver.resolve(
                &candidate.raw,
                request.kind,
                profile,
                request.add_if_not_found,
            );
            let rejection = match resolved {
                Ok(Some(target))
                    if !target
                        .quality_profile()
                        .eq_ignore_ascii_case(&profile.name) =>
                {
                    debug!(
                        title = %candidate.title,
                        target = %target,
                        target_profile = %target.quality_profile(),
                        "Feed item belongs to another quality profile"
                    );
                    Some(RejectReason::ProfileMismatch(
                        target.quality_profile().to_string(),
                    ))
                }
                Ok(Some(target)) => {
                    let ctx = FilterContext::new(
                        &target,
                        profile,
                        indexer,
                        SearchMode::Rss,
                        self.history.as_ref(),
                        self.parser.as_ref(),
                        self.scorer.as_ref(),
                    )
                    .with_path(path)
                    .with_regex(regex);
                    self.pipeline.evaluate(&mut candidate, &ctx);
                    None
                }
                Ok(None) => Some(RejectReason::UnknownTarget),
                Err(e) => {
                    warn!(title = %candidate.title, error = %e, "Catalog lookup failed");
                    Some(RejectReason::UnknownTarget)
                }
            };
            if let Some(reason) = rejection {
                metrics::CANDIDATE_DECISIONS
                    .with_label_values(&[reason.stage()])
                    .inc();
                candidate.reject(reason);
            }

            if candidate.is_accepted() {
                result.accepted.push(candidate);
            } else {
                result.rejected.push(candidate);
            }
        }

        if let Some(newest) = newest {
            if let Err(e) = self.cursors.set_cursor(&profile.name, name, &newest) {
                warn!(indexer = %name, profile = %profile.name, error = %e, "Failed to store feed cursor");
            }
        }

        TaskResult::searched(name, result)
    }
}
