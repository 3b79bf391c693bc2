//! Ordered filter stages applied to every candidate.

use tracing::debug;

use crate::catalog::{DownloadHistory, PriorityScorer};
use crate::config::{IndexerConfig, PathConfig, QualityProfile};
use crate::metrics;
use crate::parser::ReleaseParser;
use crate::search::{SearchMode, SearchTarget};

use super::matching::EpisodeMatcher;
use super::rules::CompiledRegexProfile;
use super::stages::Stage;
use super::{Candidate, Decision};

/// Everything a stage may look at besides the candidate.
pub struct FilterContext<'a> {
    pub target: &'a SearchTarget,
    pub profile: &'a QualityProfile,
    pub indexer: &'a IndexerConfig,
    pub path: Option<&'a PathConfig>,
    pub regex: Option<&'a CompiledRegexProfile>,
    pub mode: SearchMode,
    pub history: &'a dyn DownloadHistory,
    pub parser: &'a dyn ReleaseParser,
    pub scorer: &'a dyn PriorityScorer,
    /// Compiled once per target for episode searches.
    pub episode: Option<EpisodeMatcher>,
}

impl<'a> FilterContext<'a> {
    pub fn new(
        target: &'a SearchTarget,
        profile: &'a QualityProfile,
        indexer: &'a IndexerConfig,
        mode: SearchMode,
        history: &'a dyn DownloadHistory,
        parser: &'a dyn ReleaseParser,
        scorer: &'a dyn PriorityScorer,
    ) -> Self {
        Self {
            target,
            profile,
            indexer,
            path: None,
            regex: None,
            mode,
            history,
            parser,
            scorer,
            episode: match target {
                SearchTarget::Episode(episode) => Some(EpisodeMatcher::new(episode)),
                SearchTarget::Movie(_) => None,
            },
        }
    }

    pub fn with_path(mut self, path: Option<&'a PathConfig>) -> Self {
        self.path = path;
        self
    }

    pub fn with_regex(mut self, regex: Option<&'a CompiledRegexProfile>) -> Self {
        self.regex = regex;
        self
    }
}

/// Candidates split by decision, each half in input order.
#[derive(Debug, Default)]
pub struct FilterResult {
    pub accepted: Vec<Candidate>,
    pub rejected: Vec<Candidate>,
}

/// Runs stages in order; the first rejection ends evaluation.
#[derive(Debug, Clone)]
pub struct FilterPipeline {
    stages: Vec<Stage>,
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl FilterPipeline {
    /// All stages in their standard order.
    pub fn standard() -> Self {
        Self {
            stages: Stage::ALL.to_vec(),
        }
    }

    pub fn with_stages(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Decide one candidate. Already-decided candidates are left untouched.
    pub fn evaluate(&self, candidate: &mut Candidate, ctx: &FilterContext<'_>) {
        if !candidate.is_pending() {
            return;
        }

        for stage in self.stages.iter().filter(|s| s.applies_to(ctx.mode)) {
            if let Decision::Reject(reason) = stage.apply(candidate, ctx) {
                debug!(
                    title = %candidate.title,
                    indexer = %candidate.indexer(),
                    stage = stage.as_str(),
                    reason = %reason,
                    "Candidate rejected"
                );
                metrics::CANDIDATE_DECISIONS
                    .with_label_values(&[stage.as_str()])
                    .inc();
                candidate.reject(reason);
                return;
            }
        }

        metrics::CANDIDATE_DECISIONS
            .with_label_values(&["accepted"])
            .inc();
        candidate.accept();
    }

    pub fn run(&self, candidates: Vec<Candidate>, ctx: &FilterContext<'_>) -> FilterResult {
        let mut result = FilterResult::default();
        for mut candidate in candidates {
            self.evaluate(&mut candidate, ctx);
            if candidate.is_accepted() {
                result.accepted.push(candidate);
            } else {
                result.rejected.push(candidate);
            }
        }
        result
    }
}
