//! Candidates and the reasons they get rejected.

use serde::Serialize;
use thiserror::Error;

use crate::indexer::RawRelease;
use crate::parser::ParsedRelease;

/// Why a candidate was turned down. The display string names the stage.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum RejectReason {
    #[error("title: too short")]
    TrivialTitle,

    #[error("size: empty release")]
    EmptySize,

    #[error("size: {size} bytes is below minimum {min}")]
    TooSmall { size: u64, min: u64 },

    #[error("size: {size} bytes is above maximum {max}")]
    TooLarge { size: u64, max: u64 },

    #[error("history: already downloaded")]
    DuplicateUrl,

    #[error("history: title already downloaded")]
    DuplicateTitle,

    #[error("external id: {found} does not match {wanted}")]
    ExternalIdMismatch { found: String, wanted: String },

    #[error("regex: rejected by '{0}'")]
    RegexRejected(String),

    #[error("regex: no required pattern matched")]
    RegexRequiredMissing,

    #[error("parse error: {0}")]
    ParseFailed(String),

    #[error("year: target has no year")]
    NoYear,

    #[error("year: {0} not found in title")]
    YearMismatch(u32),

    #[error("title: '{0}' does not match")]
    TitleMismatch(String),

    #[error("episode: {0} not found in title")]
    EpisodeMismatch(String),

    #[error("quality: {attribute} '{value}' not wanted")]
    QualityUnwanted {
        attribute: &'static str,
        value: String,
    },

    #[error("priority: unscored")]
    Unscored,

    #[error("priority: {priority} does not exceed {minimum}")]
    PriorityTooLow { priority: u32, minimum: u32 },

    #[error("unknown target")]
    UnknownTarget,

    #[error("resolve: target belongs to quality profile '{0}'")]
    ProfileMismatch(String),
}

impl RejectReason {
    /// Stage name, used as a metrics label.
    pub fn stage(&self) -> &'static str {
        match self {
            RejectReason::TrivialTitle => "trivial_title",
            RejectReason::EmptySize | RejectReason::TooSmall { .. } | RejectReason::TooLarge { .. } => {
                "size"
            }
            RejectReason::DuplicateUrl | RejectReason::DuplicateTitle => "history",
            RejectReason::ExternalIdMismatch { .. } => "external_id",
            RejectReason::RegexRejected(_) | RejectReason::RegexRequiredMissing => "regex",
            RejectReason::ParseFailed(_) => "parse",
            RejectReason::NoYear | RejectReason::YearMismatch(_) => "year",
            RejectReason::TitleMismatch(_) => "title",
            RejectReason::EpisodeMismatch(_) => "episode",
            RejectReason::QualityUnwanted { .. } => "quality",
            RejectReason::Unscored | RejectReason::PriorityTooLow { .. } => "priority",
            RejectReason::UnknownTarget | RejectReason::ProfileMismatch(_) => "resolve",
        }
    }
}

/// Outcome of a single stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Pass,
    Reject(RejectReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum CandidateStatus {
    Pending,
    Accepted,
    Rejected(RejectReason),
}

/// One raw indexer hit on its way through the filter pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub raw: RawRelease,
    /// Trimmed release title.
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed: Option<ParsedRelease>,
    pub priority: u32,
    pub status: CandidateStatus,
    /// Label of the search strategy that found it.
    pub strategy: String,
    /// Set when the indexer-reported id matched the target id.
    pub id_verified: bool,
}

impl Candidate {
    pub fn new(raw: RawRelease, strategy: impl Into<String>) -> Self {
        let title = raw.title.trim().to_string();
        Self {
            raw,
            title,
            parsed: None,
            priority: 0,
            status: CandidateStatus::Pending,
            strategy: strategy.into(),
            id_verified: false,
        }
    }

    pub fn download_url(&self) -> &str {
        &self.raw.download_url
    }

    pub fn indexer(&self) -> &str {
        &self.raw.indexer
    }

    pub fn is_pending(&self) -> bool {
        self.status == CandidateStatus::Pending
    }

    pub fn is_accepted(&self) -> bool {
        self.status == CandidateStatus::Accepted
    }

    pub fn reject_reason(&self) -> Option<&RejectReason> {
        match &self.status {
            CandidateStatus::Rejected(reason) => Some(reason),
            _ => None,
        }
    }

    /// Mark as accepted. No effect once a decision was made.
    pub fn accept(&mut self) {
        if self.is_pending() {
            self.status = CandidateStatus::Accepted;
        }
    }

    /// Mark as rejected. The first reason sticks.
    pub fn reject(&mut self, reason: RejectReason) {
        if self.is_pending() {
            self.status = CandidateStatus::Rejected(reason);
        }
    }
}
