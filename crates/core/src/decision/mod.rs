//! Candidate decisions.
//!
//! Raw indexer hits become `Candidate`s through the `CandidateNormalizer`
//! and are then run through the `FilterPipeline`, an ordered list of stages
//! where the first rejection wins and its reason is kept.

mod candidate;
pub mod matching;
mod normalizer;
mod pipeline;
mod rules;
mod stages;

pub use candidate::{Candidate, CandidateStatus, Decision, RejectReason};
pub use normalizer::CandidateNormalizer;
pub use pipeline::{FilterContext, FilterPipeline, FilterResult};
pub use rules::CompiledRegexProfile;
pub use stages::Stage;
