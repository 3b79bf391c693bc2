//! The individual filter stages.
//!
//! Every stage looks at one candidate in one context and either lets it
//! pass or names the reason it is rejected. Only the external-id, parse and
//! priority stages write to the candidate, and only to annotate it.

use tracing::warn;

use crate::search::{SearchMode, SearchTarget};

use super::matching::{external_ids_match, title_contains_year, title_matches, wanted_allows};
use super::pipeline::FilterContext;
use super::{Candidate, Decision, RejectReason};

/// Titles this short are never real releases.
const TRIVIAL_TITLE_LEN: usize = 3;

/// Filter stages, in the order the standard pipeline runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    TrivialTitle,
    Size,
    History,
    ExternalId,
    Regex,
    Parse,
    Year,
    Title,
    Episode,
    QualityWanted,
    Priority,
}

impl Stage {
    pub const ALL: [Stage; 11] = [
        Stage::TrivialTitle,
        Stage::Size,
        Stage::History,
        Stage::ExternalId,
        Stage::Regex,
        Stage::Parse,
        Stage::Year,
        Stage::Title,
        Stage::Episode,
        Stage::QualityWanted,
        Stage::Priority,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::TrivialTitle => "trivial_title",
            Stage::Size => "size",
            Stage::History => "history",
            Stage::ExternalId => "external_id",
            Stage::Regex => "regex",
            Stage::Parse => "parse",
            Stage::Year => "year",
            Stage::Title => "title",
            Stage::Episode => "episode",
            Stage::QualityWanted => "quality",
            Stage::Priority => "priority",
        }
    }

    /// Feed items are resolved to a target from the item itself, so the
    /// id and year checks would only repeat the resolution.
    pub fn applies_to(&self, mode: SearchMode) -> bool {
        !(mode == SearchMode::Rss && matches!(self, Stage::ExternalId | Stage::Year))
    }

    pub fn apply(&self, candidate: &mut Candidate, ctx: &FilterContext<'_>) -> Decision {
        match self {
            Stage::TrivialTitle => trivial_title(candidate),
            Stage::Size => size(candidate, ctx),
            Stage::History => history(candidate, ctx),
            Stage::ExternalId => external_id(candidate, ctx),
            Stage::Regex => regex(candidate, ctx),
            Stage::Parse => parse(candidate, ctx),
            Stage::Year => year(candidate, ctx),
            Stage::Title => title(candidate, ctx),
            Stage::Episode => episode(candidate, ctx),
            Stage::QualityWanted => quality_wanted(candidate, ctx),
            Stage::Priority => priority(candidate, ctx),
        }
    }
}

fn reject_if(condition: bool, reason: impl FnOnce() -> RejectReason) -> Decision {
    if condition {
        Decision::Reject(reason())
    } else {
        Decision::Pass
    }
}

fn trivial_title(candidate: &Candidate) -> Decision {
    reject_if(candidate.title.chars().count() <= TRIVIAL_TITLE_LEN, || {
        RejectReason::TrivialTitle
    })
}

fn size(candidate: &Candidate, ctx: &FilterContext<'_>) -> Decision {
    let size = candidate.raw.size_bytes;
    if size == 0 {
        return reject_if(ctx.indexer.skip_empty_size, || RejectReason::EmptySize);
    }

    let Some(path) = ctx.path else {
        return Decision::Pass;
    };

    let min = path.min_size_bytes();
    if size < min {
        return Decision::Reject(RejectReason::TooSmall { size, min });
    }
    match path.max_size_bytes() {
        Some(max) if size > max => Decision::Reject(RejectReason::TooLarge { size, max }),
        _ => Decision::Pass,
    }
}

fn history(candidate: &Candidate, ctx: &FilterContext<'_>) -> Decision {
    let kind = ctx.target.media_kind();

    match ctx.history.contains_url(kind, candidate.download_url()) {
        Ok(true) => return Decision::Reject(RejectReason::DuplicateUrl),
        Ok(false) => {}
        Err(e) => warn!(url = %candidate.download_url(), error = %e, "History lookup failed"),
    }

    if ctx.profile.history_check_title {
        match ctx.history.contains_title(kind, &candidate.title) {
            Ok(true) => return Decision::Reject(RejectReason::DuplicateTitle),
            Ok(false) => {}
            Err(e) => warn!(title = %candidate.title, error = %e, "History lookup failed"),
        }
    }

    Decision::Pass
}

fn external_id(candidate: &mut Candidate, ctx: &FilterContext<'_>) -> Decision {
    let (found, wanted) = match ctx.target {
        SearchTarget::Movie(movie) => (
            candidate.raw.external_movie_id.clone(),
            movie.external_id.clone(),
        ),
        SearchTarget::Episode(episode) => (
            candidate.raw.external_series_id.clone(),
            episode.external_series_id.map(|id| id.to_string()),
        ),
    };

    let (Some(found), Some(wanted)) = (found, wanted) else {
        return Decision::Pass;
    };

    if external_ids_match(&found, &wanted) {
        candidate.id_verified = true;
        Decision::Pass
    } else {
        Decision::Reject(RejectReason::ExternalIdMismatch { found, wanted })
    }
}

fn regex(candidate: &Candidate, ctx: &FilterContext<'_>) -> Decision {
    match ctx.regex {
        Some(rules) => match rules.check(&candidate.title, ctx.target.wanted_titles()) {
            Ok(()) => Decision::Pass,
            Err(reason) => Decision::Reject(reason),
        },
        None => Decision::Pass,
    }
}

fn parse(candidate: &mut Candidate, ctx: &FilterContext<'_>) -> Decision {
    if candidate.parsed.is_some() {
        return Decision::Pass;
    }
    match ctx.parser.parse(&candidate.title) {
        Ok(parsed) => {
            candidate.parsed = Some(parsed);
            Decision::Pass
        }
        Err(e) => Decision::Reject(RejectReason::ParseFailed(e.to_string())),
    }
}

fn year(candidate: &Candidate, ctx: &FilterContext<'_>) -> Decision {
    let SearchTarget::Movie(movie) = ctx.target else {
        return Decision::Pass;
    };
    if candidate.id_verified || !(ctx.profile.check_year || ctx.profile.check_year1) {
        return Decision::Pass;
    }
    let Some(wanted) = movie.year else {
        return Decision::Reject(RejectReason::NoYear);
    };

    let found = if ctx.profile.check_year1 {
        [wanted.saturating_sub(1), wanted, wanted + 1]
            .into_iter()
            .any(|y| title_contains_year(&candidate.title, y))
    } else {
        title_contains_year(&candidate.title, wanted)
    };
    reject_if(!found, || RejectReason::YearMismatch(wanted))
}

fn title(candidate: &Candidate, ctx: &FilterContext<'_>) -> Decision {
    if !ctx.profile.check_title {
        return Decision::Pass;
    }
    if matches!(ctx.target, SearchTarget::Movie(_)) && candidate.id_verified {
        return Decision::Pass;
    }
    let Some(parsed) = &candidate.parsed else {
        return Decision::Pass;
    };
    reject_if(
        !title_matches(&parsed.title, ctx.target.wanted_titles()),
        || RejectReason::TitleMismatch(parsed.title.clone()),
    )
}

fn episode(candidate: &Candidate, ctx: &FilterContext<'_>) -> Decision {
    let SearchTarget::Episode(target) = ctx.target else {
        return Decision::Pass;
    };
    let parsed_matches = candidate.parsed.as_ref().is_some_and(|p| {
        target.season > 0 && p.season == Some(target.season) && p.episode == Some(target.episode)
    });
    reject_if(
        !parsed_matches
            && !ctx
                .episode
                .as_ref()
                .is_some_and(|m| m.is_match(&candidate.title)),
        || RejectReason::EpisodeMismatch(target.identifier.clone()),
    )
}

fn quality_wanted(candidate: &Candidate, ctx: &FilterContext<'_>) -> Decision {
    let Some(parsed) = &candidate.parsed else {
        return Decision::Pass;
    };
    let profile = ctx.profile;
    let checks = [
        ("resolution", &profile.wanted_resolution, &parsed.resolution),
        ("quality", &profile.wanted_quality, &parsed.quality),
        ("codec", &profile.wanted_codec, &parsed.codec),
        ("audio", &profile.wanted_audio, &parsed.audio),
    ];
    for (attribute, wanted, value) in checks {
        if !wanted_allows(wanted, value.as_deref()) {
            return Decision::Reject(RejectReason::QualityUnwanted {
                attribute,
                value: value.clone().unwrap_or_else(|| "unknown".to_string()),
            });
        }
    }
    Decision::Pass
}

fn priority(candidate: &mut Candidate, ctx: &FilterContext<'_>) -> Decision {
    let Some(parsed) = &candidate.parsed else {
        return Decision::Reject(RejectReason::Unscored);
    };
    let priority = ctx.scorer.priority(parsed, ctx.profile);
    candidate.priority = priority;

    let minimum = ctx.target.minimum_priority();
    if priority == 0 {
        Decision::Reject(RejectReason::Unscored)
    } else if priority <= minimum {
        Decision::Reject(RejectReason::PriorityTooLow { priority, minimum })
    } else {
        Decision::Pass
    }
}
