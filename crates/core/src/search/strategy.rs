//! Fallback chain of query strategies for one indexer.

use serde::Serialize;

use crate::config::{IndexerConfig, QualityProfile};
use crate::indexer::QueryKind;

use super::{SearchOptions, SearchTarget};

/// One way of asking an indexer for a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", content = "query", rename_all = "snake_case")]
pub enum SearchStrategy {
    /// IMDB id for movies, TVDB id plus season/episode for series.
    ExternalId,
    /// Free text built from the canonical title.
    Title(String),
    /// Free text built from an alternate title.
    AlternateTitle(String),
    /// Latest feed items.
    Feed,
}

impl SearchStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            SearchStrategy::ExternalId => "external_id",
            SearchStrategy::Title(_) => "title",
            SearchStrategy::AlternateTitle(_) => "alternate_title",
            SearchStrategy::Feed => "feed",
        }
    }

    /// The indexer query for this strategy, if the target supports it.
    pub fn query_kind(&self, target: &SearchTarget) -> Option<QueryKind> {
        match self {
            SearchStrategy::ExternalId => external_id_query(target),
            SearchStrategy::Title(query) | SearchStrategy::AlternateTitle(query) => {
                Some(QueryKind::Text {
                    query: query.clone(),
                })
            }
            SearchStrategy::Feed => Some(QueryKind::Feed),
        }
    }
}

fn external_id_query(target: &SearchTarget) -> Option<QueryKind> {
    match target {
        SearchTarget::Movie(movie) => movie
            .external_id
            .as_ref()
            .filter(|id| !id.trim().is_empty())
            .map(|id| QueryKind::Movie {
                imdb_id: id.trim().to_string(),
            }),
        SearchTarget::Episode(episode) => episode
            .external_series_id
            .filter(|_| episode.season > 0)
            .map(|id| QueryKind::Episode {
                tvdb_id: id.to_string(),
                season: episode.season,
                episode: episode.episode,
            }),
    }
}

/// Free-text query for a title: movies get the year, episodes the identifier.
fn title_query(title: &str, target: &SearchTarget, profile: &QualityProfile) -> String {
    let title = title.trim();
    match target {
        SearchTarget::Movie(movie) => match movie.year {
            Some(year) if !profile.exclude_year_from_title_search => format!("{} {}", title, year),
            _ => title.to_string(),
        },
        SearchTarget::Episode(episode) => format!("{} {}", title, episode.identifier),
    }
}

/// Strategies to try against one indexer, in order.
pub fn build_chain(
    target: &SearchTarget,
    profile: &QualityProfile,
    indexer: &IndexerConfig,
    options: &SearchOptions,
) -> Vec<SearchStrategy> {
    let mut chain = Vec::new();

    let id_possible = indexer.external_id_search && external_id_query(target).is_some();
    if id_possible {
        chain.push(SearchStrategy::ExternalId);
    }

    if !options.title_fallback {
        return chain;
    }

    let mut tried: Vec<String> = Vec::new();
    let canonical = target.wanted_title().trim();
    if !canonical.is_empty() {
        tried.push(canonical.to_lowercase());
        if profile.backup_search_for_title || !id_possible {
            chain.push(SearchStrategy::Title(title_query(canonical, target, profile)));
        }
    }

    if profile.backup_search_for_alternate_title {
        for alternate in target.wanted_alternates() {
            let alternate = alternate.trim();
            let key = alternate.to_lowercase();
            if alternate.is_empty() || tried.contains(&key) {
                continue;
            }
            tried.push(key);
            chain.push(SearchStrategy::AlternateTitle(title_query(
                alternate, target, profile,
            )));
        }
    }

    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{EpisodeTarget, MovieTarget};

    fn options(title_fallback: bool) -> SearchOptions {
        SearchOptions { title_fallback }
    }

    fn profile() -> QualityProfile {
        QualityProfile {
            name: "hd".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_id_only_without_fallback() {
        let target: SearchTarget = MovieTarget::new(1, "Heat", "hd")
            .with_year(1995)
            .with_external_id("tt0113277")
            .into();
        let chain = build_chain(&target, &profile(), &IndexerConfig::new("geek"), &options(false));
        assert_eq!(chain, vec![SearchStrategy::ExternalId]);
        assert_eq!(
            chain[0].query_kind(&target),
            Some(QueryKind::Movie {
                imdb_id: "tt0113277".to_string()
            })
        );
    }

    #[test]
    fn test_title_runs_when_id_impossible() {
        let target: SearchTarget = MovieTarget::new(1, "Heat", "hd").with_year(1995).into();
        let chain = build_chain(&target, &profile(), &IndexerConfig::new("geek"), &options(true));
        assert_eq!(chain, vec![SearchStrategy::Title("Heat 1995".to_string())]);

        // Indexer without id support behaves the same.
        let target: SearchTarget = MovieTarget::new(1, "Heat", "hd")
            .with_year(1995)
            .with_external_id("tt0113277")
            .into();
        let mut indexer = IndexerConfig::new("geek");
        indexer.external_id_search = false;
        let chain = build_chain(&target, &profile(), &indexer, &options(true));
        assert_eq!(chain, vec![SearchStrategy::Title("Heat 1995".to_string())]);
    }

    #[test]
    fn test_backup_title_after_id() {
        let target: SearchTarget = MovieTarget::new(1, "Heat", "hd")
            .with_year(1995)
            .with_external_id("tt0113277")
            .into();
        let mut profile = profile();
        let chain = build_chain(&target, &profile, &IndexerConfig::new("geek"), &options(true));
        assert_eq!(chain, vec![SearchStrategy::ExternalId]);

        profile.backup_search_for_title = true;
        profile.exclude_year_from_title_search = true;
        let chain = build_chain(&target, &profile, &IndexerConfig::new("geek"), &options(true));
        assert_eq!(
            chain,
            vec![
                SearchStrategy::ExternalId,
                SearchStrategy::Title("Heat".to_string())
            ]
        );
    }

    #[test]
    fn test_alternates_are_deduplicated() {
        let target: SearchTarget = EpisodeTarget::new(1, "Show", 1, 2, "hd")
            .with_alternates(["SHOW", "Das Show", "das show", " "])
            .into();
        let mut profile = profile();
        profile.backup_search_for_alternate_title = true;
        let chain = build_chain(&target, &profile, &IndexerConfig::new("geek"), &options(true));
        assert_eq!(
            chain,
            vec![
                SearchStrategy::Title("Show S01E02".to_string()),
                SearchStrategy::AlternateTitle("Das Show S01E02".to_string()),
            ]
        );
    }

    #[test]
    fn test_episode_id_query() {
        let target: SearchTarget = EpisodeTarget::new(1, "Show", 3, 7, "hd")
            .with_series_id(81189)
            .into();
        assert_eq!(
            SearchStrategy::ExternalId.query_kind(&target),
            Some(QueryKind::Episode {
                tvdb_id: "81189".to_string(),
                season: 3,
                episode: 7
            })
        );

        // Dated episodes have no season/episode to send.
        let dated: SearchTarget = EpisodeTarget::dated(1, "Daily", "2024-03-05", "hd")
            .with_series_id(1)
            .into();
        assert_eq!(SearchStrategy::ExternalId.query_kind(&dated), None);
    }
}
