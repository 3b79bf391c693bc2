//! What a search is looking for.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of media a target or history entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Series,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "series",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a search runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Nothing is held yet.
    Missing,
    /// A file is held; only better releases are wanted.
    Upgrade,
    /// Feed polling; targets are resolved per item.
    Rss,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Missing => "missing",
            SearchMode::Upgrade => "upgrade",
            SearchMode::Rss => "rss",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A wanted movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieTarget {
    pub catalog_id: u64,
    /// IMDB id ("tt0133093").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    pub wanted_title: String,
    #[serde(default)]
    pub wanted_alternates: Vec<String>,
    pub quality_profile: String,
    /// Priority of the best file already held, 0 when missing.
    #[serde(default)]
    pub minimum_priority: u32,
}

impl MovieTarget {
    pub fn new(catalog_id: u64, title: impl Into<String>, quality_profile: impl Into<String>) -> Self {
        Self {
            catalog_id,
            external_id: None,
            year: None,
            wanted_title: title.into(),
            wanted_alternates: Vec::new(),
            quality_profile: quality_profile.into(),
            minimum_priority: 0,
        }
    }

    pub fn with_year(mut self, year: u32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_external_id(mut self, id: impl Into<String>) -> Self {
        self.external_id = Some(id.into());
        self
    }

    pub fn with_alternates<I, S>(mut self, alternates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.wanted_alternates = alternates.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_minimum_priority(mut self, priority: u32) -> Self {
        self.minimum_priority = priority;
        self
    }
}

/// A wanted TV episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeTarget {
    pub catalog_id: u64,
    /// TVDB series id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_series_id: Option<u32>,
    pub season: u32,
    pub episode: u32,
    /// `S01E02`, or an air date (`2024-03-05`) for date-identified series.
    pub identifier: String,
    pub wanted_title: String,
    #[serde(default)]
    pub wanted_alternates: Vec<String>,
    pub quality_profile: String,
    #[serde(default)]
    pub minimum_priority: u32,
}

impl EpisodeTarget {
    pub fn new(
        catalog_id: u64,
        series_title: impl Into<String>,
        season: u32,
        episode: u32,
        quality_profile: impl Into<String>,
    ) -> Self {
        Self {
            catalog_id,
            external_series_id: None,
            season,
            episode,
            identifier: format!("S{:02}E{:02}", season, episode),
            wanted_title: series_title.into(),
            wanted_alternates: Vec::new(),
            quality_profile: quality_profile.into(),
            minimum_priority: 0,
        }
    }

    /// Episode of a series identified by air date.
    pub fn dated(
        catalog_id: u64,
        series_title: impl Into<String>,
        air_date: impl Into<String>,
        quality_profile: impl Into<String>,
    ) -> Self {
        let mut target = Self::new(catalog_id, series_title, 0, 0, quality_profile);
        target.identifier = air_date.into();
        target
    }

    pub fn with_series_id(mut self, id: u32) -> Self {
        self.external_series_id = Some(id);
        self
    }

    pub fn with_alternates<I, S>(mut self, alternates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.wanted_alternates = alternates.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_minimum_priority(mut self, priority: u32) -> Self {
        self.minimum_priority = priority;
        self
    }
}

/// A movie or episode to search for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchTarget {
    Movie(MovieTarget),
    Episode(EpisodeTarget),
}

impl SearchTarget {
    pub fn media_kind(&self) -> MediaKind {
        match self {
            SearchTarget::Movie(_) => MediaKind::Movie,
            SearchTarget::Episode(_) => MediaKind::Series,
        }
    }

    pub fn catalog_id(&self) -> u64 {
        match self {
            SearchTarget::Movie(m) => m.catalog_id,
            SearchTarget::Episode(e) => e.catalog_id,
        }
    }

    pub fn quality_profile(&self) -> &str {
        match self {
            SearchTarget::Movie(m) => &m.quality_profile,
            SearchTarget::Episode(e) => &e.quality_profile,
        }
    }

    pub fn minimum_priority(&self) -> u32 {
        match self {
            SearchTarget::Movie(m) => m.minimum_priority,
            SearchTarget::Episode(e) => e.minimum_priority,
        }
    }

    pub fn wanted_title(&self) -> &str {
        match self {
            SearchTarget::Movie(m) => &m.wanted_title,
            SearchTarget::Episode(e) => &e.wanted_title,
        }
    }

    pub fn wanted_alternates(&self) -> &[String] {
        match self {
            SearchTarget::Movie(m) => &m.wanted_alternates,
            SearchTarget::Episode(e) => &e.wanted_alternates,
        }
    }

    /// Canonical title followed by alternates.
    pub fn wanted_titles(&self) -> impl Iterator<Item = &str> + Clone {
        std::iter::once(self.wanted_title()).chain(self.wanted_alternates().iter().map(String::as_str))
    }

    /// Short human-readable label for logs.
    pub fn display_name(&self) -> String {
        match self {
            SearchTarget::Movie(m) => match m.year {
                Some(year) => format!("{} ({})", m.wanted_title, year),
                None => m.wanted_title.clone(),
            },
            SearchTarget::Episode(e) => format!("{} {}", e.wanted_title, e.identifier),
        }
    }
}

impl From<MovieTarget> for SearchTarget {
    fn from(target: MovieTarget) -> Self {
        SearchTarget::Movie(target)
    }
}

impl From<EpisodeTarget> for SearchTarget {
    fn from(target: EpisodeTarget) -> Self {
        SearchTarget::Episode(target)
    }
}

impl fmt::Display for SearchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_identifier_is_zero_padded() {
        let target = EpisodeTarget::new(7, "Show", 1, 2, "hd");
        assert_eq!(target.identifier, "S01E02");

        let target: SearchTarget = target.into();
        assert_eq!(target.media_kind(), MediaKind::Series);
        assert_eq!(target.display_name(), "Show S01E02");
    }

    #[test]
    fn test_wanted_titles_lists_canonical_first() {
        let target: SearchTarget = MovieTarget::new(1, "Amelie", "hd")
            .with_year(2001)
            .with_alternates(["Le Fabuleux Destin d'Amélie Poulain"])
            .into();
        let titles: Vec<&str> = target.wanted_titles().collect();
        assert_eq!(titles, vec!["Amelie", "Le Fabuleux Destin d'Amélie Poulain"]);
        assert_eq!(target.to_string(), "Amelie (2001)");
    }

    #[test]
    fn test_target_serde_tag() {
        let target: SearchTarget = MovieTarget::new(1, "Heat", "hd").into();
        let json = serde_json::to_string(&target).unwrap();
        assert!(json.contains("\"type\":\"movie\""));
    }
}
