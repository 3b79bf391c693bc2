//! Maps feed items to catalog targets.

use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::{CatalogError, MediaCatalog};
use crate::config::QualityProfile;
use crate::indexer::RawRelease;
use crate::parser::ReleaseParser;

use super::{MediaKind, SearchTarget};

/// Finds the library entry a feed item belongs to.
///
/// Indexer-reported ids are tried first; the parsed title (plus year for
/// movies, identifier for episodes) is the fallback.
pub struct TargetResolver {
    catalog: Arc<dyn MediaCatalog>,
    parser: Arc<dyn ReleaseParser>,
}

impl TargetResolver {
    pub fn new(catalog: Arc<dyn MediaCatalog>, parser: Arc<dyn ReleaseParser>) -> Self {
        Self { catalog, parser }
    }

    /// Resolve one item. `Ok(None)` means the item is not wanted.
    pub fn resolve(
        &self,
        item: &RawRelease,
        kind: MediaKind,
        profile: &QualityProfile,
        add_if_not_found: bool,
    ) -> Result<Option<SearchTarget>, CatalogError> {
        match kind {
            MediaKind::Movie => self.resolve_movie(item, profile, add_if_not_found),
            MediaKind::Series => self.resolve_episode(item),
        }
    }

    fn resolve_movie(
        &self,
        item: &RawRelease,
        profile: &QualityProfile,
        add_if_not_found: bool,
    ) -> Result<Option<SearchTarget>, CatalogError> {
        let parsed = self.parser.parse(&item.title).ok();
        let external_id = item
            .external_movie_id
            .clone()
            .or_else(|| parsed.as_ref().and_then(|p| p.imdb_id.clone()));

        if let Some(id) = &external_id {
            if let Some(movie) = self.catalog.movie_by_external_id(id)? {
                return Ok(Some(movie.into()));
            }
        }

        if let Some(parsed) = &parsed {
            let tolerance = u32::from(profile.check_year1);
            if let Some(movie) = self
                .catalog
                .movie_by_title(&parsed.title, parsed.year, tolerance)?
            {
                return Ok(Some(movie.into()));
            }
        }

        match external_id {
            Some(id) if add_if_not_found => {
                let movie = self.catalog.import_movie(&id, &profile.name)?;
                info!(external_id = %id, title = %movie.wanted_title, "Imported movie from feed");
                Ok(Some(movie.into()))
            }
            _ => {
                debug!(title = %item.title, "Feed item matches no movie");
                Ok(None)
            }
        }
    }

    fn resolve_episode(&self, item: &RawRelease) -> Result<Option<SearchTarget>, CatalogError> {
        let parsed = self.parser.parse(&item.title).ok();

        let series_id = item
            .external_series_id
            .as_deref()
            .and_then(|id| id.trim().parse::<u32>().ok());
        let season = item.season.or_else(|| parsed.as_ref().and_then(|p| p.season));
        let episode = item.episode.or_else(|| parsed.as_ref().and_then(|p| p.episode));

        if let (Some(series_id), Some(season), Some(episode)) = (series_id, season, episode) {
            if let Some(target) = self
                .catalog
                .episode_by_external_id(series_id, season, episode)?
            {
                return Ok(Some(target.into()));
            }
        }

        if let Some(parsed) = &parsed {
            if let Some(identifier) = &parsed.identifier {
                if let Some(target) = self.catalog.episode_by_title(&parsed.title, identifier)? {
                    return Ok(Some(target.into()));
                }
            }
        }

        debug!(title = %item.title, "Feed item matches no episode");
        Ok(None)
    }
}
