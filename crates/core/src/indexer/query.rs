//! Indexer-specific query parameters.

use crate::config::{IndexerConfig, QualityIndexer};
use crate::search::MediaKind;

use super::{IndexerQuery, QueryKind};

/// Newznab root category for a media kind.
fn root_category(kind: MediaKind) -> u32 {
    match kind {
        MediaKind::Movie => 2000,
        MediaKind::Series => 5000,
    }
}

/// Categories to send for a query: the profile entry override, then the
/// indexer defaults for the media kind, then the Newznab root category.
pub fn categories_for(kind: MediaKind, indexer: &IndexerConfig, entry: &QualityIndexer) -> Vec<u32> {
    if !entry.categories.is_empty() {
        return entry.categories.clone();
    }
    let defaults = match kind {
        MediaKind::Movie => &indexer.movie_categories,
        MediaKind::Series => &indexer.series_categories,
    };
    if defaults.is_empty() {
        vec![root_category(kind)]
    } else {
        defaults.clone()
    }
}

/// Build the query sent to `indexer` for the given kind of lookup.
pub fn build_query(
    kind: QueryKind,
    media: MediaKind,
    indexer: &IndexerConfig,
    entry: &QualityIndexer,
) -> IndexerQuery {
    IndexerQuery {
        kind,
        categories: categories_for(media, indexer, entry),
        limit: indexer.limit,
    }
}
