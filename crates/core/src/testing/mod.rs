//! Testing utilities and mock collaborators.
//!
//! Mocks for every trait the engine calls out to, so full searches can run
//! without indexers or a real media library.
//!
//! # Example
//!
//! ```rust,ignore
//! use scoutarr_core::testing::{fixtures, MockDownloadHistory, MockIndexerGateway, MockMediaCatalog};
//!
//! let gateway = MockIndexerGateway::new();
//! gateway.set_results("geek", vec![fixtures::release("Heat.1995.1080p.BluRay.x264", "geek")]).await;
//! gateway.set_error("drunk", IndexerError::ConnectionFailed("refused".into())).await;
//!
//! let orchestrator = SearchOrchestrator::new(config, Arc::new(gateway), catalog, history);
//! ```

mod mock_catalog;
mod mock_gateway;
mod mock_history;

pub use mock_catalog::MockMediaCatalog;
pub use mock_gateway::{MockIndexerGateway, RecordedQuery};
pub use mock_history::MockDownloadHistory;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::config::{Config, IndexerConfig, QualityIndexer, QualityProfile};
    use crate::indexer::RawRelease;

    const GB: u64 = 1024 * 1024 * 1024;

    /// A release with a URL derived from its title and a 4 GB size.
    pub fn release(title: &str, indexer: &str) -> RawRelease {
        let url = format!("https://{}.example/get/{}", indexer, title.replace(' ', "."));
        RawRelease::new(title, url, 4 * GB, indexer)
    }

    /// A feed item carrying a guid.
    pub fn feed_item(title: &str, indexer: &str, item_id: &str) -> RawRelease {
        let mut item = release(title, indexer);
        item.item_id = Some(item_id.to_string());
        item
    }

    /// A profile that checks title and year and queries the given indexers.
    pub fn profile(name: &str, indexers: &[&str]) -> QualityProfile {
        QualityProfile {
            name: name.to_string(),
            check_title: true,
            check_year: true,
            indexers: indexers.iter().map(|i| QualityIndexer::new(*i)).collect(),
            ..Default::default()
        }
    }

    /// Config with the given indexers (all enabled) and profiles.
    pub fn config(indexers: &[&str], profiles: Vec<QualityProfile>) -> Config {
        Config {
            indexers: indexers.iter().map(|i| IndexerConfig::new(*i)).collect(),
            quality_profiles: profiles,
            ..Default::default()
        }
    }
}
