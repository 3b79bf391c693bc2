//! Feed search integration tests.
//!
//! Covers cursor handling, resolving feed items to library entries,
//! importing unknown movies and cursor persistence.

use std::sync::Arc;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use scoutarr_core::{
    search::IndexerStatus,
    testing::{fixtures, MockDownloadHistory, MockIndexerGateway, MockMediaCatalog},
    Config, EpisodeTarget, IndexerError, MediaKind, MovieTarget, RejectReason, RssCursorStore,
    RssSearchRequest, SearchOrchestrator, SqliteRssCursorStore,
};

struct TestHarness {
    gateway: Arc<MockIndexerGateway>,
    catalog: Arc<MockMediaCatalog>,
    history: Arc<MockDownloadHistory>,
}

impl TestHarness {
    fn new() -> Self {
        let catalog = Arc::new(MockMediaCatalog::new());
        catalog.add_movie(
            MovieTarget::new(1, "The Matrix", "hd")
                .with_year(1999)
                .with_external_id("tt0133093"),
        );
        catalog.add_movie(MovieTarget::new(2, "Heat", "hd").with_year(1995));
        Self {
            gateway: Arc::new(MockIndexerGateway::new()),
            catalog,
            history: Arc::new(MockDownloadHistory::new()),
        }
    }

    fn orchestrator(&self, config: Config) -> SearchOrchestrator {
        SearchOrchestrator::new(
            config,
            self.gateway.clone(),
            self.catalog.clone(),
            self.history.clone(),
        )
    }
}

fn config() -> Config {
    fixtures::config(&["geek"], vec![fixtures::profile("hd", &["geek"])])
}

fn titles(outcome: &scoutarr_core::SearchOutcome) -> Vec<&str> {
    outcome.accepted.iter().map(|c| c.title.as_str()).collect()
}

#[tokio::test]
async fn test_cursor_limits_second_poll_to_new_items() {
    let harness = TestHarness::new();
    harness
        .gateway
        .set_results(
            "geek",
            vec![
                fixtures::feed_item("The.Matrix.1999.1080p.BluRay.x264-A", "geek", "guid-3"),
                fixtures::feed_item("Heat.1995.720p.BluRay.x264-B", "geek", "guid-2"),
                fixtures::feed_item("The.Matrix.1999.720p.HDTV.x264-C", "geek", "guid-1"),
            ],
        )
        .await;
    let orchestrator = harness.orchestrator(config());
    let request = RssSearchRequest::new("hd", MediaKind::Movie);
    let cancel = CancellationToken::new();

    let first = orchestrator.search_rss(&request, &cancel).await;
    assert_eq!(first.accepted.len(), 3);
    assert_eq!(first.accepted[0].strategy, "feed");

    harness
        .gateway
        .set_results(
            "geek",
            vec![
                fixtures::feed_item("Heat.1995.1080p.WEB-DL.x264-D", "geek", "guid-4"),
                fixtures::feed_item("The.Matrix.1999.1080p.BluRay.x264-A", "geek", "guid-3"),
                fixtures::feed_item("Heat.1995.720p.BluRay.x264-B", "geek", "guid-2"),
            ],
        )
        .await;

    let second = orchestrator.search_rss(&request, &cancel).await;
    assert_eq!(titles(&second), vec!["Heat.1995.1080p.WEB-DL.x264-D"]);
    assert!(second.rejected.is_empty());

    // Feed searches never touch the last-scan time.
    assert!(harness.catalog.scans().is_empty());
}

#[tokio::test]
async fn test_unknown_items_are_rejected() {
    let harness = TestHarness::new();
    harness
        .gateway
        .set_results(
            "geek",
            vec![
                fixtures::feed_item("Unknown.Movie.2021.1080p.WEB-DL.x264-A", "geek", "guid-2"),
                fixtures::feed_item("Heat.1995.1080p.BluRay.x264-B", "geek", "guid-1"),
            ],
        )
        .await;
    let orchestrator = harness.orchestrator(config());

    let outcome = orchestrator
        .search_rss(
            &RssSearchRequest::new("hd", MediaKind::Movie),
            &CancellationToken::new(),
        )
        .await;
    assert_eq!(titles(&outcome), vec!["Heat.1995.1080p.BluRay.x264-B"]);
    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(
        outcome.rejected[0].reject_reason(),
        Some(&RejectReason::UnknownTarget)
    );
    assert!(harness.catalog.imported().is_empty());
}

#[tokio::test]
async fn test_items_of_other_profiles_are_rejected() {
    let harness = TestHarness::new();
    harness
        .catalog
        .add_movie(MovieTarget::new(3, "Ronin", "uhd").with_year(1998));
    harness
        .gateway
        .set_results(
            "geek",
            vec![
                fixtures::feed_item("Ronin.1998.1080p.BluRay.x264-GRP", "geek", "guid-2"),
                fixtures::feed_item("Heat.1995.1080p.BluRay.x264-B", "geek", "guid-1"),
            ],
        )
        .await;
    let orchestrator = harness.orchestrator(config());

    let outcome = orchestrator
        .search_rss(
            &RssSearchRequest::new("hd", MediaKind::Movie),
            &CancellationToken::new(),
        )
        .await;
    assert_eq!(titles(&outcome), vec!["Heat.1995.1080p.BluRay.x264-B"]);
    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(outcome.rejected[0].title, "Ronin.1998.1080p.BluRay.x264-GRP");
    assert_eq!(
        outcome.rejected[0].reject_reason(),
        Some(&RejectReason::ProfileMismatch("uhd".to_string()))
    );
}

#[tokio::test]
async fn test_add_if_not_found_imports_movie() {
    let harness = TestHarness::new();
    harness.catalog.add_importable(
        MovieTarget::new(0, "Inception", "")
            .with_year(2010)
            .with_external_id("tt1375666"),
    );
    let mut item = fixtures::feed_item("Inception.2010.1080p.BluRay.x264-GRP", "geek", "guid-1");
    item.external_movie_id = Some("tt1375666".to_string());
    harness.gateway.set_results("geek", vec![item]).await;

    let orchestrator = harness.orchestrator(config());
    let mut request = RssSearchRequest::new("hd", MediaKind::Movie);
    request.add_if_not_found = true;

    let outcome = orchestrator
        .search_rss(&request, &CancellationToken::new())
        .await;
    assert_eq!(titles(&outcome), vec!["Inception.2010.1080p.BluRay.x264-GRP"]);
    assert_eq!(harness.catalog.imported(), vec!["tt1375666".to_string()]);
}

#[tokio::test]
async fn test_episode_feed() {
    let harness = TestHarness::new();
    harness
        .catalog
        .add_episode(EpisodeTarget::new(10, "Show Name", 1, 2, "hd").with_series_id(81189));
    let mut by_id = fixtures::feed_item("Show.Name.S01E02.1080p.WEB-DL.x264-A", "geek", "guid-2");
    by_id.external_series_id = Some("81189".to_string());
    harness
        .gateway
        .set_results(
            "geek",
            vec![
                by_id,
                fixtures::feed_item("Show.Name.S01E02.720p.HDTV.x264-B", "geek", "guid-1"),
                fixtures::feed_item("Show.Name.S01E03.720p.HDTV.x264-C", "geek", "guid-0"),
            ],
        )
        .await;
    let orchestrator = harness.orchestrator(config());

    let outcome = orchestrator
        .search_rss(
            &RssSearchRequest::new("hd", MediaKind::Series),
            &CancellationToken::new(),
        )
        .await;
    assert_eq!(outcome.accepted.len(), 2);
    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(
        outcome.rejected[0].reject_reason(),
        Some(&RejectReason::UnknownTarget)
    );

    let queries = harness.gateway.queries_for("geek").await;
    assert_eq!(queries[0].categories, vec![5000]);
}

#[tokio::test]
async fn test_cursor_not_advanced_when_fetch_fails() {
    let harness = TestHarness::new();
    harness
        .gateway
        .set_results(
            "geek",
            vec![fixtures::feed_item("Heat.1995.1080p.BluRay.x264-B", "geek", "guid-1")],
        )
        .await;
    harness
        .gateway
        .set_error("geek", IndexerError::ApiError("HTTP 503".into()))
        .await;

    let cursors = Arc::new(SqliteRssCursorStore::in_memory().unwrap());
    let orchestrator = harness
        .orchestrator(config())
        .with_cursor_store(cursors.clone());

    let outcome = orchestrator
        .search_rss(
            &RssSearchRequest::new("hd", MediaKind::Movie),
            &CancellationToken::new(),
        )
        .await;
    assert!(outcome.accepted.is_empty());
    assert!(matches!(
        outcome.report("geek").unwrap().status,
        IndexerStatus::Failed(_)
    ));
    assert!(cursors.get_cursor("hd", "geek").unwrap().is_none());
}

#[tokio::test]
async fn test_cursor_persists_across_orchestrators() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cursors.db");
    let harness = TestHarness::new();
    harness
        .gateway
        .set_results(
            "geek",
            vec![
                fixtures::feed_item("Heat.1995.1080p.BluRay.x264-B", "geek", "guid-2"),
                fixtures::feed_item("The.Matrix.1999.1080p.BluRay.x264-A", "geek", "guid-1"),
            ],
        )
        .await;
    let request = RssSearchRequest::new("hd", MediaKind::Movie);
    let cancel = CancellationToken::new();

    {
        let store = Arc::new(SqliteRssCursorStore::new(&path).unwrap());
        let orchestrator = harness.orchestrator(config()).with_cursor_store(store);
        let outcome = orchestrator.search_rss(&request, &cancel).await;
        assert_eq!(outcome.accepted.len(), 2);
    }

    let store = Arc::new(SqliteRssCursorStore::new(&path).unwrap());
    assert_eq!(
        store.get_cursor("hd", "geek").unwrap().as_deref(),
        Some("guid-2")
    );
    let orchestrator = harness.orchestrator(config()).with_cursor_store(store);
    let outcome = orchestrator.search_rss(&request, &cancel).await;
    assert!(outcome.accepted.is_empty());
    assert!(outcome.rejected.is_empty());
}
