//! Reconciliation cycle integration tests.
//!
//! These tests run full cycles against mock providers and check what ends up
//! in the result store: fetch -> search -> filter -> rank -> publish.

use std::sync::Arc;
use std::time::Duration;

use stashcast_core::{
    config::RefreshConfig,
    searcher::Codec,
    testing::{fixtures, MockCatalogSource, MockFileSearch},
    OperatorCredentials, PipelineError, ReconciliationPipeline, ResultStore,
};

/// Test helper wiring mocks into a pipeline.
struct TestHarness {
    catalog: Arc<MockCatalogSource>,
    search: Arc<MockFileSearch>,
    store: Arc<ResultStore>,
    pipeline: ReconciliationPipeline,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_target(100)
    }

    fn with_target(target_count: usize) -> Self {
        Self::with_config(RefreshConfig {
            target_count,
            record_delay_ms: 0,
            ..Default::default()
        })
    }

    fn with_config(config: RefreshConfig) -> Self {
        let catalog = Arc::new(MockCatalogSource::new());
        let search = Arc::new(MockFileSearch::new());
        let store = Arc::new(ResultStore::new());

        let pipeline = ReconciliationPipeline::new(
            catalog.clone(),
            search.clone(),
            OperatorCredentials::new("operator", "operator-secret"),
            store.clone(),
            &config,
        );

        Self {
            catalog,
            search,
            store,
            pipeline,
        }
    }
}

#[tokio::test]
async fn test_three_record_cycle() {
    let h = TestHarness::new();

    // A: two matching rows. B: rows whose dates are out of order.
    // C: no release date, so no search key.
    h.catalog
        .set_records(vec![
            fixtures::catalog_record("a", "Alpha Studio", "2024-03-15"),
            fixtures::catalog_record("b", "Beta", "2024-05-20"),
            fixtures::catalog_record("c", "Gamma", ""),
        ])
        .await;
    h.search
        .set_response(
            "AlphaStudio.24.03.15",
            fixtures::search_response(vec![
                fixtures::raw_row("h1", "AlphaStudio.24.03.15.Scene.720p", 720),
                fixtures::raw_row("h2", "AlphaStudio.24.03.15.Scene.2160p", 2160),
                fixtures::raw_row("h3", "Unrelated.Release.1080p", 1080),
            ]),
        )
        .await;
    h.search
        .set_response(
            "Beta.24.05.20",
            fixtures::search_response(vec![
                fixtures::raw_row("h4", "Beta.20.05.24.Scene", 1080),
                fixtures::raw_row("h5", "Beta.05.24.20.Scene", 720),
            ]),
        )
        .await;

    let report = h.pipeline.run_cycle().await.unwrap();
    assert_eq!(report.fetched, 3);
    assert_eq!(report.matched, 1);
    assert_eq!(report.no_match, 1);
    assert_eq!(report.unsearchable, 1);
    assert_eq!(report.search_failed, 0);
    assert_eq!(report.stored, 2);

    let a = h.store.get("a").await.expect("a stored");
    let resolutions: Vec<_> = a.candidates.iter().map(|c| c.resolution).collect();
    assert_eq!(resolutions, vec![2160, 720]);
    assert_eq!(
        a.candidates[0].url,
        fixtures::candidate_url("h2", "AlphaStudio.24.03.15.Scene.2160p")
    );
    assert_eq!(a.candidates[0].codec, Some(Codec::H264));

    let b = h.store.get("b").await.expect("b stored with no candidates");
    assert!(b.candidates.is_empty());

    assert!(h.store.get("c").await.is_none());

    // Only searchable records hit the file search.
    assert_eq!(h.search.search_count().await, 2);
}

#[tokio::test]
async fn test_search_uses_operator_credentials() {
    let h = TestHarness::new();
    h.catalog
        .set_records(vec![fixtures::catalog_record("a", "Studio", "2024-03-15")])
        .await;

    h.pipeline.run_cycle().await.unwrap();

    let searches = h.search.recorded_searches().await;
    assert_eq!(searches.len(), 1);
    assert_eq!(searches[0].query, "Studio.24.03.15");
    assert_eq!(searches[0].username, "operator");
}

#[tokio::test]
async fn test_stored_urls_carry_no_credentials() {
    let h = TestHarness::new();
    h.catalog
        .set_records(vec![fixtures::catalog_record("a", "Studio", "2024-03-15")])
        .await;
    h.search
        .set_response(
            "Studio.24.03.15",
            fixtures::search_response(vec![fixtures::raw_row("h1", "Studio.24.03.15.A", 1080)]),
        )
        .await;

    h.pipeline.run_cycle().await.unwrap();

    for record in h.store.get_all().await {
        let json = serde_json::to_string(&*record).unwrap();
        assert!(!json.contains("operator"));
        for candidate in &record.candidates {
            assert!(!candidate.url.contains('@'));
        }
    }
}

#[tokio::test]
async fn test_failed_search_is_skipped_not_stored() {
    let h = TestHarness::new();
    h.catalog
        .set_records(vec![
            fixtures::catalog_record("a", "Broken", "2024-03-15"),
            fixtures::catalog_record("b", "Working", "2024-03-15"),
        ])
        .await;
    h.search.set_failure("Broken.24.03.15").await;
    h.search
        .set_response(
            "Working.24.03.15",
            fixtures::search_response(vec![fixtures::raw_row("h1", "Working.24.03.15.A", 480)]),
        )
        .await;

    let report = h.pipeline.run_cycle().await.unwrap();
    assert_eq!(report.search_failed, 1);
    assert_eq!(report.matched, 1);
    assert!(h.store.get("a").await.is_none());
    assert!(h.store.get("b").await.unwrap().has_matches());
}

#[tokio::test]
async fn test_duration_hint_filters_rows() {
    let h = TestHarness::new();
    let mut record = fixtures::catalog_record("a", "Studio", "2024-03-15");
    record.duration_secs = Some(1200);
    h.catalog.set_records(vec![record]).await;
    h.search
        .set_response(
            "Studio.24.03.15",
            fixtures::search_response(vec![
                fixtures::raw_row_with_runtime("h1", "Studio.24.03.15.Close", 1080, 1203),
                fixtures::raw_row_with_runtime("h2", "Studio.24.03.15.Far", 2160, 1210),
                fixtures::raw_row("h3", "Studio.24.03.15.Unknown", 720),
            ]),
        )
        .await;

    h.pipeline.run_cycle().await.unwrap();

    let a = h.store.get("a").await.unwrap();
    let names: Vec<_> = a
        .candidates
        .iter()
        .map(|c| c.filename.clone().unwrap_or_default())
        .collect();
    assert_eq!(names, vec!["Studio.24.03.15.Close", "Studio.24.03.15.Unknown"]);
}

#[tokio::test]
async fn test_empty_catalog_keeps_previous_results() {
    let h = TestHarness::new();
    h.catalog
        .set_records(vec![fixtures::catalog_record("a", "Studio", "2024-03-15")])
        .await;
    h.pipeline.run_cycle().await.unwrap();
    assert_eq!(h.store.len().await, 1);

    h.catalog.set_records(vec![]).await;
    let err = h.pipeline.run_cycle().await.unwrap_err();
    assert!(matches!(err, PipelineError::EmptyCatalog));
    assert_eq!(h.store.len().await, 1);
}

#[tokio::test]
async fn test_new_cycle_replaces_previous_table() {
    let h = TestHarness::new();
    h.catalog
        .set_records(vec![
            fixtures::catalog_record("a", "Studio", "2024-03-15"),
            fixtures::catalog_record("b", "Studio", "2024-03-16"),
        ])
        .await;
    h.pipeline.run_cycle().await.unwrap();
    assert_eq!(h.store.len().await, 2);

    h.catalog
        .set_records(vec![fixtures::catalog_record("c", "Studio", "2024-03-17")])
        .await;
    h.pipeline.run_cycle().await.unwrap();

    let ids: Vec<_> = h
        .store
        .get_all()
        .await
        .iter()
        .map(|r| r.id().to_string())
        .collect();
    assert_eq!(ids, vec!["c"]);
}

#[tokio::test]
async fn test_target_count_limits_fetch() {
    let h = TestHarness::with_target(2);
    h.catalog
        .set_records(vec![
            fixtures::catalog_record("a", "Studio", "2024-03-15"),
            fixtures::catalog_record("b", "Studio", "2024-03-16"),
            fixtures::catalog_record("c", "Studio", "2024-03-17"),
        ])
        .await;

    let report = h.pipeline.run_cycle().await.unwrap();
    assert_eq!(report.fetched, 2);
    assert_eq!(h.store.len().await, 2);
}

#[tokio::test(start_paused = true)]
async fn test_record_delay_between_searches() {
    let h = TestHarness::with_config(RefreshConfig {
        record_delay_ms: 500,
        ..Default::default()
    });
    h.catalog
        .set_records(vec![
            fixtures::catalog_record("a", "Studio", "2024-03-15"),
            fixtures::catalog_record("b", "Studio", ""),
            fixtures::catalog_record("c", "Studio", "2024-03-16"),
            fixtures::catalog_record("d", "Studio", "2024-03-17"),
        ])
        .await;

    let start = tokio::time::Instant::now();
    let report = h.pipeline.run_cycle().await.unwrap();
    assert_eq!(report.unsearchable, 1);

    let searches = h.search.recorded_searches().await;
    let offsets: Vec<_> = searches
        .iter()
        .map(|s| s.timestamp.duration_since(start))
        .collect();
    // No pause before the first search or for the unsearchable record.
    assert_eq!(
        offsets,
        vec![
            Duration::ZERO,
            Duration::from_millis(500),
            Duration::from_millis(1000),
        ]
    );
    assert_eq!(start.elapsed(), Duration::from_millis(1000));
}
