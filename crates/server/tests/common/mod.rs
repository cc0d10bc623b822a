//! Common test utilities for router tests with mocks.
//!
//! This module provides a test fixture that wires an in-process router to
//! mock providers, so add-on and operator endpoints can be exercised without
//! reaching StashDB or Easynews.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use stashcast_core::{
    config::{FileSearchConfig, MetadataConfig, RefreshConfig},
    testing::{MockCatalogSource, MockFileSearch},
    Config, ReconciliationPipeline, RefreshScheduler, ResultStore,
};
use stashcast_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use stashcast_core::testing::fixtures;

pub const TEST_API_KEY: &str = "test-stashdb-key";
pub const OPERATOR_USERNAME: &str = "operator";
pub const OPERATOR_PASSWORD: &str = "operator-secret";

/// Test fixture with mock providers behind a real router.
///
/// The scheduler is never started; tests run cycles explicitly with
/// [`TestFixture::refresh`].
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock trending catalog
    pub catalog: Arc<MockCatalogSource>,
    /// Mock file search - configure per-query responses
    pub search: Arc<MockFileSearch>,
    pub store: Arc<ResultStore>,
    pub scheduler: Arc<RefreshScheduler>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    pub fn new() -> Self {
        let catalog = Arc::new(MockCatalogSource::new());
        let search = Arc::new(MockFileSearch::new());
        let store = Arc::new(ResultStore::new());

        let config = Config {
            server: Default::default(),
            metadata: MetadataConfig {
                api_key: TEST_API_KEY.to_string(),
                ..Default::default()
            },
            file_search: FileSearchConfig {
                username: OPERATOR_USERNAME.to_string(),
                password: OPERATOR_PASSWORD.to_string(),
                ..Default::default()
            },
            refresh: RefreshConfig {
                record_delay_ms: 0,
                ..Default::default()
            },
        };

        let pipeline = Arc::new(ReconciliationPipeline::new(
            catalog.clone(),
            search.clone(),
            config.file_search.operator_credentials(),
            Arc::clone(&store),
            &config.refresh,
        ));
        let scheduler = Arc::new(RefreshScheduler::new(
            pipeline,
            std::time::Duration::from_secs(config.refresh.interval_secs),
        ));

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&store),
            Arc::clone(&scheduler),
        ));

        Self {
            router: create_router(state),
            catalog,
            search,
            store,
            scheduler,
        }
    }

    /// Fixture whose store holds one matched record (`matched`, two
    /// candidates) and one searched record without candidates (`empty`).
    pub async fn populated() -> Self {
        let fixture = Self::new();
        fixture
            .catalog
            .set_records(vec![
                fixtures::catalog_record("matched", "Studio", "2024-03-15"),
                fixtures::catalog_record("empty", "Other", "2024-04-01"),
            ])
            .await;
        fixture
            .search
            .set_response(
                "Studio.24.03.15",
                fixtures::search_response(vec![
                    fixtures::raw_row("h1", "Studio.24.03.15.Scene.720p", 720),
                    fixtures::raw_row("h2", "Studio.24.03.15.Scene.1080p", 1080),
                ]),
            )
            .await;
        fixture.refresh().await;
        fixture
    }

    /// Trigger a cycle and wait for it to finish.
    pub async fn refresh(&self) {
        assert!(self.scheduler.trigger().started());
        self.scheduler.wait_idle().await;
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path).await
    }

    /// Send a POST request without a body.
    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path).await
    }

    /// GET returning the raw body text (for non-JSON endpoints).
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let (status, bytes) = self.send("GET", path).await;
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn request(&self, method: &str, path: &str) -> TestResponse {
        let (status, bytes) = self.send(method, path).await;
        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse { status, body }
    }

    async fn send(&self, method: &str, path: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, body_bytes.to_vec())
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
