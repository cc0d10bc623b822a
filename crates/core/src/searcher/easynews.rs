//! Easynews search backend implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::config::FileSearchConfig;
use crate::credentials::OperatorCredentials;
use crate::metrics;

use super::decode::SearchResponse;
use super::{FileSearch, SearchError};

/// Container extensions requested from the provider.
pub const VIDEO_EXTENSIONS: &str = "m4v,3gp,mov,divx,xvid,wmv,avi,mpg,mpeg,mp4,mkv,avc,flv,webm";

/// Easynews search backend.
pub struct EasynewsClient {
    client: Client,
    url: String,
}

impl EasynewsClient {
    /// Create a new Easynews client.
    pub fn new(config: &FileSearchConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| SearchError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    /// Query parameters for one search.
    fn build_query(query: &str) -> Vec<(&'static str, String)> {
        vec![
            ("gps", query.to_string()),
            ("u", "1".to_string()),
            ("fty[]", "VIDEO".to_string()),
            ("fex", VIDEO_EXTENSIONS.to_string()),
        ]
    }

    async fn try_search(
        &self,
        credentials: &OperatorCredentials,
        query: &str,
    ) -> Result<SearchResponse, SearchError> {
        debug!(query, "Searching Easynews");

        let response = self
            .client
            .get(&self.url)
            .query(&Self::build_query(query))
            .basic_auth(credentials.username(), Some(credentials.password()))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout
                } else if e.is_connect() {
                    SearchError::ConnectionFailed(e.to_string())
                } else {
                    SearchError::ApiError(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SearchError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::ApiError(format!(
                "HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::ApiError(format!("Failed to parse response: {}", e)))?;

        debug!(query, results = body.rows().len(), "Easynews search complete");
        Ok(body)
    }
}

#[async_trait]
impl FileSearch for EasynewsClient {
    fn name(&self) -> &str {
        "easynews"
    }

    async fn search(
        &self,
        credentials: &OperatorCredentials,
        query: &str,
    ) -> Option<SearchResponse> {
        let start = Instant::now();
        let result = self.try_search(credentials, query).await;
        metrics::observe_external_call(
            "easynews",
            "search",
            result.is_ok(),
            start.elapsed().as_secs_f64(),
        );

        match result {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(query, error = %e, "Easynews search failed");
                None
            }
        }
    }
}
