//! StashDB GraphQL client.
//!
//! StashDB authenticates with an `ApiKey` header. Trending scenes are
//! paginated at a fixed page size.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::MetadataConfig;
use crate::metrics;

use super::types::{parse_release_date, CatalogImage, CatalogRecord};
use super::{CatalogSource, CatalogSourceError};

/// Rows requested per page.
pub const PAGE_SIZE: usize = 25;

const TRENDING_SCENES_QUERY: &str = r#"
  query QueryScenes($page: Int!) {
    queryScenes(input: { page: $page, per_page: 25, sort: TRENDING }) {
      scenes {
        id
        title
        details
        date
        release_date
        duration
        director
        code
        studio { id name }
        tags { id name }
        images { url width height }
      }
      count
    }
  }
"#;

/// StashDB API client.
pub struct StashDbClient {
    client: Client,
    url: String,
    api_key: String,
    page_delay: Duration,
}

impl StashDbClient {
    /// Create a new StashDB client.
    pub fn new(config: &MetadataConfig) -> Result<Self, CatalogSourceError> {
        if config.api_key.is_empty() {
            return Err(CatalogSourceError::NotConfigured(
                "StashDB API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            api_key: config.api_key.clone(),
            page_delay: Duration::from_millis(config.page_delay_ms),
        })
    }

    /// Fetch one page of trending scenes (1-indexed).
    async fn fetch_page(&self, page: u32) -> Result<Vec<CatalogRecord>, CatalogSourceError> {
        let start = Instant::now();
        let result = self.request_page(page).await;
        metrics::observe_external_call(
            "stashdb",
            "query_scenes",
            result.is_ok(),
            start.elapsed().as_secs_f64(),
        );
        result
    }

    async fn request_page(&self, page: u32) -> Result<Vec<CatalogRecord>, CatalogSourceError> {
        debug!(page, "StashDB trending query");

        let response = self
            .client
            .post(&self.url)
            .header("ApiKey", &self.api_key)
            .json(&json!({
                "query": TRENDING_SCENES_QUERY,
                "variables": { "page": page },
            }))
            .send()
            .await?;

        let status = response.status();
        if status == 401 || status == 403 {
            return Err(CatalogSourceError::NotConfigured(
                "Invalid StashDB API key".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogSourceError::ApiError {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let body: GraphQlResponse = response.json().await.map_err(|e| {
            CatalogSourceError::ParseError(format!("Failed to parse scenes response: {}", e))
        })?;

        decode_page(body)
    }
}

#[async_trait]
impl CatalogSource for StashDbClient {
    fn name(&self) -> &str {
        "stashdb"
    }

    async fn fetch_trending(&self, target_count: usize) -> Vec<CatalogRecord> {
        collect_pages(target_count, self.page_delay, |page| self.fetch_page(page)).await
    }
}

/// Drive pagination until `target_count` records are collected, a short page
/// signals the end, or a page fails. Errors keep what was already collected.
pub async fn collect_pages<F, Fut>(
    target_count: usize,
    page_delay: Duration,
    mut fetch_page: F,
) -> Vec<CatalogRecord>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<CatalogRecord>, CatalogSourceError>>,
{
    let max_pages = target_count.div_ceil(PAGE_SIZE) as u32;
    let mut records: Vec<CatalogRecord> = Vec::with_capacity(target_count);

    for page in 1..=max_pages {
        match fetch_page(page).await {
            Ok(rows) => {
                let row_count = rows.len();
                records.extend(rows);
                debug!(page, rows = row_count, "Fetched trending page");

                if row_count < PAGE_SIZE {
                    break;
                }
            }
            Err(e) => {
                warn!(page, error = %e, collected = records.len(), "Trending fetch stopped early");
                break;
            }
        }

        if page < max_pages && !page_delay.is_zero() {
            tokio::time::sleep(page_delay).await;
        }
    }

    records.truncate(target_count);
    info!(records = records.len(), target = target_count, "Trending catalog fetched");
    records
}

fn decode_page(body: GraphQlResponse) -> Result<Vec<CatalogRecord>, CatalogSourceError> {
    if let Some(errors) = body.errors.filter(|e| !e.is_empty()) {
        let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
        return Err(CatalogSourceError::GraphQl(messages.join("; ")));
    }

    let data = body
        .data
        .ok_or_else(|| CatalogSourceError::ParseError("response has no data".to_string()))?;

    Ok(data
        .query_scenes
        .scenes
        .into_iter()
        .map(CatalogRecord::from)
        .collect())
}

// StashDB API response types
#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<QueryScenesData>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct QueryScenesData {
    #[serde(rename = "queryScenes")]
    query_scenes: QueryScenesResult,
}

#[derive(Debug, Deserialize)]
struct QueryScenesResult {
    #[serde(default)]
    scenes: Vec<SceneRow>,
    #[allow(dead_code)]
    #[serde(default)]
    count: u64,
}

#[derive(Debug, Deserialize)]
struct SceneRow {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    duration: Option<u32>,
    #[serde(default)]
    director: Option<String>,
    #[serde(default)]
    studio: Option<StudioRow>,
    #[serde(default)]
    tags: Vec<TagRow>,
    #[serde(default)]
    images: Vec<ImageRow>,
}

#[derive(Debug, Deserialize)]
struct StudioRow {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagRow {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageRow {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

impl From<SceneRow> for CatalogRecord {
    fn from(row: SceneRow) -> Self {
        let release_date = [row.date.as_deref(), row.release_date.as_deref()]
            .into_iter()
            .flatten()
            .find_map(parse_release_date);

        Self {
            id: row.id,
            title: row.title.unwrap_or_default(),
            details: row.details.filter(|d| !d.is_empty()),
            release_date,
            duration_secs: row.duration.filter(|d| *d > 0),
            studio_name: row.studio.and_then(|s| s.name),
            director: row.director.filter(|d| !d.is_empty()),
            tags: row.tags.into_iter().filter_map(|t| t.name).collect(),
            images: row
                .images
                .into_iter()
                .filter_map(|i| {
                    i.url.filter(|u| !u.is_empty()).map(|url| CatalogImage {
                        url,
                        width: i.width,
                        height: i.height,
                    })
                })
                .collect(),
        }
    }
}
