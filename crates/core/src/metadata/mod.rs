//! Metadata source integration.
//!
//! Fetches the trending catalog from StashDB and derives the file-search key
//! for each record.

mod stashdb;
mod types;

pub use stashdb::{collect_pages, StashDbClient, PAGE_SIZE};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the metadata provider.
#[derive(Debug, Error)]
pub enum CatalogSourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// GraphQL response carried an error list.
    #[error("GraphQL errors: {0}")]
    GraphQl(String),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing API key, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

/// Trait for trending-catalog providers.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Fetch up to `target_count` trending records.
    ///
    /// Never fails: a transport or protocol error stops pagination and the
    /// pages collected so far are returned. Callers must not assume the
    /// target count is met.
    async fn fetch_trending(&self, target_count: usize) -> Vec<CatalogRecord>;
}
