//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the provider traits, so the
//! pipeline, scheduler and HTTP layer can be exercised without network
//! access.
//!
//! # Example
//!
//! ```rust,ignore
//! use stashcast_core::testing::{fixtures, MockCatalogSource, MockFileSearch};
//!
//! let catalog = MockCatalogSource::with_records(vec![
//!     fixtures::catalog_record("scene-1", "Studio", "2024-03-15"),
//! ]);
//! let search = MockFileSearch::new();
//! search.set_response(
//!     "Studio.24.03.15",
//!     fixtures::search_response(vec![fixtures::raw_row("h1", "Studio.24.03.15.A", 1080)]),
//! ).await;
//! ```

mod mock_catalog_source;
mod mock_file_search;

pub use mock_catalog_source::MockCatalogSource;
pub use mock_file_search::{MockFileSearch, RecordedSearch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use serde_json::{json, Value};

    use crate::metadata::{parse_release_date, CatalogImage, CatalogRecord};
    use crate::searcher::SearchResponse;

    /// Routing fields used by [`search_response`].
    pub const DOWN_URL: &str = "https://members.easynews.com/dl";
    pub const DL_FARM: &str = "auto";
    pub const DL_PORT: u16 = 443;

    /// Create a catalog record with reasonable defaults.
    ///
    /// `date` is `YYYY-MM-DD`; pass an empty string for no date.
    pub fn catalog_record(id: &str, studio: &str, date: &str) -> CatalogRecord {
        CatalogRecord {
            id: id.to_string(),
            title: format!("Scene {}", id),
            details: Some(format!("Details for {}.", id)),
            release_date: parse_release_date(date),
            duration_secs: None,
            studio_name: if studio.is_empty() {
                None
            } else {
                Some(studio.to_string())
            },
            director: None,
            tags: vec!["Tag One".to_string(), "Tag Two".to_string()],
            images: vec![
                CatalogImage {
                    url: format!("https://cdn.example/{}/landscape.jpg", id),
                    width: Some(1280),
                    height: Some(720),
                },
                CatalogImage {
                    url: format!("https://cdn.example/{}/portrait.jpg", id),
                    width: Some(600),
                    height: Some(900),
                },
            ],
        }
    }

    /// Raw provider row with a hash, title and vertical resolution.
    pub fn raw_row(hash: &str, title: &str, yres: u32) -> Value {
        json!({
            "0": hash,
            "4": "1.2 GB",
            "10": title,
            "11": ".mkv",
            "12": "H264",
            "yres": yres,
        })
    }

    /// Raw provider row that also carries a runtime in seconds.
    pub fn raw_row_with_runtime(hash: &str, title: &str, yres: u32, runtime: u32) -> Value {
        let mut row = raw_row(hash, title, yres);
        row["runtime"] = json!(runtime);
        row
    }

    /// Search response with the fixture routing fields.
    pub fn search_response(rows: Vec<Value>) -> SearchResponse {
        serde_json::from_value(json!({
            "downURL": DOWN_URL,
            "dlFarm": DL_FARM,
            "dlPort": DL_PORT,
            "data": rows,
        }))
        .expect("fixture rows must decode")
    }

    /// Expected credential-free URL for a [`raw_row`] fixture.
    pub fn candidate_url(hash: &str, title: &str) -> String {
        format!(
            "{}/{}/{}/{}.mkv/{}.mkv",
            DOWN_URL, DL_FARM, DL_PORT, hash, title
        )
    }
}
