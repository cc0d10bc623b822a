//! Catalog record types and search-key derivation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One media item from the metadata provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogRecord {
    /// Provider identifier, stable across cycles.
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Release date (first parseable of the provider's date fields).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<NaiveDate>,
    /// Runtime in seconds. `None` when the provider does not know it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub studio_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<CatalogImage>,
}

/// An image attached to a catalog record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogImage {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl CatalogImage {
    /// Wider than tall. Images without dimensions are not landscape.
    pub fn is_landscape(&self) -> bool {
        match (self.width, self.height) {
            (Some(w), Some(h)) => w > 0 && h > 0 && w > h,
            _ => false,
        }
    }
}

/// Date tokens as they appear in release filenames: `YY`, `MM`, `DD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParts {
    pub yy: String,
    pub mm: String,
    pub dd: String,
}

/// Two-digit year, zero-padded month and day.
pub fn format_date_parts(date: Option<NaiveDate>) -> Option<DateParts> {
    let date = date?;
    Some(DateParts {
        yy: date.format("%y").to_string(),
        mm: date.format("%m").to_string(),
        dd: date.format("%d").to_string(),
    })
}

/// Keep only ASCII letters and digits. Returns `None` if nothing is left.
pub fn normalize_studio_name(name: &str) -> Option<String> {
    let normalized: String = name.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Search key `{Studio}.{YY}.{MM}.{DD}`, or `None` if the record is unsearchable.
pub fn build_search_key(record: &CatalogRecord) -> Option<String> {
    let parts = format_date_parts(record.release_date)?;
    let studio = normalize_studio_name(record.studio_name.as_deref()?)?;
    Some(format!("{}.{}.{}.{}", studio, parts.yy, parts.mm, parts.dd))
}

/// Parse a provider date string. Accepts `YYYY-MM-DD` optionally followed by
/// a time component.
pub fn parse_release_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}
