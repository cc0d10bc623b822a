//! Stremio add-on handlers.
//!
//! Every resource is served both bare and behind a user config segment
//! (`/{config}/...`). Only the stream resource uses the config.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use stashcast_core::{materialize_stream_url, ReconciledRecord, SearchCandidate, UserCredentials};
use tracing::debug;

use super::user_config::parse_user_config;
use crate::state::AppState;

pub const ADDON_ID: &str = "com.stremio.stashdb";
pub const ID_PREFIX: &str = "stashdb:";
pub const CONTENT_TYPE: &str = "movie";
pub const CATALOG_ID: &str = "stashdb-trending";

const FILENAME_MAX_CHARS: usize = 50;

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaPreview {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    pub poster: Option<String>,
    pub poster_shape: &'static str,
    pub description: Option<String>,
    pub release_info: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub metas: Vec<MetaPreview>,
}

#[derive(Debug, Serialize)]
pub struct MetaLink {
    pub name: &'static str,
    pub category: &'static str,
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaDetail {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    pub poster: Option<String>,
    pub poster_shape: &'static str,
    pub background: Option<String>,
    pub description: Option<String>,
    pub release_info: Option<String>,
    pub director: Vec<String>,
    pub cast: Vec<String>,
    pub genres: Vec<String>,
    pub runtime: Option<String>,
    pub links: Vec<MetaLink>,
}

#[derive(Debug, Serialize)]
pub struct MetaResponse {
    pub meta: Option<MetaDetail>,
}

#[derive(Debug, Serialize)]
pub struct StreamEntry {
    pub name: String,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct StreamResponse {
    pub streams: Vec<StreamEntry>,
}

// ============================================================================
// Mapping
// ============================================================================

/// First landscape image, else the first image.
fn poster_url(record: &ReconciledRecord) -> Option<String> {
    let images = &record.record.images;
    images
        .iter()
        .find(|img| img.is_landscape())
        .or_else(|| images.first())
        .map(|img| img.url.clone())
}

/// Another landscape image, else the poster.
fn background_url(record: &ReconciledRecord, poster: Option<&str>) -> Option<String> {
    record
        .record
        .images
        .iter()
        .find(|img| img.is_landscape() && Some(img.url.as_str()) != poster)
        .map(|img| img.url.clone())
        .or_else(|| poster.map(str::to_string))
}

fn release_info(record: &ReconciledRecord) -> Option<String> {
    record
        .record
        .release_date
        .map(|d| d.format("%Y-%m-%d").to_string())
}

pub fn to_preview(record: &ReconciledRecord) -> MetaPreview {
    MetaPreview {
        id: format!("{}{}", ID_PREFIX, record.id()),
        kind: CONTENT_TYPE,
        name: record.record.title.clone(),
        poster: poster_url(record),
        poster_shape: "landscape",
        description: record.record.details.clone(),
        release_info: release_info(record),
    }
}

pub fn to_detail(record: &ReconciledRecord) -> MetaDetail {
    let poster = poster_url(record);
    let background = background_url(record, poster.as_deref());

    MetaDetail {
        id: format!("{}{}", ID_PREFIX, record.id()),
        kind: CONTENT_TYPE,
        name: record.record.title.clone(),
        poster,
        poster_shape: "landscape",
        background,
        description: record.record.details.clone(),
        release_info: release_info(record),
        director: record.record.director.iter().cloned().collect(),
        cast: Vec::new(),
        genres: record.record.tags.clone(),
        runtime: record
            .record
            .duration_secs
            .filter(|secs| *secs > 0)
            .map(|secs| format!("{} min", secs / 60)),
        links: vec![MetaLink {
            name: "StashDB",
            category: "imdb",
            url: format!("https://stashdb.org/scenes/{}", record.id()),
        }],
    }
}

fn truncate_filename(name: &str) -> String {
    if name.chars().count() > FILENAME_MAX_CHARS {
        let head: String = name.chars().take(FILENAME_MAX_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        name.to_string()
    }
}

/// Multi-line stream title: quality, codec and size, filename.
pub fn stream_title(candidate: &SearchCandidate) -> String {
    let mut lines = Vec::with_capacity(3);

    if candidate.resolution > 0 {
        lines.push(format!("📺 {}p", candidate.resolution));
    } else {
        lines.push("📺 Unknown Quality".to_string());
    }

    let details: Vec<String> = candidate
        .codec
        .as_ref()
        .map(|c| c.to_string())
        .into_iter()
        .chain(candidate.size_formatted.clone())
        .collect();
    if !details.is_empty() {
        lines.push(format!("⚙️ {}", details.join(" • ")));
    }

    if let Some(filename) = &candidate.filename {
        lines.push(format!("📁 {}", truncate_filename(filename)));
    }

    lines.join("\n")
}

/// Streams for a record. The URL is materialized here and never kept.
pub fn build_streams(
    record: Option<&ReconciledRecord>,
    credentials: Option<&UserCredentials>,
) -> Vec<StreamEntry> {
    let Some(record) = record.filter(|r| r.has_matches()) else {
        return Vec::new();
    };

    let Some(credentials) = credentials else {
        return vec![StreamEntry {
            name: "Configuration Required".to_string(),
            title: "Please reinstall addon with your Easynews credentials".to_string(),
            url: String::new(),
        }];
    };

    record
        .candidates
        .iter()
        .map(|candidate| StreamEntry {
            name: "Easynews".to_string(),
            title: stream_title(candidate),
            url: materialize_stream_url(credentials, &candidate.url),
        })
        .collect()
}

/// Strip the `.json` suffix from the last path segment.
fn resource_id(segment: &str) -> &str {
    segment.strip_suffix(".json").unwrap_or(segment)
}

/// Content id without the add-on prefix.
fn record_id(segment: &str) -> &str {
    let id = resource_id(segment);
    id.strip_prefix(ID_PREFIX).unwrap_or(id)
}

fn param<'a>(params: &'a HashMap<String, String>, key: &str) -> &'a str {
    params.get(key).map(String::as_str).unwrap_or_default()
}

// ============================================================================
// Handlers
// ============================================================================

pub fn manifest_json() -> Value {
    json!({
        "id": ADDON_ID,
        "version": env!("CARGO_PKG_VERSION"),
        "name": "StashDB - Easynews",
        "description": "Stream trending scenes from StashDB via Easynews",
        "resources": ["catalog", "meta", "stream"],
        "types": [CONTENT_TYPE],
        "idPrefixes": [ID_PREFIX],
        "catalogs": [{
            "type": CONTENT_TYPE,
            "id": CATALOG_ID,
            "name": "StashDB",
            "extra": [{ "name": "genre", "isRequired": false, "options": ["Trending"] }]
        }],
        "behaviorHints": {
            "configurable": true,
            "configurationRequired": false
        },
        "config": [
            { "key": "easynewsUsername", "type": "text", "title": "Easynews Username", "required": true },
            { "key": "easynewsPassword", "type": "password", "title": "Easynews Password", "required": true }
        ]
    })
}

/// GET /manifest.json and /{config}/manifest.json
pub async fn manifest() -> Json<Value> {
    Json(manifest_json())
}

/// GET /catalog/{kind}/{catalog_id} and /catalog/{kind}/{catalog_id}/{extra}
///
/// Lists stored records that have at least one candidate, in store order.
/// There is a single listing, so the extra args are ignored.
pub async fn catalog(
    State(state): State<Arc<AppState>>,
    Path(params): Path<HashMap<String, String>>,
) -> Json<CatalogResponse> {
    let kind = param(&params, "kind");
    let catalog_id = resource_id(param(&params, "catalog_id"));

    if kind != CONTENT_TYPE || catalog_id != CATALOG_ID {
        return Json(CatalogResponse { metas: Vec::new() });
    }

    let metas = state
        .store()
        .get_all()
        .await
        .iter()
        .filter(|r| r.has_matches())
        .map(|r| to_preview(r))
        .collect();

    Json(CatalogResponse { metas })
}

/// GET /meta/{kind}/{id}
pub async fn meta(
    State(state): State<Arc<AppState>>,
    Path(params): Path<HashMap<String, String>>,
) -> Json<MetaResponse> {
    if param(&params, "kind") != CONTENT_TYPE {
        return Json(MetaResponse { meta: None });
    }

    let id = record_id(param(&params, "id"));
    let meta = state.store().get(id).await.map(|r| to_detail(&r));
    Json(MetaResponse { meta })
}

/// GET /{config}/stream/{kind}/{id}
///
/// Without a usable config token the response is a single placeholder
/// stream asking the user to configure the add-on.
pub async fn stream(
    State(state): State<Arc<AppState>>,
    Path(params): Path<HashMap<String, String>>,
) -> Json<StreamResponse> {
    if param(&params, "kind") != CONTENT_TYPE {
        return Json(StreamResponse { streams: Vec::new() });
    }

    let id = record_id(param(&params, "id"));
    let credentials = params.get("config").and_then(|token| parse_user_config(token));
    if credentials.is_none() {
        debug!(id, "Stream request without usable user config");
    }

    let record = state.store().get(id).await;
    let streams = build_streams(record.as_deref(), credentials.as_ref());
    Json(StreamResponse { streams })
}
