//! Decoding of raw Easynews search responses.
//!
//! Rows arrive as JSON objects mixing positional keys (`"0"`, `"10"`, ...)
//! with named ones. This module is the only place that knows those keys;
//! everything downstream works with [`SearchCandidate`].

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Deserialize;

use crate::credentials::UserCredentials;

use super::types::{Codec, FieldValue, SearchCandidate};

const GIB: f64 = 1_073_741_824.0;
const MIB: f64 = 1_048_576.0;
const KIB: f64 = 1024.0;

static DURATION_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:(\d+)m)?:?(?:(\d+)s)?").unwrap());
static SIZE_TEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\d+\.?\d*\s*(GB|MB|KB)").unwrap());
static FULL_RESOLUTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+)\s*x\s*(\d+)").unwrap());

/// Raw search response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    data: Vec<RawResultRow>,
    #[serde(rename = "downURL", default)]
    down_url: Option<FieldValue>,
    #[serde(rename = "dlFarm", default)]
    dl_farm: Option<FieldValue>,
    #[serde(rename = "dlPort", default)]
    dl_port: Option<FieldValue>,
}

impl SearchResponse {
    /// Result rows in provider order.
    pub fn rows(&self) -> &[RawResultRow] {
        &self.data
    }

    pub fn into_rows(self) -> Vec<RawResultRow> {
        self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// One raw result row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawResultRow {
    #[serde(rename = "0", default)]
    hash: Option<FieldValue>,
    #[serde(rename = "4", default)]
    size_text: Option<FieldValue>,
    #[serde(rename = "10", default)]
    title: Option<FieldValue>,
    #[serde(rename = "11", default)]
    extension: Option<FieldValue>,
    #[serde(rename = "12", default)]
    codec_label: Option<FieldValue>,
    #[serde(rename = "14", default)]
    duration_text: Option<FieldValue>,
    #[serde(rename = "fn", default)]
    file_name: Option<FieldValue>,
    #[serde(default)]
    runtime: Option<FieldValue>,
    #[serde(default)]
    yres: Option<FieldValue>,
    #[serde(default)]
    height: Option<FieldValue>,
    #[serde(default)]
    fullres: Option<FieldValue>,
    #[serde(default)]
    vcodec: Option<FieldValue>,
    #[serde(default)]
    size: Option<FieldValue>,
    #[serde(rename = "rawSize", default)]
    raw_size: Option<FieldValue>,
}

/// First field that carries a non-empty value.
fn first_present<'a>(fields: &[&'a Option<FieldValue>]) -> Option<&'a FieldValue> {
    fields
        .iter()
        .filter_map(|f| f.as_ref())
        .find(|v| v.is_present())
}

fn text_or_empty(field: &Option<FieldValue>) -> String {
    first_present(&[field])
        .and_then(|v| v.as_text())
        .map(|t| t.into_owned())
        .unwrap_or_default()
}

/// Title token used for date-order matching. Empty when absent.
pub fn title_token(row: &RawResultRow) -> String {
    text_or_empty(&row.title)
}

/// Display filename: the post title, else the file name field.
pub fn display_filename(row: &RawResultRow) -> Option<String> {
    first_present(&[&row.title, &row.file_name])
        .and_then(|v| v.as_text())
        .map(|t| t.into_owned())
}

/// `{downURL}/{dlFarm}/{dlPort}` from the response routing fields.
pub fn decode_url_prefix(response: &SearchResponse) -> String {
    format!(
        "{}/{}/{}",
        text_or_empty(&response.down_url),
        text_or_empty(&response.dl_farm),
        text_or_empty(&response.dl_port)
    )
}

/// `{prefix}/{hash}{ext}/{title}{ext}`. Carries no credentials.
pub fn build_candidate_url(prefix: &str, row: &RawResultRow) -> String {
    let hash = text_or_empty(&row.hash);
    let title = text_or_empty(&row.title);
    let ext = text_or_empty(&row.extension);
    format!("{}/{}{}/{}{}", prefix, hash, ext, title, ext)
}

/// Embed user credentials into a credential-free URL.
///
/// The result is built per request and must not be cached or stored.
/// Username and password are percent-encoded; a URL without a scheme is
/// treated as `https`.
pub fn materialize_stream_url(credentials: &UserCredentials, url: &str) -> String {
    let (scheme, rest) = url.split_once("://").unwrap_or(("https", url));
    format!(
        "{}://{}:{}@{}",
        scheme,
        urlencoding::encode(credentials.username()),
        urlencoding::encode(credentials.password()),
        rest
    )
}

fn resolution_class(height: i64) -> u32 {
    match height {
        h if h >= 2160 => 2160,
        h if h >= 1080 => 1080,
        h if h >= 720 => 720,
        h if h >= 480 => 480,
        h if h > 0 => h as u32,
        _ => 0,
    }
}

/// Resolution class from `yres`, then `height`, then a `"W x H"` string.
/// Returns 0 when nothing is derivable.
pub fn extract_resolution(row: &RawResultRow) -> u32 {
    if let Some(h) = first_present(&[&row.yres]).and_then(|v| v.as_leading_integer()) {
        return resolution_class(h);
    }

    if let Some(h) = first_present(&[&row.height]).and_then(|v| v.as_number()) {
        return resolution_class(h.trunc() as i64);
    }

    if let Some(FieldValue::Text(full)) = &row.fullres {
        if let Some(caps) = FULL_RESOLUTION.captures(full) {
            if let Some(h) = caps.get(2).and_then(|m| m.as_str().parse::<i64>().ok()) {
                return resolution_class(h);
            }
        }
    }

    0
}

/// Normalized codec from `vcodec`, falling back to the positional codec field.
pub fn extract_codec(row: &RawResultRow) -> Option<Codec> {
    let label = first_present(&[&row.vcodec, &row.codec_label])?
        .as_text()?
        .into_owned();
    let upper = label.to_uppercase();

    let codec = if upper.contains("265") || upper.contains("HEVC") {
        Codec::Hevc
    } else if upper.contains("264") || upper.contains("AVC") || upper.contains("H264") {
        Codec::H264
    } else if upper.contains("VP9") {
        Codec::Vp9
    } else if upper.contains("AV1") {
        Codec::Av1
    } else {
        Codec::Other(label)
    };
    Some(codec)
}

/// Duration in seconds from `runtime`, falling back to the `"40m:23s"` text.
/// Zero means unknown.
pub fn extract_duration(row: &RawResultRow) -> Option<u32> {
    let runtime = first_present(&[&row.runtime])
        .and_then(|v| v.as_leading_integer())
        .and_then(|secs| u32::try_from(secs).ok())
        .filter(|secs| *secs > 0);
    if runtime.is_some() {
        return runtime;
    }

    match first_present(&[&row.duration_text])? {
        FieldValue::Text(text) => parse_duration_text(text).filter(|secs| *secs > 0),
        _ => None,
    }
}

/// Parse `"<m>m:<s>s"`; either component may be missing.
pub fn parse_duration_text(text: &str) -> Option<u32> {
    DURATION_TEXT.captures_iter(text).find_map(|caps| {
        let minutes = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
        let seconds = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
        if minutes.is_none() && seconds.is_none() {
            return None;
        }
        Some(minutes.unwrap_or(0) * 60 + seconds.unwrap_or(0))
    })
}

/// Human readable size. Already formatted text passes through unchanged;
/// byte counts become GB/MB/KB with one decimal.
pub fn format_size(value: &FieldValue) -> Option<String> {
    if let FieldValue::Text(text) = value {
        if SIZE_TEXT.is_match(text) {
            return Some(text.clone());
        }
    }

    if !value.is_present() {
        return None;
    }
    let bytes = value.as_number()?.trunc();
    if bytes >= GIB {
        Some(format!("{:.1} GB", bytes / GIB))
    } else if bytes >= MIB {
        Some(format!("{:.1} MB", bytes / MIB))
    } else {
        Some(format!("{:.1} KB", bytes / KIB))
    }
}

/// Raw byte size from `size`, falling back to `rawSize`. Formatted text in
/// `size` does not shadow a numeric `rawSize`.
pub fn extract_size_bytes(row: &RawResultRow) -> Option<u64> {
    [&row.size, &row.raw_size]
        .into_iter()
        .filter_map(|f| f.as_ref())
        .filter(|v| v.is_present())
        .find_map(|v| v.as_number().filter(|n| *n >= 0.0))
        .map(|n| n as u64)
}

/// Formatted size from the positional size text, `size`, or `rawSize`.
pub fn extract_size_formatted(row: &RawResultRow) -> Option<String> {
    first_present(&[&row.size_text, &row.size, &row.raw_size]).and_then(format_size)
}

/// Map a raw row to a credential-free candidate.
pub fn to_candidate(prefix: &str, row: &RawResultRow) -> SearchCandidate {
    SearchCandidate {
        url: build_candidate_url(prefix, row),
        filename: display_filename(row),
        resolution: extract_resolution(row),
        codec: extract_codec(row),
        size_bytes: extract_size_bytes(row),
        size_formatted: extract_size_formatted(row),
        duration_secs: extract_duration(row),
    }
}
