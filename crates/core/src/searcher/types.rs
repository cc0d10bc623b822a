//! Types for the file search system.

use std::borrow::Cow;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::credentials::OperatorCredentials;

use super::decode::SearchResponse;

/// A loosely typed provider field. The provider sends the same field as a
/// number in one row and a string in the next.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Other(serde_json::Value),
}

impl FieldValue {
    /// False for zero, empty text, `false` and other empty values.
    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::Integer(i) => *i != 0,
            FieldValue::Float(f) => *f != 0.0 && !f.is_nan(),
            FieldValue::Text(s) => !s.is_empty(),
            FieldValue::Other(v) => match v {
                serde_json::Value::Null => false,
                serde_json::Value::Bool(b) => *b,
                _ => true,
            },
        }
    }

    /// Text form of scalar values.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            FieldValue::Integer(i) => Some(Cow::Owned(i.to_string())),
            FieldValue::Float(f) => Some(Cow::Owned(f.to_string())),
            FieldValue::Text(s) => Some(Cow::Borrowed(s.as_str())),
            FieldValue::Other(_) => None,
        }
    }

    /// Leading integer: numbers are truncated, text yields its leading
    /// digits (`"1080p"` is 1080).
    pub fn as_leading_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            FieldValue::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            FieldValue::Text(s) => leading_integer(s),
            _ => None,
        }
    }

    /// Strict numeric value: numbers, or text that is entirely a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) if f.is_finite() => Some(*f),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }
}

fn leading_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Normalized video codec label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Codec {
    Hevc,
    H264,
    Vp9,
    Av1,
    /// Unrecognized label, kept as the provider sent it.
    Other(String),
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Codec::Hevc => f.write_str("HEVC"),
            Codec::H264 => f.write_str("H264"),
            Codec::Vp9 => f.write_str("VP9"),
            Codec::Av1 => f.write_str("AV1"),
            Codec::Other(label) => f.write_str(label),
        }
    }
}

impl From<Codec> for String {
    fn from(codec: Codec) -> Self {
        codec.to_string()
    }
}

impl From<String> for Codec {
    fn from(label: String) -> Self {
        match label.as_str() {
            "HEVC" => Codec::Hevc,
            "H264" => Codec::H264,
            "VP9" => Codec::Vp9,
            "AV1" => Codec::Av1,
            _ => Codec::Other(label),
        }
    }
}

/// One normalized, credential-free search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCandidate {
    /// Download URL without any embedded credentials.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Resolution class: 2160, 1080, 720, 480, a raw height, or 0 if unknown.
    pub resolution: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<Codec>,
    /// Size in bytes as reported by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Human readable size, e.g. `"1.7 GB"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_formatted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
}

/// Errors that can occur during search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search backend connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Search backend rejected credentials")]
    Unauthorized,

    #[error("Search backend API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Trait for file search backends.
#[async_trait]
pub trait FileSearch: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Run one search with operator credentials.
    ///
    /// Returns `None` on any failure (network, auth, malformed body); the
    /// error is logged here and never propagates.
    async fn search(
        &self,
        credentials: &OperatorCredentials,
        query: &str,
    ) -> Option<SearchResponse>;
}
