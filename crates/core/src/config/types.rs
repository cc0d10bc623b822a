use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::credentials::OperatorCredentials;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub file_search: FileSearchConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    7001
}

/// Metadata provider (StashDB) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetadataConfig {
    /// GraphQL endpoint.
    #[serde(default = "default_metadata_url")]
    pub url: String,
    /// StashDB API key. Required.
    #[serde(default)]
    pub api_key: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Pause between page requests in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub page_delay_ms: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            url: default_metadata_url(),
            api_key: String::new(),
            timeout_secs: default_timeout(),
            page_delay_ms: default_delay_ms(),
        }
    }
}

fn default_metadata_url() -> String {
    "https://stashdb.org/graphql".to_string()
}

/// File-search provider (Easynews) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FileSearchConfig {
    /// Search endpoint.
    #[serde(default = "default_file_search_url")]
    pub url: String,
    /// Operator account used for ingestion searches. Required.
    #[serde(default)]
    pub username: String,
    /// Operator account password. Required.
    #[serde(default)]
    pub password: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl FileSearchConfig {
    /// Operator credentials for ingestion calls.
    pub fn operator_credentials(&self) -> OperatorCredentials {
        OperatorCredentials::new(self.username.clone(), self.password.clone())
    }
}

impl Default for FileSearchConfig {
    fn default() -> Self {
        Self {
            url: default_file_search_url(),
            username: String::new(),
            password: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_file_search_url() -> String {
    "https://members.easynews.com/2.0/search/solr-search/advanced".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_delay_ms() -> u64 {
    500
}

/// Refresh cycle configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RefreshConfig {
    /// Number of trending records to fetch per cycle.
    #[serde(default = "default_target_count")]
    pub target_count: usize,
    /// Period between scheduled cycles in seconds (default: 24h).
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Pause between per-record searches in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub record_delay_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            target_count: default_target_count(),
            interval_secs: default_interval_secs(),
            record_delay_ms: default_delay_ms(),
        }
    }
}

fn default_target_count() -> usize {
    100
}

fn default_interval_secs() -> u64 {
    24 * 60 * 60
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub metadata: SanitizedMetadataConfig,
    pub file_search: SanitizedFileSearchConfig,
    pub refresh: RefreshConfig,
}

/// Sanitized metadata config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedMetadataConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
    pub page_delay_ms: u64,
}

/// Sanitized file-search config (credentials hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedFileSearchConfig {
    pub url: String,
    pub credentials_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            metadata: SanitizedMetadataConfig {
                url: config.metadata.url.clone(),
                api_key_configured: !config.metadata.api_key.is_empty(),
                timeout_secs: config.metadata.timeout_secs,
                page_delay_ms: config.metadata.page_delay_ms,
            },
            file_search: SanitizedFileSearchConfig {
                url: config.file_search.url.clone(),
                credentials_configured: !config.file_search.username.is_empty()
                    && !config.file_search.password.is_empty(),
                timeout_secs: config.file_search.timeout_secs,
            },
            refresh: config.refresh.clone(),
        }
    }
}
