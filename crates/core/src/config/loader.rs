use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefixed secret variables. The env provider would parse `123456` as a
/// number, so these are layered again as raw strings.
const PREFIXED_STRING_VARS: &[(&str, &str)] = &[
    ("STASHCAST_METADATA__API_KEY", "metadata.api_key"),
    ("STASHCAST_FILE_SEARCH__USERNAME", "file_search.username"),
    ("STASHCAST_FILE_SEARCH__PASSWORD", "file_search.password"),
];

/// Flat environment variables accepted for secrets, mapped onto config paths.
const LEGACY_STRING_VARS: &[(&str, &str)] = &[
    ("STASHDB_API_KEY", "metadata.api_key"),
    ("EASYNEWS_USERNAME", "file_search.username"),
    ("EASYNEWS_PASSWORD", "file_search.password"),
];

/// Flat numeric environment variables, mapped onto config paths.
const LEGACY_NUMERIC_VARS: &[(&str, &str)] = &[
    ("SCRAPE_COUNT", "refresh.target_count"),
    ("PORT", "server.port"),
];

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    extract(Figment::new().merge(Toml::file(path)))
}

/// Load configuration from environment variables only
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    extract(Figment::new())
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn extract(figment: Figment) -> Result<Config, ConfigError> {
    let figment = figment.merge(Env::prefixed("STASHCAST_").split("__"));
    let figment = merge_string_env(figment, |name| std::env::var(name).ok())?;

    figment
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Layer the secret and legacy variables on top. Values are read through
/// `lookup` so they keep their string type (a numeric password stays a
/// string). Legacy variables win over prefixed ones.
fn merge_string_env<F>(figment: Figment, lookup: F) -> Result<Figment, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut figment = figment;

    for &(var, path) in PREFIXED_STRING_VARS.iter().chain(LEGACY_STRING_VARS) {
        if let Some(value) = lookup(var).filter(|v| !v.is_empty()) {
            figment = figment.merge(Serialized::default(path, value));
        }
    }

    for &(var, path) in LEGACY_NUMERIC_VARS {
        if let Some(value) = lookup(var).filter(|v| !v.is_empty()) {
            let number: u64 = value.trim().parse().map_err(|_| {
                ConfigError::ParseError(format!("{} must be a number, got {:?}", var, value))
            })?;
            figment = figment.merge(Serialized::default(path, number));
        }
    }

    Ok(figment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[server]
port = 9000
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_load_config_from_str_invalid_type() {
        let toml = r#"
[server]
port = "not-a-port"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[server]
host = "127.0.0.1"
port = 3000

[refresh]
target_count = 25
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.refresh.target_count, 25);
    }

    #[test]
    fn test_legacy_env_overrides_file_values() {
        let figment = Figment::new().merge(Toml::string(
            r#"
[metadata]
api_key = "from-file"

[refresh]
target_count = 10
"#,
        ));
        let lookup = lookup_from(&[
            ("STASHDB_API_KEY", "from-env"),
            ("EASYNEWS_USERNAME", "operator"),
            ("EASYNEWS_PASSWORD", "123456"),
            ("SCRAPE_COUNT", "40"),
        ]);

        let config: Config = merge_string_env(figment, lookup)
            .unwrap()
            .extract()
            .unwrap();

        assert_eq!(config.metadata.api_key, "from-env");
        assert_eq!(config.file_search.username, "operator");
        assert_eq!(config.file_search.password, "123456");
        assert_eq!(config.refresh.target_count, 40);
    }

    #[test]
    fn test_prefixed_numeric_secrets_stay_strings() {
        // Stand-in for the env provider's typed parse of the same variables.
        let figment = Figment::new()
            .merge(Serialized::default("file_search.password", 123456u64))
            .merge(Serialized::default("metadata.api_key", 42u64));
        let lookup = lookup_from(&[
            ("STASHCAST_FILE_SEARCH__PASSWORD", "123456"),
            ("STASHCAST_METADATA__API_KEY", "0042"),
        ]);

        let config: Config = merge_string_env(figment, lookup)
            .unwrap()
            .extract()
            .unwrap();

        assert_eq!(config.file_search.password, "123456");
        assert_eq!(config.metadata.api_key, "0042");
    }

    #[test]
    fn test_legacy_secret_wins_over_prefixed() {
        let lookup = lookup_from(&[
            ("STASHCAST_FILE_SEARCH__USERNAME", "prefixed"),
            ("EASYNEWS_USERNAME", "legacy"),
        ]);

        let config: Config = merge_string_env(Figment::new(), lookup)
            .unwrap()
            .extract()
            .unwrap();
        assert_eq!(config.file_search.username, "legacy");
    }

    #[test]
    fn test_load_config_from_env_numeric_password() {
        std::env::set_var("STASHCAST_FILE_SEARCH__PASSWORD", "123456");
        let result = load_config_from_env();
        std::env::remove_var("STASHCAST_FILE_SEARCH__PASSWORD");

        let config = result.unwrap();
        assert_eq!(config.file_search.password, "123456");
    }

    #[test]
    fn test_legacy_env_ignores_empty_values() {
        let figment = Figment::new().merge(Toml::string("[metadata]\napi_key = \"kept\""));
        let lookup = lookup_from(&[("STASHDB_API_KEY", "")]);

        let config: Config = merge_string_env(figment, lookup)
            .unwrap()
            .extract()
            .unwrap();
        assert_eq!(config.metadata.api_key, "kept");
    }

    #[test]
    fn test_legacy_env_rejects_non_numeric_port() {
        let lookup = lookup_from(&[("PORT", "seven")]);
        let result = merge_string_env(Figment::new(), lookup);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
