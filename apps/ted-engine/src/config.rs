//! Configuration loading, validation, and environment interpolation.
//!
//! Configuration is YAML with `${VAR}` / `${VAR:-default}` interpolation
//! from the process environment. Every field has a default, so a missing
//! config file yields a fully working setup against the public TED API.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Data source configuration.
    #[serde(default)]
    pub source: SourceConfig,
    /// National-accounts decomposition configuration.
    #[serde(default)]
    pub accounts: AccountsConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port for the REST endpoints (/health, /v1/*).
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Bind address.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            bind_address: default_bind_address(),
        }
    }
}

const fn default_http_port() -> u16 {
    8080
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

/// Data source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the TED API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl SourceConfig {
    /// Request timeout as a [`std::time::Duration`].
    #[must_use]
    pub const fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://ted.api.artt.dev".to_string()
}
const fn default_timeout_secs() -> u64 {
    30
}

/// Decomposition configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountsConfig {
    /// Chain-linking base year (real level equals nominal, deflator 1).
    #[serde(default = "default_base_year")]
    pub base_year: i32,
    /// First year of history requested from the data source.
    #[serde(default = "default_start_year")]
    pub start_year: i32,
    /// Name of the expenditure aggregate weighted contributions are
    /// measured against.
    #[serde(default = "default_aggregate")]
    pub aggregate: String,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            base_year: default_base_year(),
            start_year: default_start_year(),
            aggregate: default_aggregate(),
        }
    }
}

const fn default_base_year() -> i32 {
    crate::series::catalog::BASE_YEAR
}
const fn default_start_year() -> i32 {
    crate::series::catalog::START_YEAR
}
fn default_aggregate() -> String {
    crate::series::catalog::AGGREGATE.to_string()
}

/// Load configuration from a YAML file, defaulting to `config.yaml`.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;
    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (used by tests and embedded
/// defaults).
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate cross-field constraints.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.source.base_url.is_empty() {
        return Err(ConfigError::ValidationError(
            "source.base_url must not be empty".to_string(),
        ));
    }
    if config.source.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "source.timeout_secs must be positive".to_string(),
        ));
    }
    if config.accounts.aggregate.is_empty() {
        return Err(ConfigError::ValidationError(
            "accounts.aggregate must not be empty".to_string(),
        ));
    }
    if config.accounts.start_year > config.accounts.base_year {
        return Err(ConfigError::ValidationError(format!(
            "accounts.start_year {} is after accounts.base_year {}",
            config.accounts.start_year, config.accounts.base_year
        )));
    }
    let current_year = Utc::now().year();
    if config.accounts.base_year > current_year {
        return Err(ConfigError::ValidationError(format!(
            "accounts.base_year {} is in the future",
            config.accounts.base_year
        )));
    }
    Ok(())
}

/// Interpolate `${VAR}` and `${VAR:-default}` patterns from the process
/// environment.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let mut result = input.to_string();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    for cap in re.captures_iter(input) {
        let Some(full_match) = cap.get(0) else {
            continue;
        };
        let Some(var_match) = cap.get(1) else {
            continue;
        };
        let full_match = full_match.as_str();
        let var_name = var_match.as_str();
        let default_value = cap.get(2).map(|m| m.as_str());

        let value = match std::env::var(var_name) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.map_or_else(String::new, str::to_string),
        };

        result = result.replace(full_match, &value);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.http_port, 8080);
        assert_eq!(config.source.base_url, "https://ted.api.artt.dev");
        assert_eq!(config.accounts.base_year, 2002);
        assert_eq!(config.accounts.start_year, 1993);
        assert_eq!(config.accounts.aggregate, "gde");
    }

    #[test]
    fn test_load_from_string_with_partial_fields() {
        let config = load_config_from_string(
            r"
server:
  http_port: 9000
accounts:
  base_year: 2010
",
        )
        .unwrap();
        assert_eq!(config.server.http_port, 9000);
        assert_eq!(config.accounts.base_year, 2010);
        // Untouched sections keep their defaults.
        assert_eq!(config.accounts.start_year, 1993);
        assert_eq!(config.source.base_url, "https://ted.api.artt.dev");
    }

    #[test]
    fn test_env_interpolation_with_default() {
        let yaml = r"
source:
  base_url: ${TED_ENGINE_UNSET_URL:-http://localhost:9999}
";
        let config = load_config_from_string(yaml).unwrap();
        assert_eq!(config.source.base_url, "http://localhost:9999");
    }

    #[test]
    fn test_start_year_after_base_year_rejected() {
        let err = load_config_from_string(
            r"
accounts:
  base_year: 2000
  start_year: 2005
",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let err = load_config_from_string(
            r"
source:
  base_url: ''
",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
