//! Client configuration.
//!
//! Settings come from a TOML file, then from environment variables which
//! override the file. A `.env` file in the working directory is loaded
//! before the environment is read.
//!
//! ## Environment Variables
//!
//! - `COUCHFIND_HOST` - Server host
//! - `COUCHFIND_PORT` - Server port
//! - `COUCHFIND_DATABASE` - Target database
//! - `COUCHFIND_TIMEOUT_SECS` - Per-request timeout in seconds
//! - `COUCHFIND_MAX_PAGE_SIZE` - Rows requested per round
//! - `COUCHFIND_FETCH_CEILING` - Upper bound for exhausting finds
//! - `COUCHFIND_DEBUG` - Enables debug logging (`1`, `true`, `yes`)

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::port::{FindLimits, DEFAULT_FETCH_CEILING, DEFAULT_MAX_PAGE_SIZE};

pub const ENV_HOST: &str = "COUCHFIND_HOST";
pub const ENV_PORT: &str = "COUCHFIND_PORT";
pub const ENV_DATABASE: &str = "COUCHFIND_DATABASE";
pub const ENV_TIMEOUT_SECS: &str = "COUCHFIND_TIMEOUT_SECS";
pub const ENV_MAX_PAGE_SIZE: &str = "COUCHFIND_MAX_PAGE_SIZE";
pub const ENV_FETCH_CEILING: &str = "COUCHFIND_FETCH_CEILING";
pub const ENV_DEBUG: &str = "COUCHFIND_DEBUG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}

/// Connection and pagination settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub hostname: String,
    pub port: u16,
    pub database: String,
    /// Per-request timeout
    pub timeout_secs: u64,
    pub max_page_size: usize,
    pub fetch_ceiling: usize,
    pub debug_logging: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            port: 5984,
            database: "default".to_string(),
            timeout_secs: 30,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
            fetch_ceiling: DEFAULT_FETCH_CEILING,
            debug_logging: false,
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        tracing::debug!("Loaded config from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Apply `COUCHFIND_*` overrides. Empty variables are ignored.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        let _ = dotenvy::dotenv();
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(host) = get(ENV_HOST) {
            self.hostname = host;
        }
        if let Some(database) = get(ENV_DATABASE) {
            self.database = database;
        }
        if let Some(value) = get(ENV_PORT) {
            self.port = parse_env(ENV_PORT, &value)?;
        }
        if let Some(value) = get(ENV_TIMEOUT_SECS) {
            self.timeout_secs = parse_env(ENV_TIMEOUT_SECS, &value)?;
        }
        if let Some(value) = get(ENV_MAX_PAGE_SIZE) {
            self.max_page_size = parse_env(ENV_MAX_PAGE_SIZE, &value)?;
        }
        if let Some(value) = get(ENV_FETCH_CEILING) {
            self.fetch_ceiling = parse_env(ENV_FETCH_CEILING, &value)?;
        }
        if let Some(value) = get(ENV_DEBUG) {
            self.debug_logging = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        name: ENV_DEBUG,
                        value,
                    })
                }
            };
        }
        Ok(())
    }

    /// Base URL for HTTP requests
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.hostname, self.port)
    }

    pub fn limits(&self) -> FindLimits {
        FindLimits::new(self.max_page_size, self.fetch_ceiling)
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url(), "http://localhost:5984");
        assert_eq!(config.limits(), FindLimits::default());
        assert!(!config.debug_logging);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ClientConfig::from_toml_str(
            r#"
            hostname = "couch.internal"
            database = "people"
            max_page_size = 25
            "#,
        )
        .unwrap();
        assert_eq!(config.hostname, "couch.internal");
        assert_eq!(config.database, "people");
        assert_eq!(config.port, 5984);
        assert_eq!(config.limits().max_page_size, 25);
        assert_eq!(config.limits().fetch_ceiling, DEFAULT_FETCH_CEILING);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("couchfind.toml");
        let config = ClientConfig {
            port: 6984,
            timeout_secs: 5,
            ..ClientConfig::default()
        };
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        assert_eq!(ClientConfig::from_file(&path).unwrap(), config);
        assert!(matches!(
            ClientConfig::from_file(&dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_invalid_toml() {
        let err = ClientConfig::from_toml_str("port = \"not a number\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ClientConfig::default();
        config
            .apply_overrides(lookup(&[
                (ENV_HOST, "db.example"),
                (ENV_PORT, "15984"),
                (ENV_DATABASE, ""),
                (ENV_FETCH_CEILING, "500"),
                (ENV_DEBUG, "true"),
            ]))
            .unwrap();
        assert_eq!(config.hostname, "db.example");
        assert_eq!(config.port, 15984);
        assert_eq!(config.database, "default");
        assert_eq!(config.fetch_ceiling, 500);
        assert!(config.debug_logging);
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = ClientConfig::default();
        let err = config
            .apply_overrides(lookup(&[(ENV_PORT, "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: ENV_PORT, .. }));
        assert_eq!(err.to_string(), "Invalid value for COUCHFIND_PORT: eighty");
    }
}
