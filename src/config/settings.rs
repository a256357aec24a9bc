//! Application configuration loading from `salesbook.toml`.
//!
//! Every field has a default, so a missing file yields a working configuration. The
//! file location can be overridden with `SALESBOOK_CONFIG` and the database URL with
//! `DATABASE_URL` (the environment wins over the file).

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, error, info};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "salesbook.toml";

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// `SeaORM` connection string
    pub database_url: String,
    /// Currency code used when rendering reports
    pub currency: String,
    /// PIN lockout policy
    pub security: SecuritySettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: super::database::DEFAULT_DATABASE_URL.to_string(),
            currency: "GHS".to_string(),
            security: SecuritySettings::default(),
        }
    }
}

/// PIN lockout policy.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SecuritySettings {
    /// Failed verifications allowed before the record locks
    pub max_attempts: u32,
    /// How long a lock lasts
    pub lockout_minutes: u32,
    /// PIN written when no record exists yet
    pub default_pin: String,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_minutes: 5,
            default_pin: "4321".to_string(),
        }
    }
}

/// Parses configuration from a TOML string.
///
/// # Errors
/// Returns [`Error::Config`] if the TOML is invalid or a field has the wrong type.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse configuration: {e}"),
    })?;

    if config.security.max_attempts == 0 {
        return Err(Error::Config {
            message: "security.max_attempts must be at least 1".to_string(),
        });
    }
    if !crate::core::pin::is_valid_pin(&config.security.default_pin) {
        return Err(Error::Config {
            message: "security.default_pin must be exactly 4 digits".to_string(),
        });
    }
    Ok(config)
}

/// Loads configuration from `path`, falling back to defaults when the file is absent.
///
/// # Errors
/// Returns [`Error::Io`] if the file exists but cannot be read, and [`Error::Config`]
/// if its contents are invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    if !path_ref.exists() {
        info!("No configuration file at {:?}; using defaults", path_ref);
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(path_ref)
        .inspect_err(|e| error!("Failed to read config file {:?}: {}", path_ref, e))?;
    parse_config(&contents)
}

/// Loads the application configuration the binary runs with.
///
/// Reads `SALESBOOK_CONFIG` (default [`DEFAULT_CONFIG_PATH`]) and lets `DATABASE_URL`
/// override the database location.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path =
        std::env::var("SALESBOOK_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = load_config(&path)?;
    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.database_url = url;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            database_url = "sqlite::memory:"
            currency = "NGN"

            [security]
            max_attempts = 3
            lockout_minutes = 10
            default_pin = "9876"
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.currency, "NGN");
        assert_eq!(config.security.max_attempts, 3);
        assert_eq!(config.security.lockout_minutes, 10);
        assert_eq!(config.security.default_pin, "9876");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = parse_config("currency = \"USD\"").unwrap();
        assert_eq!(config.currency, "USD");
        assert_eq!(config.security, SecuritySettings::default());
        assert_eq!(config.database_url, super::super::database::DEFAULT_DATABASE_URL);
    }

    #[test]
    fn test_rejects_bad_security_values() {
        let zero = "[security]\nmax_attempts = 0";
        assert!(matches!(parse_config(zero), Err(Error::Config { .. })));

        let bad_pin = "[security]\ndefault_pin = \"12a4\"";
        assert!(matches!(parse_config(bad_pin), Err(Error::Config { .. })));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = load_config("definitely/not/here/salesbook.toml").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_unreadable_path_is_io_error() {
        // A directory exists but cannot be read as a file
        let result = load_config(std::env::temp_dir());
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
