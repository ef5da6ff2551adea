//! Configuration loading and management for salesflow
//!
//! Loading hierarchy: environment variables override the config file,
//! which overrides the built-in defaults.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod env;
mod schema;

pub use schema::{IdentityConfig, RegistryConfig, RoutingConfig, SalesflowConfig, StorageConfig};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Load configuration from the default location and the environment.
///
/// The file path comes from `SALESFLOW_CONFIG` when set, otherwise
/// `salesflow.toml` in the working directory. A missing file is not an
/// error; defaults apply.
pub fn load_config() -> Result<SalesflowConfig, ConfigError> {
    let path = std::env::var("SALESFLOW_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("salesflow.toml"));

    let mut config = if path.exists() {
        load_from_file(&path)?
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        SalesflowConfig::default()
    };

    env::apply_env_overrides(&mut config)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load configuration from an explicit TOML file.
pub fn load_from_file(path: &Path) -> Result<SalesflowConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Validate invariants the rest of the system relies on.
pub fn validate_config(config: &SalesflowConfig) -> Result<(), ConfigError> {
    let routing = &config.routing;
    for (name, value) in [
        ("routing.high_confidence", routing.high_confidence),
        ("routing.low_confidence", routing.low_confidence),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::Invalid(format!(
                "{} must be within [0, 1], got {}",
                name, value
            )));
        }
    }
    if routing.low_confidence > routing.high_confidence {
        return Err(ConfigError::Invalid(
            "routing.low_confidence must not exceed routing.high_confidence".to_string(),
        ));
    }
    if config.identity.outbound_sender.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "identity.outbound_sender must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_validate() {
        assert!(validate_config(&SalesflowConfig::default()).is_ok());
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[storage]\nthreads_dir = \"/tmp/threads\"\n\n[identity]\noutbound_sender = \"bot@example.com\"\nquote_timeline = \"48 hours\"\n"
        )
        .unwrap();
        let config = load_from_file(file.path()).unwrap();
        assert_eq!(config.storage.threads_dir.to_str(), Some("/tmp/threads"));
        assert_eq!(config.identity.outbound_sender, "bot@example.com");
        // Sections that were not in the file keep their defaults.
        assert!((config.routing.high_confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let mut config = SalesflowConfig::default();
        config.routing.low_confidence = 0.9;
        config.routing.high_confidence = 0.4;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Invalid(_))
        ));
    }
}
