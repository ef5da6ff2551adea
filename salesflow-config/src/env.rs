//! Environment variable overrides

use crate::schema::SalesflowConfig;
use crate::ConfigError;
use std::path::PathBuf;

/// Apply `SALESFLOW_*` environment overrides onto a loaded config.
pub(crate) fn apply_env_overrides(config: &mut SalesflowConfig) -> Result<(), ConfigError> {
    if let Ok(dir) = std::env::var("SALESFLOW_THREADS_DIR") {
        config.storage.threads_dir = PathBuf::from(dir);
    }
    if let Ok(sender) = std::env::var("SALESFLOW_OUTBOUND_SENDER") {
        config.identity.outbound_sender = sender;
    }
    if let Ok(timeline) = std::env::var("SALESFLOW_QUOTE_TIMELINE") {
        config.identity.quote_timeline = timeline;
    }
    if let Ok(value) = std::env::var("SALESFLOW_HIGH_CONFIDENCE") {
        config.routing.high_confidence = parse_threshold("SALESFLOW_HIGH_CONFIDENCE", &value)?;
    }
    if let Ok(value) = std::env::var("SALESFLOW_LOW_CONFIDENCE") {
        config.routing.low_confidence = parse_threshold("SALESFLOW_LOW_CONFIDENCE", &value)?;
    }
    if let Ok(path) = std::env::var("SALESFLOW_FORWARDERS_FILE") {
        config.registries.forwarders_file = Some(PathBuf::from(path));
    }
    if let Ok(path) = std::env::var("SALESFLOW_SALES_TEAM_FILE") {
        config.registries.sales_team_file = Some(PathBuf::from(path));
    }
    Ok(())
}

fn parse_threshold(name: &str, value: &str) -> Result<f64, ConfigError> {
    value
        .parse::<f64>()
        .map_err(|_| ConfigError::Parse(format!("{} must be a float, got '{}'", name, value)))
}
