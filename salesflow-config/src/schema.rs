//! Configuration schema

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalesflowConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub registries: RegistryConfig,
}

/// Where thread state lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one JSON file per thread
    pub threads_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            threads_dir: PathBuf::from("data/threads"),
        }
    }
}

/// Outbound identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Sender address stamped on outbound entries
    pub outbound_sender: String,
    /// Quote timeline promised in confirmation acknowledgments
    pub quote_timeline: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        IdentityConfig {
            outbound_sender: "sales-desk@salesflow.example".to_string(),
            quote_timeline: "24 hours".to_string(),
        }
    }
}

/// Routing thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Mean confidence at or above which a turn counts as high-confidence
    pub high_confidence: f64,
    /// Mean confidence below which a turn counts as low-confidence
    pub low_confidence: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        RoutingConfig {
            high_confidence: 0.7,
            low_confidence: 0.5,
        }
    }
}

/// Optional registry files; built-in defaults apply when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// JSON file with a top-level `forwarders` list
    #[serde(default)]
    pub forwarders_file: Option<PathBuf>,
    /// JSON file with a top-level `sales_team` list
    #[serde(default)]
    pub sales_team_file: Option<PathBuf>,
}
