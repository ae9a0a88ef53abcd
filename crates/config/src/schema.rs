/// Config schema types (bridges, database, delivery cache, adapters).
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgekeeperConfig {
    pub bridges: BridgesConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    /// Per-platform adapter settings, keyed by platform name.
    pub adapters: HashMap<String, AdapterConfig>,
}

/// Bridge identity and user-facing message settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgesConfig {
    /// Prefix prepended to a bridge name to form its id. Defaults to "bridge-".
    pub id_prefix: String,
    /// Command users are pointed at in error messages. Defaults to "!bolt help".
    pub help_command: String,
}

impl Default for BridgesConfig {
    fn default() -> Self {
        Self {
            id_prefix: "bridge-".into(),
            help_command: "!bolt help".into(),
        }
    }
}

/// Persistent bridge store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx connection URL. When unset, `bridgekeeper.db` in the data dir is used.
    pub url: Option<String>,
}

/// Where cached delivery handles live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Sqlite,
}

/// Delivery cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Seconds a cached delivery stays readable. Defaults to one day.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            ttl_secs: 86_400,
        }
    }
}

/// Settings for a config-driven adapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Extra fields merged into every senddata object this adapter produces.
    pub senddata: serde_json::Map<String, serde_json::Value>,
}
