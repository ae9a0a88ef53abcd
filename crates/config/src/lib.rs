//! Configuration loading and env substitution.
//!
//! Config files: `bridgekeeper.toml`, `bridgekeeper.yaml`, or `bridgekeeper.json`
//! Searched in `./` then `~/.config/bridgekeeper/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{apply_env_overrides, config_dir, data_dir, discover_and_load, load_config},
    schema::{
        AdapterConfig, BridgekeeperConfig, BridgesConfig, CacheBackend, CacheConfig,
        DatabaseConfig,
    },
};
