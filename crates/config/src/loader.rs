use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::BridgekeeperConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "bridgekeeper.toml",
    "bridgekeeper.yaml",
    "bridgekeeper.yml",
    "bridgekeeper.json",
];

/// Env var overriding `database.url`.
const ENV_DATABASE_URL: &str = "BRIDGEKEEPER_DATABASE_URL";
/// Env var overriding `bridges.id_prefix`.
const ENV_ID_PREFIX: &str = "BRIDGEKEEPER_ID_PREFIX";

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<BridgekeeperConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./bridgekeeper.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/bridgekeeper/bridgekeeper.{toml,yaml,yml,json}` (user-global)
///
/// Returns `BridgekeeperConfig::default()` if no config file is found or the
/// one found fails to parse.
pub fn discover_and_load() -> BridgekeeperConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    BridgekeeperConfig::default()
}

/// Apply `BRIDGEKEEPER_*` environment overrides on top of a loaded config.
pub fn apply_env_overrides(config: &mut BridgekeeperConfig) {
    apply_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_overrides_with(config: &mut BridgekeeperConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup(ENV_DATABASE_URL).filter(|v| !v.is_empty()) {
        debug!("database url overridden from environment");
        config.database.url = Some(url);
    }
    if let Some(prefix) = lookup(ENV_ID_PREFIX).filter(|v| !v.is_empty()) {
        config.bridges.id_prefix = prefix;
    }
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/bridgekeeper/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "bridgekeeper").map(|d| d.config_dir().to_path_buf())
}

/// Returns the data directory holding the default SQLite database.
///
/// Falls back to `./.bridgekeeper` when no home directory can be resolved.
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "bridgekeeper")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".bridgekeeper"))
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<BridgekeeperConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
