use std::{collections::HashMap, sync::Arc};

use bridgekeeper_config::AdapterConfig;

#[cfg(feature = "metrics")]
use bridgekeeper_metrics::{adapters as adapter_metrics, gauge};

use crate::adapter::{BridgeAdapter, StaticAdapter};

/// Registry of platform adapters, keyed by platform name.
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn BridgeAdapter>>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// One [`StaticAdapter`] per configured platform.
    pub fn from_config(adapters: &HashMap<String, AdapterConfig>) -> Self {
        let mut registry = Self::new();
        for (platform, cfg) in adapters {
            registry.register(Arc::new(
                StaticAdapter::new(platform.clone()).with_fields(cfg.senddata.clone()),
            ));
        }
        registry
    }

    /// Register an adapter, replacing any previous one for the same platform.
    pub fn register(&mut self, adapter: Arc<dyn BridgeAdapter>) {
        self.adapters
            .insert(adapter.platform().to_string(), adapter);
        #[cfg(feature = "metrics")]
        gauge!(adapter_metrics::REGISTERED).set(self.adapters.len() as f64);
    }

    pub fn get(&self, platform: &str) -> Option<Arc<dyn BridgeAdapter>> {
        self.adapters.get(platform).cloned()
    }

    /// Registered platform names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn register_and_get() {
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(StaticAdapter::new("discord")));

        assert!(registry.get("discord").is_some());
        assert!(registry.get("matrix").is_none());
    }

    #[test]
    fn list_is_sorted() {
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(StaticAdapter::new("guilded")));
        registry.register(Arc::new(StaticAdapter::new("discord")));
        assert_eq!(registry.list(), vec!["discord", "guilded"]);
    }

    #[tokio::test]
    async fn from_config_builds_static_adapters() {
        let mut adapters = HashMap::new();
        let mut cfg = AdapterConfig::default();
        cfg.senddata.insert("token_ref".into(), json!("env:DISCORD"));
        adapters.insert("discord".to_string(), cfg);

        let registry = AdapterRegistry::from_config(&adapters);
        let adapter = registry.get("discord").unwrap();
        let senddata = adapter.create_senddata("42").await.unwrap();
        assert_eq!(senddata, json!({"channel": "42", "token_ref": "env:DISCORD"}));
    }
}
