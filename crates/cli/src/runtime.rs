//! Wiring shared by the bridge commands: pool, store, adapters, cache.

use std::{sync::Arc, time::Duration};

use {
    anyhow::{Context, bail},
    bridgekeeper_bridges::{
        AdapterRegistry, BridgeService, BridgeSettings, BridgeStore, DeliveryCache,
        cache_sqlite::SqliteDeliveryCache, store_sqlite::SqliteBridgeStore,
    },
    bridgekeeper_config::{BridgekeeperConfig, CacheBackend},
    sqlx::{SqlitePool, sqlite::SqlitePoolOptions},
    tracing::debug,
};

/// Connection URL for the bridge database.
///
/// Uses `database.url` when set, otherwise `bridgekeeper.db` in the data dir.
pub fn database_url(config: &BridgekeeperConfig) -> anyhow::Result<String> {
    if let Some(url) = &config.database.url {
        return Ok(url.clone());
    }
    let dir = bridgekeeper_config::data_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create data dir {}", dir.display()))?;
    Ok(format!(
        "sqlite:{}?mode=rwc",
        dir.join("bridgekeeper.db").display()
    ))
}

pub async fn connect(config: &BridgekeeperConfig) -> anyhow::Result<SqlitePool> {
    let url = database_url(config)?;
    debug!(url = %url, "opening bridge database");
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .with_context(|| format!("failed to open database at {url}"))?;
    bridgekeeper_bridges::run_migrations(&pool).await?;
    Ok(pool)
}

pub struct Runtime {
    pool: SqlitePool,
    pub store: Arc<dyn BridgeStore>,
    pub service: BridgeService,
    /// Only set for the SQLite backend. An in-memory cache belongs to the
    /// process that relays messages and is empty in every CLI invocation.
    cache: Option<Arc<dyn DeliveryCache>>,
}

impl Runtime {
    pub async fn open(config: &BridgekeeperConfig) -> anyhow::Result<Self> {
        let pool = connect(config).await?;
        Ok(Self::with_pool(pool, config))
    }

    pub fn with_pool(pool: SqlitePool, config: &BridgekeeperConfig) -> Self {
        let store: Arc<dyn BridgeStore> = Arc::new(SqliteBridgeStore::with_pool(pool.clone()));
        let adapters = Arc::new(AdapterRegistry::from_config(&config.adapters));
        let service = BridgeService::new(
            Arc::clone(&store),
            adapters,
            BridgeSettings::from(&config.bridges),
        );

        let cache: Option<Arc<dyn DeliveryCache>> = match config.cache.backend {
            CacheBackend::Memory => None,
            CacheBackend::Sqlite => Some(Arc::new(SqliteDeliveryCache::new(
                pool.clone(),
                Duration::from_secs(config.cache.ttl_secs),
            ))),
        };

        Self {
            pool,
            store,
            service,
            cache,
        }
    }

    #[cfg(test)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The persistent delivery cache, or an error for the in-memory backend.
    pub fn delivery_cache(&self) -> anyhow::Result<&dyn DeliveryCache> {
        match &self.cache {
            Some(cache) => Ok(cache.as_ref()),
            None => bail!(
                "the in-memory delivery cache cannot be inspected from the CLI; \
                 set cache.backend = \"sqlite\""
            ),
        }
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, bridgekeeper_bridges::BridgeCommand};

    #[test]
    fn explicit_url_wins() {
        let mut config = BridgekeeperConfig::default();
        config.database.url = Some("sqlite::memory:".into());
        assert_eq!(database_url(&config).unwrap(), "sqlite::memory:");
    }

    #[tokio::test]
    async fn join_persists_to_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BridgekeeperConfig::default();
        config.database.url = Some(format!(
            "sqlite:{}?mode=rwc",
            dir.path().join("bridges.db").display()
        ));
        config
            .adapters
            .insert("discord".into(), Default::default());

        let rt = Runtime::open(&config).await.unwrap();
        let response = rt
            .service
            .execute(BridgeCommand::Join {
                channel: "c1".into(),
                platform: "discord".into(),
                name: Some("general".into()),
            })
            .await;
        assert!(response.is_ok());
        rt.close().await;

        let rt = Runtime::open(&config).await.unwrap();
        let bridge = rt.store.find_by_channel("c1").await.unwrap().unwrap();
        assert_eq!(bridge.id, "bridge-general");
        assert_eq!(bridge.platforms[0].senddata["channel"], "c1");
        rt.close().await;
    }

    #[tokio::test]
    async fn memory_backend_has_no_inspectable_cache() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BridgekeeperConfig::default();
        config.database.url = Some(format!(
            "sqlite:{}?mode=rwc",
            dir.path().join("bridges.db").display()
        ));

        let rt = Runtime::open(&config).await.unwrap();
        assert!(rt.delivery_cache().is_err());
        rt.close().await;

        config.cache.backend = CacheBackend::Sqlite;
        let rt = Runtime::open(&config).await.unwrap();
        assert!(rt.delivery_cache().is_ok());
        rt.close().await;
    }
}
