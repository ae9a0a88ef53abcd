//! SQLite-backed delivery cache.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use {anyhow::Result, async_trait::async_trait, sqlx::SqlitePool, tracing::debug};

use crate::{
    cache::{DeliveryCache, cache_key},
    types::SentMessage,
};

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Delivery cache persisted in the `delivery_cache` table.
///
/// Survives restarts, unlike [`crate::cache_memory::InMemoryDeliveryCache`].
/// Expired rows are ignored on read; [`SqliteDeliveryCache::purge_expired`]
/// deletes them.
pub struct SqliteDeliveryCache {
    pool: SqlitePool,
    ttl: Duration,
}

impl SqliteDeliveryCache {
    /// Use an existing pool. Call [`crate::run_migrations`] first.
    pub fn new(pool: SqlitePool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    /// Delete expired rows. Returns how many were removed.
    pub async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM delivery_cache WHERE expires_at <= ?")
            .bind(now_ms())
            .execute(&self.pool)
            .await?;
        let purged = result.rows_affected();
        if purged > 0 {
            debug!(purged, "purged expired delivery cache entries");
        }
        Ok(purged)
    }
}

#[async_trait]
impl DeliveryCache for SqliteDeliveryCache {
    async fn get(&self, message_id: &str) -> Result<Option<Vec<SentMessage>>> {
        let value = sqlx::query_scalar::<_, String>(
            "SELECT value FROM delivery_cache WHERE key = ? AND expires_at > ?",
        )
        .bind(cache_key(message_id))
        .bind(now_ms())
        .fetch_optional(&self.pool)
        .await?;
        value
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(Into::into)
    }

    async fn put(&self, message_id: &str, sent: &[SentMessage]) -> Result<()> {
        let value = serde_json::to_string(sent)?;
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = now_ms().saturating_add(ttl_ms);
        sqlx::query(
            r#"INSERT INTO delivery_cache (key, value, expires_at)
               VALUES (?, ?, ?)
               ON CONFLICT(key) DO UPDATE SET
                 value = excluded.value,
                 expires_at = excluded.expires_at"#,
        )
        .bind(cache_key(message_id))
        .bind(&value)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, sqlx::sqlite::SqlitePoolOptions};

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::run_migrations(&pool).await.unwrap();
        pool
    }

    fn sent(plugin: &str, id: &str) -> SentMessage {
        SentMessage {
            channel: format!("{plugin}-1"),
            plugin: plugin.into(),
            id: id.into(),
            thread: None,
        }
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let cache = SqliteDeliveryCache::new(test_pool().await, Duration::from_secs(60));
        let handles = vec![sent("discord", "a"), sent("guilded", "b")];
        cache.put("m1", &handles).await.unwrap();

        assert_eq!(cache.get("m1").await.unwrap(), Some(handles));
        assert!(cache.get("m2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_replaces() {
        let cache = SqliteDeliveryCache::new(test_pool().await, Duration::from_secs(60));
        cache.put("m1", &[sent("discord", "a")]).await.unwrap();
        cache.put("m1", &[sent("guilded", "b")]).await.unwrap();

        assert_eq!(
            cache.get("m1").await.unwrap(),
            Some(vec![sent("guilded", "b")])
        );
    }

    #[tokio::test]
    async fn test_stored_under_message_key() {
        let pool = test_pool().await;
        let cache = SqliteDeliveryCache::new(pool.clone(), Duration::from_secs(60));
        cache.put("m1", &[sent("discord", "a")]).await.unwrap();

        let raw = sqlx::query_scalar::<_, String>("SELECT value FROM delivery_cache WHERE key = ?")
            .bind("message-m1")
            .fetch_one(&pool)
            .await
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(parsed.is_array());
    }

    #[tokio::test]
    async fn test_huge_ttl_saturates() {
        let ttl = Duration::from_secs(u64::MAX / 1000 * 4);
        let cache = SqliteDeliveryCache::new(test_pool().await, ttl);
        cache.put("m1", &[sent("discord", "a")]).await.unwrap();

        assert_eq!(
            cache.get("m1").await.unwrap(),
            Some(vec![sent("discord", "a")])
        );
        assert_eq!(cache.purge_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        let cache = SqliteDeliveryCache::new(test_pool().await, Duration::ZERO);
        cache.put("m1", &[sent("discord", "a")]).await.unwrap();

        assert!(cache.get("m1").await.unwrap().is_none());
        assert_eq!(cache.purge_expired().await.unwrap(), 1);
        assert_eq!(cache.purge_expired().await.unwrap(), 0);
    }
}
