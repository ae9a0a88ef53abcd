//! SQLite-backed bridge store using sqlx.

use std::time::{SystemTime, UNIX_EPOCH};

use {
    anyhow::{Context, Result},
    async_trait::async_trait,
    sqlx::{SqlitePool, sqlite::SqlitePoolOptions},
    tracing::debug,
};

use crate::{store::BridgeStore, types::BridgeRecord};

/// Internal row type for sqlx mapping.
#[derive(sqlx::FromRow)]
struct BridgeRow {
    id: String,
    name: String,
    platforms: String,
}

impl TryFrom<BridgeRow> for BridgeRecord {
    type Error = anyhow::Error;

    fn try_from(r: BridgeRow) -> Result<Self> {
        let platforms = serde_json::from_str(&r.platforms)
            .with_context(|| format!("corrupt platforms for bridge {}", r.id))?;
        Ok(Self {
            id: r.id,
            name: r.name,
            platforms,
        })
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// SQLite-backed bridge store.
///
/// Each bridge is one row holding its membership list as JSON. The
/// `bridge_channels` table indexes channels back to their bridge; its primary
/// key rejects a channel claimed by two bridges.
pub struct SqliteBridgeStore {
    pool: SqlitePool,
}

impl SqliteBridgeStore {
    /// Connect with a dedicated pool and run migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("failed to connect to SQLite")?;

        crate::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Use an existing pool. Call [`crate::run_migrations`] first.
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BridgeStore for SqliteBridgeStore {
    async fn find_by_channel(&self, channel: &str) -> Result<Option<BridgeRecord>> {
        let row = sqlx::query_as::<_, BridgeRow>(
            "SELECT b.id, b.name, b.platforms FROM bridges b \
             JOIN bridge_channels c ON c.bridge_id = b.id \
             WHERE c.channel = ?",
        )
        .bind(channel)
        .fetch_optional(&self.pool)
        .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<BridgeRecord>> {
        let row =
            sqlx::query_as::<_, BridgeRow>("SELECT id, name, platforms FROM bridges WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(TryInto::try_into).transpose()
    }

    async fn upsert(&self, bridge: &BridgeRecord) -> Result<()> {
        let platforms = serde_json::to_string(&bridge.platforms)?;
        let now = now_ms();

        // Dropping the transaction on any error rolls both tables back.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO bridges (id, name, platforms, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                 platforms = excluded.platforms,
                 updated_at = excluded.updated_at"#,
        )
        .bind(&bridge.id)
        .bind(&bridge.name)
        .bind(&platforms)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM bridge_channels WHERE bridge_id = ?")
            .bind(&bridge.id)
            .execute(&mut *tx)
            .await?;

        for member in &bridge.platforms {
            sqlx::query("INSERT INTO bridge_channels (channel, bridge_id) VALUES (?, ?)")
                .bind(&member.channel)
                .bind(&bridge.id)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("channel {} is already bridged", member.channel))?;
        }

        tx.commit().await?;
        debug!(id = %bridge.id, members = bridge.platforms.len(), "bridge saved");
        Ok(())
    }
}
