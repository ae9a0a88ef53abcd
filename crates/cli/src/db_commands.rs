use {
    anyhow::{Result, bail},
    bridgekeeper_bridges::cache_sqlite::SqliteDeliveryCache,
    bridgekeeper_config::BridgekeeperConfig,
    clap::Subcommand,
    std::{path::PathBuf, time::Duration},
};

use crate::runtime;

#[derive(Subcommand)]
pub enum DbAction {
    /// Run pending migrations.
    Migrate,
    /// Delete expired rows from the SQLite delivery cache.
    Purge,
    /// Delete the database file. Only works for file-backed SQLite URLs.
    Reset {
        /// Skip confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
}

pub async fn handle_db(action: DbAction, config: &BridgekeeperConfig) -> Result<()> {
    match action {
        DbAction::Migrate => {
            let pool = runtime::connect(config).await?;
            pool.close().await;
            println!("Migrations applied.");
            Ok(())
        },
        DbAction::Purge => {
            let pool = runtime::connect(config).await?;
            let cache =
                SqliteDeliveryCache::new(pool.clone(), Duration::from_secs(config.cache.ttl_secs));
            let purged = cache.purge_expired().await?;
            pool.close().await;
            println!("Purged {purged} expired delivery cache entries.");
            Ok(())
        },
        DbAction::Reset { yes } => reset(config, yes),
    }
}

fn reset(config: &BridgekeeperConfig, yes: bool) -> Result<()> {
    let url = runtime::database_url(config)?;
    let Some(path) = sqlite_path(&url) else {
        bail!("cannot reset non-file database {url}");
    };

    if !yes {
        eprintln!("This will delete all bridges and cached deliveries:");
        eprintln!("  {}", path.display());
        eprintln!();
        eprintln!("Run with --yes to confirm.");
        std::process::exit(1);
    }

    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.clone().into_os_string();
        file.push(suffix);
        let file = PathBuf::from(file);
        if file.exists() {
            std::fs::remove_file(&file)?;
            println!("Deleted {}", file.display());
        }
    }
    Ok(())
}

/// Filesystem path of a `sqlite:` URL, or `None` for in-memory databases.
fn sqlite_path(url: &str) -> Option<PathBuf> {
    let rest = url.strip_prefix("sqlite:")?;
    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Some(PathBuf::from(path))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_path_parses_file_urls() {
        assert_eq!(
            sqlite_path("sqlite:/tmp/b.db?mode=rwc"),
            Some(PathBuf::from("/tmp/b.db"))
        );
        assert_eq!(
            sqlite_path("sqlite:///var/lib/b.db"),
            Some(PathBuf::from("/var/lib/b.db"))
        );
        assert_eq!(sqlite_path("sqlite::memory:"), None);
        assert_eq!(sqlite_path("postgres://localhost/b"), None);
    }

    #[tokio::test]
    async fn reset_removes_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("bridges.db");
        let mut config = BridgekeeperConfig::default();
        config.database.url = Some(format!("sqlite:{}?mode=rwc", db.display()));

        handle_db(DbAction::Migrate, &config).await.unwrap();
        assert!(db.exists());

        handle_db(DbAction::Reset { yes: true }, &config)
            .await
            .unwrap();
        assert!(!db.exists());
    }
}
