//! Bridge membership.
//!
//! A bridge mirrors one conversation across chat platforms. This crate owns the
//! mapping from a bridge to its member channels: the [`BridgeService`] joins,
//! leaves and resets channels against a [`BridgeStore`], asking the platform's
//! [`BridgeAdapter`] for the opaque senddata each membership carries. The
//! [`DeliveryCache`] records where forwarded messages landed so edits and
//! deletes can follow them.

pub mod adapter;
pub mod cache;
pub mod cache_memory;
pub mod cache_sqlite;
pub mod command;
pub mod error;
pub mod registry;
pub mod service;
pub mod store;
pub mod store_memory;
pub mod store_sqlite;
pub mod types;

pub use {
    adapter::{BridgeAdapter, StaticAdapter},
    cache::{DeliveryCache, cache_key, get_bridged_message},
    command::{BridgeCommand, CommandResponse, StatusCode},
    error::{Error, ErrorCategory, ErrorContext, ErrorKind, Result},
    registry::AdapterRegistry,
    service::{BridgeService, BridgeSettings},
    store::{BridgeLookup, BridgeStore},
    types::{BridgeRecord, ChannelState, PlatformMembership, SentMessage},
};

/// Run database migrations for the bridges crate.
///
/// Creates the `bridges`, `bridge_channels` and `delivery_cache` tables. Call
/// once at startup before handing the pool to [`store_sqlite::SqliteBridgeStore`]
/// or [`cache_sqlite::SqliteDeliveryCache`].
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}
