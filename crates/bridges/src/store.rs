use {anyhow::Result, async_trait::async_trait};

use crate::types::BridgeRecord;

/// How to address a bridge in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeLookup<'a> {
    /// The bridge that has this channel among its members.
    Channel(&'a str),
    /// The bridge with this id.
    Id(&'a str),
}

/// Persistent storage for bridge documents.
///
/// Implementations surface I/O failures as errors and never retry. `upsert`
/// must be atomic per bridge id; concurrent upserts of the same id resolve
/// last-writer-wins.
#[async_trait]
pub trait BridgeStore: Send + Sync {
    async fn find_by_channel(&self, channel: &str) -> Result<Option<BridgeRecord>>;
    async fn find_by_id(&self, id: &str) -> Result<Option<BridgeRecord>>;
    /// Replace the bridge with the same id, or insert it.
    async fn upsert(&self, bridge: &BridgeRecord) -> Result<()>;

    async fn find(&self, lookup: BridgeLookup<'_>) -> Result<Option<BridgeRecord>> {
        match lookup {
            BridgeLookup::Channel(channel) => self.find_by_channel(channel).await,
            BridgeLookup::Id(id) => self.find_by_id(id).await,
        }
    }
}
