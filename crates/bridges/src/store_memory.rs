//! In-memory bridge store for tests.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use {
    anyhow::{Result, bail},
    async_trait::async_trait,
};

use crate::{store::BridgeStore, types::BridgeRecord};

/// In-memory store backed by `HashMap`. No persistence.
///
/// Counts upserts and can be told to fail them or lookups, so callers can check that a
/// rejected operation wrote nothing.
pub struct InMemoryBridgeStore {
    bridges: Mutex<HashMap<String, BridgeRecord>>,
    upserts: AtomicUsize,
    fail_upserts: AtomicBool,
    fail_finds: AtomicBool,
}

impl InMemoryBridgeStore {
    pub fn new() -> Self {
        Self {
            bridges: Mutex::new(HashMap::new()),
            upserts: AtomicUsize::new(0),
            fail_upserts: AtomicBool::new(false),
            fail_finds: AtomicBool::new(false),
        }
    }

    /// Make every following `upsert` fail (or succeed again).
    pub fn fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    /// Make every following lookup fail (or succeed again).
    pub fn fail_finds(&self, fail: bool) {
        self.fail_finds.store(fail, Ordering::SeqCst);
    }

    fn check_finds(&self) -> Result<()> {
        if self.fail_finds.load(Ordering::SeqCst) {
            bail!("in-memory store rejected lookup");
        }
        Ok(())
    }

    /// Number of upserts that reached the store, including failed ones.
    pub fn upsert_count(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    /// Snapshot of every stored bridge.
    pub fn all(&self) -> Vec<BridgeRecord> {
        let bridges = self.bridges.lock().unwrap_or_else(|e| e.into_inner());
        bridges.values().cloned().collect()
    }
}

impl Default for InMemoryBridgeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BridgeStore for InMemoryBridgeStore {
    async fn find_by_channel(&self, channel: &str) -> Result<Option<BridgeRecord>> {
        self.check_finds()?;
        let bridges = self.bridges.lock().unwrap_or_else(|e| e.into_inner());
        Ok(bridges
            .values()
            .find(|b| b.contains_channel(channel))
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<BridgeRecord>> {
        self.check_finds()?;
        let bridges = self.bridges.lock().unwrap_or_else(|e| e.into_inner());
        Ok(bridges.get(id).cloned())
    }

    async fn upsert(&self, bridge: &BridgeRecord) -> Result<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if self.fail_upserts.load(Ordering::SeqCst) {
            bail!("in-memory store rejected upsert of {}", bridge.id);
        }

        let mut bridges = self.bridges.lock().unwrap_or_else(|e| e.into_inner());
        // Same channel-uniqueness rule the SQLite index enforces.
        if let Some(other) = bridges.values().find(|other| {
            other.id != bridge.id
                && bridge
                    .platforms
                    .iter()
                    .any(|m| other.contains_channel(&m.channel))
        }) {
            bail!("channel already belongs to bridge {}", other.id);
        }
        bridges.insert(bridge.id.clone(), bridge.clone());
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::types::PlatformMembership, serde_json::json};

    fn bridge(name: &str, channels: &[&str]) -> BridgeRecord {
        let mut b = BridgeRecord::new("bridge-", name);
        for c in channels {
            b.platforms.push(PlatformMembership {
                channel: (*c).into(),
                plugin: "discord".into(),
                senddata: json!(null),
            });
        }
        b
    }

    #[tokio::test]
    async fn upsert_then_find() {
        let store = InMemoryBridgeStore::new();
        store.upsert(&bridge("a", &["c1", "c2"])).await.unwrap();

        let by_channel = store.find_by_channel("c2").await.unwrap().unwrap();
        assert_eq!(by_channel.id, "bridge-a");
        let by_id = store.find_by_id("bridge-a").await.unwrap().unwrap();
        assert_eq!(by_id.platforms.len(), 2);
        assert!(store.find_by_channel("c3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn upsert_replaces() {
        let store = InMemoryBridgeStore::new();
        store.upsert(&bridge("a", &["c1"])).await.unwrap();
        store.upsert(&bridge("a", &[])).await.unwrap();

        assert!(store.find_by_channel("c1").await.unwrap().is_none());
        assert_eq!(store.all().len(), 1);
        assert_eq!(store.upsert_count(), 2);
    }

    #[tokio::test]
    async fn rejects_channel_owned_elsewhere() {
        let store = InMemoryBridgeStore::new();
        store.upsert(&bridge("a", &["c1"])).await.unwrap();
        assert!(store.upsert(&bridge("b", &["c1"])).await.is_err());
        assert!(store.find_by_id("bridge-b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failing_upserts() {
        let store = InMemoryBridgeStore::new();
        store.fail_upserts(true);
        assert!(store.upsert(&bridge("a", &["c1"])).await.is_err());
        assert!(store.all().is_empty());

        store.fail_upserts(false);
        store.upsert(&bridge("a", &["c1"])).await.unwrap();
        assert_eq!(store.all().len(), 1);
    }

    #[tokio::test]
    async fn failing_finds() {
        let store = InMemoryBridgeStore::new();
        store.upsert(&bridge("a", &["c1"])).await.unwrap();
        store.fail_finds(true);
        assert!(store.find_by_channel("c1").await.is_err());
        assert!(store.find_by_id("bridge-a").await.is_err());

        store.fail_finds(false);
        assert!(store.find_by_channel("c1").await.unwrap().is_some());
    }
}
