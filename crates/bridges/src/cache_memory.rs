//! In-process delivery cache with a fixed TTL.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use {anyhow::Result, async_trait::async_trait, dashmap::DashMap};

#[cfg(feature = "metrics")]
use bridgekeeper_metrics::{cache as cache_metrics, counter};

use crate::{
    cache::{DeliveryCache, cache_key},
    types::SentMessage,
};

/// Writes between sweeps of expired entries.
const PRUNE_EVERY_WRITES: u64 = 256;

#[derive(Debug, Clone)]
struct CachedValue {
    /// JSON array of [`SentMessage`].
    json: String,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl CachedValue {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// Delivery cache held in a `DashMap`.
///
/// Expired entries are dropped when read and swept every
/// [`PRUNE_EVERY_WRITES`] writes.
#[derive(Clone)]
pub struct InMemoryDeliveryCache {
    ttl: Duration,
    entries: Arc<DashMap<String, CachedValue>>,
    writes: Arc<AtomicU64>,
}

impl InMemoryDeliveryCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(DashMap::new()),
            writes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get_at(&self, message_id: &str, now: Instant) -> Result<Option<Vec<SentMessage>>> {
        let key = cache_key(message_id);
        let live = self
            .entries
            .get(&key)
            .and_then(|entry| entry.is_live(now).then(|| entry.json.clone()));

        match live {
            Some(json) => {
                #[cfg(feature = "metrics")]
                counter!(cache_metrics::HITS_TOTAL).increment(1);
                Ok(Some(serde_json::from_str(&json)?))
            },
            None => {
                #[cfg(feature = "metrics")]
                counter!(cache_metrics::MISSES_TOTAL).increment(1);
                self.entries.remove_if(&key, |_, v| !v.is_live(now));
                Ok(None)
            },
        }
    }

    fn put_at(&self, message_id: &str, sent: &[SentMessage], now: Instant) -> Result<()> {
        let json = serde_json::to_string(sent)?;
        self.entries.insert(cache_key(message_id), CachedValue {
            json,
            expires_at: now.checked_add(self.ttl),
        });

        let writes = self.writes.fetch_add(1, Ordering::Relaxed) + 1;
        if writes.is_multiple_of(PRUNE_EVERY_WRITES) {
            self.prune(now);
        }
        Ok(())
    }

    fn prune(&self, now: Instant) {
        self.entries.retain(|_, v| v.is_live(now));
    }
}

#[async_trait]
impl DeliveryCache for InMemoryDeliveryCache {
    async fn get(&self, message_id: &str) -> Result<Option<Vec<SentMessage>>> {
        self.get_at(message_id, Instant::now())
    }

    async fn put(&self, message_id: &str, sent: &[SentMessage]) -> Result<()> {
        self.put_at(message_id, sent, Instant::now())
    }
}
