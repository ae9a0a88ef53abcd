//! Delivery cache contract.
//!
//! When a message is forwarded, the pipeline stores the handle of every copy it
//! produced under the source message id. Replies, edits and deletes look the
//! list up to reach each mirror.

use {anyhow::Result, async_trait::async_trait};

use crate::types::SentMessage;

/// Cache key for a source message id.
pub fn cache_key(message_id: &str) -> String {
    format!("message-{message_id}")
}

/// Short-lived store of per-platform handles for forwarded messages.
///
/// Entries are replaced wholesale on `put` and expire on the cache's own
/// schedule; an expired entry reads as absent.
#[async_trait]
pub trait DeliveryCache: Send + Sync {
    async fn get(&self, message_id: &str) -> Result<Option<Vec<SentMessage>>>;
    async fn put(&self, message_id: &str, sent: &[SentMessage]) -> Result<()>;
}

/// Look up the mirrors of a message, treating a missing id as "not bridged".
pub async fn get_bridged_message(
    cache: &dyn DeliveryCache,
    message_id: Option<&str>,
) -> Result<Option<Vec<SentMessage>>> {
    match message_id {
        Some(id) if !id.is_empty() => cache.get(id).await,
        _ => Ok(None),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::cache_memory::InMemoryDeliveryCache,
        std::time::Duration,
    };

    fn sent(plugin: &str, id: &str) -> SentMessage {
        SentMessage {
            channel: format!("{plugin}-channel"),
            plugin: plugin.into(),
            id: id.into(),
            thread: None,
        }
    }

    #[test]
    fn key_format() {
        assert_eq!(cache_key("123"), "message-123");
    }

    #[tokio::test]
    async fn missing_id_skips_cache() {
        let cache = InMemoryDeliveryCache::new(Duration::from_secs(60));
        cache.put("", &[sent("discord", "1")]).await.unwrap();

        assert!(get_bridged_message(&cache, None).await.unwrap().is_none());
        assert!(get_bridged_message(&cache, Some("")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn bridged_message_round_trip() {
        let cache = InMemoryDeliveryCache::new(Duration::from_secs(60));
        let handles = vec![sent("discord", "1"), sent("guilded", "2")];
        cache.put("src", &handles).await.unwrap();

        let got = get_bridged_message(&cache, Some("src")).await.unwrap();
        assert_eq!(got, Some(handles));
    }
}
