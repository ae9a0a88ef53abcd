use {
    anyhow::{Result, bail},
    async_trait::async_trait,
    serde_json::{Map, Value},
};

/// A platform's side of the bridge handshake.
///
/// `create_senddata` returns whatever the platform later needs to deliver
/// messages into `channel` (a webhook, a room handle, ...). The value is stored
/// with the membership and handed back to the adapter untouched.
#[async_trait]
pub trait BridgeAdapter: Send + Sync {
    /// Platform identifier (e.g. "discord", "guilded").
    fn platform(&self) -> &str;

    async fn create_senddata(&self, channel: &str) -> Result<Value>;
}

/// Adapter whose senddata is the channel id plus fixed fields from config.
///
/// Stands in for platforms whose delivery needs nothing beyond the channel id.
#[derive(Debug, Clone)]
pub struct StaticAdapter {
    platform: String,
    fields: Map<String, Value>,
}

impl StaticAdapter {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            fields: Map::new(),
        }
    }

    pub fn with_fields(mut self, fields: Map<String, Value>) -> Self {
        self.fields = fields;
        self
    }
}

#[async_trait]
impl BridgeAdapter for StaticAdapter {
    fn platform(&self) -> &str {
        &self.platform
    }

    async fn create_senddata(&self, channel: &str) -> Result<Value> {
        if channel.trim().is_empty() {
            bail!("{}: channel id must not be empty", self.platform);
        }
        let mut senddata = self.fields.clone();
        senddata.insert("channel".into(), Value::String(channel.to_owned()));
        Ok(Value::Object(senddata))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[tokio::test]
    async fn static_senddata_includes_channel() {
        let adapter = StaticAdapter::new("discord");
        let senddata = adapter.create_senddata("1234").await.unwrap();
        assert_eq!(senddata, json!({"channel": "1234"}));
    }

    #[tokio::test]
    async fn static_senddata_merges_fields() {
        let mut fields = Map::new();
        fields.insert("webhook".into(), json!("https://example.invalid/hook"));
        fields.insert("channel".into(), json!("overwritten"));
        let adapter = StaticAdapter::new("discord").with_fields(fields);

        let senddata = adapter.create_senddata("1234").await.unwrap();
        assert_eq!(senddata["webhook"], "https://example.invalid/hook");
        assert_eq!(senddata["channel"], "1234");
    }

    #[tokio::test]
    async fn static_rejects_blank_channel() {
        let adapter = StaticAdapter::new("discord");
        let err = adapter.create_senddata("  ").await.unwrap_err();
        assert!(err.to_string().contains("discord"));
    }
}
