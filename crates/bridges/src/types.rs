use serde::{Deserialize, Serialize};

/// A named bridge and the channels participating in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeRecord {
    /// `id_prefix + name`.
    pub id: String,
    pub name: String,
    /// Members in join order.
    #[serde(default)]
    pub platforms: Vec<PlatformMembership>,
}

impl BridgeRecord {
    /// A bridge with no members yet.
    pub fn new(id_prefix: &str, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: format!("{id_prefix}{name}"),
            name,
            platforms: Vec::new(),
        }
    }

    /// Name recovered from the id by stripping `id_prefix`.
    ///
    /// Falls back to the stored `name` for ids written under another prefix.
    pub fn derived_name(&self, id_prefix: &str) -> &str {
        self.id.strip_prefix(id_prefix).unwrap_or(&self.name)
    }

    pub fn contains_channel(&self, channel: &str) -> bool {
        self.platforms.iter().any(|m| m.channel == channel)
    }

    pub fn membership(&self, channel: &str) -> Option<&PlatformMembership> {
        self.platforms.iter().find(|m| m.channel == channel)
    }

    /// A bridge with no members. Kept in the store, but nothing is relayed.
    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}

/// One platform channel's participation in a bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformMembership {
    /// Platform-local channel id, unique across all bridges.
    pub channel: String,
    /// Adapter (platform) name.
    pub plugin: String,
    /// Adapter-defined delivery metadata. Opaque to this crate.
    pub senddata: serde_json::Value,
}

/// Handle to a message mirrored onto one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    pub channel: String,
    pub plugin: String,
    /// Platform message id.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread: Option<String>,
}

/// Membership state of a single channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelState {
    Unbridged,
    Bridged { bridge_id: String },
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    fn member(channel: &str) -> PlatformMembership {
        PlatformMembership {
            channel: channel.into(),
            plugin: "discord".into(),
            senddata: json!({"channel": channel}),
        }
    }

    #[test]
    fn id_is_prefix_plus_name() {
        let bridge = BridgeRecord::new("bridge-", "general");
        assert_eq!(bridge.id, "bridge-general");
        assert_eq!(bridge.name, "general");
        assert!(bridge.is_empty());
    }

    #[test]
    fn derived_name_strips_prefix() {
        let bridge = BridgeRecord::new("bridge-", "general");
        assert_eq!(bridge.derived_name("bridge-"), "general");
    }

    #[test]
    fn derived_name_falls_back_to_name() {
        let bridge = BridgeRecord::new("old-", "general");
        assert_eq!(bridge.derived_name("bridge-"), "general");
    }

    #[test]
    fn membership_lookup() {
        let mut bridge = BridgeRecord::new("bridge-", "general");
        bridge.platforms.push(member("c1"));
        bridge.platforms.push(member("c2"));

        assert!(bridge.contains_channel("c2"));
        assert!(!bridge.contains_channel("c3"));
        assert_eq!(bridge.membership("c1").unwrap().senddata["channel"], "c1");
    }

    #[test]
    fn document_shape() {
        let mut bridge = BridgeRecord::new("bridge-", "general");
        bridge.platforms.push(member("c1"));
        let value = serde_json::to_value(&bridge).unwrap();
        assert_eq!(value["id"], "bridge-general");
        assert_eq!(value["platforms"][0]["plugin"], "discord");
        assert_eq!(value["platforms"][0]["senddata"]["channel"], "c1");
    }

    #[test]
    fn sent_message_omits_missing_thread() {
        let sent = SentMessage {
            channel: "c1".into(),
            plugin: "discord".into(),
            id: "m1".into(),
            thread: None,
        };
        let raw = serde_json::to_string(&sent).unwrap();
        assert!(!raw.contains("thread"));
        let back: SentMessage = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, sent);
    }
}
